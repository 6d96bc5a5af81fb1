//! Typed step configuration.
//!
//! The binary loads raw inputs from the environment (see `vdtest-cli`) and
//! hands a [`StepConfig`] to the core. [`StepConfig::validate`] performs the
//! checks that must pass before any network call is made.
//!
//! # Example
//!
//! ```no_run
//! use vdtest_core::config::{ApiEndpoint, StepConfig, TestType};
//!
//! let config = StepConfig {
//!     api: ApiEndpoint {
//!         base_url: "https://vdt.example.com/test".to_string(),
//!         app_slug: "app".to_string(),
//!         build_slug: "build".to_string(),
//!         api_token: "secret".to_string(),
//!     },
//!     apk_path: "app-debug.apk".into(),
//!     test_type: TestType::Robo,
//!     test_devices: "Pixel2,28,en,portrait".to_string(),
//!     ..StepConfig::default()
//! };
//! config.validate().expect("invalid configuration");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

/// Default test timeout in seconds.
pub const DEFAULT_TEST_TIMEOUT_SECS: u64 = 900;

/// Missing or invalid configuration, detected before any network call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required input was empty.
    #[error("Issue with {field}: required variable is not present")]
    Missing { field: &'static str },

    /// An input had a value outside its allowed set or format.
    #[error("Issue with {field}: {message}")]
    Invalid { field: &'static str, message: String },

    /// A path input pointed at nothing.
    #[error("Issue with {field}: path does not exist: {}", path.display())]
    PathNotFound { field: &'static str, path: PathBuf },
}

/// The kind of test to run. Exactly one test variant is submitted per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TestType {
    /// Run a separate test APK against the app with a test runner.
    #[default]
    Instrumentation,
    /// Automated UI exploration.
    Robo,
    /// Self-contained game-loop scenarios.
    GameLoop,
}

impl TestType {
    /// The configuration value naming this test type.
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::Instrumentation => "instrumentation",
            TestType::Robo => "robo",
            TestType::GameLoop => "gameloop",
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "instrumentation" => Ok(TestType::Instrumentation),
            "robo" => Ok(TestType::Robo),
            "gameloop" => Ok(TestType::GameLoop),
            "" => Err(ConfigError::Missing { field: "TestType" }),
            other => Err(ConfigError::Invalid {
                field: "TestType",
                message: format!(
                    "invalid value ({}), allowed: instrumentation, robo, gameloop",
                    other
                ),
            }),
        }
    }
}

/// Location and credentials of the remote test API.
///
/// The token is part of every request path; `Debug` never prints it.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiEndpoint {
    pub base_url: String,
    pub app_slug: String,
    pub build_slug: String,
    pub api_token: String,
}

impl ApiEndpoint {
    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// `{base}/{app}/{build}/{token}`: test submission and step listing.
    pub fn test_url(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base(),
            self.app_slug,
            self.build_slug,
            self.api_token
        )
    }

    /// `{base}/assets/{app}/{build}/{token}`: upload URLs and asset listing.
    pub fn assets_url(&self) -> String {
        format!(
            "{}/assets/{}/{}/{}",
            self.base(),
            self.app_slug,
            self.build_slug,
            self.api_token
        )
    }

    /// Checks that every part of the endpoint is present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        require("APIBaseURL", &self.base_url)?;
        require("APIToken", &self.api_token)?;
        require("BuildSlug", &self.build_slug)?;
        require("AppSlug", &self.app_slug)?;
        Ok(())
    }
}

impl fmt::Debug for ApiEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiEndpoint")
            .field("base_url", &self.base_url)
            .field("app_slug", &self.app_slug)
            .field("build_slug", &self.build_slug)
            .field("api_token", &"<redacted>")
            .finish()
    }
}

/// Instrumentation-only inputs. Empty strings mean "use the service default".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstrumentationInputs {
    pub test_package_id: String,
    pub test_runner_class: String,
    /// Comma-separated test targets.
    pub test_targets: String,
}

/// Robo-only inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoboInputs {
    pub initial_activity: String,
    pub max_depth: String,
    pub max_steps: String,
    /// One `resourceName,inputText,actionType` per line.
    pub directives: String,
}

/// Game-loop-only inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameLoopInputs {
    /// Comma-separated integer scenario IDs.
    pub scenarios: String,
    /// Comma-separated scenario labels.
    pub scenario_labels: String,
}

/// Everything one run of the step needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepConfig {
    pub api: ApiEndpoint,

    pub apk_path: PathBuf,
    /// Required for instrumentation tests only.
    pub test_apk_path: Option<PathBuf>,
    pub test_type: TestType,
    /// One `model,apiLevel,locale,orientation` per line.
    pub test_devices: String,
    pub app_package_id: String,
    pub test_timeout_secs: u64,
    pub download_test_results: bool,
    /// One device path per line.
    pub directories_to_pull: String,
    /// One `KEY=VALUE` per line.
    pub environment_variables: String,

    pub instrumentation: InstrumentationInputs,
    pub robo: RoboInputs,
    pub game_loop: GameLoopInputs,
}

impl Default for StepConfig {
    fn default() -> Self {
        Self {
            api: ApiEndpoint::default(),
            apk_path: PathBuf::new(),
            test_apk_path: None,
            test_type: TestType::default(),
            test_devices: String::new(),
            app_package_id: String::new(),
            test_timeout_secs: DEFAULT_TEST_TIMEOUT_SECS,
            download_test_results: false,
            directories_to_pull: String::new(),
            environment_variables: String::new(),
            instrumentation: InstrumentationInputs::default(),
            robo: RoboInputs::default(),
            game_loop: GameLoopInputs::default(),
        }
    }
}

impl StepConfig {
    /// Checks required inputs and that the packages to upload exist.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.api.validate()?;
        require_path("ApkPath", Some(&self.apk_path))?;
        if self.test_type == TestType::Instrumentation {
            require_path("TestApkPath", self.test_apk_path.as_deref())?;
        }
        Ok(())
    }

    /// Whether a test APK is uploaded alongside the app.
    pub fn uploads_test_apk(&self) -> bool {
        self.test_type == TestType::Instrumentation
    }
}

fn require(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Missing { field });
    }
    Ok(())
}

fn require_path(field: &'static str, path: Option<&Path>) -> Result<(), ConfigError> {
    let path = match path {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Err(ConfigError::Missing { field }),
    };
    if !path.exists() {
        return Err(ConfigError::PathNotFound {
            field,
            path: path.to_path_buf(),
        });
    }
    Ok(())
}
