//! Step inputs, read from flags or the step's environment variables.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use vdtest_core::config::{
    ApiEndpoint, ConfigError, GameLoopInputs, InstrumentationInputs, RoboInputs, StepConfig,
    TestType, DEFAULT_TEST_TIMEOUT_SECS,
};
use vdtest_core::device::DeviceSpec;
use vdtest_core::parse::non_blank_lines;
use vdtest_core::poll::PollConfig;

/// Raw step inputs. Every text input defaults to empty.
#[derive(Args, Debug, Clone)]
pub struct StepInputs {
    /// Base URL of the virtual device testing API
    #[arg(long, env = "api_base_url", default_value = "")]
    pub api_base_url: String,

    /// API token, part of every request path
    #[arg(long, env = "api_token", default_value = "", hide_env_values = true)]
    pub api_token: String,

    /// Build slug
    #[arg(long, env = "BITRISE_BUILD_SLUG", default_value = "")]
    pub build_slug: String,

    /// App slug
    #[arg(long, env = "BITRISE_APP_SLUG", default_value = "")]
    pub app_slug: String,

    /// Path of the app APK
    #[arg(long, env = "apk_path", default_value = "")]
    pub apk_path: String,

    /// Path of the test APK (instrumentation only)
    #[arg(long, env = "test_apk_path", default_value = "")]
    pub test_apk_path: String,

    /// Test type: instrumentation, robo or gameloop
    #[arg(long, env = "test_type", default_value = "")]
    pub test_type: String,

    /// One `model,apiLevel,locale,orientation` per line
    #[arg(long, env = "test_devices", default_value = "")]
    pub test_devices: String,

    /// Package ID of the app under test
    #[arg(long, env = "app_package_id", default_value = "")]
    pub app_package_id: String,

    /// Test timeout in seconds
    #[arg(long, env = "test_timeout", default_value = "900")]
    pub test_timeout: String,

    /// `true` to download the produced test assets
    #[arg(long, env = "download_test_results", default_value = "false")]
    pub download_test_results: String,

    /// Device directories to pull after the test, one per line
    #[arg(long, env = "directories_to_pull", default_value = "")]
    pub directories_to_pull: String,

    /// Device environment variables, one `KEY=VALUE` per line
    #[arg(long, env = "environment_variables", default_value = "")]
    pub environment_variables: String,

    /// Instrumentation test package ID
    #[arg(long, env = "inst_test_package_id", default_value = "")]
    pub inst_test_package_id: String,

    /// Instrumentation test runner class
    #[arg(long, env = "inst_test_runner_class", default_value = "")]
    pub inst_test_runner_class: String,

    /// Comma-separated instrumentation test targets
    #[arg(long, env = "inst_test_targets", default_value = "")]
    pub inst_test_targets: String,

    /// Robo initial activity
    #[arg(long, env = "robo_initial_activity", default_value = "")]
    pub robo_initial_activity: String,

    /// Robo maximum crawl depth
    #[arg(long, env = "robo_max_depth", default_value = "")]
    pub robo_max_depth: String,

    /// Robo maximum steps
    #[arg(long, env = "robo_max_steps", default_value = "")]
    pub robo_max_steps: String,

    /// Robo directives, one `resourceName,inputText,actionType` per line
    #[arg(long, env = "robo_directives", default_value = "")]
    pub robo_directives: String,

    /// Comma-separated game loop scenario numbers
    #[arg(long, env = "loop_scenarios", default_value = "")]
    pub loop_scenarios: String,

    /// Comma-separated game loop scenario labels
    #[arg(long, env = "loop_scenario_labels", default_value = "")]
    pub loop_scenario_labels: String,

    /// Seconds between test status requests
    #[arg(long, env = "VDTEST_POLL_INTERVAL", default_value = "5")]
    pub poll_interval: String,
}

impl StepInputs {
    /// Converts the raw inputs into a validated [`StepConfig`] and the poll
    /// settings.
    ///
    /// Checks run in the order the inputs are documented: API location and
    /// credentials, test type, timeout and poll interval, then the packages.
    pub fn into_config(self) -> Result<(StepConfig, PollConfig), ConfigError> {
        let api = ApiEndpoint {
            base_url: self.api_base_url,
            app_slug: self.app_slug,
            build_slug: self.build_slug,
            api_token: self.api_token,
        };
        api.validate()?;

        let test_type: TestType = self.test_type.parse()?;

        let test_timeout_secs = match self.test_timeout.trim() {
            "" => DEFAULT_TEST_TIMEOUT_SECS,
            value => value.parse().map_err(|_| ConfigError::Invalid {
                field: "TestTimeout",
                message: format!("not a number of seconds: {}", value),
            })?,
        };

        let poll = parse_poll_interval(&self.poll_interval)?;

        let test_apk_path = if self.test_apk_path.is_empty() {
            None
        } else {
            Some(PathBuf::from(self.test_apk_path))
        };

        let config = StepConfig {
            api,
            apk_path: PathBuf::from(self.apk_path),
            test_apk_path,
            test_type,
            test_devices: self.test_devices,
            app_package_id: self.app_package_id,
            test_timeout_secs,
            download_test_results: self.download_test_results == "true",
            directories_to_pull: self.directories_to_pull,
            environment_variables: self.environment_variables,
            instrumentation: InstrumentationInputs {
                test_package_id: self.inst_test_package_id,
                test_runner_class: self.inst_test_runner_class,
                test_targets: self.inst_test_targets,
            },
            robo: RoboInputs {
                initial_activity: self.robo_initial_activity,
                max_depth: self.robo_max_depth,
                max_steps: self.robo_max_steps,
                directives: self.robo_directives,
            },
            game_loop: GameLoopInputs {
                scenarios: self.loop_scenarios,
                scenario_labels: self.loop_scenario_labels,
            },
        };
        config.validate()?;
        Ok((config, poll))
    }

    /// Human-readable summary of the inputs. The token is never included.
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Configs:".to_string(),
            format!("- ApkPath: {}", self.apk_path),
            format!("- TestTimeout: {}", self.test_timeout),
            format!("- DirectoriesToPull: {}", self.directories_to_pull),
            format!("- EnvironmentVariables: {}", self.environment_variables),
            "- TestDevices:".to_string(),
            device_table(&self.test_devices),
            format!("- AppPackageID: {}", self.app_package_id),
            format!("- TestType: {}", self.test_type),
        ];

        match self.test_type.as_str() {
            "instrumentation" => lines.extend([
                format!("- TestApkPath: {}", self.test_apk_path),
                format!("- InstTestPackageID: {}", self.inst_test_package_id),
                format!("- InstTestRunnerClass: {}", self.inst_test_runner_class),
                format!("- InstTestTargets: {}", self.inst_test_targets),
            ]),
            "robo" => lines.extend([
                format!("- RoboInitialActivity: {}", self.robo_initial_activity),
                format!("- RoboMaxDepth: {}", self.robo_max_depth),
                format!("- RoboMaxSteps: {}", self.robo_max_steps),
                format!("- RoboDirectives: {}", self.robo_directives),
            ]),
            "gameloop" => lines.extend([
                format!("- LoopScenarios: {}", self.loop_scenarios),
                format!("- LoopScenarioLabels: {}", self.loop_scenario_labels),
            ]),
            _ => {}
        }

        lines.join("\n")
    }
}

/// Whole seconds, at least one. Empty keeps the default interval.
fn parse_poll_interval(value: &str) -> Result<PollConfig, ConfigError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(PollConfig::default());
    }
    match value.parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(PollConfig {
            interval: Duration::from_secs(secs),
        }),
        _ => Err(ConfigError::Invalid {
            field: "PollInterval",
            message: format!("not a positive number of seconds: {}", value),
        }),
    }
}

/// Table of the well-formed device lines. Malformed lines are reported
/// later, when the matrix is built.
fn device_table(test_devices: &str) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_header(["Model", "API Level", "Locale", "Orientation"]);
    for device in non_blank_lines(test_devices).filter_map(|line| DeviceSpec::parse_line(line).ok()) {
        table.add_row([device.model, device.api_level, device.locale, device.orientation]);
    }
    table.to_string()
}
