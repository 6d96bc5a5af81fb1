//! Test matrix construction.
//!
//! [`build_test_matrix`] translates a [`StepConfig`] into the JSON document
//! submitted to the test service:
//!
//! ```text
//! {
//!   "environmentMatrix": { "androidDeviceList": { "androidDevices": [...] } },
//!   "testSpecification": {
//!     "testTimeout": "900s",
//!     "testSetup": { "directoriesToPull": [...], "environmentVariables": [...] },
//!     "androidInstrumentationTest" | "androidRoboTest" | "androidTestLoop": {...}
//!   }
//! }
//! ```
//!
//! Optional inputs left empty are omitted from the document so the service
//! applies its own defaults.

use serde::{Deserialize, Serialize};

use crate::config::{StepConfig, TestType};
use crate::device::{parse_devices, DeviceSpec};
use crate::directive::{parse_directives, RoboDirective};
use crate::parse::{
    parse_env_list, parse_integer, parse_integer_list, parse_line_list, parse_scalar_list,
    ParseError,
};

/// The full submission body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestMatrix {
    pub environment_matrix: EnvironmentMatrix,
    pub test_specification: TestSpecification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentMatrix {
    pub android_device_list: AndroidDeviceList,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AndroidDeviceList {
    pub android_devices: Vec<DeviceSpec>,
}

/// Shared test settings plus exactly one test variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSpecification {
    /// Duration string, e.g. `"900s"`.
    pub test_timeout: String,
    pub test_setup: TestSetup,
    #[serde(flatten)]
    pub test: TestVariant,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSetup {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub directories_to_pull: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub environment_variables: Vec<EnvVar>,
}

/// An environment variable set on the device for the test run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

/// The test-type specific part of the specification.
///
/// Serialized externally tagged, so the variant name becomes the single
/// `android*Test` key next to the shared fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TestVariant {
    #[serde(rename = "androidInstrumentationTest")]
    Instrumentation(InstrumentationTest),
    #[serde(rename = "androidRoboTest")]
    Robo(RoboTest),
    #[serde(rename = "androidTestLoop")]
    GameLoop(GameLoopTest),
}

impl TestVariant {
    /// The test type this variant was built for.
    pub fn test_type(&self) -> TestType {
        match self {
            TestVariant::Instrumentation(_) => TestType::Instrumentation,
            TestVariant::Robo(_) => TestType::Robo,
            TestVariant::GameLoop(_) => TestType::GameLoop,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstrumentationTest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_package_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_package_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_runner_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_targets: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoboTest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_package_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_initial_activity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_depth: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub robo_directives: Option<Vec<RoboDirective>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameLoopTest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_package_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<Vec<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_labels: Option<Vec<String>>,
}

/// Builds the submission body. Fails on the first malformed input.
pub fn build_test_matrix(config: &StepConfig) -> Result<TestMatrix, ParseError> {
    let devices = parse_devices(&config.test_devices)?;

    Ok(TestMatrix {
        environment_matrix: EnvironmentMatrix {
            android_device_list: AndroidDeviceList {
                android_devices: devices,
            },
        },
        test_specification: build_test_specification(config)?,
    })
}

/// Builds the shared settings and the variant selected by `config.test_type`.
pub fn build_test_specification(config: &StepConfig) -> Result<TestSpecification, ParseError> {
    let test_setup = TestSetup {
        directories_to_pull: parse_line_list(&config.directories_to_pull),
        environment_variables: parse_env_list(&config.environment_variables),
    };

    let test = match config.test_type {
        TestType::Instrumentation => TestVariant::Instrumentation(instrumentation_test(config)),
        TestType::Robo => TestVariant::Robo(robo_test(config)?),
        TestType::GameLoop => TestVariant::GameLoop(game_loop_test(config)?),
    };

    Ok(TestSpecification {
        test_timeout: format!("{}s", config.test_timeout_secs),
        test_setup,
        test,
    })
}

fn instrumentation_test(config: &StepConfig) -> InstrumentationTest {
    let inputs = &config.instrumentation;
    InstrumentationTest {
        app_package_id: non_empty(&config.app_package_id),
        test_package_id: non_empty(&inputs.test_package_id),
        test_runner_class: non_empty(&inputs.test_runner_class),
        test_targets: non_empty(&inputs.test_targets).map(|t| parse_scalar_list(&t)),
    }
}

fn robo_test(config: &StepConfig) -> Result<RoboTest, ParseError> {
    let inputs = &config.robo;
    Ok(RoboTest {
        app_package_id: non_empty(&config.app_package_id),
        app_initial_activity: non_empty(&inputs.initial_activity),
        max_depth: optional_integer("robo_max_depth", &inputs.max_depth)?,
        max_steps: optional_integer("robo_max_steps", &inputs.max_steps)?,
        robo_directives: match non_empty(&inputs.directives) {
            Some(raw) => Some(parse_directives(&raw)?),
            None => None,
        },
    })
}

fn game_loop_test(config: &StepConfig) -> Result<GameLoopTest, ParseError> {
    let inputs = &config.game_loop;
    Ok(GameLoopTest {
        app_package_id: non_empty(&config.app_package_id),
        scenarios: match non_empty(&inputs.scenarios) {
            Some(raw) => Some(parse_integer_list("loop_scenarios", &raw)?),
            None => None,
        },
        scenario_labels: non_empty(&inputs.scenario_labels).map(|l| parse_scalar_list(&l)),
    })
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn optional_integer(field: &'static str, value: &str) -> Result<Option<i64>, ParseError> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_integer(field, value).map(Some)
}
