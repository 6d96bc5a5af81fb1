//! Remote test steps as reported by the step listing endpoint.
//!
//! The service creates one step per device cell of the matrix. Steps are
//! read-only here: the poll loop inspects their [`StepState`] and the
//! reporter classifies their [`Outcome`].

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Body of `GET {base}/{app}/{build}/{token}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListStepsResponse {
    #[serde(default)]
    pub steps: Vec<TestStep>,
}

/// One execution cell of the matrix.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStep {
    #[serde(default)]
    pub state: StepState,
    #[serde(default)]
    pub outcome: Option<Outcome>,
    #[serde(default)]
    pub dimension_value: Vec<DimensionEntry>,
}

impl TestStep {
    /// Whether the step has reached its terminal state.
    pub fn is_complete(&self) -> bool {
        self.state == StepState::Complete
    }

    /// Dimension values keyed by dimension name (`Model`, `Version`, ...).
    pub fn dimensions(&self) -> HashMap<&str, &str> {
        self.dimension_value
            .iter()
            .map(|entry| (entry.key.as_str(), entry.value.as_str()))
            .collect()
    }
}

/// A `{key, value}` pair naming one dimension of the step's cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DimensionEntry {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// Lifecycle state of a step. Anything but `complete` counts as running.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum StepState {
    #[default]
    Pending,
    Running,
    Complete,
    /// Any other state string reported by the service.
    Other(String),
}

impl From<String> for StepState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" => StepState::Pending,
            "running" => StepState::Running,
            "complete" => StepState::Complete,
            _ => StepState::Other(s),
        }
    }
}

impl From<StepState> for String {
    fn from(state: StepState) -> Self {
        match state {
            StepState::Pending => "pending".to_string(),
            StepState::Running => "running".to_string(),
            StepState::Complete => "complete".to_string(),
            StepState::Other(s) => s,
        }
    }
}

/// Outcome summary. Unrecognized values are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Summary {
    Success,
    Failure,
    Inconclusive,
    Skipped,
    Unrecognized(String),
    #[default]
    Unspecified,
}

impl Summary {
    pub fn as_str(&self) -> &str {
        match self {
            Summary::Success => "success",
            Summary::Failure => "failure",
            Summary::Inconclusive => "inconclusive",
            Summary::Skipped => "skipped",
            Summary::Unrecognized(s) => s,
            Summary::Unspecified => "",
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for Summary {
    fn from(s: String) -> Self {
        match s.as_str() {
            "success" => Summary::Success,
            "failure" => Summary::Failure,
            "inconclusive" => Summary::Inconclusive,
            "skipped" => Summary::Skipped,
            "" => Summary::Unspecified,
            _ => Summary::Unrecognized(s),
        }
    }
}

impl From<Summary> for String {
    fn from(summary: Summary) -> Self {
        summary.as_str().to_string()
    }
}

/// Final result of a step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    #[serde(default)]
    pub summary: Summary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_detail: Option<FailureDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inconclusive_detail: Option<InconclusiveDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skipped_detail: Option<SkippedDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_detail: Option<SuccessDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FailureDetail {
    pub crashed: bool,
    pub not_installed: bool,
    pub other_native_crash: bool,
    pub timed_out: bool,
    pub unable_to_crawl: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InconclusiveDetail {
    pub aborted_by_user: bool,
    pub infrastructure_failure: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SkippedDetail {
    pub incompatible_app_version: bool,
    pub incompatible_architecture: bool,
    pub incompatible_device: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuccessDetail {
    pub other_native_crash: bool,
}
