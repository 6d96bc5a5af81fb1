//! Test device descriptors.
//!
//! Devices are configured one per line as `model,apiLevel,locale,orientation`
//! and serialized into the matrix's `androidDevices` list with the remote
//! service's field names.

use serde::{Deserialize, Serialize};

use crate::parse::{non_blank_lines, split_fields, ParseError};

const FIELDS: usize = 4;

/// One device/OS/locale/orientation cell of the test matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSpec {
    /// Device model identifier (e.g. `Nexus6`).
    #[serde(rename = "androidModelId")]
    pub model: String,

    /// Android API level (e.g. `24`).
    #[serde(rename = "androidVersionId")]
    pub api_level: String,

    /// Locale code (e.g. `en`).
    pub locale: String,

    /// `portrait` or `landscape`.
    pub orientation: String,
}

impl DeviceSpec {
    /// Parses a single trimmed, non-blank device line.
    pub fn parse_line(line: &str) -> Result<Self, ParseError> {
        let fields = split_fields(line, "test device", FIELDS)?;
        Ok(Self {
            model: fields[0].to_string(),
            api_level: fields[1].to_string(),
            locale: fields[2].to_string(),
            orientation: fields[3].to_string(),
        })
    }
}

/// Parses the multi-line device list, preserving input order.
///
/// Blank lines are skipped; any other line must have exactly four fields.
pub fn parse_devices(input: &str) -> Result<Vec<DeviceSpec>, ParseError> {
    non_blank_lines(input).map(DeviceSpec::parse_line).collect()
}
