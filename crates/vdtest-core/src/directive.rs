//! Robo test directives: scripted UI actions applied during exploration.

use serde::{Deserialize, Serialize};

use crate::parse::{non_blank_lines, split_fields, ParseError};

const FIELDS: usize = 3;

/// A single `resourceName,inputText,actionType` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoboDirective {
    /// Android resource name of the target UI element.
    pub resource_name: String,
    /// Text to enter; empty for click actions.
    pub input_text: String,
    /// Action type, e.g. `SINGLE_CLICK` or `ENTER_TEXT`.
    pub action_type: String,
}

/// Parses the multi-line directive list. Blank lines are skipped.
pub fn parse_directives(input: &str) -> Result<Vec<RoboDirective>, ParseError> {
    non_blank_lines(input)
        .map(|line| {
            let fields = split_fields(line, "directive", FIELDS)?;
            Ok(RoboDirective {
                resource_name: fields[0].to_string(),
                input_text: fields[1].to_string(),
                action_type: fields[2].to_string(),
            })
        })
        .collect()
}
