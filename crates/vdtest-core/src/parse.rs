//! Parsers for the flat, delimiter-separated step inputs.
//!
//! Every list-shaped input of the step arrives as a single string: either
//! one entry per line (devices, directives, directories, environment
//! variables) or comma-separated on one line (test targets, game-loop
//! scenarios and labels). The helpers here turn those strings into typed
//! values; [`crate::device`] and [`crate::directive`] build on
//! [`split_fields`] for their fixed-width records.

use thiserror::Error;

use crate::matrix::EnvVar;

/// A malformed user-supplied list, record or numeric field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A record line did not have the expected number of comma-separated fields.
    #[error("Invalid {kind} configuration: {line} (expected {expected} comma-separated fields, got {found})")]
    FieldCount {
        /// What the line describes ("test device", "directive").
        kind: &'static str,
        /// The offending line, trimmed.
        line: String,
        expected: usize,
        found: usize,
    },

    /// A value that must be an integer was not.
    #[error("Failed to parse {field} value ({value}) to integer: {reason}")]
    Integer {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Iterates over the trimmed, non-blank lines of `input`.
pub fn non_blank_lines(input: &str) -> impl Iterator<Item = &str> {
    input.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Parses one entry per line, skipping blank lines.
///
/// Used for the directories-to-pull input.
pub fn parse_line_list(input: &str) -> Vec<String> {
    non_blank_lines(input).map(String::from).collect()
}

/// Splits a trimmed record line on `,` and checks the field count.
pub fn split_fields<'a>(
    line: &'a str,
    kind: &'static str,
    expected: usize,
) -> Result<Vec<&'a str>, ParseError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != expected {
        return Err(ParseError::FieldCount {
            kind,
            line: line.to_string(),
            expected,
            found: fields.len(),
        });
    }
    Ok(fields)
}

/// Splits a comma-separated list after trimming the whole input.
///
/// Individual tokens are not trimmed: `"a, b"` yields `["a", " b"]`.
/// Callers only invoke this for non-empty inputs.
pub fn parse_scalar_list(input: &str) -> Vec<String> {
    input.trim().split(',').map(String::from).collect()
}

/// Parses a single integer field.
pub fn parse_integer(field: &'static str, value: &str) -> Result<i64, ParseError> {
    value.parse::<i64>().map_err(|e| ParseError::Integer {
        field,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Parses a comma-separated list of integers; any non-integer token is an error.
pub fn parse_integer_list(field: &'static str, input: &str) -> Result<Vec<i64>, ParseError> {
    input
        .trim()
        .split(',')
        .map(|token| parse_integer(field, token))
        .collect()
}

/// Parses `KEY=VALUE` lines into environment variables.
///
/// Blank lines and lines without `=` are dropped. Only the first `=`
/// separates key from value, so `A=1=2` yields key `A`, value `1=2`.
pub fn parse_env_list(input: &str) -> Vec<EnvVar> {
    non_blank_lines(input)
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| EnvVar {
            key: key.to_string(),
            value: value.to_string(),
        })
        .collect()
}
