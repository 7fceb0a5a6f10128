//! Flat `key = value` line syntax shared by the config and categories files.
//!
//! One assignment per line, `#` starts a comment outside double quotes,
//! strings are double-quoted, integers are non-negative decimal and numbers
//! must be finite.

use thiserror::Error;

/// A malformed line or value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyntaxError {
    #[error("invalid syntax on line {line}: expected key = value")]
    MissingAssignment { line: usize },

    #[error("expected double-quoted string, got `{value}`")]
    ExpectedString { value: String },

    #[error("expected non-negative integer, got `{value}`")]
    ExpectedInteger { value: String },

    #[error("expected number, got `{value}`")]
    ExpectedNumber { value: String },
}

/// One `key = value` line, trimmed, with its 1-based line number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Assignment<'a> {
    pub line: usize,
    pub key: &'a str,
    pub value: &'a str,
}

/// Yields every non-blank, non-comment line of `raw` as an [`Assignment`].
pub fn assignments(raw: &str) -> impl Iterator<Item = Result<Assignment<'_>, SyntaxError>> {
    raw.lines().enumerate().filter_map(|(index, raw_line)| {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            return None;
        }
        let line_number = index + 1;
        Some(
            line.split_once('=')
                .map(|(key, value)| Assignment {
                    line: line_number,
                    key: key.trim(),
                    value: value.trim(),
                })
                .ok_or(SyntaxError::MissingAssignment { line: line_number }),
        )
    })
}

/// Cuts `line` at the first `#` that is not inside a double-quoted string.
#[must_use]
pub fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

/// Parses `"text"` into `text`.
///
/// # Errors
///
/// Returns [`SyntaxError::ExpectedString`] if the value is not quoted.
pub fn parse_string_literal(raw_value: &str) -> Result<String, SyntaxError> {
    let token = raw_value.trim();
    if token.len() < 2 || !token.starts_with('"') || !token.ends_with('"') {
        return Err(SyntaxError::ExpectedString {
            value: token.to_string(),
        });
    }
    Ok(token[1..token.len() - 1].to_string())
}

/// Parses a non-negative decimal integer.
///
/// # Errors
///
/// Returns [`SyntaxError::ExpectedInteger`] for anything else, including
/// trailing tokens and values beyond `u64`.
pub fn parse_integer(raw_value: &str) -> Result<u64, SyntaxError> {
    let token = raw_value.trim();
    token
        .parse::<u64>()
        .map_err(|_| SyntaxError::ExpectedInteger {
            value: token.to_string(),
        })
}

/// Parses a finite decimal number.
///
/// # Errors
///
/// Returns [`SyntaxError::ExpectedNumber`] for non-numeric or non-finite input.
pub fn parse_number(raw_value: &str) -> Result<f64, SyntaxError> {
    let token = raw_value.trim();
    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(SyntaxError::ExpectedNumber {
            value: token.to_string(),
        }),
    }
}
