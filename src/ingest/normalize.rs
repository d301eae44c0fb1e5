//! Unit & Value Normalizer
//!
//! Converts free-text size and numeric cells from a spreadsheet export into
//! canonical values. Sizes are normalized to gigabytes. Every function here
//! is total: any input that cannot be read as a non-negative finite number
//! normalizes to `0.0`.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Units
// =============================================================================

/// Gigabytes per terabyte
pub const GB_PER_TB: f64 = 1024.0;

/// Megabytes per gigabyte
pub const MB_PER_GB: f64 = 1024.0;

/// Spreadsheet division-by-zero marker (matched lowercased)
const ERROR_SENTINEL: &str = "#div/0";

/// Two-decimal zero written by the export, e.g. "0.00 MB"
const ZERO_PLACEHOLDER: &str = "0.00";

/// Size unit recognized in a size cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    Terabytes,
    Gigabytes,
    Megabytes,
}

impl SizeUnit {
    /// Detect the unit by substring containment, largest unit first.
    /// `text` must already be lowercased.
    fn detect(text: &str) -> Option<Self> {
        if text.contains("tb") {
            Some(SizeUnit::Terabytes)
        } else if text.contains("gb") {
            Some(SizeUnit::Gigabytes)
        } else if text.contains("mb") {
            Some(SizeUnit::Megabytes)
        } else {
            None
        }
    }

    /// Convert a value in this unit to gigabytes
    pub fn to_gb(self, value: f64) -> f64 {
        match self {
            SizeUnit::Terabytes => value * GB_PER_TB,
            SizeUnit::Gigabytes => value,
            SizeUnit::Megabytes => value / MB_PER_GB,
        }
    }
}

// =============================================================================
// Value Issues
// =============================================================================

/// Reason a cell was normalized to zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueIssue {
    /// Cell was empty or whitespace
    Empty,
    /// Cell carried the division-by-zero marker
    ErrorSentinel,
    /// Cell was a formatted zero such as "0.00 MB"
    ZeroPlaceholder,
    /// No readable number in the cell
    Unparseable,
    /// Number was negative, NaN or infinite
    OutOfRange,
}

impl fmt::Display for ValueIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueIssue::Empty => write!(f, "empty value"),
            ValueIssue::ErrorSentinel => write!(f, "error sentinel"),
            ValueIssue::ZeroPlaceholder => write!(f, "zero placeholder"),
            ValueIssue::Unparseable => write!(f, "unparseable value"),
            ValueIssue::OutOfRange => write!(f, "value out of range"),
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Parse a size cell such as "1.26 TB", "897.46 GB" or "0.21 MB" to gigabytes.
///
/// Returns `Err` with the reason when the cell normalizes to zero.
pub fn parse_size_checked(text: &str) -> Result<f64, ValueIssue> {
    let text = text.trim().to_lowercase();

    if text.contains(ERROR_SENTINEL) {
        return Err(ValueIssue::ErrorSentinel);
    }
    if text.is_empty() {
        return Err(ValueIssue::Empty);
    }
    if text.starts_with(ZERO_PLACEHOLDER) {
        return Err(ValueIssue::ZeroPlaceholder);
    }

    let literal = leading_literal(&text);
    if literal.is_empty() {
        return Err(ValueIssue::Unparseable);
    }
    let value: f64 = literal.parse().map_err(|_| ValueIssue::Unparseable)?;

    let gb = match SizeUnit::detect(&text) {
        Some(unit) => unit.to_gb(value),
        // No unit token: already gigabytes
        None => value,
    };

    ensure_in_range(gb)
}

/// Parse a size cell to gigabytes, normalizing anything unreadable to `0.0`
pub fn parse_size(text: &str) -> f64 {
    parse_size_checked(text).unwrap_or(0.0)
}

/// Parse a plain numeric cell such as an ops/s rate.
///
/// Returns `Err` with the reason when the cell normalizes to zero.
pub fn parse_number_checked(text: &str) -> Result<f64, ValueIssue> {
    let text = text.trim().to_lowercase();

    if text.contains(ERROR_SENTINEL) {
        return Err(ValueIssue::ErrorSentinel);
    }
    if text.is_empty() {
        return Err(ValueIssue::Empty);
    }

    let value: f64 = text.parse().map_err(|_| ValueIssue::Unparseable)?;
    ensure_in_range(value)
}

/// Parse a plain numeric cell, normalizing anything unreadable to `0.0`
pub fn parse_number(text: &str) -> f64 {
    parse_number_checked(text).unwrap_or(0.0)
}

/// Leading run of digits and dots
fn leading_literal(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit() && *c != '.')
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}

fn ensure_in_range(value: f64) -> Result<f64, ValueIssue> {
    if value.is_finite() && value >= 0.0 {
        // Folds -0.0 into 0.0
        Ok(value + 0.0)
    } else {
        Err(ValueIssue::OutOfRange)
    }
}
