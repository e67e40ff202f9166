//! Query selector parsing.
//!
//! # Responsibility
//! - Turn one free-text query argument into a typed [`Selector`] in a
//!   single parsing step, before any store access.
//!
//! # Invariants
//! - The trimmed, case-insensitive literal `todas` always means "all
//!   records"; it is checked before any key interpretation.
//! - For numeric-or-text keys, a value parsing as `i64` is numeric; anything
//!   else is text.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Literal that selects every record of a collection.
pub const ALL_RECORDS_SENTINEL: &str = "todas";

/// Returns whether `input` is the all-records sentinel.
pub fn is_all_records_sentinel(input: &str) -> bool {
    input.trim().eq_ignore_ascii_case(ALL_RECORDS_SENTINEL)
}

/// Which key forms a collection's query slot accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyShape {
    /// Integer natural keys (employee dni, product code).
    Numeric,
    /// Text natural keys (branch name). Digits are kept as text.
    Text,
    /// Either a product code or a branch name (sells relation).
    NumericOrText,
}

/// Parsed query intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    AllRecords,
    ByNumericKey(i64),
    ByTextKey(String),
}

/// Query argument that cannot be turned into a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    Empty,
    NotNumeric(String),
}

impl Display for SelectorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "query must not be empty"),
            Self::NotNumeric(value) => write!(
                f,
                "expected a number or `{ALL_RECORDS_SENTINEL}`, got `{value}`"
            ),
        }
    }
}

impl Error for SelectorError {}

impl Selector {
    /// Parses `input` according to the key shape of the queried collection.
    pub fn parse(input: &str, shape: KeyShape) -> Result<Self, SelectorError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SelectorError::Empty);
        }
        if is_all_records_sentinel(trimmed) {
            return Ok(Self::AllRecords);
        }

        match shape {
            KeyShape::Numeric => trimmed
                .parse::<i64>()
                .map(Self::ByNumericKey)
                .map_err(|_| SelectorError::NotNumeric(trimmed.to_string())),
            KeyShape::Text => Ok(Self::ByTextKey(trimmed.to_string())),
            KeyShape::NumericOrText => Ok(trimmed
                .parse::<i64>()
                .map(Self::ByNumericKey)
                .unwrap_or_else(|_| Self::ByTextKey(trimmed.to_string()))),
        }
    }
}
