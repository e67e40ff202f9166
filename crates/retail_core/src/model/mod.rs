//! Domain records stored in the four document collections.
//!
//! # Responsibility
//! - Define the record shapes exchanged with callers and persisted as JSON.
//! - Own per-record validation rules and natural-key identities.
//!
//! # Invariants
//! - Serialized field names match the collection document shapes exactly.
//! - Natural keys never appear in change sets; they are immutable.
//! - Store-assigned document ids are not part of any record.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod branch;
pub mod employee;
pub mod product;
pub mod sells;

/// Record-level validation contract, enforced before writes and after reads.
pub trait Record {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Validation failure for a record or change set.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Text field is empty after trimming.
    BlankField(&'static str),
    /// Numeric natural key must be strictly positive.
    NonPositiveKey { field: &'static str, value: i64 },
    /// Stock counts cannot go below zero.
    NegativeStock(i64),
    /// Prices must be finite and strictly positive.
    InvalidPrice(f64),
    /// Branch name collides with the all-records sentinel.
    ReservedName(String),
    /// Branch name carries leading or trailing whitespace.
    PaddedName { field: &'static str, value: String },
    /// A modification carried no field to change.
    EmptyChanges,
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankField(field) => write!(f, "field `{field}` must not be blank"),
            Self::NonPositiveKey { field, value } => {
                write!(f, "field `{field}` must be a positive integer, got {value}")
            }
            Self::NegativeStock(value) => write!(f, "stock must not be negative, got {value}"),
            Self::InvalidPrice(value) => {
                write!(f, "price must be a positive finite number, got {value}")
            }
            Self::ReservedName(name) => {
                write!(f, "name `{name}` is reserved for listing all records")
            }
            Self::PaddedName { field, value } => write!(
                f,
                "field `{field}` must not start or end with whitespace, got `{value}`"
            ),
            Self::EmptyChanges => write!(f, "modification does not change any field"),
        }
    }
}

impl Error for ValidationError {}

/// Business identifier of one record in any collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NaturalKey {
    Employee(employee::NationalId),
    Product(product::ProductCode),
    Branch(String),
    Sells(sells::SellsKey),
}

impl Display for NaturalKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Employee(dni) => write!(f, "employee with dni {dni}"),
            Self::Product(code) => write!(f, "product with code {code}"),
            Self::Branch(name) => write!(f, "branch `{name}`"),
            Self::Sells(key) => write!(
                f,
                "relation branch `{}` - product {}",
                key.branch, key.product_code
            ),
        }
    }
}

pub(crate) fn require_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(())
}

/// Branch names are looked up by trimmed query text, so they must be stored
/// trimmed as well.
pub(crate) fn require_branch_name(
    field: &'static str,
    value: &str,
) -> Result<(), ValidationError> {
    require_text(field, value)?;
    if value.trim() != value {
        return Err(ValidationError::PaddedName {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

pub(crate) fn require_positive_key(field: &'static str, value: i64) -> Result<(), ValidationError> {
    if value <= 0 {
        return Err(ValidationError::NonPositiveKey { field, value });
    }
    Ok(())
}

pub(crate) fn require_stock(value: i64) -> Result<(), ValidationError> {
    if value < 0 {
        return Err(ValidationError::NegativeStock(value));
    }
    Ok(())
}
