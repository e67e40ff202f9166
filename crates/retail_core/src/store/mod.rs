//! Generic record store over schema-less document collections.
//!
//! # Responsibility
//! - Provide mechanical per-collection CRUD primitives keyed by natural key.
//! - Keep SQL and JSON document details inside the persistence boundary.
//!
//! # Invariants
//! - No business validation happens here beyond rejecting corrupt documents.
//! - "Not found" is never an error: lookups return `None`, mutations return
//!   a zero affected-row count.
//! - Duplicate natural keys are rejected by the unique indexes and surface as
//!   [`StoreError::UniqueViolation`].

use crate::db::DbError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

mod collections;
pub mod document_store;

pub use collections::Collection;
pub use document_store::{DocumentStore, StoredDocument};

/// Opaque, store-assigned identifier of one document.
pub type DocumentId = Uuid;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure while accessing a document collection.
#[derive(Debug)]
pub enum StoreError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Write rejected by a natural-key unique index.
    UniqueViolation { collection: &'static str },
    /// Persisted document cannot be decoded into a valid record.
    InvalidDocument {
        collection: &'static str,
        message: String,
    },
    /// Record or change set could not be encoded as JSON.
    Serialization(serde_json::Error),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Collection table is missing from the connection.
    MissingCollection(&'static str),
}

impl StoreError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::UniqueViolation { collection } => {
                write!(f, "natural key already present in `{collection}`")
            }
            Self::InvalidDocument {
                collection,
                message,
            } => write!(f, "invalid document in `{collection}`: {message}"),
            Self::Serialization(err) => write!(f, "document encoding failed: {err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "record store requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingCollection(name) => {
                write!(f, "record store requires collection `{name}`")
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Serialization(err) => Some(err),
            Self::UniqueViolation { .. }
            | Self::InvalidDocument { .. }
            | Self::UninitializedConnection { .. }
            | Self::MissingCollection(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization(value)
    }
}
