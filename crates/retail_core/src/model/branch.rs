//! Branch record.
//!
//! Branch names double as lookup text in queries, so a name equal to the
//! all-records sentinel would be unreachable by key. Such names are rejected.

use super::{require_branch_name, require_text, Record, ValidationError};
use crate::query::is_all_records_sentinel;
use serde::{Deserialize, Serialize};

/// Document stored in the `sucursales` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "direccion")]
    pub address: String,
}

impl Branch {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

impl Record for Branch {
    fn validate(&self) -> Result<(), ValidationError> {
        require_branch_name("nombre", &self.name)?;
        if is_all_records_sentinel(&self.name) {
            return Err(ValidationError::ReservedName(self.name.clone()));
        }
        require_text("direccion", &self.address)?;
        Ok(())
    }
}

/// Partial update for a branch. The address is its only mutable field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BranchChanges {
    #[serde(rename = "direccion", skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl BranchChanges {
    pub fn address(address: impl Into<String>) -> Self {
        Self {
            address: Some(address.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.address.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.address {
            None => Err(ValidationError::EmptyChanges),
            Some(value) => require_text("direccion", value),
        }
    }
}
