//! Employee record.
//!
//! # Invariants
//! - `national_id` is the natural key and is strictly positive.
//! - `branch` names a branch that existed when the record was last written;
//!   it may go stale afterwards.

use super::{
    require_branch_name, require_positive_key, require_text, Record, ValidationError,
};
use serde::{Deserialize, Serialize};

/// National identity number, the employee natural key.
pub type NationalId = i64;

/// Document stored in the `empleados` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(rename = "dni")]
    pub national_id: NationalId,
    #[serde(rename = "nombre")]
    pub first_name: String,
    #[serde(rename = "apellido")]
    pub last_name: String,
    /// Soft reference to `Branch::name`.
    #[serde(rename = "sucursal")]
    pub branch: String,
}

impl Employee {
    pub fn new(
        national_id: NationalId,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            national_id,
            first_name: first_name.into(),
            last_name: last_name.into(),
            branch: branch.into(),
        }
    }
}

impl Record for Employee {
    fn validate(&self) -> Result<(), ValidationError> {
        require_positive_key("dni", self.national_id)?;
        require_text("nombre", &self.first_name)?;
        require_text("apellido", &self.last_name)?;
        require_branch_name("sucursal", &self.branch)?;
        Ok(())
    }
}

/// Partial update for an employee. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmployeeChanges {
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(rename = "apellido", skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "sucursal", skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}

impl EmployeeChanges {
    /// Change set replacing every non-key field.
    pub fn all(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        branch: impl Into<String>,
    ) -> Self {
        Self {
            first_name: Some(first_name.into()),
            last_name: Some(last_name.into()),
            branch: Some(branch.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.branch.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyChanges);
        }
        if let Some(value) = &self.first_name {
            require_text("nombre", value)?;
        }
        if let Some(value) = &self.last_name {
            require_text("apellido", value)?;
        }
        if let Some(value) = &self.branch {
            require_branch_name("sucursal", value)?;
        }
        Ok(())
    }
}
