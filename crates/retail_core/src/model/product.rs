//! Product record.

use super::{require_positive_key, require_stock, require_text, Record, ValidationError};
use serde::{Deserialize, Serialize};

/// Product code, the product natural key.
pub type ProductCode = i64;

/// Document stored in the `productos` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "codigo")]
    pub code: ProductCode,
    #[serde(rename = "descripcion")]
    pub description: String,
    /// Global stock, independent from per-branch stock on `Sells`.
    pub stock: i64,
}

impl Product {
    pub fn new(code: ProductCode, description: impl Into<String>, stock: i64) -> Self {
        Self {
            code,
            description: description.into(),
            stock,
        }
    }
}

impl Record for Product {
    fn validate(&self) -> Result<(), ValidationError> {
        require_positive_key("codigo", self.code)?;
        require_text("descripcion", &self.description)?;
        require_stock(self.stock)?;
        Ok(())
    }
}

/// Partial update for a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProductChanges {
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
}

impl ProductChanges {
    pub fn all(description: impl Into<String>, stock: i64) -> Self {
        Self {
            description: Some(description.into()),
            stock: Some(stock),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.stock.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyChanges);
        }
        if let Some(value) = &self.description {
            require_text("descripcion", value)?;
        }
        if let Some(value) = self.stock {
            require_stock(value)?;
        }
        Ok(())
    }
}
