//! Sells relation: which branch sells which product, at what price.
//!
//! # Invariants
//! - `(branch, product_code)` is the compound natural key.
//! - `price` and `stock` belong to the relationship, not to either endpoint.
//! - Both endpoints are soft references checked only at creation time.

use super::product::ProductCode;
use super::{
    require_branch_name, require_positive_key, require_stock, Record, ValidationError,
};
use serde::{Deserialize, Serialize};

/// Compound natural key of a sells relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SellsKey {
    pub branch: String,
    pub product_code: ProductCode,
}

impl SellsKey {
    pub fn new(branch: impl Into<String>, product_code: ProductCode) -> Self {
        Self {
            branch: branch.into(),
            product_code,
        }
    }
}

/// Document stored in the `vende` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sells {
    #[serde(rename = "sucursal")]
    pub branch: String,
    #[serde(rename = "codigoProducto")]
    pub product_code: ProductCode,
    #[serde(rename = "precio")]
    pub price: f64,
    /// Stock held by this branch for this product.
    pub stock: i64,
}

impl Sells {
    pub fn new(
        branch: impl Into<String>,
        product_code: ProductCode,
        price: f64,
        stock: i64,
    ) -> Self {
        Self {
            branch: branch.into(),
            product_code,
            price,
            stock,
        }
    }

    pub fn key(&self) -> SellsKey {
        SellsKey::new(self.branch.clone(), self.product_code)
    }
}

impl Record for Sells {
    fn validate(&self) -> Result<(), ValidationError> {
        require_branch_name("sucursal", &self.branch)?;
        require_positive_key("codigoProducto", self.product_code)?;
        require_price(self.price)?;
        require_stock(self.stock)?;
        Ok(())
    }
}

/// Partial update for the relationship attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SellsChanges {
    #[serde(rename = "precio", skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
}

impl SellsChanges {
    pub fn all(price: f64, stock: i64) -> Self {
        Self {
            price: Some(price),
            stock: Some(stock),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.price.is_none() && self.stock.is_none()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.is_empty() {
            return Err(ValidationError::EmptyChanges);
        }
        if let Some(value) = self.price {
            require_price(value)?;
        }
        if let Some(value) = self.stock {
            require_stock(value)?;
        }
        Ok(())
    }
}

fn require_price(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::InvalidPrice(value));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Sells, SellsChanges};
    use crate::model::{Record, ValidationError};

    #[test]
    fn serializes_with_collection_field_names() {
        let sells = Sells::new("Centro", 101, 9.5, 20);
        let json = serde_json::to_value(&sells).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "sucursal": "Centro",
                "codigoProducto": 101,
                "precio": 9.5,
                "stock": 20
            })
        );
    }

    #[test]
    fn price_must_be_positive_and_finite() {
        for price in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let sells = Sells::new("Centro", 101, price, 1);
            assert!(matches!(
                sells.validate(),
                Err(ValidationError::InvalidPrice(_))
            ));
        }
    }

    #[test]
    fn padded_branch_is_rejected() {
        let sells = Sells::new("Centro ", 101, 9.5, 2);
        assert_eq!(
            sells.validate(),
            Err(ValidationError::PaddedName {
                field: "sucursal",
                value: "Centro ".to_string(),
            })
        );
    }

    #[test]
    fn changes_validate_present_fields_only() {
        let stock_only = SellsChanges {
            stock: Some(3),
            ..SellsChanges::default()
        };
        assert!(stock_only.validate().is_ok());
        assert_eq!(
            SellsChanges::all(-2.0, 3).validate(),
            Err(ValidationError::InvalidPrice(-2.0))
        );
    }
}
