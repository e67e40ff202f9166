//! Binding between record types and their collections.

use crate::model::branch::Branch;
use crate::model::employee::{Employee, NationalId};
use crate::model::product::{Product, ProductCode};
use crate::model::sells::{Sells, SellsKey};
use crate::model::{NaturalKey, Record};
use rusqlite::types::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A record type persisted as JSON documents in one named collection.
pub trait Collection: Record + Serialize + DeserializeOwned {
    /// Natural key type.
    type Key: Clone;

    /// Collection (table) name.
    const NAME: &'static str;

    /// Document fields forming the natural key, in unique-index order.
    const KEY_FIELDS: &'static [&'static str];

    fn key(&self) -> Self::Key;

    /// SQL values for `KEY_FIELDS`, in the same order.
    fn key_values(key: &Self::Key) -> Vec<Value>;

    fn natural_key(key: &Self::Key) -> NaturalKey;
}

impl Collection for Employee {
    type Key = NationalId;
    const NAME: &'static str = "empleados";
    const KEY_FIELDS: &'static [&'static str] = &["dni"];

    fn key(&self) -> Self::Key {
        self.national_id
    }

    fn key_values(key: &Self::Key) -> Vec<Value> {
        vec![Value::Integer(*key)]
    }

    fn natural_key(key: &Self::Key) -> NaturalKey {
        NaturalKey::Employee(*key)
    }
}

impl Collection for Product {
    type Key = ProductCode;
    const NAME: &'static str = "productos";
    const KEY_FIELDS: &'static [&'static str] = &["codigo"];

    fn key(&self) -> Self::Key {
        self.code
    }

    fn key_values(key: &Self::Key) -> Vec<Value> {
        vec![Value::Integer(*key)]
    }

    fn natural_key(key: &Self::Key) -> NaturalKey {
        NaturalKey::Product(*key)
    }
}

impl Collection for Branch {
    type Key = String;
    const NAME: &'static str = "sucursales";
    const KEY_FIELDS: &'static [&'static str] = &["nombre"];

    fn key(&self) -> Self::Key {
        self.name.clone()
    }

    fn key_values(key: &Self::Key) -> Vec<Value> {
        vec![Value::Text(key.clone())]
    }

    fn natural_key(key: &Self::Key) -> NaturalKey {
        NaturalKey::Branch(key.clone())
    }
}

impl Collection for Sells {
    type Key = SellsKey;
    const NAME: &'static str = "vende";
    const KEY_FIELDS: &'static [&'static str] = &["sucursal", "codigoProducto"];

    fn key(&self) -> Self::Key {
        Sells::key(self)
    }

    fn key_values(key: &Self::Key) -> Vec<Value> {
        vec![
            Value::Text(key.branch.clone()),
            Value::Integer(key.product_code),
        ]
    }

    fn natural_key(key: &Self::Key) -> NaturalKey {
        NaturalKey::Sells(key.clone())
    }
}
