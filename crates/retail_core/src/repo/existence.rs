//! Read-only existence lookups across collections.
//!
//! # Responsibility
//! - Answer "does this natural key currently exist?" for cross-collection
//!   validation.
//!
//! # Invariants
//! - Never writes.
//! - The boolean API reports a storage failure as `false` and logs it; the
//!   `probe_*` API propagates the failure instead.

use crate::model::branch::Branch;
use crate::model::employee::{Employee, NationalId};
use crate::model::product::{Product, ProductCode};
use crate::model::sells::{Sells, SellsKey};
use crate::model::NaturalKey;
use crate::repo::log_key;
use crate::store::document_store::ensure_collection_ready;
use crate::store::{Collection, DocumentStore, StoreResult};
use log::error;
use rusqlite::Connection;

/// Existence checker bound to one connection (or open transaction).
pub struct ExistenceChecker<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ExistenceChecker<'conn> {
    /// Constructs a checker from a migrated connection holding every
    /// collection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        for collection in [Employee::NAME, Product::NAME, Branch::NAME, Sells::NAME] {
            ensure_collection_ready(conn, collection)?;
        }
        Ok(Self::attach(conn))
    }

    pub(crate) fn attach(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn branch_exists(&self, name: &str) -> bool {
        collapse(
            &NaturalKey::Branch(name.to_string()),
            self.probe_branch(name),
        )
    }

    pub fn product_exists(&self, code: ProductCode) -> bool {
        collapse(&NaturalKey::Product(code), self.probe_product(code))
    }

    pub fn employee_exists(&self, national_id: NationalId) -> bool {
        collapse(
            &NaturalKey::Employee(national_id),
            self.probe_employee(national_id),
        )
    }

    pub fn relation_exists(&self, branch: &str, product_code: ProductCode) -> bool {
        let key = SellsKey::new(branch, product_code);
        let probed = self.probe_relation(&key);
        collapse(&NaturalKey::Sells(key), probed)
    }

    pub fn probe_branch(&self, name: &str) -> StoreResult<bool> {
        self.probe::<Branch>(&name.to_string())
    }

    pub fn probe_product(&self, code: ProductCode) -> StoreResult<bool> {
        self.probe::<Product>(&code)
    }

    pub fn probe_employee(&self, national_id: NationalId) -> StoreResult<bool> {
        self.probe::<Employee>(&national_id)
    }

    pub fn probe_relation(&self, key: &SellsKey) -> StoreResult<bool> {
        self.probe::<Sells>(key)
    }

    fn probe<C: Collection>(&self, key: &C::Key) -> StoreResult<bool> {
        let found = DocumentStore::<C>::attach(self.conn).find_by_key(key)?;
        Ok(found.is_some())
    }
}

fn collapse(key: &NaturalKey, probed: StoreResult<bool>) -> bool {
    match probed {
        Ok(exists) => exists,
        Err(err) => {
            error!(
                "event=exists_check module=repo status=error key={} error={}",
                log_key(key),
                err
            );
            false
        }
    }
}
