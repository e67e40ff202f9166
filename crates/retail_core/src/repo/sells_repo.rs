//! Sells relation manager.
//!
//! # Responsibility
//! - Own the `vende` collection linking branches and products.
//! - Validate both endpoints at creation; read, never write, the endpoint
//!   collections.
//!
//! # Invariants
//! - Creation gates run in fixed order: branch exists, product exists, pair
//!   absent. The first failing gate is the one reported.
//! - Modification only requires the relation itself to exist; endpoints may
//!   have gone stale since creation.
//! - Relation queries dispatch on the selector: all, by product code, or by
//!   branch name.

use crate::model::branch::Branch;
use crate::model::product::Product;
use crate::model::sells::{Sells, SellsChanges, SellsKey};
use crate::model::{NaturalKey, Record};
use crate::query::{KeyShape, Selector};
use crate::repo::existence::ExistenceChecker;
use crate::repo::{
    begin_write, commit, delete_record, insert_record, log_key, query_records, rejected,
    storage_failure, update_record, EntityRepository, Miss, QueryOutcome, Reference, RepoError,
    RepoResult, WriteOutcome,
};
use crate::store::document_store::ensure_collection_ready;
use crate::store::{Collection, DocumentStore, StoreError};
use log::{debug, info, warn};
use rusqlite::types::Value;
use rusqlite::Connection;

const FIELD_BRANCH: &str = "sucursal";
const FIELD_PRODUCT_CODE: &str = "codigoProducto";

/// Relation manager over the `vende` collection.
pub struct SellsRelationManager<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SellsRelationManager<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        for collection in [Sells::NAME, Branch::NAME, Product::NAME] {
            ensure_collection_ready(conn, collection)?;
        }
        Ok(Self { conn })
    }

    fn query_by_field(
        &self,
        field: &'static str,
        value: Value,
    ) -> Result<Vec<Sells>, StoreError> {
        let documents = DocumentStore::<Sells>::attach(self.conn).find_by_field(field, value)?;
        Ok(documents
            .into_iter()
            .map(|document| document.record)
            .collect())
    }
}

impl EntityRepository for SellsRelationManager<'_> {
    type Record = Sells;
    type Key = SellsKey;
    type Changes = SellsChanges;

    const KEY_SHAPE: KeyShape = KeyShape::NumericOrText;

    fn alta(&self, sells: &Sells) -> RepoResult<()> {
        const OP: &str = "sells_alta";
        let key = NaturalKey::Sells(sells.key());
        sells.validate().map_err(|err| rejected(OP, &key, err.into()))?;

        let tx = begin_write(self.conn, OP, &key)?;
        let checker = ExistenceChecker::attach(&tx);

        if !checker
            .probe_branch(&sells.branch)
            .map_err(|err| storage_failure(OP, &key, err))?
        {
            return Err(rejected(
                OP,
                &key,
                RepoError::MissingReference(Reference::Branch(sells.branch.clone())),
            ));
        }
        if !checker
            .probe_product(sells.product_code)
            .map_err(|err| storage_failure(OP, &key, err))?
        {
            return Err(rejected(
                OP,
                &key,
                RepoError::MissingReference(Reference::Product(sells.product_code)),
            ));
        }
        if checker
            .probe_relation(&sells.key())
            .map_err(|err| storage_failure(OP, &key, err))?
        {
            return Err(rejected(OP, &key, RepoError::DuplicateKey(key.clone())));
        }

        insert_record(&tx, OP, sells)?;
        commit(tx, OP, &key)?;
        info!(
            "event={OP} module=repo status=ok key={} precio={} stock={}",
            log_key(&key),
            sells.price,
            sells.stock
        );
        Ok(())
    }

    fn baja(&self, key: &SellsKey) -> RepoResult<WriteOutcome> {
        delete_record::<Sells>(self.conn, "sells_baja", key)
    }

    fn modificacion(&self, key: &SellsKey, changes: &SellsChanges) -> RepoResult<WriteOutcome> {
        const OP: &str = "sells_modificacion";
        let natural_key = NaturalKey::Sells(key.clone());
        changes
            .validate()
            .map_err(|err| rejected(OP, &natural_key, err.into()))?;

        let tx = begin_write(self.conn, OP, &natural_key)?;
        if !ExistenceChecker::attach(&tx)
            .probe_relation(key)
            .map_err(|err| storage_failure(OP, &natural_key, err))?
        {
            warn!(
                "event={OP} module=repo status=not_found key={}",
                log_key(&natural_key)
            );
            return Ok(WriteOutcome::NotFound(natural_key));
        }

        let outcome = update_record::<Sells, _>(&tx, OP, key, changes)?;
        commit(tx, OP, &natural_key)?;
        Ok(outcome)
    }

    fn consulta(&self, selector: &Selector) -> RepoResult<QueryOutcome<Sells>> {
        const OP: &str = "sells_consulta";
        match selector {
            Selector::AllRecords => query_records::<Sells>(self.conn, OP, None),
            Selector::ByNumericKey(code) => {
                let relations = self
                    .query_by_field(FIELD_PRODUCT_CODE, Value::Integer(*code))
                    .map_err(|err| storage_failure(OP, &NaturalKey::Product(*code), err))?;
                debug!(
                    "event={OP} module=repo status=ok codigoProducto={code} matched={}",
                    relations.len()
                );
                if relations.is_empty() {
                    return Ok(QueryOutcome::NotFound(Miss::ProductNotSold(*code)));
                }
                Ok(QueryOutcome::Found(relations))
            }
            Selector::ByTextKey(branch) => {
                let branch_key = NaturalKey::Branch(branch.clone());
                let relations = self
                    .query_by_field(FIELD_BRANCH, Value::Text(branch.clone()))
                    .map_err(|err| storage_failure(OP, &branch_key, err))?;
                debug!(
                    "event={OP} module=repo status=ok key={} matched={}",
                    log_key(&branch_key),
                    relations.len()
                );
                if !relations.is_empty() {
                    return Ok(QueryOutcome::Found(relations));
                }

                let branch_exists = ExistenceChecker::attach(self.conn)
                    .probe_branch(branch)
                    .map_err(|err| storage_failure(OP, &branch_key, err))?;
                if branch_exists {
                    Ok(QueryOutcome::NotFound(Miss::BranchSellsNothing(branch.clone())))
                } else {
                    Ok(QueryOutcome::NotFound(Miss::UnknownBranch(branch.clone())))
                }
            }
        }
    }
}
