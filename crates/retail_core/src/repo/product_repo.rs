//! Product repository.

use crate::model::product::{Product, ProductChanges, ProductCode};
use crate::model::{NaturalKey, Record};
use crate::query::{KeyShape, Selector};
use crate::repo::existence::ExistenceChecker;
use crate::repo::{
    begin_write, commit, delete_record, insert_record, log_key, numeric_key, query_records,
    rejected, storage_failure, update_record, EntityRepository, QueryOutcome, RepoError,
    RepoResult, WriteOutcome,
};
use crate::store::document_store::ensure_collection_ready;
use crate::store::Collection;
use log::info;
use rusqlite::Connection;

/// Product repository over the `productos` collection.
///
/// Deleting a product does not touch sells relations naming it.
pub struct ProductRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> ProductRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_collection_ready(conn, Product::NAME)?;
        Ok(Self { conn })
    }
}

impl EntityRepository for ProductRepository<'_> {
    type Record = Product;
    type Key = ProductCode;
    type Changes = ProductChanges;

    const KEY_SHAPE: KeyShape = KeyShape::Numeric;

    fn alta(&self, product: &Product) -> RepoResult<()> {
        const OP: &str = "product_alta";
        let key = NaturalKey::Product(product.code);
        product.validate().map_err(|err| rejected(OP, &key, err.into()))?;

        let tx = begin_write(self.conn, OP, &key)?;
        if ExistenceChecker::attach(&tx)
            .probe_product(product.code)
            .map_err(|err| storage_failure(OP, &key, err))?
        {
            return Err(rejected(OP, &key, RepoError::DuplicateKey(key.clone())));
        }

        insert_record(&tx, OP, product)?;
        commit(tx, OP, &key)?;
        info!("event={OP} module=repo status=ok key={}", log_key(&key));
        Ok(())
    }

    fn baja(&self, code: &ProductCode) -> RepoResult<WriteOutcome> {
        delete_record::<Product>(self.conn, "product_baja", code)
    }

    fn modificacion(
        &self,
        code: &ProductCode,
        changes: &ProductChanges,
    ) -> RepoResult<WriteOutcome> {
        const OP: &str = "product_modificacion";
        changes
            .validate()
            .map_err(|err| rejected(OP, &NaturalKey::Product(*code), err.into()))?;
        update_record::<Product, _>(self.conn, OP, code, changes)
    }

    fn consulta(&self, selector: &Selector) -> RepoResult<QueryOutcome<Product>> {
        let code = numeric_key(selector)?;
        query_records::<Product>(self.conn, "product_consulta", code.as_ref())
    }
}
