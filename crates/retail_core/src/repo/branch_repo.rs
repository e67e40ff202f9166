//! Branch repository.
//!
//! Branches are the target of soft references from employees and sells
//! relations. Deletion does not cascade to, or check, those references.

use crate::model::branch::{Branch, BranchChanges};
use crate::model::{NaturalKey, Record};
use crate::query::{KeyShape, Selector};
use crate::repo::existence::ExistenceChecker;
use crate::repo::{
    begin_write, commit, delete_record, insert_record, log_key, query_records, rejected,
    storage_failure, update_record, EntityRepository, QueryOutcome, RepoError, RepoResult,
    WriteOutcome,
};
use crate::store::document_store::ensure_collection_ready;
use crate::store::Collection;
use log::info;
use rusqlite::Connection;

/// Branch repository over the `sucursales` collection.
pub struct BranchRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> BranchRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_collection_ready(conn, Branch::NAME)?;
        Ok(Self { conn })
    }
}

impl EntityRepository for BranchRepository<'_> {
    type Record = Branch;
    type Key = String;
    type Changes = BranchChanges;

    const KEY_SHAPE: KeyShape = KeyShape::Text;

    fn alta(&self, branch: &Branch) -> RepoResult<()> {
        const OP: &str = "branch_alta";
        let key = NaturalKey::Branch(branch.name.clone());
        branch.validate().map_err(|err| rejected(OP, &key, err.into()))?;

        let tx = begin_write(self.conn, OP, &key)?;
        if ExistenceChecker::attach(&tx)
            .probe_branch(&branch.name)
            .map_err(|err| storage_failure(OP, &key, err))?
        {
            return Err(rejected(OP, &key, RepoError::DuplicateKey(key.clone())));
        }

        insert_record(&tx, OP, branch)?;
        commit(tx, OP, &key)?;
        info!("event={OP} module=repo status=ok key={}", log_key(&key));
        Ok(())
    }

    fn baja(&self, name: &String) -> RepoResult<WriteOutcome> {
        delete_record::<Branch>(self.conn, "branch_baja", name)
    }

    fn modificacion(&self, name: &String, changes: &BranchChanges) -> RepoResult<WriteOutcome> {
        const OP: &str = "branch_modificacion";
        changes
            .validate()
            .map_err(|err| rejected(OP, &NaturalKey::Branch(name.clone()), err.into()))?;
        update_record::<Branch, _>(self.conn, OP, name, changes)
    }

    fn consulta(&self, selector: &Selector) -> RepoResult<QueryOutcome<Branch>> {
        let name = match selector {
            Selector::AllRecords => None,
            Selector::ByTextKey(name) => Some(name.clone()),
            Selector::ByNumericKey(value) => Some(value.to_string()),
        };
        query_records::<Branch>(self.conn, "branch_consulta", name.as_ref())
    }
}
