//! Employee repository.
//!
//! # Invariants
//! - `dni` is unique across `empleados`.
//! - `sucursal` must name an existing branch whenever it is written.
//! - Deleting a branch later leaves employees pointing at it untouched.

use crate::model::branch::Branch;
use crate::model::employee::{Employee, EmployeeChanges, NationalId};
use crate::model::{NaturalKey, Record};
use crate::query::{KeyShape, Selector};
use crate::repo::existence::ExistenceChecker;
use crate::repo::{
    begin_write, commit, delete_record, insert_record, log_key, numeric_key, query_records,
    rejected, storage_failure, update_record, EntityRepository, QueryOutcome, Reference,
    RepoError, RepoResult, WriteOutcome,
};
use crate::store::document_store::ensure_collection_ready;
use crate::store::{Collection, DocumentStore};
use log::{info, warn};
use rusqlite::Connection;

/// Employee repository over the `empleados` collection.
pub struct EmployeeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> EmployeeRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_collection_ready(conn, Employee::NAME)?;
        ensure_collection_ready(conn, Branch::NAME)?;
        Ok(Self { conn })
    }
}

impl EntityRepository for EmployeeRepository<'_> {
    type Record = Employee;
    type Key = NationalId;
    type Changes = EmployeeChanges;

    const KEY_SHAPE: KeyShape = KeyShape::Numeric;

    fn alta(&self, employee: &Employee) -> RepoResult<()> {
        const OP: &str = "employee_alta";
        let key = NaturalKey::Employee(employee.national_id);
        employee.validate().map_err(|err| rejected(OP, &key, err.into()))?;

        let tx = begin_write(self.conn, OP, &key)?;
        let checker = ExistenceChecker::attach(&tx);

        if checker
            .probe_employee(employee.national_id)
            .map_err(|err| storage_failure(OP, &key, err))?
        {
            return Err(rejected(OP, &key, RepoError::DuplicateKey(key.clone())));
        }
        if !checker
            .probe_branch(&employee.branch)
            .map_err(|err| storage_failure(OP, &key, err))?
        {
            return Err(rejected(
                OP,
                &key,
                RepoError::MissingReference(Reference::Branch(employee.branch.clone())),
            ));
        }

        insert_record(&tx, OP, employee)?;
        commit(tx, OP, &key)?;
        info!("event={OP} module=repo status=ok key={}", log_key(&key));
        Ok(())
    }

    fn baja(&self, national_id: &NationalId) -> RepoResult<WriteOutcome> {
        delete_record::<Employee>(self.conn, "employee_baja", national_id)
    }

    fn modificacion(
        &self,
        national_id: &NationalId,
        changes: &EmployeeChanges,
    ) -> RepoResult<WriteOutcome> {
        const OP: &str = "employee_modificacion";
        let key = NaturalKey::Employee(*national_id);
        changes.validate().map_err(|err| rejected(OP, &key, err.into()))?;

        let tx = begin_write(self.conn, OP, &key)?;
        let current = DocumentStore::<Employee>::attach(&tx)
            .find_by_key(national_id)
            .map_err(|err| storage_failure(OP, &key, err))?;
        let Some(current) = current else {
            warn!("event={OP} module=repo status=not_found key={}", log_key(&key));
            return Ok(WriteOutcome::NotFound(key));
        };

        if let Some(branch) = changes.branch.as_deref() {
            if branch != current.record.branch
                && !ExistenceChecker::attach(&tx)
                    .probe_branch(branch)
                    .map_err(|err| storage_failure(OP, &key, err))?
            {
                return Err(rejected(
                    OP,
                    &key,
                    RepoError::MissingReference(Reference::Branch(branch.to_string())),
                ));
            }
        }

        let outcome = update_record::<Employee, _>(&tx, OP, national_id, changes)?;
        commit(tx, OP, &key)?;
        Ok(outcome)
    }

    fn consulta(&self, selector: &Selector) -> RepoResult<QueryOutcome<Employee>> {
        let national_id = numeric_key(selector)?;
        query_records::<Employee>(self.conn, "employee_consulta", national_id.as_ref())
    }
}
