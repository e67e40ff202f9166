//! Entity repositories, the sells relation manager and existence checks.
//!
//! # Responsibility
//! - Enforce natural-key uniqueness and write-time referential soundness on
//!   top of the mechanical record store.
//! - Report structured outcomes: applied, not found, rejected, or failed.
//!
//! # Invariants
//! - Every mutation runs in one immediate (write-locked) transaction; a
//!   failing gate rolls it back, so no call partially applies.
//! - Gate order is fixed per operation (duplicate before reference for
//!   entities; branch, product, pair for relations).
//! - "Not found" is an outcome, never an error.
//! - Only [`RepoError::Storage`] is retryable.

use crate::model::product::ProductCode;
use crate::model::{NaturalKey, ValidationError};
use crate::query::{KeyShape, Selector, SelectorError};
use crate::store::{Collection, DocumentStore, StoreError};
use log::{debug, error, info, warn};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod branch_repo;
pub mod employee_repo;
pub mod existence;
pub mod product_repo;
pub mod sells_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Soft reference that must resolve at write time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    Branch(String),
    Product(ProductCode),
}

impl Display for Reference {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Branch(name) => write!(f, "branch `{name}` does not exist"),
            Self::Product(code) => write!(f, "product with code {code} does not exist"),
        }
    }
}

/// Error categories exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DuplicateKey,
    ReferentialIntegrity,
    InvalidInput,
    Storage,
}

/// Rejection or failure of a repository operation.
#[derive(Debug)]
pub enum RepoError {
    /// Natural or compound key already present.
    DuplicateKey(NaturalKey),
    /// Referenced branch or product is absent.
    MissingReference(Reference),
    /// Record or change set breaks a field rule.
    Validation(ValidationError),
    /// Query argument does not fit the collection's key shape.
    InvalidSelector(SelectorError),
    /// Underlying collection access failed.
    Storage(StoreError),
}

impl RepoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateKey(_) => ErrorKind::DuplicateKey,
            Self::MissingReference(_) => ErrorKind::ReferentialIntegrity,
            Self::Validation(_) | Self::InvalidSelector(_) => ErrorKind::InvalidInput,
            Self::Storage(_) => ErrorKind::Storage,
        }
    }

    /// Storage failures may be transient; every other rejection is final.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Storage
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateKey(key) => write!(f, "{key} already exists"),
            Self::MissingReference(reference) => write!(f, "{reference}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::InvalidSelector(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::InvalidSelector(err) => Some(err),
            Self::Storage(err) => Some(err),
            Self::DuplicateKey(_) | Self::MissingReference(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<SelectorError> for RepoError {
    fn from(value: SelectorError) -> Self {
        Self::InvalidSelector(value)
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Storage(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value.into())
    }
}

/// Result of baja/modificacion.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    NotFound(NaturalKey),
}

impl WriteOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// Why a consulta produced no records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Miss {
    /// All-records query over an empty collection.
    EmptyCollection(&'static str),
    /// Key query with no matching record.
    NoMatch(NaturalKey),
    /// No branch sells the product.
    ProductNotSold(ProductCode),
    /// Branch exists but sells nothing.
    BranchSellsNothing(String),
    /// Branch named in a relation query does not exist.
    UnknownBranch(String),
}

impl Display for Miss {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCollection(name) => write!(f, "collection `{name}` is empty"),
            Self::NoMatch(key) => write!(f, "no record matches {key}"),
            Self::ProductNotSold(code) => {
                write!(f, "product {code} is not sold by any branch")
            }
            Self::BranchSellsNothing(name) => write!(f, "branch `{name}` sells no products"),
            Self::UnknownBranch(name) => write!(f, "branch `{name}` does not exist"),
        }
    }
}

/// Result of consulta.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome<T> {
    /// Non-empty match set in store order.
    Found(Vec<T>),
    NotFound(Miss),
}

impl<T> QueryOutcome<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Matching records; empty for a miss.
    pub fn records(&self) -> &[T] {
        match self {
            Self::Found(records) => records,
            Self::NotFound(_) => &[],
        }
    }

    pub fn into_records(self) -> Vec<T> {
        match self {
            Self::Found(records) => records,
            Self::NotFound(_) => Vec::new(),
        }
    }

    pub fn miss(&self) -> Option<&Miss> {
        match self {
            Self::Found(_) => None,
            Self::NotFound(miss) => Some(miss),
        }
    }
}

/// Shared verb set of every repository.
pub trait EntityRepository {
    type Record;
    type Key;
    type Changes;

    /// Key forms accepted by `consulta`.
    const KEY_SHAPE: KeyShape;

    fn alta(&self, record: &Self::Record) -> RepoResult<()>;
    fn baja(&self, key: &Self::Key) -> RepoResult<WriteOutcome>;
    fn modificacion(&self, key: &Self::Key, changes: &Self::Changes)
        -> RepoResult<WriteOutcome>;
    fn consulta(&self, selector: &Selector) -> RepoResult<QueryOutcome<Self::Record>>;

    /// Parses raw query text, then runs `consulta`.
    fn consulta_text(&self, input: &str) -> RepoResult<QueryOutcome<Self::Record>> {
        let selector = Selector::parse(input, Self::KEY_SHAPE)?;
        self.consulta(&selector)
    }
}

/// Renders a natural key as a single log token.
pub(crate) fn log_key(key: &NaturalKey) -> String {
    match key {
        NaturalKey::Employee(dni) => format!("dni:{dni}"),
        NaturalKey::Product(code) => format!("codigo:{code}"),
        NaturalKey::Branch(name) => format!("nombre:{}", name.replace(' ', "_")),
        NaturalKey::Sells(key) => format!(
            "sucursal:{},codigoProducto:{}",
            key.branch.replace(' ', "_"),
            key.product_code
        ),
    }
}

pub(crate) fn begin_write<'conn>(
    conn: &'conn Connection,
    operation: &'static str,
    key: &NaturalKey,
) -> RepoResult<Transaction<'conn>> {
    Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
        .map_err(|err| storage_failure(operation, key, err))
}

pub(crate) fn commit(
    tx: Transaction<'_>,
    operation: &'static str,
    key: &NaturalKey,
) -> RepoResult<()> {
    tx.commit()
        .map_err(|err| storage_failure(operation, key, err))
}

/// Logs a storage failure with operation context and wraps it.
pub(crate) fn storage_failure(
    operation: &'static str,
    key: &NaturalKey,
    err: impl Into<StoreError>,
) -> RepoError {
    let err = err.into();
    error!(
        "event={operation} module=repo status=error key={} error={}",
        log_key(key),
        err
    );
    RepoError::Storage(err)
}

pub(crate) fn rejected(operation: &'static str, key: &NaturalKey, err: RepoError) -> RepoError {
    warn!(
        "event={operation} module=repo status=rejected key={} reason={}",
        log_key(key),
        err
    );
    err
}

/// Inserts `record`, translating a unique-index hit into `DuplicateKey`.
pub(crate) fn insert_record<C: Collection>(
    conn: &Connection,
    operation: &'static str,
    record: &C,
) -> RepoResult<()> {
    let key = C::natural_key(&record.key());
    match DocumentStore::<C>::attach(conn).insert(record) {
        Ok(_) => Ok(()),
        Err(err) if err.is_unique_violation() => {
            Err(rejected(operation, &key, RepoError::DuplicateKey(key.clone())))
        }
        Err(err) => Err(storage_failure(operation, &key, err)),
    }
}

/// Deletes the record keyed by `key`; zero rows is a not-found outcome.
pub(crate) fn delete_record<C: Collection>(
    conn: &Connection,
    operation: &'static str,
    key: &C::Key,
) -> RepoResult<WriteOutcome> {
    let natural_key = C::natural_key(key);
    let deleted = DocumentStore::<C>::attach(conn)
        .delete_by_key(key)
        .map_err(|err| storage_failure(operation, &natural_key, err))?;

    if deleted == 0 {
        warn!(
            "event={operation} module=repo status=not_found key={}",
            log_key(&natural_key)
        );
        return Ok(WriteOutcome::NotFound(natural_key));
    }

    info!(
        "event={operation} module=repo status=ok key={} deleted={deleted}",
        log_key(&natural_key)
    );
    Ok(WriteOutcome::Applied)
}

/// Applies a merge patch to the record keyed by `key`.
pub(crate) fn update_record<C: Collection, F: serde::Serialize>(
    conn: &Connection,
    operation: &'static str,
    key: &C::Key,
    changes: &F,
) -> RepoResult<WriteOutcome> {
    let natural_key = C::natural_key(key);
    let updated = DocumentStore::<C>::attach(conn)
        .update_by_key(key, changes)
        .map_err(|err| storage_failure(operation, &natural_key, err))?;

    if updated == 0 {
        warn!(
            "event={operation} module=repo status=not_found key={}",
            log_key(&natural_key)
        );
        return Ok(WriteOutcome::NotFound(natural_key));
    }

    info!(
        "event={operation} module=repo status=ok key={}",
        log_key(&natural_key)
    );
    Ok(WriteOutcome::Applied)
}

/// Runs an all-records or by-key query against one collection.
pub(crate) fn query_records<C: Collection>(
    conn: &Connection,
    operation: &'static str,
    key: Option<&C::Key>,
) -> RepoResult<QueryOutcome<C>> {
    let store = DocumentStore::<C>::attach(conn);
    match key {
        None => {
            let records: Vec<C> = store
                .find_all()
                .map_err(|err| {
                    error!(
                        "event={operation} module=repo status=error collection={} error={}",
                        C::NAME,
                        err
                    );
                    RepoError::Storage(err)
                })?
                .into_iter()
                .map(|document| document.record)
                .collect();
            debug!(
                "event={operation} module=repo status=ok collection={} matched={}",
                C::NAME,
                records.len()
            );
            if records.is_empty() {
                return Ok(QueryOutcome::NotFound(Miss::EmptyCollection(C::NAME)));
            }
            Ok(QueryOutcome::Found(records))
        }
        Some(key) => {
            let natural_key = C::natural_key(key);
            let found = store
                .find_by_key(key)
                .map_err(|err| storage_failure(operation, &natural_key, err))?;
            match found {
                Some(document) => Ok(QueryOutcome::Found(vec![document.record])),
                None => {
                    warn!(
                        "event={operation} module=repo status=not_found key={}",
                        log_key(&natural_key)
                    );
                    Ok(QueryOutcome::NotFound(Miss::NoMatch(natural_key)))
                }
            }
        }
    }
}

/// Numeric-keyed collections accept only the sentinel or an integer.
pub(crate) fn numeric_key(selector: &Selector) -> RepoResult<Option<i64>> {
    match selector {
        Selector::AllRecords => Ok(None),
        Selector::ByNumericKey(value) => Ok(Some(*value)),
        Selector::ByTextKey(text) => Err(RepoError::InvalidSelector(SelectorError::NotNumeric(
            text.clone(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::{insert_record, ErrorKind, RepoError};
    use crate::db::open_db_in_memory;
    use crate::model::product::Product;
    use crate::model::sells::{Sells, SellsKey};
    use crate::model::NaturalKey;

    #[test]
    fn unique_index_hit_on_insert_maps_to_duplicate_key() {
        let conn = open_db_in_memory().unwrap();
        insert_record(&conn, "product_alta", &Product::new(101, "Yerba", 40)).unwrap();

        let err =
            insert_record(&conn, "product_alta", &Product::new(101, "Cafe", 3)).unwrap_err();
        assert!(matches!(err, RepoError::DuplicateKey(NaturalKey::Product(101))));
        assert!(!err.is_retryable());
    }

    #[test]
    fn compound_unique_index_hit_maps_to_duplicate_key() {
        let conn = open_db_in_memory().unwrap();
        insert_record(&conn, "sells_alta", &Sells::new("Centro", 101, 9.5, 2)).unwrap();

        let err = insert_record(&conn, "sells_alta", &Sells::new("Centro", 101, 7.0, 1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert!(matches!(
            err,
            RepoError::DuplicateKey(NaturalKey::Sells(ref key)) if *key == SellsKey::new("Centro", 101)
        ));
    }
}
