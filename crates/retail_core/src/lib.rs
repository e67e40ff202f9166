//! Consistency layer for the retail record store.
//!
//! Employees, products, branches and the branch-sells-product relation live
//! in schema-less document collections. This crate owns the business rules
//! the store cannot enforce by itself: natural-key uniqueness and write-time
//! referential soundness.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod query;
pub mod repo;
pub mod store;

pub use config::{ConfigError, CoreConfig, StoreConfig, StoreLocation};
pub use db::{open_db, open_db_in_memory, open_db_with, DbError, DbResult};
pub use logging::{
    default_log_level, init_logging, init_logging_from, logging_status, LogSettings, LoggingError,
};
pub use model::branch::{Branch, BranchChanges};
pub use model::employee::{Employee, EmployeeChanges, NationalId};
pub use model::product::{Product, ProductChanges, ProductCode};
pub use model::sells::{Sells, SellsChanges, SellsKey};
pub use model::{NaturalKey, Record, ValidationError};
pub use query::{KeyShape, Selector, SelectorError, ALL_RECORDS_SENTINEL};
pub use repo::branch_repo::BranchRepository;
pub use repo::employee_repo::EmployeeRepository;
pub use repo::existence::ExistenceChecker;
pub use repo::product_repo::ProductRepository;
pub use repo::sells_repo::SellsRelationManager;
pub use repo::{
    EntityRepository, ErrorKind, Miss, QueryOutcome, Reference, RepoError, RepoResult,
    WriteOutcome,
};
pub use store::{Collection, DocumentId, DocumentStore, StoreError, StoreResult, StoredDocument};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
