//! SQLite-backed document collection accessor.
//!
//! Each collection is a table of `(id, body)` rows where `body` is the JSON
//! document. Natural-key lookups go through `json_extract` expressions that
//! match the unique indexes created by the migrations.

use super::{Collection, DocumentId, StoreError, StoreResult};
use crate::db::migrations::{current_user_version, latest_version};
use rusqlite::types::Value;
use rusqlite::{ffi, params_from_iter, Connection, ErrorCode, Row};
use serde::Serialize;
use std::marker::PhantomData;
use uuid::Uuid;

/// One persisted record together with its store-assigned id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument<C> {
    pub id: DocumentId,
    pub record: C,
}

/// Record store for the collection bound to `C`.
pub struct DocumentStore<'conn, C> {
    conn: &'conn Connection,
    _collection: PhantomData<C>,
}

impl<'conn, C: Collection> DocumentStore<'conn, C> {
    /// Constructs a store from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        ensure_collection_ready(conn, C::NAME)?;
        Ok(Self::attach(conn))
    }

    /// Binds to a connection already checked by a repository constructor.
    pub(crate) fn attach(conn: &'conn Connection) -> Self {
        Self {
            conn,
            _collection: PhantomData,
        }
    }

    /// Inserts one document and returns its new id.
    pub fn insert(&self, record: &C) -> StoreResult<DocumentId> {
        let id = Uuid::new_v4();
        let body = serde_json::to_string(record)?;
        let sql = format!("INSERT INTO {} (id, body) VALUES (?1, ?2);", C::NAME);

        match self.conn.execute(&sql, [id.to_string(), body]) {
            Ok(_) => Ok(id),
            Err(err) if is_unique_violation(&err) => Err(StoreError::UniqueViolation {
                collection: C::NAME,
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Deletes the document matching `key`. Returns the affected-row count.
    pub fn delete_by_key(&self, key: &C::Key) -> StoreResult<usize> {
        let sql = format!(
            "DELETE FROM {} WHERE {};",
            C::NAME,
            key_predicate(C::KEY_FIELDS, 1)
        );
        let changed = self
            .conn
            .execute(&sql, params_from_iter(C::key_values(key)))?;
        Ok(changed)
    }

    /// Merges `fields` into the document matching `key`.
    ///
    /// `fields` must serialize to a JSON object; it is applied as a merge
    /// patch, so absent members keep their stored value.
    pub fn update_by_key<F: Serialize>(&self, key: &C::Key, fields: &F) -> StoreResult<usize> {
        let patch = serde_json::to_value(fields)?;
        if !patch.is_object() {
            return Err(StoreError::InvalidDocument {
                collection: C::NAME,
                message: format!("update fields must be a JSON object, got `{patch}`"),
            });
        }

        let sql = format!(
            "UPDATE {} SET body = json_patch(body, ?1) WHERE {};",
            C::NAME,
            key_predicate(C::KEY_FIELDS, 2)
        );
        let mut bind_values = vec![Value::Text(patch.to_string())];
        bind_values.extend(C::key_values(key));

        match self.conn.execute(&sql, params_from_iter(bind_values)) {
            Ok(changed) => Ok(changed),
            Err(err) if is_unique_violation(&err) => Err(StoreError::UniqueViolation {
                collection: C::NAME,
            }),
            Err(err) => Err(err.into()),
        }
    }

    /// Loads the document matching `key`, if any.
    pub fn find_by_key(&self, key: &C::Key) -> StoreResult<Option<StoredDocument<C>>> {
        let sql = format!(
            "SELECT id, body FROM {} WHERE {};",
            C::NAME,
            key_predicate(C::KEY_FIELDS, 1)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(C::key_values(key)))?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_document_row(row)?));
        }
        Ok(None)
    }

    /// Lists every document in insertion order.
    pub fn find_all(&self) -> StoreResult<Vec<StoredDocument<C>>> {
        let sql = format!("SELECT id, body FROM {} ORDER BY rowid ASC;", C::NAME);
        self.collect_rows(&sql, Vec::new())
    }

    /// Lists documents whose top-level `field` equals `value`, in insertion
    /// order.
    pub fn find_by_field(
        &self,
        field: &'static str,
        value: Value,
    ) -> StoreResult<Vec<StoredDocument<C>>> {
        let sql = format!(
            "SELECT id, body FROM {} WHERE {} ORDER BY rowid ASC;",
            C::NAME,
            key_predicate(&[field], 1)
        );
        self.collect_rows(&sql, vec![value])
    }

    /// Number of documents in the collection.
    pub fn count(&self) -> StoreResult<u64> {
        let sql = format!("SELECT COUNT(*) FROM {};", C::NAME);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn collect_rows(
        &self,
        sql: &str,
        bind_values: Vec<Value>,
    ) -> StoreResult<Vec<StoredDocument<C>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }
        Ok(documents)
    }
}

/// Verifies `conn` is migrated and holds the `collection` table.
pub(crate) fn ensure_collection_ready(
    conn: &Connection,
    collection: &'static str,
) -> StoreResult<()> {
    let expected_version = latest_version();
    let actual_version = current_user_version(conn)?;
    if actual_version != expected_version {
        return Err(StoreError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [collection],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(StoreError::MissingCollection(collection));
    }

    Ok(())
}

fn key_predicate(fields: &[&str], first_param: usize) -> String {
    fields
        .iter()
        .enumerate()
        .map(|(offset, field)| {
            format!(
                "json_extract(body, '$.{field}') = ?{}",
                first_param + offset
            )
        })
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn parse_document_row<C: Collection>(row: &Row<'_>) -> StoreResult<StoredDocument<C>> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| StoreError::InvalidDocument {
        collection: C::NAME,
        message: format!("invalid document id `{id_text}`"),
    })?;

    let body: String = row.get("body")?;
    let record: C = serde_json::from_str(&body).map_err(|err| StoreError::InvalidDocument {
        collection: C::NAME,
        message: format!("document {id} does not decode: {err}"),
    })?;
    record
        .validate()
        .map_err(|err| StoreError::InvalidDocument {
            collection: C::NAME,
            message: format!("document {id} fails validation: {err}"),
        })?;

    Ok(StoredDocument { id, record })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(inner, _)
            if inner.code == ErrorCode::ConstraintViolation
                && inner.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
