//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the EntityStore trait.
//! Documents are kept as JSON text; the region tag is lifted into its own
//! column so resume and statistics queries can filter on it.

use crate::remote::Region;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{EntityStore, StoreError, StoreResult};
use crate::storage::{EntityKind, FailureRecord, StoreOutcome};
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde_json::Value;
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens or creates the database at `path`
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StoreError::Unavailable)` - The file cannot be opened
    pub fn new(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

/// Reads the `extractions.region` tag of a document
fn region_tag(doc: &Value) -> Option<&str> {
    doc.get("extractions")
        .and_then(|e| e.get("region"))
        .and_then(Value::as_str)
}

fn is_constraint_violation(e: &rusqlite::Error) -> bool {
    e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation)
}

impl EntityStore for SqliteStore {
    // ===== Documents =====

    fn store(
        &mut self,
        id: &str,
        kind: EntityKind,
        doc: &Value,
        upsert: bool,
    ) -> StoreResult<StoreOutcome> {
        let body = serde_json::to_string(doc)?;
        let region = region_tag(doc);
        let now = Utc::now().to_rfc3339();

        if upsert {
            let existed = self.exists(id, kind)?;
            self.conn.execute(
                &format!(
                    "INSERT OR REPLACE INTO {} (id, region, body, stored_at) VALUES (?1, ?2, ?3, ?4)",
                    kind.table()
                ),
                params![id, region, body, now],
            )?;
            return Ok(if existed {
                StoreOutcome::Replaced
            } else {
                StoreOutcome::Inserted
            });
        }

        let result = self.conn.execute(
            &format!(
                "INSERT INTO {} (id, region, body, stored_at) VALUES (?1, ?2, ?3, ?4)",
                kind.table()
            ),
            params![id, region, body, now],
        );

        match result {
            Ok(_) => Ok(StoreOutcome::Inserted),
            Err(e) if is_constraint_violation(&e) => {
                tracing::warn!("Duplicate: {} with id {} already stored", kind, id);
                Ok(StoreOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, id: &str, kind: EntityKind) -> StoreResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE id = ?1", kind.table()),
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn load(&self, id: &str, kind: EntityKind) -> StoreResult<Option<Value>> {
        let body: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT body FROM {} WHERE id = ?1", kind.table()),
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(text) => Ok(Some(serde_json::from_str(&text)?)),
            None => Ok(None),
        }
    }

    fn recent_keys(
        &self,
        kind: EntityKind,
        region: Option<Region>,
        limit: usize,
    ) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id FROM {} WHERE (?1 IS NULL OR region = ?1) ORDER BY rowid DESC LIMIT ?2",
            kind.table()
        ))?;

        let keys = stmt
            .query_map(
                params![region.map(|r| r.as_str()), limit as i64],
                |row| row.get(0),
            )?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(keys)
    }

    // ===== Failure Ledger =====

    fn record_failure(&mut self, id: &str, error: &str, permanent: bool) -> StoreResult<FailureRecord> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO failed_matches (id, attempts, permanent, last_error, last_attempt_at)
             VALUES (?1, 1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                attempts = attempts + 1,
                permanent = MAX(permanent, excluded.permanent),
                last_error = excluded.last_error,
                last_attempt_at = excluded.last_attempt_at",
            params![id, permanent as i64, error, now],
        )?;

        self.failure(id)?
            .ok_or_else(|| StoreError::Unavailable(format!("Failure record for {} vanished", id)))
    }

    fn failure(&self, id: &str) -> StoreResult<Option<FailureRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT id, attempts, permanent, last_error, last_attempt_at
                 FROM failed_matches WHERE id = ?1",
                params![id],
                |row| {
                    Ok(FailureRecord {
                        id: row.get(0)?,
                        attempts: row.get(1)?,
                        permanent: row.get::<_, i64>(2)? != 0,
                        last_error: row.get(3)?,
                        last_attempt_at: row.get(4)?,
                    })
                },
            )
            .optional()?;

        Ok(record)
    }

    fn clear_failure(&mut self, id: &str) -> StoreResult<()> {
        self.conn
            .execute("DELETE FROM failed_matches WHERE id = ?1", params![id])?;
        Ok(())
    }

    // ===== Statistics =====

    fn count(&self, kind: EntityKind) -> StoreResult<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", kind.table()),
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn count_by_region(&self, kind: EntityKind) -> StoreResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT COALESCE(region, 'unknown') AS r, COUNT(*) AS c
             FROM {} GROUP BY r ORDER BY c DESC, r ASC",
            kind.table()
        ))?;

        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get::<_, i64>(1)? as u64)))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    fn count_failures(&self) -> StoreResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM failed_matches", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
