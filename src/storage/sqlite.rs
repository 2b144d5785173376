//! `SQLite`-backed durable duplicate store.
//!
//! The reference durable backend behind the `sqlite:` scheme. Fingerprint
//! digests are keyed in a `fingerprints` table with a primary-key constraint,
//! so check-and-add is a single `INSERT OR IGNORE` statement and the
//! contains-then-add race never exists at this level. Audit entries land in a
//! separate `audit_log` table, which lets this backend double as an event
//! logger via the `"store"` alias.

use crate::audit::{EventLogger, LogEntry};
use crate::models::AttributeSet;
use crate::storage::DuplicateStore;
use crate::{Error, Result};
use rusqlite::{params, Connection};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// `SQLite`-backed duplicate store.
///
/// # Concurrency Model
///
/// Uses a `Mutex<Connection>` because `rusqlite::Connection` is not `Sync`.
/// WAL mode and a `busy_timeout` pragma handle access from other processes:
/// readers proceed concurrently with a single writer, and lock contention
/// waits up to five seconds instead of failing immediately.
pub struct SqliteStore {
    conn: Mutex<Connection>,
    /// Path to the database file (`None` for in-memory).
    db_path: Option<PathBuf>,
}

impl SqliteStore {
    /// Opens (or creates) a durable store at `db_path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreFailed`] if the database cannot be opened or
    /// its schema cannot be initialized.
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = Connection::open(&db_path).map_err(|e| Error::StoreFailed {
            operation: "open_sqlite".to_string(),
            cause: e.to_string(),
        })?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: Some(db_path),
        };
        store.initialize()?;
        Ok(store)
    }

    /// Creates an in-memory `SQLite` store (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreFailed`] if the schema cannot be initialized.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| Error::StoreFailed {
            operation: "open_sqlite_in_memory".to_string(),
            cause: e.to_string(),
        })?;

        let store = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        store.initialize()?;
        Ok(store)
    }

    /// Returns the backing database path, if any.
    #[must_use]
    pub fn db_path(&self) -> Option<&PathBuf> {
        self.db_path.as_ref()
    }

    /// Returns the number of recorded fingerprints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StoreFailed`] if the count query fails.
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock_conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM fingerprints", [], |row| row.get(0))
            .map_err(|e| Self::op_failed("count", &e))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn lock_conn(&self) -> MutexGuard<'_, Connection> {
        match self.conn.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // Connection state is still valid after a panic elsewhere.
                tracing::warn!("SQLite mutex was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.lock_conn();
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;

             CREATE TABLE IF NOT EXISTS fingerprints (
                 digest TEXT PRIMARY KEY,
                 recorded_at TEXT NOT NULL
             );

             CREATE TABLE IF NOT EXISTS audit_log (
                 id INTEGER PRIMARY KEY AUTOINCREMENT,
                 timestamp TEXT NOT NULL,
                 entry TEXT NOT NULL
             );",
        )
        .map_err(|e| Self::op_failed("initialize_schema", &e))
    }

    fn op_failed(operation: &str, cause: &dyn std::fmt::Display) -> Error {
        Error::StoreFailed {
            operation: operation.to_string(),
            cause: cause.to_string(),
        }
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl DuplicateStore for SqliteStore {
    fn contains(&self, attrs: &AttributeSet) -> Result<bool> {
        let digest = attrs.fingerprint().digest();
        let conn = self.lock_conn();
        let mut stmt = conn
            .prepare_cached("SELECT 1 FROM fingerprints WHERE digest = ?1")
            .map_err(|e| Self::op_failed("contains", &e))?;
        stmt.exists(params![digest])
            .map_err(|e| Self::op_failed("contains", &e))
    }

    fn add(&self, attrs: &AttributeSet) -> Result<()> {
        self.check_and_add(attrs).map(|_| ())
    }

    fn check_and_add(&self, attrs: &AttributeSet) -> Result<bool> {
        let digest = attrs.fingerprint().digest();
        // The primary-key constraint makes this a backend-native atomic
        // upsert; changes() tells us whether this call inserted the row.
        let conn = self.lock_conn();
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO fingerprints (digest, recorded_at)
                 VALUES (?1, datetime('now'))",
                params![digest],
            )
            .map_err(|e| Self::op_failed("check_and_add", &e))?;
        Ok(inserted > 0)
    }

    fn clear(&self) -> Result<()> {
        let conn = self.lock_conn();
        conn.execute("DELETE FROM fingerprints", [])
            .map(|_| ())
            .map_err(|e| Self::op_failed("clear", &e))
    }
}

impl EventLogger for SqliteStore {
    fn append(&self, entry: LogEntry) -> Result<()> {
        let body = serde_json::to_string(&entry)
            .map_err(|e| Error::LogFailed(format!("serialize entry: {e}")))?;
        let conn = self.lock_conn();
        conn.execute(
            "INSERT INTO audit_log (timestamp, entry) VALUES (?1, ?2)",
            params![entry.timestamp.to_rfc3339(), body],
        )
        .map(|_| ())
        .map_err(|e| Error::LogFailed(format!("insert audit entry: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CheckOutcome, RequestContext};

    fn sample() -> AttributeSet {
        AttributeSet::from_pairs([("phone", "555-1111"), ("email", "a@b.com")])
    }

    #[test]
    fn test_check_and_add_is_first_insert_wins() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.check_and_add(&sample()).unwrap());
        assert!(!store.check_and_add(&sample()).unwrap());
        assert!(store.contains(&sample()).unwrap());
    }

    #[test]
    fn test_add_is_idempotent() {
        let store = SqliteStore::in_memory().unwrap();
        store.add(&sample()).unwrap();
        store.add(&sample()).unwrap();
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_clear_resets_everything() {
        let store = SqliteStore::in_memory().unwrap();
        store.add(&sample()).unwrap();
        store.clear().unwrap();
        assert!(!store.contains(&sample()).unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_fingerprints_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dedup.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.add(&sample()).unwrap();
        }

        let reopened = SqliteStore::open(&path).unwrap();
        assert!(reopened.contains(&sample()).unwrap());
    }

    #[test]
    fn test_audit_entries_are_persisted() {
        let store = SqliteStore::in_memory().unwrap();
        let ctx = RequestContext::new("203.0.113.7", "payload");
        let outcome = CheckOutcome::all_unique(sample().attributes().to_vec());

        store.record_success(&ctx, &outcome).unwrap();
        store.record_error(&ctx, "boom").unwrap();

        let conn = store.lock_conn();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn test_open_bad_path_fails() {
        let err = SqliteStore::open("/nonexistent/deeply/nested/dedup.db").unwrap_err();
        assert!(matches!(err, Error::StoreFailed { .. }));
    }
}
