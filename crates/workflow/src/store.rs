//! Case storage: SQLite for durability, in-memory for tests
//!
//! Both stores save with compare-and-set on the case version, so a
//! read-check-write sequence that lost a race fails with `Conflict`
//! instead of overwriting a newer case.

use chrono::SecondsFormat;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, PoisonError, RwLock};
use thiserror::Error;

use crate::case::{Case, CaseStatus};

/// Errors from a case store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Case not found: {0}")]
    NotFound(String),

    #[error("Case already exists: {0}")]
    Duplicate(String),

    #[error("Version conflict on {id}: expected {expected}")]
    Conflict { id: String, expected: u64 },
}

/// Which cases to list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaseFilter {
    /// Only cases created by this actor id
    pub created_by: Option<String>,
    pub status: Option<CaseStatus>,
    /// At most this many cases, newest first
    pub limit: Option<usize>,
}

impl CaseFilter {
    fn matches(&self, case: &Case) -> bool {
        self.created_by.as_ref().map_or(true, |id| &case.created_by.id == id)
            && self.status.map_or(true, |s| case.status == s)
    }
}

/// Durable case storage
///
/// `update` must be durable before it returns `Ok`.
pub trait CaseStore: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<Case>, StoreError>;

    /// Store a brand-new case
    fn insert(&self, case: &Case) -> Result<(), StoreError>;

    /// Replace a case only if the stored version is still `expected_version`
    fn update(&self, case: &Case, expected_version: u64) -> Result<(), StoreError>;

    /// Matching cases, newest first
    fn list(&self, filter: &CaseFilter) -> Result<Vec<Case>, StoreError>;
}

/// SQLite-backed case store: JSON body plus indexed lookup columns
pub struct SqliteCaseStore {
    conn: Mutex<Connection>,
}

impl SqliteCaseStore {
    /// Open (or create) a store at the given database path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.conn();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS cases (
                id TEXT PRIMARY KEY,
                status TEXT NOT NULL,
                created_by TEXT NOT NULL,
                created_at TEXT NOT NULL,
                version INTEGER NOT NULL,
                body TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_cases_status ON cases(status)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_cases_created_by ON cases(created_by)",
            [],
        )?;

        Ok(())
    }

    /// Number of stored cases
    pub fn count(&self) -> Result<usize, StoreError> {
        let count: i64 = self
            .conn()
            .query_row("SELECT COUNT(*) FROM cases", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn timestamp(case: &Case) -> String {
    case.created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

impl CaseStore for SqliteCaseStore {
    fn get(&self, id: &str) -> Result<Option<Case>, StoreError> {
        let body: Option<String> = self
            .conn()
            .query_row("SELECT body FROM cases WHERE id = ?1", params![id], |row| row.get(0))
            .optional()?;

        body.map(|b| serde_json::from_str(&b).map_err(StoreError::from))
            .transpose()
    }

    fn insert(&self, case: &Case) -> Result<(), StoreError> {
        let body = serde_json::to_string(case)?;
        let result = self.conn().execute(
            "INSERT INTO cases (id, status, created_by, created_at, version, body)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                case.id,
                case.status.as_str(),
                case.created_by.id,
                timestamp(case),
                case.version as i64,
                body,
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Duplicate(case.id.clone()))
            }
            Err(e) => Err(StoreError::Database(e)),
        }
    }

    fn update(&self, case: &Case, expected_version: u64) -> Result<(), StoreError> {
        let body = serde_json::to_string(case)?;
        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE cases SET status = ?1, version = ?2, body = ?3
             WHERE id = ?4 AND version = ?5",
            params![
                case.status.as_str(),
                case.version as i64,
                body,
                case.id,
                expected_version as i64,
            ],
        )?;

        if rows == 0 {
            let exists: Option<i64> = conn
                .query_row("SELECT version FROM cases WHERE id = ?1", params![case.id], |row| {
                    row.get(0)
                })
                .optional()?;
            return Err(match exists {
                Some(_) => StoreError::Conflict {
                    id: case.id.clone(),
                    expected: expected_version,
                },
                None => StoreError::NotFound(case.id.clone()),
            });
        }

        Ok(())
    }

    fn list(&self, filter: &CaseFilter) -> Result<Vec<Case>, StoreError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT body FROM cases
             WHERE (?1 IS NULL OR created_by = ?1) AND (?2 IS NULL OR status = ?2)
             ORDER BY created_at DESC, id DESC
             LIMIT ?3",
        )?;

        let bodies: Vec<String> = stmt
            .query_map(
                params![
                    filter.created_by,
                    filter.status.map(|s| s.as_str()),
                    filter.limit.map_or(-1, |limit| limit as i64),
                ],
                |row| row.get(0),
            )?
            .collect::<Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|b| serde_json::from_str(b).map_err(StoreError::from))
            .collect()
    }
}

/// In-memory case store for tests
#[derive(Default)]
pub struct MemoryCaseStore {
    cases: RwLock<HashMap<String, Case>>,
}

impl MemoryCaseStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cases.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CaseStore for MemoryCaseStore {
    fn get(&self, id: &str) -> Result<Option<Case>, StoreError> {
        Ok(self
            .cases
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned())
    }

    fn insert(&self, case: &Case) -> Result<(), StoreError> {
        let mut cases = self.cases.write().unwrap_or_else(PoisonError::into_inner);
        if cases.contains_key(&case.id) {
            return Err(StoreError::Duplicate(case.id.clone()));
        }
        cases.insert(case.id.clone(), case.clone());
        Ok(())
    }

    fn update(&self, case: &Case, expected_version: u64) -> Result<(), StoreError> {
        let mut cases = self.cases.write().unwrap_or_else(PoisonError::into_inner);
        match cases.get(&case.id) {
            None => Err(StoreError::NotFound(case.id.clone())),
            Some(stored) if stored.version != expected_version => Err(StoreError::Conflict {
                id: case.id.clone(),
                expected: expected_version,
            }),
            Some(_) => {
                cases.insert(case.id.clone(), case.clone());
                Ok(())
            }
        }
    }

    fn list(&self, filter: &CaseFilter) -> Result<Vec<Case>, StoreError> {
        let cases = self.cases.read().unwrap_or_else(PoisonError::into_inner);
        let mut matching: Vec<Case> = cases.values().filter(|c| filter.matches(c)).cloned().collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        if let Some(limit) = filter.limit {
            matching.truncate(limit);
        }
        Ok(matching)
    }
}
