//! Database layer for the task roster.

pub mod assignment;
pub mod cascade;
pub mod schema;
pub mod sequence;
pub mod tasks;
pub mod update;
pub mod users;

use crate::error::{RosterError, RosterResult};
use anyhow::Result;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use sequence::{DenseIds, SequencePolicy};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    sequence: Arc<dyn SequencePolicy>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // Enable WAL mode for concurrent access
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA foreign_keys=ON;
             PRAGMA busy_timeout=5000;",
        )?;

        Self::from_connection(conn)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;

        conn.execute_batch("PRAGMA foreign_keys=ON;")?;

        Self::from_connection(conn)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        embedded::migrations::runner().run(&mut conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            sequence: Arc::new(DenseIds),
        })
    }

    /// Replace the policy applied to id sequences after deletes.
    pub fn with_sequence_policy(mut self, policy: Arc<dyn SequencePolicy>) -> Self {
        self.sequence = policy;
        self
    }

    pub fn sequence_policy(&self) -> &dyn SequencePolicy {
        self.sequence.as_ref()
    }

    fn lock(&self) -> RosterResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| RosterError::internal("database connection lock poisoned"))
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> RosterResult<T>
    where
        F: FnOnce(&Connection) -> RosterResult<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Run a write sequence as one all-or-nothing unit.
    ///
    /// The transaction takes SQLite's write lock up front (`BEGIN IMMEDIATE`), so
    /// the reads a sequence makes before writing see the state its writes
    /// apply to. Returning an error rolls everything back.
    pub fn write_tx<F, T>(&self, f: F) -> RosterResult<T>
    where
        F: FnOnce(&Transaction<'_>) -> RosterResult<T>,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

/// Get the current timestamp in milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
