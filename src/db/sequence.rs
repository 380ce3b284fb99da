//! Id sequence compaction.
//!
//! Entity tables use `AUTOINCREMENT`, so SQLite keeps the last issued id of
//! each table in `sqlite_sequence` and never reuses an id on its own. After a
//! delete the roster rewinds that counter to the highest id still present, so
//! the next insert gets `max(id) + 1` (or 1 when the table is empty).
//!
//! Rewinding is racy against inserts from another process that happen
//! between the delete and the rewind, which is why it sits behind
//! [`SequencePolicy`] and can be switched off with [`KeepGaps`].

use super::Database;
use super::schema::Table;
use crate::error::RosterResult;
use rusqlite::{Connection, OptionalExtension, params};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// What to do with a table's id counter after rows were deleted from it.
pub trait SequencePolicy: Send + Sync + fmt::Debug {
    /// Called once per affected table, after the delete, on the same transaction.
    fn compact(&self, conn: &Connection, table: Table) -> RosterResult<()>;
}

/// Rewind counters so ids stay dense.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenseIds;

impl SequencePolicy for DenseIds {
    fn compact(&self, conn: &Connection, table: Table) -> RosterResult<()> {
        let next = compact_sequence(conn, table)?;
        debug!(table = %table, next_id = next, "Compacted id sequence");
        Ok(())
    }
}

/// Leave counters alone; deleted ids are never reused.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeepGaps;

impl SequencePolicy for KeepGaps {
    fn compact(&self, _conn: &Connection, _table: Table) -> RosterResult<()> {
        Ok(())
    }
}

/// Policy for the `compact_ids` configuration switch.
pub fn policy_for(compact_ids: bool) -> Arc<dyn SequencePolicy> {
    if compact_ids {
        Arc::new(DenseIds)
    } else {
        Arc::new(KeepGaps)
    }
}

/// Rewind a table's counter to its current maximum id. Returns the id the
/// next insert will receive.
pub fn compact_sequence(conn: &Connection, table: Table) -> RosterResult<i64> {
    let max_id: i64 = conn.query_row(
        &format!("SELECT COALESCE(MAX(id), 0) FROM {}", table.name()),
        [],
        |row| row.get(0),
    )?;

    // sqlite_sequence stores the last issued id, not the next one.
    // No row yet means the table never had an insert; nothing to rewind.
    conn.execute(
        "UPDATE sqlite_sequence SET seq = ?1 WHERE name = ?2",
        params![max_id, table.name()],
    )?;

    Ok(max_id + 1)
}

/// The id the next insert into `table` will receive.
pub fn next_id(conn: &Connection, table: Table) -> RosterResult<i64> {
    let seq: Option<i64> = conn
        .query_row(
            "SELECT seq FROM sqlite_sequence WHERE name = ?1",
            params![table.name()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(seq.unwrap_or(0) + 1)
}

impl Database {
    /// Rewind a table's id counter now, regardless of the configured policy.
    /// Returns the id the next insert will receive.
    pub fn compact_sequence(&self, table: Table) -> RosterResult<i64> {
        self.write_tx(|tx| compact_sequence(tx, table))
    }

    /// The id the next insert into `table` will receive.
    pub fn next_id(&self, table: Table) -> RosterResult<i64> {
        self.with_conn(|conn| next_id(conn, table))
    }
}
