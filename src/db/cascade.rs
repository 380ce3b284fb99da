//! Ordered cascade deletes.
//!
//! The schema declares foreign keys but no `ON DELETE` actions; which rows
//! become orphans when a task, manager or employee goes away is a business
//! rule, encoded in [`CascadeGraph`]:
//!
//! ```text
//! Task     -> Owner, Manager, Employee, PlanningFile, ProjectFile
//! Manager  -> Employee, PlanningFile, ProjectFile
//! Employee -> ProjectFile
//! ```
//!
//! Removing a task always purges its dependents. Removing a manager or
//! employee purges that role's dependents for the task only once the task has
//! no rows of that role left. Every delete and the sequence compaction that
//! follows it run in one transaction.

use super::Database;
use super::schema::Table;
use super::tasks::{get_file_internal, member_not_found, require_task};
use crate::error::{RosterError, RosterResult};
use crate::types::{EntityId, FileKind, Role};
use rusqlite::{Connection, OptionalExtension, params};
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, info};

/// Static dependency graph between entity tables.
pub struct CascadeGraph;

impl CascadeGraph {
    /// Tables whose rows depend on a row of `table`, in removal order.
    pub fn dependents(table: Table) -> &'static [Table] {
        match table {
            Table::Tasks => &[
                Table::Owners,
                Table::Managers,
                Table::Employees,
                Table::PlanningFiles,
                Table::ProjectFiles,
            ],
            Table::Managers => &[Table::Employees, Table::PlanningFiles, Table::ProjectFiles],
            Table::Employees => &[Table::ProjectFiles],
            Table::Owners | Table::PlanningFiles | Table::ProjectFiles => &[],
        }
    }

    /// Every table reachable from `root`, breadth first, each listed once.
    /// `root` itself is not included.
    pub fn purge_order(root: Table) -> Vec<Table> {
        let mut order = Vec::new();
        let mut queue: VecDeque<Table> = CascadeGraph::dependents(root).iter().copied().collect();
        while let Some(table) = queue.pop_front() {
            if table == root || order.contains(&table) {
                continue;
            }
            order.push(table);
            queue.extend(CascadeGraph::dependents(table).iter().copied());
        }
        order
    }
}

/// Rows removed by one delete operation, per table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    removed: BTreeMap<Table, usize>,
}

impl CascadeReport {
    fn record(&mut self, table: Table, rows: usize) {
        if rows > 0 {
            *self.removed.entry(table).or_default() += rows;
        }
    }

    /// Entity rows removed from `table`.
    pub fn removed(&self, table: Table) -> usize {
        self.removed.get(&table).copied().unwrap_or(0)
    }

    /// Whether any row was removed from `table`.
    pub fn touched(&self, table: Table) -> bool {
        self.removed(table) > 0
    }

    /// Tables that lost at least one row.
    pub fn tables(&self) -> impl Iterator<Item = Table> + '_ {
        self.removed.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.removed.is_empty()
    }
}

/// A removed planning or project file. `file_name` is handed back so the
/// caller can delete the stored object.
#[derive(Debug, Clone, Serialize)]
pub struct FileDeletion {
    pub file_name: String,
    pub report: CascadeReport,
}

impl AsRef<CascadeReport> for CascadeReport {
    fn as_ref(&self) -> &CascadeReport {
        self
    }
}

impl AsRef<CascadeReport> for FileDeletion {
    fn as_ref(&self) -> &CascadeReport {
        &self.report
    }
}

/// Ids of the entities of `table` linked to a task.
fn linked_ids(conn: &Connection, table: Table, task_id: EntityId) -> RosterResult<Vec<EntityId>> {
    let Some(join) = table.join() else {
        return Ok(Vec::new());
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM {} WHERE task_id = ?1",
        join.column, join.table
    ))?;
    let ids = stmt
        .query_map(params![task_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<EntityId>>>()?;
    Ok(ids)
}

/// Remove every row of `table` that belongs to `task_id`.
///
/// For many-to-many tables the task's join rows go first, then the entity rows
/// no other task still links to.
fn purge_table(
    conn: &Connection,
    table: Table,
    task_id: EntityId,
    owner_id: EntityId,
    report: &mut CascadeReport,
) -> RosterResult<()> {
    let Some(join) = table.join() else {
        if table == Table::Owners {
            let rows = conn.execute("DELETE FROM owners WHERE id = ?1", params![owner_id])?;
            report.record(table, rows);
        }
        return Ok(());
    };

    let ids = linked_ids(conn, table, task_id)?;
    if ids.is_empty() {
        return Ok(());
    }

    conn.execute(
        &format!("DELETE FROM {} WHERE task_id = ?1", join.table),
        params![task_id],
    )?;

    let delete_sql = format!(
        "DELETE FROM {table} WHERE id = ?1
         AND NOT EXISTS (SELECT 1 FROM {join} WHERE {column} = ?1)",
        table = table.name(),
        join = join.table,
        column = join.column,
    );
    let mut rows = 0;
    for id in &ids {
        rows += conn.execute(&delete_sql, params![id])?;
    }
    report.record(table, rows);

    debug!(task_id, table = %table, rows, "Purged dependent rows");
    Ok(())
}

/// Purge everything below `root` for a task, walking the graph top-down.
fn purge_dependents(
    conn: &Connection,
    root: Table,
    task_id: EntityId,
    owner_id: EntityId,
    report: &mut CascadeReport,
) -> RosterResult<()> {
    for table in CascadeGraph::purge_order(root) {
        purge_table(conn, table, task_id, owner_id, report)?;
    }
    Ok(())
}

fn remaining_links(conn: &Connection, table: Table, task_id: EntityId) -> RosterResult<i64> {
    let Some(join) = table.join() else {
        return Ok(0);
    };
    let count = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE task_id = ?1", join.table),
        params![task_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Delete one manager or employee of a task, cascading when it was the last one.
pub(crate) fn delete_member_internal(
    conn: &Connection,
    role: Role,
    task_id: EntityId,
    member_id: EntityId,
) -> RosterResult<CascadeReport> {
    let table = role.table();
    let join = role.join();

    let linked: Option<i64> = conn
        .query_row(
            &format!(
                "SELECT 1 FROM {} WHERE task_id = ?1 AND {} = ?2",
                join.table, join.column
            ),
            params![task_id, member_id],
            |row| row.get(0),
        )
        .optional()?;
    if linked.is_none() {
        return Err(member_not_found(role, member_id)
            .with_details(format!("no {} {} on task {}", role.as_str(), member_id, task_id)));
    }
    let task = require_task(conn, task_id)?;

    let mut report = CascadeReport::default();
    conn.execute(
        &format!("DELETE FROM {} WHERE {} = ?1", join.table, join.column),
        params![member_id],
    )?;
    let rows = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", table.name()),
        params![member_id],
    )?;
    report.record(table, rows);

    if remaining_links(conn, table, task_id)? == 0 {
        debug!(task_id, role = role.as_str(), "Last member removed, cascading");
        purge_dependents(conn, table, task_id, task.owner_id, &mut report)?;
    }

    Ok(report)
}

/// Delete one planning or project file. Returns its stored name.
pub(crate) fn delete_file_internal(
    conn: &Connection,
    kind: FileKind,
    file_id: EntityId,
) -> RosterResult<FileDeletion> {
    let file = get_file_internal(conn, kind, file_id)?
        .ok_or_else(|| RosterError::file_not_found(file_id))?;
    let table = kind.table();
    let join = kind.join();

    let mut report = CascadeReport::default();
    conn.execute(
        &format!("DELETE FROM {} WHERE {} = ?1", join.table, join.column),
        params![file_id],
    )?;
    let rows = conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", table.name()),
        params![file_id],
    )?;
    report.record(table, rows);

    Ok(FileDeletion {
        file_name: file.file_name,
        report,
    })
}

/// Delete a task and everything that depends on it.
pub(crate) fn delete_task_internal(conn: &Connection, task_id: EntityId) -> RosterResult<CascadeReport> {
    let task = require_task(conn, task_id)?;

    let mut report = CascadeReport::default();
    purge_dependents(conn, Table::Tasks, task_id, task.owner_id, &mut report)?;

    let rows = conn.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
    report.record(Table::Tasks, rows);

    Ok(report)
}

impl Database {
    /// Run a delete and compact the sequences of every table it touched, as one unit.
    fn delete_with_compaction<F, T>(&self, f: F) -> RosterResult<T>
    where
        F: FnOnce(&Connection) -> RosterResult<T>,
        T: AsRef<CascadeReport>,
    {
        let policy = self.sequence_policy();
        self.write_tx(|tx| {
            let out = f(tx)?;
            for table in out.as_ref().tables() {
                policy.compact(tx, table)?;
            }
            Ok(out)
        })
    }

    /// Remove a manager from a task.
    ///
    /// When it was the task's last manager, the task's employees, planning
    /// files and project files are removed too.
    pub fn delete_manager(&self, task_id: EntityId, manager_id: EntityId) -> RosterResult<CascadeReport> {
        self.delete_member(Role::Manager, task_id, manager_id)
    }

    /// Remove an employee from a task.
    ///
    /// When it was the task's last employee, the task's project files are
    /// removed too. Planning files stay.
    pub fn delete_employee(&self, task_id: EntityId, employee_id: EntityId) -> RosterResult<CascadeReport> {
        self.delete_member(Role::Employee, task_id, employee_id)
    }

    pub fn delete_member(
        &self,
        role: Role,
        task_id: EntityId,
        member_id: EntityId,
    ) -> RosterResult<CascadeReport> {
        let report = self.delete_with_compaction(|conn| {
            delete_member_internal(conn, role, task_id, member_id)
        })?;

        info!(task_id, member_id, role = role.as_str(), removed = ?report, "Deleted member");
        Ok(report)
    }

    pub fn delete_planning_file(&self, file_id: EntityId) -> RosterResult<FileDeletion> {
        self.delete_file(FileKind::Planning, file_id)
    }

    pub fn delete_project_file(&self, file_id: EntityId) -> RosterResult<FileDeletion> {
        self.delete_file(FileKind::Project, file_id)
    }

    /// Remove a planning or project file and its join row.
    pub fn delete_file(&self, kind: FileKind, file_id: EntityId) -> RosterResult<FileDeletion> {
        let deletion = self.delete_with_compaction(|conn| {
            delete_file_internal(conn, kind, file_id)
        })?;

        info!(file_id, kind = kind.as_str(), file_name = %deletion.file_name, "Deleted file");
        Ok(deletion)
    }

    /// Remove a task with its owner, managers, employees and files.
    pub fn delete_task(&self, task_id: EntityId) -> RosterResult<CascadeReport> {
        let report = self.delete_with_compaction(|conn| delete_task_internal(conn, task_id))?;

        info!(task_id, removed = ?report, "Deleted task");
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_purges_in_dependency_order() {
        assert_eq!(
            CascadeGraph::purge_order(Table::Tasks),
            vec![
                Table::Owners,
                Table::Managers,
                Table::Employees,
                Table::PlanningFiles,
                Table::ProjectFiles,
            ]
        );
    }

    #[test]
    fn manager_purge_lists_project_files_once() {
        assert_eq!(
            CascadeGraph::purge_order(Table::Managers),
            vec![Table::Employees, Table::PlanningFiles, Table::ProjectFiles]
        );
    }

    #[test]
    fn employee_purge_keeps_planning_files() {
        assert_eq!(
            CascadeGraph::purge_order(Table::Employees),
            vec![Table::ProjectFiles]
        );
    }

    #[test]
    fn leaves_have_no_dependents() {
        for leaf in [Table::Owners, Table::PlanningFiles, Table::ProjectFiles] {
            assert!(CascadeGraph::purge_order(leaf).is_empty());
        }
    }

    #[test]
    fn report_ignores_zero_row_deletes() {
        let mut report = CascadeReport::default();
        report.record(Table::Employees, 0);
        report.record(Table::Managers, 1);
        report.record(Table::Managers, 2);

        assert!(!report.touched(Table::Employees));
        assert_eq!(report.removed(Table::Managers), 3);
        assert_eq!(report.tables().collect::<Vec<_>>(), vec![Table::Managers]);
    }
}
