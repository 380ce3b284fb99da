//! Manager/employee exclusivity.
//!
//! A user may hold at most one role row on a task: manager or employee, never
//! both, and never the same role twice. Every assignment goes through
//! [`validate_assignment`] on the same write transaction as the insert that
//! follows it. The schema enforces the same rule on the join tables
//! (`UNIQUE (task_id, user_id)` plus cross-table triggers), and
//! [`link_member`] maps those violations to the matching conflict.

use super::Database;
use super::tasks::require_task;
use super::users::find_user_internal;
use crate::error::{RosterError, RosterResult, is_constraint_violation};
use crate::types::{EntityId, Member, Role};
use rusqlite::{Connection, params};
use tracing::{debug, info};

/// Count the role rows a user holds on a task.
pub fn count_role_rows(
    conn: &Connection,
    role: Role,
    task_id: EntityId,
    user_id: EntityId,
) -> RosterResult<i64> {
    let join = role.join();
    let count = conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {table} m
             JOIN {join} j ON j.{column} = m.id
             WHERE j.task_id = ?1 AND m.user_id = ?2",
            table = role.table().name(),
            join = join.table,
            column = join.column,
        ),
        params![task_id, user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Check that `user_id` may take `role` on `task_id`.
///
/// Fails with `AlreadyManager` or `AlreadyEmployee` naming the role the user
/// already holds. An existing row for the requested role is rejected too.
pub fn validate_assignment(
    conn: &Connection,
    task_id: EntityId,
    user_id: EntityId,
    role: Role,
) -> RosterResult<()> {
    let managers = count_role_rows(conn, Role::Manager, task_id, user_id)?;
    let employees = count_role_rows(conn, Role::Employee, task_id, user_id)?;

    match role {
        Role::Manager if managers > 0 => Err(RosterError::already_manager(user_id, task_id)),
        Role::Manager if employees > 0 => Err(RosterError::already_employee(user_id, task_id)),
        Role::Employee if employees > 0 => Err(RosterError::already_employee(user_id, task_id)),
        Role::Employee if managers > 0 => Err(RosterError::already_manager(user_id, task_id)),
        _ => Ok(()),
    }
}

/// Resolve `email`, validate, then insert the role row and its join row.
///
/// Must run inside a write transaction so the check and the insert see the
/// same state.
pub(crate) fn assign_member(
    conn: &Connection,
    task_id: EntityId,
    role: Role,
    email: &str,
) -> RosterResult<Member> {
    let user = find_user_internal(conn, email)?;
    validate_assignment(conn, task_id, user.id, role)?;

    conn.execute(
        &format!(
            "INSERT INTO {} (email, user_id) VALUES (?1, ?2)",
            role.table().name()
        ),
        params![user.email, user.id],
    )?;
    let member = Member {
        id: conn.last_insert_rowid(),
        email: user.email,
        user_id: user.id,
    };

    link_member(conn, task_id, role, &member)?;

    debug!(task_id, member_id = member.id, role = role.as_str(), "Inserted role row");
    Ok(member)
}

/// Conflict named by a failed role join insert.
///
/// The schema rejects a second row for the same (task, user) in either role
/// table; the SQLite message names the table holding the existing role.
fn role_conflict(err: &rusqlite::Error, role: Role, user_id: EntityId, task_id: EntityId) -> RosterError {
    let message = match err {
        rusqlite::Error::SqliteFailure(_, Some(message)) => message.as_str(),
        _ => "",
    };
    let held = if message.contains(Role::Manager.join().table) {
        Role::Manager
    } else if message.contains(Role::Employee.join().table) {
        Role::Employee
    } else {
        role
    };
    match held {
        Role::Manager => RosterError::already_manager(user_id, task_id),
        Role::Employee => RosterError::already_employee(user_id, task_id),
    }
}

/// Link a role row to a task. Uniqueness of (task, user) across both role
/// tables is enforced by the schema, independent of [`validate_assignment`].
pub(crate) fn link_member(
    conn: &Connection,
    task_id: EntityId,
    role: Role,
    member: &Member,
) -> RosterResult<()> {
    let join = role.join();
    conn.execute(
        &format!(
            "INSERT INTO {} (task_id, {}, user_id) VALUES (?1, ?2, ?3)",
            join.table, join.column
        ),
        params![task_id, member.id, member.user_id],
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            role_conflict(&e, role, member.user_id, task_id)
        } else {
            e.into()
        }
    })?;
    Ok(())
}

impl Database {
    /// Check whether a user may take a role on a task without writing anything.
    pub fn validate_assignment(
        &self,
        task_id: EntityId,
        user_id: EntityId,
        role: Role,
    ) -> RosterResult<()> {
        self.with_conn(|conn| validate_assignment(conn, task_id, user_id, role))
    }

    /// Assign the user with `email` to a task as manager or employee.
    pub fn assign(&self, task_id: EntityId, role: Role, email: &str) -> RosterResult<Member> {
        let email = email.trim();
        if email.is_empty() {
            return Err(RosterError::missing_field("email"));
        }

        let member = self.write_tx(|tx| {
            require_task(tx, task_id)?;
            assign_member(tx, task_id, role, email)
        })?;

        info!(task_id, member_id = member.id, role = role.as_str(), email = %member.email, "Assigned member");
        Ok(member)
    }
}
