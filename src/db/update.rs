//! Combined task updates.
//!
//! One call can patch the task body, add a manager, add an employee and attach
//! a planning and a project file. Only parts that carry data are written, and
//! the whole call is one transaction: a failing part rolls back the parts
//! written before it.

use super::assignment::assign_member;
use super::tasks::require_task;
use super::{Database, now_ms};
use crate::error::{RosterError, RosterResult, is_constraint_violation};
use crate::types::{
    EntityId, FileKind, FileUpload, Role, StoredFile, Task, TaskFields, UpdateOutcome, UpdateRequest,
};
use rusqlite::{Connection, ToSql, params};
use tracing::{debug, info};

/// Write the non-empty fields of `patch`. Returns false when there was nothing to write.
fn apply_patch(conn: &Connection, task_id: EntityId, patch: &TaskFields) -> RosterResult<bool> {
    let changes = patch.changes();
    if changes.is_empty() {
        return Ok(false);
    }

    let mut assignments: Vec<String> = Vec::with_capacity(changes.len() + 1);
    let mut params_vec: Vec<Box<dyn ToSql>> = Vec::with_capacity(changes.len() + 2);
    for (column, value) in &changes {
        params_vec.push(Box::new(value.to_string()));
        assignments.push(format!("{} = ?{}", column, params_vec.len()));
    }
    params_vec.push(Box::new(now_ms()));
    assignments.push(format!("updated_at = ?{}", params_vec.len()));
    params_vec.push(Box::new(task_id));

    let sql = format!(
        "UPDATE tasks SET {} WHERE id = ?{}",
        assignments.join(", "),
        params_vec.len()
    );
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|b| b.as_ref()).collect();
    conn.execute(&sql, params_refs.as_slice())?;

    debug!(task_id, fields = changes.len(), "Patched task");
    Ok(true)
}

/// Insert a file row and link it to the task. File URLs are unique across all
/// tasks, so an existing URL fails with `DuplicateFile` before anything is written.
pub(crate) fn attach_file_internal(
    conn: &Connection,
    task_id: EntityId,
    kind: FileKind,
    upload: &FileUpload,
) -> RosterResult<StoredFile> {
    let table = kind.table();
    let file_name = upload.file_name.trim();
    let file_url = upload.file_url.trim();

    let existing: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE file_url = ?1", table.name()),
        params![file_url],
        |row| row.get(0),
    )?;
    if existing > 0 {
        return Err(RosterError::duplicate_file(file_url));
    }

    conn.execute(
        &format!(
            "INSERT INTO {} (file_name, file_url) VALUES (?1, ?2)",
            table.name()
        ),
        params![file_name, file_url],
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            RosterError::duplicate_file(file_url)
        } else {
            e.into()
        }
    })?;
    let file = StoredFile {
        id: conn.last_insert_rowid(),
        file_name: file_name.to_string(),
        file_url: file_url.to_string(),
    };

    let join = kind.join();
    conn.execute(
        &format!(
            "INSERT INTO {} (task_id, {}) VALUES (?1, ?2)",
            join.table, join.column
        ),
        params![task_id, file.id],
    )?;

    debug!(task_id, file_id = file.id, kind = kind.as_str(), "Attached file");
    Ok(file)
}

/// `Some(email)` only when the optional email carries a value.
fn requested_email(email: &Option<String>) -> Option<&str> {
    email.as_deref().map(str::trim).filter(|e| !e.is_empty())
}

/// `Some(upload)` only when the optional upload carries a name or URL.
fn requested_upload(upload: &Option<FileUpload>) -> Option<&FileUpload> {
    upload.as_ref().filter(|u| !u.is_empty())
}

impl Database {
    /// Apply a combined update to a task.
    ///
    /// Order: task body, manager, employee, planning file, project file. Any
    /// failure aborts the call and nothing it wrote is kept.
    pub fn update_task(
        &self,
        task_id: EntityId,
        request: &UpdateRequest,
    ) -> RosterResult<UpdateOutcome> {
        let outcome = self.write_tx(|tx| {
            require_task(tx, task_id)?;
            apply_patch(tx, task_id, &request.task)?;

            let manager = requested_email(&request.manager_email)
                .map(|email| assign_member(tx, task_id, Role::Manager, email))
                .transpose()?;
            let employee = requested_email(&request.employee_email)
                .map(|email| assign_member(tx, task_id, Role::Employee, email))
                .transpose()?;
            let planning_file = requested_upload(&request.planning_file)
                .map(|upload| attach_file_internal(tx, task_id, FileKind::Planning, upload))
                .transpose()?;
            let project_file = requested_upload(&request.project_file)
                .map(|upload| attach_file_internal(tx, task_id, FileKind::Project, upload))
                .transpose()?;

            Ok(UpdateOutcome {
                task: require_task(tx, task_id)?,
                manager,
                employee,
                planning_file,
                project_file,
            })
        })?;

        info!(
            task_id,
            manager = outcome.manager.is_some(),
            employee = outcome.employee.is_some(),
            planning_file = outcome.planning_file.is_some(),
            project_file = outcome.project_file.is_some(),
            "Updated task"
        );
        Ok(outcome)
    }

    /// Attach a single planning or project file to a task.
    pub fn attach_file(
        &self,
        task_id: EntityId,
        kind: FileKind,
        upload: &FileUpload,
    ) -> RosterResult<StoredFile> {
        self.attach_file_to_task(task_id, kind, upload)
            .map(|(_, file)| file)
    }

    /// Like [`Database::attach_file`], also returning the task as read inside
    /// the attaching transaction.
    pub fn attach_file_to_task(
        &self,
        task_id: EntityId,
        kind: FileKind,
        upload: &FileUpload,
    ) -> RosterResult<(Task, StoredFile)> {
        if upload.is_empty() {
            return Err(RosterError::missing_field("file_url"));
        }

        let (task, file) = self.write_tx(|tx| {
            let task = require_task(tx, task_id)?;
            let file = attach_file_internal(tx, task_id, kind, upload)?;
            Ok((task, file))
        })?;

        info!(task_id, file_id = file.id, kind = kind.as_str(), "Attached file");
        Ok((task, file))
    }
}
