//! Task creation and the read side of the task graph.

use super::users::find_user_internal;
use super::{Database, now_ms};
use crate::error::{RosterError, RosterResult};
use crate::types::{
    EntityId, FileKind, Member, Owner, Role, StoredFile, Task, TaskDetail, TaskFields, TaskMembers,
};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

const TASK_COLUMNS: &str = "id, name, planning_description, planning_status, planning_due_date, \
     project_status, project_due_date, project_comment, priority, owner_id, created_at, updated_at";

pub fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get(0)?,
        name: row.get(1)?,
        planning_description: row.get(2)?,
        planning_status: row.get(3)?,
        planning_due_date: row.get(4)?,
        project_status: row.get(5)?,
        project_due_date: row.get(6)?,
        project_comment: row.get(7)?,
        priority: row.get(8)?,
        owner_id: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn parse_member_row(row: &Row) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get(0)?,
        email: row.get(1)?,
        user_id: row.get(2)?,
    })
}

fn parse_file_row(row: &Row) -> rusqlite::Result<StoredFile> {
    Ok(StoredFile {
        id: row.get(0)?,
        file_name: row.get(1)?,
        file_url: row.get(2)?,
    })
}

pub(crate) fn get_task_internal(conn: &Connection, task_id: EntityId) -> RosterResult<Option<Task>> {
    let task = conn
        .query_row(
            &format!("SELECT {} FROM tasks WHERE id = ?1", TASK_COLUMNS),
            params![task_id],
            parse_task_row,
        )
        .optional()?;
    Ok(task)
}

/// Load a task or fail with `TaskNotFound`.
pub(crate) fn require_task(conn: &Connection, task_id: EntityId) -> RosterResult<Task> {
    get_task_internal(conn, task_id)?.ok_or_else(|| RosterError::task_not_found(task_id))
}

pub(crate) fn get_owner_internal(conn: &Connection, owner_id: EntityId) -> RosterResult<Option<Owner>> {
    let owner = conn
        .query_row(
            "SELECT id, email, user_id FROM owners WHERE id = ?1",
            params![owner_id],
            |row| {
                Ok(Owner {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    user_id: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(owner)
}

pub(crate) fn get_member_internal(
    conn: &Connection,
    role: Role,
    member_id: EntityId,
) -> RosterResult<Option<Member>> {
    let member = conn
        .query_row(
            &format!(
                "SELECT id, email, user_id FROM {} WHERE id = ?1",
                role.table().name()
            ),
            params![member_id],
            parse_member_row,
        )
        .optional()?;
    Ok(member)
}

pub(crate) fn get_file_internal(
    conn: &Connection,
    kind: FileKind,
    file_id: EntityId,
) -> RosterResult<Option<StoredFile>> {
    let file = conn
        .query_row(
            &format!(
                "SELECT id, file_name, file_url FROM {} WHERE id = ?1",
                kind.table().name()
            ),
            params![file_id],
            parse_file_row,
        )
        .optional()?;
    Ok(file)
}

/// Managers or employees linked to a task, by id.
pub(crate) fn members_for_task(
    conn: &Connection,
    role: Role,
    task_id: EntityId,
) -> RosterResult<Vec<Member>> {
    let join = role.join();
    let mut stmt = conn.prepare(&format!(
        "SELECT m.id, m.email, m.user_id FROM {table} m
         JOIN {join} j ON j.{column} = m.id
         WHERE j.task_id = ?1 ORDER BY m.id",
        table = role.table().name(),
        join = join.table,
        column = join.column,
    ))?;
    let members = stmt
        .query_map(params![task_id], parse_member_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(members)
}

/// Planning or project files linked to a task, by id.
pub(crate) fn files_for_task(
    conn: &Connection,
    kind: FileKind,
    task_id: EntityId,
) -> RosterResult<Vec<StoredFile>> {
    let join = kind.join();
    let mut stmt = conn.prepare(&format!(
        "SELECT f.id, f.file_name, f.file_url FROM {table} f
         JOIN {join} j ON j.{column} = f.id
         WHERE j.task_id = ?1 ORDER BY f.id",
        table = kind.table().name(),
        join = join.table,
        column = join.column,
    ))?;
    let files = stmt
        .query_map(params![task_id], parse_file_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(files)
}

fn all_tasks(conn: &Connection) -> RosterResult<Vec<Task>> {
    let mut stmt = conn.prepare(&format!("SELECT {} FROM tasks ORDER BY id", TASK_COLUMNS))?;
    let tasks = stmt
        .query_map([], parse_task_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

fn load_detail(conn: &Connection, task: Task) -> RosterResult<TaskDetail> {
    let owner = get_owner_internal(conn, task.owner_id)?.ok_or_else(|| {
        RosterError::internal(format!(
            "Task {} references missing owner {}",
            task.id, task.owner_id
        ))
    })?;

    Ok(TaskDetail {
        owner,
        managers: members_for_task(conn, Role::Manager, task.id)?,
        employees: members_for_task(conn, Role::Employee, task.id)?,
        planning_files: files_for_task(conn, FileKind::Planning, task.id)?,
        project_files: files_for_task(conn, FileKind::Project, task.id)?,
        task,
    })
}

impl Database {
    /// Create a task together with its owner.
    ///
    /// The owner is resolved from the directory by email and bound to the task
    /// for its whole life.
    pub fn create_task(&self, owner_email: &str, fields: &TaskFields) -> RosterResult<(Task, Owner)> {
        let owner_email = owner_email.trim();
        if owner_email.is_empty() {
            return Err(RosterError::missing_field("owner_email"));
        }
        let name = fields.name.trim();
        if name.is_empty() {
            return Err(RosterError::missing_field("name"));
        }
        let now = now_ms();

        let (task, owner) = self.write_tx(|tx| {
            let user = find_user_internal(tx, owner_email)?;

            tx.execute(
                "INSERT INTO owners (email, user_id) VALUES (?1, ?2)",
                params![user.email, user.id],
            )?;
            let owner = Owner {
                id: tx.last_insert_rowid(),
                email: user.email.clone(),
                user_id: user.id,
            };

            tx.execute(
                "INSERT INTO tasks (name, planning_description, planning_status, planning_due_date,
                                    project_status, project_due_date, project_comment, priority,
                                    owner_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
                params![
                    name,
                    fields.planning_description.trim(),
                    fields.planning_status.trim(),
                    fields.planning_due_date.trim(),
                    fields.project_status.trim(),
                    fields.project_due_date.trim(),
                    fields.project_comment.trim(),
                    fields.priority.trim(),
                    owner.id,
                    now,
                ],
            )?;
            let task = require_task(tx, tx.last_insert_rowid())?;

            Ok((task, owner))
        })?;

        info!(task_id = task.id, owner_id = owner.id, name = %task.name, "Created task");
        Ok((task, owner))
    }

    /// Get a task with its owner, managers, employees and files.
    pub fn get_task(&self, task_id: EntityId) -> RosterResult<TaskDetail> {
        self.with_conn(|conn| {
            let task = require_task(conn, task_id)?;
            load_detail(conn, task)
        })
    }

    /// Every task with all of its relations.
    pub fn list_tasks(&self) -> RosterResult<Vec<TaskDetail>> {
        self.with_conn(|conn| {
            all_tasks(conn)?
                .into_iter()
                .map(|task| load_detail(conn, task))
                .collect()
        })
    }

    /// The owner of every task.
    pub fn list_owners(&self) -> RosterResult<Vec<TaskMembers<Owner>>> {
        self.with_conn(|conn| {
            all_tasks(conn)?
                .into_iter()
                .map(|task| -> RosterResult<TaskMembers<Owner>> {
                    let items = get_owner_internal(conn, task.owner_id)?.into_iter().collect();
                    Ok(TaskMembers {
                        task_id: task.id,
                        task_name: task.name,
                        items,
                    })
                })
                .collect()
        })
    }

    /// Managers or employees of every task.
    pub fn list_members(&self, role: Role) -> RosterResult<Vec<TaskMembers<Member>>> {
        self.with_conn(|conn| {
            all_tasks(conn)?
                .into_iter()
                .map(|task| -> RosterResult<TaskMembers<Member>> {
                    Ok(TaskMembers {
                        items: members_for_task(conn, role, task.id)?,
                        task_id: task.id,
                        task_name: task.name,
                    })
                })
                .collect()
        })
    }

    /// Planning or project files of every task.
    pub fn list_files(&self, kind: FileKind) -> RosterResult<Vec<TaskMembers<StoredFile>>> {
        self.with_conn(|conn| {
            all_tasks(conn)?
                .into_iter()
                .map(|task| -> RosterResult<TaskMembers<StoredFile>> {
                    Ok(TaskMembers {
                        items: files_for_task(conn, kind, task.id)?,
                        task_id: task.id,
                        task_name: task.name,
                    })
                })
                .collect()
        })
    }

    /// Get a manager or employee row by id.
    pub fn get_member(&self, role: Role, member_id: EntityId) -> RosterResult<Member> {
        self.with_conn(|conn| {
            get_member_internal(conn, role, member_id)?
                .ok_or_else(|| member_not_found(role, member_id))
        })
    }

    /// Get a planning or project file by id.
    pub fn get_file(&self, kind: FileKind, file_id: EntityId) -> RosterResult<StoredFile> {
        self.with_conn(|conn| {
            get_file_internal(conn, kind, file_id)?
                .ok_or_else(|| RosterError::file_not_found(file_id))
        })
    }
}

pub(crate) fn member_not_found(role: Role, member_id: EntityId) -> RosterError {
    match role {
        Role::Manager => RosterError::manager_not_found(member_id),
        Role::Employee => RosterError::employee_not_found(member_id),
    }
}
