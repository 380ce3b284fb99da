//! Roster operations that reach beyond the database.
//!
//! [`RosterService`] wraps a [`Database`] together with the object store and
//! the notifier. Relational work commits first; the collaborators are called
//! afterwards and never roll it back.

use crate::config::{Config, NotifyConfig};
use crate::db::Database;
use crate::db::cascade::CascadeReport;
use crate::db::sequence::policy_for;
use crate::error::{RosterError, RosterResult};
use crate::notify::{LogNotifier, Notice, Notifier};
use crate::storage::{LocalObjectStore, ObjectStore};
use crate::types::{
    EntityId, FileKind, FileUpload, Member, Owner, Role, StoredFile, Task, TaskDetail, TaskFields,
    TaskMembers, UpdateOutcome, UpdateRequest, User,
};
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct RosterService {
    db: Database,
    store: Arc<dyn ObjectStore>,
    notifier: Arc<dyn Notifier>,
    notify: NotifyConfig,
}

impl RosterService {
    pub fn new(
        db: Database,
        store: Arc<dyn ObjectStore>,
        notifier: Arc<dyn Notifier>,
        notify: NotifyConfig,
    ) -> Self {
        Self {
            db,
            store,
            notifier,
            notify,
        }
    }

    /// Open the configured database and media directory.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.ensure_db_dir()?;
        let db = Database::open(&config.storage.db_path)?
            .with_sequence_policy(policy_for(config.storage.compact_ids));
        Ok(Self::new(
            db,
            Arc::new(LocalObjectStore::new(&config.storage.media_dir)),
            Arc::new(LogNotifier),
            config.notify.clone(),
        ))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn create_user(&self, email: &str, name: &str) -> RosterResult<User> {
        self.db.create_user(email, name)
    }

    pub fn list_users(&self) -> RosterResult<Vec<User>> {
        self.db.list_users()
    }

    pub fn create_task(&self, owner_email: &str, fields: &TaskFields) -> RosterResult<(Task, Owner)> {
        self.db.create_task(owner_email, fields)
    }

    pub fn get_task(&self, task_id: EntityId) -> RosterResult<TaskDetail> {
        self.db.get_task(task_id)
    }

    pub fn list_tasks(&self) -> RosterResult<Vec<TaskDetail>> {
        self.db.list_tasks()
    }

    pub fn list_owners(&self) -> RosterResult<Vec<TaskMembers<Owner>>> {
        self.db.list_owners()
    }

    pub fn list_members(&self, role: Role) -> RosterResult<Vec<TaskMembers<Member>>> {
        self.db.list_members(role)
    }

    pub fn list_files(&self, kind: FileKind) -> RosterResult<Vec<TaskMembers<StoredFile>>> {
        self.db.list_files(kind)
    }

    pub fn assign(&self, task_id: EntityId, role: Role, email: &str) -> RosterResult<Member> {
        self.db.assign(task_id, role, email)
    }

    /// Apply a combined update, then announce a new planning file.
    pub fn update_task(
        &self,
        task_id: EntityId,
        request: &UpdateRequest,
    ) -> RosterResult<UpdateOutcome> {
        let outcome = self.db.update_task(task_id, request)?;
        if outcome.planning_file.is_some() {
            self.announce_planning_file(&outcome.task.name);
        }
        Ok(outcome)
    }

    /// Attach one file; planning files are announced like in [`Self::update_task`].
    pub fn attach_file(
        &self,
        task_id: EntityId,
        kind: FileKind,
        upload: &FileUpload,
    ) -> RosterResult<StoredFile> {
        let (task, file) = self.db.attach_file_to_task(task_id, kind, upload)?;
        if kind == FileKind::Planning {
            self.announce_planning_file(&task.name);
        }
        Ok(file)
    }

    /// Notification is best effort. A failed send is logged and dropped.
    fn announce_planning_file(&self, task_name: &str) {
        if !self.notify.enabled {
            return;
        }
        if self.notify.recipient.trim().is_empty() {
            debug!(task_name, "No notice recipient configured, skipping");
            return;
        }

        let notice = Notice::planning_file_uploaded(&self.notify.recipient, task_name);
        if let Err(e) = self.notifier.send(&notice) {
            let error = RosterError::notification(&e);
            warn!(
                recipient = %notice.recipient,
                code = ?error.code,
                error = %error,
                "Failed to send planning file notice"
            );
        }
    }

    pub fn delete_manager(&self, task_id: EntityId, manager_id: EntityId) -> RosterResult<CascadeReport> {
        self.db.delete_manager(task_id, manager_id)
    }

    pub fn delete_employee(&self, task_id: EntityId, employee_id: EntityId) -> RosterResult<CascadeReport> {
        self.db.delete_employee(task_id, employee_id)
    }

    pub fn delete_member(
        &self,
        role: Role,
        task_id: EntityId,
        member_id: EntityId,
    ) -> RosterResult<CascadeReport> {
        self.db.delete_member(role, task_id, member_id)
    }

    pub fn delete_planning_file(&self, file_id: EntityId) -> RosterResult<String> {
        self.delete_file(FileKind::Planning, file_id)
    }

    pub fn delete_project_file(&self, file_id: EntityId) -> RosterResult<String> {
        self.delete_file(FileKind::Project, file_id)
    }

    /// Delete a file row, then its stored object. Returns the file name.
    pub fn delete_file(&self, kind: FileKind, file_id: EntityId) -> RosterResult<String> {
        let deletion = self.db.delete_file(kind, file_id)?;
        self.store.delete(&deletion.file_name).map_err(|e| {
            RosterError::storage(&e).with_details(format!(
                "{} file {} was deleted; stored object {:?} may need reconciliation",
                kind.as_str(),
                file_id,
                deletion.file_name
            ))
        })?;
        Ok(deletion.file_name)
    }

    /// Delete a task and its dependents, then clear the object store.
    ///
    /// The relational delete has committed by the time the store is called, so
    /// a store failure leaves the rows gone and reports `StorageFailure`.
    pub fn delete_task(&self, task_id: EntityId) -> RosterResult<CascadeReport> {
        let report = self.db.delete_task(task_id)?;
        self.store.delete_all().map_err(|e| {
            RosterError::storage(&e).with_details(format!(
                "task {} rows were deleted; stored objects may need reconciliation",
                task_id
            ))
        })?;
        Ok(report)
    }
}
