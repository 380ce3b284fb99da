//! Core types for the task roster.

use serde::{Deserialize, Serialize};

/// Store-assigned integer identifier shared by every entity table.
pub type EntityId = i64;

/// A user from the directory, resolved by email at assignment time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub email: String,
    pub name: String,
    pub created_at: i64,
}

/// The single owner bound to a task when it is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub id: EntityId,
    pub email: String,
    pub user_id: EntityId,
}

/// A manager or employee row. Which one depends on the [`Role`] it was read with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: EntityId,
    pub email: String,
    pub user_id: EntityId,
}

/// A planning or project file. Which one depends on the [`FileKind`] it was read with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredFile {
    pub id: EntityId,
    pub file_name: String,
    pub file_url: String,
}

/// Role a user holds on a task, apart from ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Manager,
    Employee,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Manager => "manager",
            Role::Employee => "employee",
        }
    }
}

/// The two kinds of uploaded artifacts a task can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Planning,
    Project,
}

impl FileKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Planning => "planning",
            FileKind::Project => "project",
        }
    }
}

/// A task row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: EntityId,
    pub name: String,
    pub planning_description: String,
    pub planning_status: String,
    pub planning_due_date: String,
    pub project_status: String,
    pub project_due_date: String,
    pub project_comment: String,
    pub priority: String,
    pub owner_id: EntityId,
    pub created_at: i64,
    pub updated_at: i64,
}

/// The textual fields of a task.
///
/// Used both to create a task and as a partial update. In an update an empty
/// (or whitespace-only) value means "leave unchanged"; it never clears the
/// stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskFields {
    pub name: String,
    pub planning_description: String,
    pub planning_status: String,
    pub planning_due_date: String,
    pub project_status: String,
    pub project_due_date: String,
    pub project_comment: String,
    pub priority: String,
}

impl TaskFields {
    /// Fields paired with their column names, in column order.
    fn columns(&self) -> [(&'static str, &str); 8] {
        [
            ("name", self.name.as_str()),
            ("planning_description", self.planning_description.as_str()),
            ("planning_status", self.planning_status.as_str()),
            ("planning_due_date", self.planning_due_date.as_str()),
            ("project_status", self.project_status.as_str()),
            ("project_due_date", self.project_due_date.as_str()),
            ("project_comment", self.project_comment.as_str()),
            ("priority", self.priority.as_str()),
        ]
    }

    /// Column/value pairs that carry a change, values trimmed.
    pub fn changes(&self) -> Vec<(&'static str, &str)> {
        self.columns()
            .into_iter()
            .map(|(column, value)| (column, value.trim()))
            .filter(|(_, value)| !value.is_empty())
            .collect()
    }

    /// True when no field requests a change.
    pub fn is_empty(&self) -> bool {
        self.columns().iter().all(|(_, value)| value.trim().is_empty())
    }
}

/// A file to attach to a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileUpload {
    pub file_name: String,
    pub file_url: String,
}

impl FileUpload {
    pub fn new(file_name: impl Into<String>, file_url: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            file_url: file_url.into(),
        }
    }

    /// An upload with neither a name nor a URL requests nothing.
    pub fn is_empty(&self) -> bool {
        self.file_name.trim().is_empty() && self.file_url.trim().is_empty()
    }
}

/// A combined update of a task and its optional new relations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateRequest {
    pub task: TaskFields,
    pub manager_email: Option<String>,
    pub employee_email: Option<String>,
    pub planning_file: Option<FileUpload>,
    pub project_file: Option<FileUpload>,
}

/// What an update wrote: the task as stored afterwards plus any rows created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateOutcome {
    pub task: Task,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manager: Option<Member>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<Member>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub planning_file: Option<StoredFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_file: Option<StoredFile>,
}

/// A task with every relation loaded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    pub owner: Owner,
    pub managers: Vec<Member>,
    pub employees: Vec<Member>,
    pub planning_files: Vec<StoredFile>,
    pub project_files: Vec<StoredFile>,
}

/// One relation of one task, for the per-relation listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskMembers<T> {
    pub task_id: EntityId,
    pub task_name: String,
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_fields_are_empty() {
        assert!(TaskFields::default().is_empty());
        assert!(TaskFields::default().changes().is_empty());
    }

    #[test]
    fn whitespace_does_not_count_as_change() {
        let fields = TaskFields {
            planning_status: "   ".to_string(),
            ..Default::default()
        };

        assert!(fields.is_empty());
    }

    #[test]
    fn changes_keep_column_order_and_trim() {
        let fields = TaskFields {
            priority: "high".to_string(),
            name: "  Launch ".to_string(),
            ..Default::default()
        };

        assert_eq!(fields.changes(), vec![("name", "Launch"), ("priority", "high")]);
    }

    #[test]
    fn upload_with_only_a_name_is_not_empty() {
        assert!(FileUpload::default().is_empty());
        assert!(!FileUpload::new("plan.pdf", "").is_empty());
        assert!(!FileUpload::new("", "s3://bucket/plan.pdf").is_empty());
    }
}
