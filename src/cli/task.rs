//! Arguments for the task subcommands.

use crate::types::{EntityId, FileUpload, TaskFields, UpdateRequest};
use clap::{Args, Subcommand};

/// Textual task fields. Omitted fields stay empty (create) or unchanged (update).
#[derive(Args, Debug, Default, Clone)]
pub struct TaskFieldArgs {
    /// Task name
    #[arg(long)]
    pub name: Option<String>,

    #[arg(long, value_name = "TEXT")]
    pub planning_description: Option<String>,

    #[arg(long, value_name = "STATUS")]
    pub planning_status: Option<String>,

    #[arg(long, value_name = "DATE")]
    pub planning_due_date: Option<String>,

    #[arg(long, value_name = "STATUS")]
    pub project_status: Option<String>,

    #[arg(long, value_name = "DATE")]
    pub project_due_date: Option<String>,

    #[arg(long, value_name = "TEXT")]
    pub project_comment: Option<String>,

    #[arg(long)]
    pub priority: Option<String>,
}

impl TaskFieldArgs {
    pub fn to_fields(&self) -> TaskFields {
        let value = |v: &Option<String>| v.clone().unwrap_or_default();
        TaskFields {
            name: value(&self.name),
            planning_description: value(&self.planning_description),
            planning_status: value(&self.planning_status),
            planning_due_date: value(&self.planning_due_date),
            project_status: value(&self.project_status),
            project_due_date: value(&self.project_due_date),
            project_comment: value(&self.project_comment),
            priority: value(&self.priority),
        }
    }
}

/// Split `NAME=URL` into an upload. A bare value is used as both.
pub fn parse_upload(value: &str) -> Result<FileUpload, String> {
    let (name, url) = match value.split_once('=') {
        Some((name, url)) => (name.trim(), url.trim()),
        None => (value.trim(), value.trim()),
    };
    if url.is_empty() {
        return Err(format!("missing file url in {:?}", value));
    }
    Ok(FileUpload::new(name, url))
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Create a task owned by an existing user
    Create {
        /// Email of the owning user
        #[arg(long)]
        owner: String,

        #[command(flatten)]
        fields: TaskFieldArgs,
    },

    /// Show one task with its relations
    Show { task_id: EntityId },

    /// List every task
    List,

    /// Patch a task and optionally add members and files in one step
    Update(UpdateArgs),

    /// Delete a task with its owner, members and files
    Delete { task_id: EntityId },
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    pub task_id: EntityId,

    #[command(flatten)]
    pub fields: TaskFieldArgs,

    /// Add a manager by user email
    #[arg(long, value_name = "EMAIL")]
    pub manager: Option<String>,

    /// Add an employee by user email
    #[arg(long, value_name = "EMAIL")]
    pub employee: Option<String>,

    /// Attach a planning file (NAME=URL)
    #[arg(long, value_name = "NAME=URL", value_parser = parse_upload)]
    pub planning_file: Option<FileUpload>,

    /// Attach a project file (NAME=URL)
    #[arg(long, value_name = "NAME=URL", value_parser = parse_upload)]
    pub project_file: Option<FileUpload>,
}

impl UpdateArgs {
    pub fn to_request(&self) -> UpdateRequest {
        UpdateRequest {
            task: self.fields.to_fields(),
            manager_email: self.manager.clone(),
            employee_email: self.employee.clone(),
            planning_file: self.planning_file.clone(),
            project_file: self.project_file.clone(),
        }
    }
}
