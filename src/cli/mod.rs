//! CLI command definitions for task-roster
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod task;

use crate::db::schema::Table;
use crate::types::{EntityId, FileKind, Role};
use clap::{Parser, Subcommand, ValueEnum};
use task::TaskCommand;

/// Task roster: tasks, their owners, managers, employees and files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Path to media directory (overrides config)
    #[arg(short, long, global = true)]
    pub media_dir: Option<String>,

    /// Output format: markdown (default) or json
    #[arg(short, long, default_value = "markdown", global = true)]
    pub format: String,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage users
    #[command(subcommand)]
    User(UserCommand),

    /// Create, inspect, update and delete tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Add a user to a task as manager or employee
    Assign {
        #[arg(value_enum)]
        role: RoleArg,
        task_id: EntityId,
        email: String,
    },

    /// Attach a planning or project file to a task
    Attach {
        #[arg(value_enum)]
        kind: FileKindArg,
        task_id: EntityId,

        /// File name shown to users and used as the stored object name
        #[arg(long)]
        name: String,

        /// File URL, unique across all tasks
        #[arg(long)]
        url: String,
    },

    /// Remove a manager, employee or file
    #[command(subcommand)]
    Remove(RemoveCommand),

    /// List one relation for every task
    List {
        #[arg(value_enum)]
        relation: RelationArg,
    },

    /// Rewind id sequences to the highest id in use
    Compact {
        /// Table to compact (default: every entity table)
        table: Option<Table>,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a user
    Add {
        email: String,

        /// Display name
        #[arg(long, default_value = "")]
        name: String,
    },

    /// List registered users
    List,
}

#[derive(Subcommand, Debug)]
pub enum RemoveCommand {
    /// Remove a manager from a task; the last one takes employees and files along
    Manager { task_id: EntityId, manager_id: EntityId },

    /// Remove an employee from a task; the last one takes project files along
    Employee { task_id: EntityId, employee_id: EntityId },

    /// Remove a planning file and its stored object
    PlanningFile { file_id: EntityId },

    /// Remove a project file and its stored object
    ProjectFile { file_id: EntityId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RoleArg {
    Manager,
    Employee,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Manager => Role::Manager,
            RoleArg::Employee => Role::Employee,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileKindArg {
    Planning,
    Project,
}

impl From<FileKindArg> for FileKind {
    fn from(arg: FileKindArg) -> Self {
        match arg {
            FileKindArg::Planning => FileKind::Planning,
            FileKindArg::Project => FileKind::Project,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RelationArg {
    Owners,
    Managers,
    Employees,
    PlanningFiles,
    ProjectFiles,
}
