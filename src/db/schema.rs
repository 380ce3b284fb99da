//! Entity tables and the join tables that tie them to tasks.

use super::Database;
use crate::error::RosterResult;
use crate::types::{FileKind, Role};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A base entity table. Users are excluded: they are never deleted or compacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Tasks,
    Owners,
    Managers,
    Employees,
    PlanningFiles,
    ProjectFiles,
}

/// A join table linking an entity table to `tasks`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Join {
    pub table: &'static str,
    /// Column holding the entity id; the other key column is always `task_id`.
    pub column: &'static str,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Tasks,
        Table::Owners,
        Table::Managers,
        Table::Employees,
        Table::PlanningFiles,
        Table::ProjectFiles,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Tasks => "tasks",
            Table::Owners => "owners",
            Table::Managers => "managers",
            Table::Employees => "employees",
            Table::PlanningFiles => "planning_files",
            Table::ProjectFiles => "project_files",
        }
    }

    /// The join table for many-to-many entities. Tasks and owners have none.
    pub fn join(self) -> Option<Join> {
        match self {
            Table::Managers => Some(Role::Manager.join()),
            Table::Employees => Some(Role::Employee.join()),
            Table::PlanningFiles => Some(FileKind::Planning.join()),
            Table::ProjectFiles => Some(FileKind::Project.join()),
            Table::Tasks | Table::Owners => None,
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Table {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Table::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| {
                let names: Vec<&str> = Table::ALL.iter().map(|t| t.name()).collect();
                format!("unknown table '{}', expected one of: {}", s, names.join(", "))
            })
    }
}

impl Role {
    pub fn table(self) -> Table {
        match self {
            Role::Manager => Table::Managers,
            Role::Employee => Table::Employees,
        }
    }

    pub(crate) fn join(self) -> Join {
        match self {
            Role::Manager => Join {
                table: "task_managers",
                column: "manager_id",
            },
            Role::Employee => Join {
                table: "task_employees",
                column: "employee_id",
            },
        }
    }
}

impl FileKind {
    pub fn table(self) -> Table {
        match self {
            FileKind::Planning => Table::PlanningFiles,
            FileKind::Project => Table::ProjectFiles,
        }
    }

    pub(crate) fn join(self) -> Join {
        match self {
            FileKind::Planning => Join {
                table: "task_planning_files",
                column: "planning_file_id",
            },
            FileKind::Project => Join {
                table: "task_project_files",
                column: "project_file_id",
            },
        }
    }
}

impl Database {
    /// Number of rows currently in a table.
    pub fn count_rows(&self, table: Table) -> RosterResult<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                &format!("SELECT COUNT(*) FROM {}", table.name()),
                [],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    /// Number of join rows linking a task to entities of the given table.
    pub fn count_links(&self, table: Table, task_id: i64) -> RosterResult<i64> {
        let Some(join) = table.join() else {
            return Ok(0);
        };
        self.with_conn(|conn| {
            let count = conn.query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE task_id = ?1", join.table),
                [task_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }
}
