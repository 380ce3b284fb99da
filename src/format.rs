//! Output formatting utilities for markdown and JSON.

use crate::db::cascade::CascadeReport;
use crate::types::{Member, StoredFile, TaskDetail, TaskMembers, UpdateOutcome, User};
use serde::Serialize;

/// Output format for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    Markdown,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "markdown" | "md" => Some(OutputFormat::Markdown),
            _ => None,
        }
    }
}

/// Pretty JSON for any serializable result.
pub fn to_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

fn field(md: &mut String, label: &str, value: &str) {
    if !value.is_empty() {
        md.push_str(&format!("- **{}**: {}\n", label, value));
    }
}

fn member_line(member: &Member) -> String {
    format!("- `{}` {} (user `{}`)\n", member.id, member.email, member.user_id)
}

fn file_line(file: &StoredFile) -> String {
    format!("- `{}` {} <{}>\n", file.id, file.file_name, file.file_url)
}

/// Format one task with its relations.
pub fn format_task_markdown(detail: &TaskDetail) -> String {
    let task = &detail.task;
    let mut md = String::new();

    md.push_str(&format!("## Task: {}\n", task.name));
    md.push_str(&format!("- **id**: `{}`\n", task.id));
    md.push_str(&format!("- **owner**: {}\n", detail.owner.email));
    field(&mut md, "priority", &task.priority);
    field(&mut md, "planning_status", &task.planning_status);
    field(&mut md, "planning_due_date", &task.planning_due_date);
    field(&mut md, "project_status", &task.project_status);
    field(&mut md, "project_due_date", &task.project_due_date);

    if !task.planning_description.is_empty() {
        md.push_str("\n### Planning\n");
        md.push_str(&task.planning_description);
        md.push('\n');
    }

    if !task.project_comment.is_empty() {
        md.push_str("\n### Project comment\n");
        md.push_str(&task.project_comment);
        md.push('\n');
    }

    let sections: [(&str, Vec<String>); 4] = [
        ("Managers", detail.managers.iter().map(member_line).collect()),
        ("Employees", detail.employees.iter().map(member_line).collect()),
        ("Planning files", detail.planning_files.iter().map(file_line).collect()),
        ("Project files", detail.project_files.iter().map(file_line).collect()),
    ];
    for (title, lines) in sections {
        if lines.is_empty() {
            continue;
        }
        md.push_str(&format!("\n### {} ({})\n", title, lines.len()));
        for line in lines {
            md.push_str(&line);
        }
    }

    md
}

/// Format a list of tasks as a compact table.
pub fn format_tasks_markdown(tasks: &[TaskDetail]) -> String {
    let mut md = format!("# Tasks ({})\n\n", tasks.len());
    if tasks.is_empty() {
        md.push_str("No tasks.\n");
        return md;
    }

    md.push_str("| id | name | owner | priority | managers | employees | files |\n");
    md.push_str("|----|------|-------|----------|----------|-----------|-------|\n");
    for detail in tasks {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} |\n",
            detail.task.id,
            detail.task.name,
            detail.owner.email,
            detail.task.priority,
            detail.managers.len(),
            detail.employees.len(),
            detail.planning_files.len() + detail.project_files.len(),
        ));
    }
    md
}

pub fn format_users_markdown(users: &[User]) -> String {
    let mut md = format!("# Users ({})\n\n", users.len());
    for user in users {
        md.push_str(&format!("- `{}` {} <{}>\n", user.id, user.name, user.email));
    }
    md
}

/// Format one relation per task, e.g. every task's managers.
pub fn format_relation_markdown<T>(
    title: &str,
    groups: &[TaskMembers<T>],
    line: impl Fn(&T) -> String,
) -> String {
    let mut md = format!("# {}\n", title);
    for group in groups {
        md.push_str(&format!("\n## {} (`{}`)\n", group.task_name, group.task_id));
        if group.items.is_empty() {
            md.push_str("- none\n");
        }
        for item in &group.items {
            md.push_str(&line(item));
        }
    }
    md
}

pub fn format_members_markdown(title: &str, groups: &[TaskMembers<Member>]) -> String {
    format_relation_markdown(title, groups, member_line)
}

pub fn format_files_markdown(title: &str, groups: &[TaskMembers<StoredFile>]) -> String {
    format_relation_markdown(title, groups, file_line)
}

/// Summarize what a combined update wrote.
pub fn format_update_markdown(outcome: &UpdateOutcome) -> String {
    let mut md = format!("Updated task `{}` ({})\n", outcome.task.id, outcome.task.name);
    if let Some(manager) = &outcome.manager {
        md.push_str(&format!("- manager added: {}\n", manager.email));
    }
    if let Some(employee) = &outcome.employee {
        md.push_str(&format!("- employee added: {}\n", employee.email));
    }
    if let Some(file) = &outcome.planning_file {
        md.push_str(&format!("- planning file attached: {}\n", file.file_name));
    }
    if let Some(file) = &outcome.project_file {
        md.push_str(&format!("- project file attached: {}\n", file.file_name));
    }
    md
}

/// List removed rows per table.
pub fn format_cascade_markdown(report: &CascadeReport) -> String {
    if report.is_empty() {
        return "Nothing removed.\n".to_string();
    }
    let mut md = String::from("Removed:\n");
    for table in report.tables() {
        md.push_str(&format!("- {}: {}\n", table, report.removed(table)));
    }
    md
}
