//! Structured error types for roster operations.

use serde::Serialize;
use std::fmt;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors
    MissingRequiredField,

    // Not found errors
    TaskNotFound,
    ManagerNotFound,
    EmployeeNotFound,
    FileNotFound,
    UserNotFound,

    // Conflict errors
    AlreadyManager,
    AlreadyEmployee,
    DuplicateFile,
    AlreadyExists,

    // Downstream collaborator errors
    StorageFailure,
    NotificationFailure,

    // Internal errors
    DatabaseError,
    InternalError,
}

/// Broad category of an [`ErrorCode`], used by callers to decide how to react.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    ValidationFailed,
    DependencyFailure,
    Internal,
}

impl ErrorCode {
    pub fn kind(self) -> ErrorKind {
        match self {
            ErrorCode::MissingRequiredField => ErrorKind::ValidationFailed,
            ErrorCode::TaskNotFound
            | ErrorCode::ManagerNotFound
            | ErrorCode::EmployeeNotFound
            | ErrorCode::FileNotFound
            | ErrorCode::UserNotFound => ErrorKind::NotFound,
            ErrorCode::AlreadyManager
            | ErrorCode::AlreadyEmployee
            | ErrorCode::DuplicateFile
            | ErrorCode::AlreadyExists => ErrorKind::Conflict,
            ErrorCode::StorageFailure | ErrorCode::NotificationFailure => {
                ErrorKind::DependencyFailure
            }
            ErrorCode::DatabaseError | ErrorCode::InternalError => ErrorKind::Internal,
        }
    }
}

/// Structured error returned by every roster operation.
#[derive(Debug, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct RosterError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl RosterError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
            details: None,
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.code.kind()
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    // Convenience constructors

    pub fn missing_field(field: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("{} is required", field),
        )
        .with_field(field)
    }

    pub fn task_not_found(task_id: i64) -> Self {
        Self::new(
            ErrorCode::TaskNotFound,
            format!("Task not found: {}", task_id),
        )
    }

    pub fn manager_not_found(manager_id: i64) -> Self {
        Self::new(
            ErrorCode::ManagerNotFound,
            format!("Manager not found: {}", manager_id),
        )
    }

    pub fn employee_not_found(employee_id: i64) -> Self {
        Self::new(
            ErrorCode::EmployeeNotFound,
            format!("Employee not found: {}", employee_id),
        )
    }

    pub fn file_not_found(file_id: i64) -> Self {
        Self::new(
            ErrorCode::FileNotFound,
            format!("File not found: {}", file_id),
        )
    }

    pub fn user_not_found(email: &str) -> Self {
        Self::new(
            ErrorCode::UserNotFound,
            format!("User not found: {}", email),
        )
        .with_field("email")
    }

    pub fn already_manager(user_id: i64, task_id: i64) -> Self {
        Self::new(
            ErrorCode::AlreadyManager,
            format!("User {} is already a manager of task {}", user_id, task_id),
        )
    }

    pub fn already_employee(user_id: i64, task_id: i64) -> Self {
        Self::new(
            ErrorCode::AlreadyEmployee,
            format!("User {} is already an employee of task {}", user_id, task_id),
        )
    }

    pub fn duplicate_file(file_url: &str) -> Self {
        Self::new(
            ErrorCode::DuplicateFile,
            format!("File already exists: {}", file_url),
        )
        .with_field("file_url")
    }

    pub fn already_exists(what: &str) -> Self {
        Self::new(ErrorCode::AlreadyExists, format!("{} already exists", what))
    }

    pub fn storage(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::StorageFailure, err.to_string())
    }

    pub fn notification(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::NotificationFailure, err.to_string())
    }

    pub fn database(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, err.to_string())
    }

    pub fn internal(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::InternalError, err.to_string())
    }
}

impl From<rusqlite::Error> for RosterError {
    fn from(err: rusqlite::Error) -> Self {
        RosterError::database(err)
    }
}

// Allow using ? with anyhow errors by converting them
impl From<anyhow::Error> for RosterError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<RosterError>() {
            Ok(roster_err) => roster_err,
            Err(err) => RosterError::internal(err),
        }
    }
}

/// True when SQLite rejected a write because of a UNIQUE, PRIMARY KEY or
/// foreign key constraint.
pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

/// Result type for roster operations.
pub type RosterResult<T> = std::result::Result<T, RosterError>;
