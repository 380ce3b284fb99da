//! Task roster library.
//!
//! Tasks with one owner, many managers and employees, and planning/project
//! files, kept in SQLite. Removing a manager or employee cascades to the rows
//! that depend on it, and id sequences are compacted after deletes.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod notify;
pub mod service;
pub mod storage;
pub mod types;
