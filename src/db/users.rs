//! User directory: the people owners, managers and employees are resolved from.

use super::{Database, now_ms};
use crate::error::{RosterError, RosterResult, is_constraint_violation};
use crate::types::User;
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::info;

fn parse_user_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Resolve a user by email. Fails with `UserNotFound`.
pub(crate) fn find_user_internal(conn: &Connection, email: &str) -> RosterResult<User> {
    let email = email.trim();
    conn.query_row(
        "SELECT id, email, name, created_at FROM users WHERE email = ?1",
        params![email],
        parse_user_row,
    )
    .optional()?
    .ok_or_else(|| RosterError::user_not_found(email))
}

impl Database {
    /// Register a directory user.
    pub fn create_user(&self, email: &str, name: &str) -> RosterResult<User> {
        let email = email.trim();
        if email.is_empty() {
            return Err(RosterError::missing_field("email"));
        }
        let now = now_ms();

        let user = self.write_tx(|tx| {
            tx.execute(
                "INSERT INTO users (email, name, created_at) VALUES (?1, ?2, ?3)",
                params![email, name.trim(), now],
            )
            .map_err(|e| {
                if is_constraint_violation(&e) {
                    RosterError::already_exists(&format!("User {}", email))
                } else {
                    e.into()
                }
            })?;

            Ok(User {
                id: tx.last_insert_rowid(),
                email: email.to_string(),
                name: name.trim().to_string(),
                created_at: now,
            })
        })?;

        info!(user_id = user.id, email = %user.email, "Registered user");
        Ok(user)
    }

    /// Resolve a user by email.
    pub fn find_user_by_email(&self, email: &str) -> RosterResult<User> {
        self.with_conn(|conn| find_user_internal(conn, email))
    }

    /// All registered users, oldest first.
    pub fn list_users(&self) -> RosterResult<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, email, name, created_at FROM users ORDER BY id")?;
            let users = stmt
                .query_map([], parse_user_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(users)
        })
    }
}
