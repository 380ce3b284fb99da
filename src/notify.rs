//! Outbound notices.

use anyhow::Result;
use serde::Serialize;
use tracing::info;

/// A message for one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

impl Notice {
    /// Notice sent after a planning file is attached to a task.
    pub fn planning_file_uploaded(recipient: &str, task_name: &str) -> Self {
        Self {
            recipient: recipient.to_string(),
            subject: "planning file".to_string(),
            body: format!("planning file uploaded in task: {}", task_name),
        }
    }
}

/// Delivers notices. Delivery is best effort: callers log failures and move on.
pub trait Notifier: Send + Sync {
    fn send(&self, notice: &Notice) -> Result<()>;
}

/// Notifier that records notices in the log instead of mailing them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, notice: &Notice) -> Result<()> {
        info!(
            recipient = %notice.recipient,
            subject = %notice.subject,
            body = %notice.body,
            "Notice dispatched"
        );
        Ok(())
    }
}
