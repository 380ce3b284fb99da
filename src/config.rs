//! Configuration loading and management.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Roster configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub notify: NotifyConfig,
}

/// Where data lives and how ids are managed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory holding uploaded file objects.
    #[serde(default = "default_media_dir")]
    pub media_dir: PathBuf,

    /// Rewind id sequences after deletes so ids stay dense.
    #[serde(default = "default_compact_ids")]
    pub compact_ids: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            media_dir: default_media_dir(),
            compact_ids: default_compact_ids(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from(".task-roster/roster.db")
}

fn default_media_dir() -> PathBuf {
    PathBuf::from(".task-roster/media")
}

fn default_compact_ids() -> bool {
    true
}

/// Notices sent when planning files are attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_notify_enabled")]
    pub enabled: bool,

    /// Address that receives planning-file notices.
    #[serde(default)]
    pub recipient: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            enabled: default_notify_enabled(),
            recipient: String::new(),
        }
    }
}

fn default_notify_enabled() -> bool {
    true
}

/// Parse the usual spellings of a boolean environment value.
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    /// Load configuration from file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration from default locations or return defaults.
    ///
    /// Looks at `.task-roster/config.yaml`, then `~/.task-roster/config.yaml`.
    /// Environment variables override whatever was found.
    pub fn load_or_default() -> Self {
        let mut candidates = vec![PathBuf::from(".task-roster/config.yaml")];
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join(".task-roster").join("config.yaml"));
        }

        let mut config = candidates
            .iter()
            .find_map(|path| Self::load(path).ok())
            .unwrap_or_default();
        config.apply_env();
        config
    }

    /// Apply `TASK_ROSTER_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(db_path) = lookup("TASK_ROSTER_DB_PATH") {
            self.storage.db_path = PathBuf::from(db_path);
        }

        if let Some(media_dir) = lookup("TASK_ROSTER_MEDIA_DIR") {
            self.storage.media_dir = PathBuf::from(media_dir);
        }

        if let Some(compact) = lookup("TASK_ROSTER_COMPACT_IDS").as_deref().and_then(parse_bool) {
            self.storage.compact_ids = compact;
        }

        if let Some(recipient) = lookup("TASK_ROSTER_NOTIFY_TO") {
            self.notify.recipient = recipient;
        }
    }

    /// Ensure the database directory exists.
    pub fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.storage.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}
