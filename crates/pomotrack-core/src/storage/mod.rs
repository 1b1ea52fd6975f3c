mod config;
mod memory;
mod snapshot;
mod sqlite;

pub use config::{Config, LoggingConfig, ReminderConfig, TimerConfig};
pub use memory::MemoryStore;
pub use snapshot::PersistedState;
pub(crate) use snapshot::encode;
pub use sqlite::SqliteStore;

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::{ConfigError, StorageError};

/// Key names in the persistent store.
pub mod keys {
    pub const SETTINGS: &str = "pomodoro_settings";
    pub const HISTORY: &str = "pomodoro_history";
    pub const THEME: &str = "pomodoro_theme";
    pub const STREAK: &str = "pomodoro_streak";
    pub const DAILY_PROGRESS: &str = "pomodoro_daily_progress";
    pub const LAST_DATE: &str = "pomodoro_last_date";
    pub const TIMER: &str = "pomodoro_timer";

    pub const ALL: [&str; 7] = [
        SETTINGS,
        HISTORY,
        THEME,
        STREAK,
        DAILY_PROGRESS,
        LAST_DATE,
        TIMER,
    ];
}

/// Asynchronous string key-value store.
///
/// Values are opaque text; the engine encodes JSON (or plain text for the
/// progress counter and the date) before handing them over.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Returns the data directory, creating it if needed.
///
/// `POMOTRACK_HOME` wins when set. Otherwise `~/.config/pomotrack/`, or
/// `~/.config/pomotrack-dev/` with `POMOTRACK_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("POMOTRACK_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("POMOTRACK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomotrack-dev")
            } else {
                base_dir.join("pomotrack")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::NoDataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
