//! Start-up load of every persisted key.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{keys, Store};
use crate::error::StorageError;
use crate::settings::Settings;
use crate::timer::{EngineState, SessionRecord, StreakData};

/// Everything the engine reads at start-up. Missing and malformed values
/// have already been replaced by defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub settings: Settings,
    pub history: Vec<SessionRecord>,
    pub dark_mode: bool,
    pub streak: StreakData,
    pub daily_progress_minutes: u32,
    pub last_date: Option<NaiveDate>,
    pub timer: Option<EngineState>,
}

impl PersistedState {
    /// Read all keys. Never fails: a key that cannot be read or decoded is
    /// logged and replaced by its default.
    pub async fn load(store: &dyn Store) -> Self {
        let settings = match read_json::<Settings>(store, keys::SETTINGS).await {
            Some(s) => match s.validate() {
                Ok(()) => s,
                Err(e) => {
                    warn!(key = keys::SETTINGS, error = %e, "stored settings invalid, using defaults");
                    Settings::default()
                }
            },
            None => Settings::default(),
        };

        let history = read_json::<Vec<SessionRecord>>(store, keys::HISTORY).await.unwrap_or_default();
        let dark_mode = read_json::<bool>(store, keys::THEME).await.unwrap_or(false);
        let streak = read_json::<StreakData>(store, keys::STREAK)
            .await
            .unwrap_or_default()
            .normalized();
        let daily_progress_minutes = read_parsed(store, keys::DAILY_PROGRESS, |raw| {
            raw.trim().parse::<u32>().map_err(|e| e.to_string())
        })
        .await
        .unwrap_or(0);
        let last_date = read_parsed(store, keys::LAST_DATE, |raw| {
            NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| e.to_string())
        })
        .await;
        let timer = read_json::<EngineState>(store, keys::TIMER).await;

        Self {
            settings,
            history,
            dark_mode,
            streak,
            daily_progress_minutes,
            last_date,
            timer,
        }
    }
}

async fn read_raw(store: &dyn Store, key: &str) -> Option<String> {
    match store.get(key).await {
        Ok(Some(raw)) => Some(raw),
        Ok(None) => {
            debug!(key, "no stored value");
            None
        }
        Err(e) => {
            warn!(key, error = %e, "failed to read stored value, using default");
            None
        }
    }
}

async fn read_parsed<T, F>(store: &dyn Store, key: &str, parse: F) -> Option<T>
where
    F: FnOnce(&str) -> Result<T, String>,
{
    let raw = read_raw(store, key).await?;
    match parse(&raw) {
        Ok(value) => Some(value),
        Err(message) => {
            let err = StorageError::Malformed {
                key: key.to_string(),
                message,
            };
            warn!(error = %err, "ignoring stored value");
            None
        }
    }
}

async fn read_json<T: DeserializeOwned>(store: &dyn Store, key: &str) -> Option<T> {
    read_parsed(store, key, |raw| serde_json::from_str(raw).map_err(|e| e.to_string())).await
}

/// Encodings for the values the engine writes.
pub(crate) mod encode {
    use chrono::NaiveDate;
    use serde::Serialize;

    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
        serde_json::to_string(value)
    }

    pub fn minutes(value: u32) -> String {
        value.to_string()
    }

    pub fn date(value: NaiveDate) -> String {
        value.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::timer::Phase;

    #[tokio::test]
    async fn empty_store_yields_defaults() {
        let store = MemoryStore::new();
        let state = PersistedState::load(&store).await;
        assert_eq!(state, PersistedState::default());
        assert_eq!(state.settings.work_duration, 25);
    }

    #[tokio::test]
    async fn reads_every_key() {
        let store = MemoryStore::with_values([
            (keys::SETTINGS, r#"{"workDuration":50,"dailyGoalMinutes":100}"#),
            (
                keys::HISTORY,
                r#"[{"type":"work","duration":25,"startTime":"2026-05-04T09:00:00Z","endTime":"2026-05-04T09:25:00Z"}]"#,
            ),
            (keys::THEME, "true"),
            (
                keys::STREAK,
                r#"{"currentStreak":2,"lastCompletedDate":"2026-05-03","highestStreak":4}"#,
            ),
            (keys::DAILY_PROGRESS, "75"),
            (keys::LAST_DATE, "2026-05-04"),
        ]);

        let state = PersistedState::load(&store).await;
        assert_eq!(state.settings.work_duration, 50);
        assert_eq!(state.settings.short_break_duration, 5);
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].phase, Phase::Work);
        assert!(state.dark_mode);
        assert_eq!(state.streak.highest_streak, 4);
        assert_eq!(state.daily_progress_minutes, 75);
        assert_eq!(state.last_date, NaiveDate::from_ymd_opt(2026, 5, 4));
        assert!(state.timer.is_none());
    }

    #[tokio::test]
    async fn malformed_values_fall_back_per_key() {
        let store = MemoryStore::with_values([
            (keys::SETTINGS, r#"{"workDuration":0}"#),
            (keys::HISTORY, "not json"),
            (keys::DAILY_PROGRESS, "-3"),
            (keys::LAST_DATE, "yesterday"),
            (keys::THEME, "true"),
        ]);

        let state = PersistedState::load(&store).await;
        assert_eq!(state.settings, Settings::default());
        assert!(state.history.is_empty());
        assert_eq!(state.daily_progress_minutes, 0);
        assert!(state.last_date.is_none());
        assert!(state.dark_mode);
    }

    #[tokio::test]
    async fn stored_settings_and_timer_slice_decode_together() {
        let store = MemoryStore::with_values([
            (keys::SETTINGS, r#"{"shortBreakDuration":7,"notificationsEnabled":false}"#),
            (
                keys::TIMER,
                r#"{"isRunning":true,"currentSessionType":"shortBreak","timeLeftSeconds":120,"totalTimeSeconds":420,"completedWorkSessions":3}"#,
            ),
        ]);

        let state = PersistedState::load(&store).await;
        assert_eq!(state.settings.short_break_duration, 7);
        assert!(!state.settings.notifications_enabled);
        let timer = state.timer.expect("timer slice");
        assert_eq!(timer.current_session_type, Phase::ShortBreak);
        assert_eq!(timer.time_left_seconds, 120);
        assert_eq!(timer.completed_work_sessions, 3);
        assert!(timer.session_start.is_none());
    }

    #[test]
    fn encodings_match_store_format() {
        assert_eq!(encode::minutes(195), "195");
        assert_eq!(
            encode::date(NaiveDate::from_ymd_opt(2026, 1, 9).unwrap()),
            "2026-01-09"
        );
        assert_eq!(encode::json(&true).unwrap(), "true");
    }
}
