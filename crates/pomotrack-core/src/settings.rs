//! User settings for the session engine.
//!
//! Settings live in the persistent store as camelCase JSON under
//! [`keys::SETTINGS`](crate::storage::keys::SETTINGS). Missing fields fall
//! back to defaults so older snapshots keep loading.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timer::Phase;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_work_duration")]
    pub work_duration: u32,
    #[serde(default = "default_short_break")]
    pub short_break_duration: u32,
    #[serde(default = "default_long_break")]
    pub long_break_duration: u32,
    #[serde(default = "default_sessions_before_long_break")]
    pub sessions_before_long_break: u32,
    #[serde(default = "default_daily_goal")]
    pub daily_goal_minutes: u32,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
}

fn default_work_duration() -> u32 {
    25
}
fn default_short_break() -> u32 {
    5
}
fn default_long_break() -> u32 {
    15
}
fn default_sessions_before_long_break() -> u32 {
    4
}
fn default_daily_goal() -> u32 {
    180
}
fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            short_break_duration: default_short_break(),
            long_break_duration: default_long_break(),
            sessions_before_long_break: default_sessions_before_long_break(),
            daily_goal_minutes: default_daily_goal(),
            notifications_enabled: true,
        }
    }
}

impl Settings {
    /// Configured length of `phase` in minutes.
    pub fn duration_min(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.work_duration,
            Phase::ShortBreak => self.short_break_duration,
            Phase::LongBreak => self.long_break_duration,
        }
    }

    /// Configured length of `phase` in seconds.
    pub fn duration_secs(&self, phase: Phase) -> u32 {
        self.duration_min(phase).saturating_mul(60)
    }

    /// Check every invariant. Durations, the goal and the long-break cadence
    /// must all be at least one.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let positive = [
            ("workDuration", self.work_duration),
            ("shortBreakDuration", self.short_break_duration),
            ("longBreakDuration", self.long_break_duration),
            ("sessionsBeforeLongBreak", self.sessions_before_long_break),
            ("dailyGoalMinutes", self.daily_goal_minutes),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ValidationError::NonPositive { field });
            }
        }
        Ok(())
    }

    /// Merge `patch` into a copy of these settings.
    ///
    /// The merged value is validated as a whole; on failure `self` is left
    /// untouched and the error names the first offending field.
    pub fn merged(&self, patch: &SettingsPatch) -> Result<Settings, ValidationError> {
        let merged = Settings {
            work_duration: patch.work_duration.unwrap_or(self.work_duration),
            short_break_duration: patch
                .short_break_duration
                .unwrap_or(self.short_break_duration),
            long_break_duration: patch
                .long_break_duration
                .unwrap_or(self.long_break_duration),
            sessions_before_long_break: patch
                .sessions_before_long_break
                .unwrap_or(self.sessions_before_long_break),
            daily_goal_minutes: patch.daily_goal_minutes.unwrap_or(self.daily_goal_minutes),
            notifications_enabled: patch
                .notifications_enabled
                .unwrap_or(self.notifications_enabled),
        };
        merged.validate()?;
        Ok(merged)
    }
}

/// A partial settings update. `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_break_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_break_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sessions_before_long_break: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_goal_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications_enabled: Option<bool>,
}

impl SettingsPatch {
    /// Build a single-field patch from a camelCase key and a textual value,
    /// as typed on a command line.
    pub fn from_key_value(key: &str, value: &str) -> Result<Self, ValidationError> {
        let number = |field: &str| -> Result<u32, ValidationError> {
            value
                .trim()
                .parse::<i64>()
                .map_err(|e| ValidationError::InvalidValue {
                    field: field.to_string(),
                    message: e.to_string(),
                })
                .and_then(|n| {
                    u32::try_from(n).map_err(|_| ValidationError::InvalidValue {
                        field: field.to_string(),
                        message: format!("{n} is out of range"),
                    })
                })
        };

        let mut patch = SettingsPatch::default();
        match key {
            "workDuration" => patch.work_duration = Some(number(key)?),
            "shortBreakDuration" => patch.short_break_duration = Some(number(key)?),
            "longBreakDuration" => patch.long_break_duration = Some(number(key)?),
            "sessionsBeforeLongBreak" => patch.sessions_before_long_break = Some(number(key)?),
            "dailyGoalMinutes" => patch.daily_goal_minutes = Some(number(key)?),
            "notificationsEnabled" => {
                let flag = value
                    .trim()
                    .parse::<bool>()
                    .map_err(|e| ValidationError::InvalidValue {
                        field: key.to_string(),
                        message: e.to_string(),
                    })?;
                patch.notifications_enabled = Some(flag);
            }
            other => {
                return Err(ValidationError::InvalidValue {
                    field: other.to_string(),
                    message: "unknown setting".into(),
                })
            }
        }
        Ok(patch)
    }
}
