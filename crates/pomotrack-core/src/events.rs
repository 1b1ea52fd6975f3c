use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::timer::{Phase, SessionRecord, StreakData};

/// Every state change in the engine produces an Event.
/// Views subscribe to them; the persistence worker maps them to store keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        time_left_secs: u32,
        session_start: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        time_left_secs: u32,
        at: DateTime<Utc>,
    },
    TimerTicked {
        phase: Phase,
        time_left_secs: u32,
        total_secs: u32,
        at: DateTime<Utc>,
    },
    /// A phase ran down to zero. `record` is set for work sessions that had
    /// a start timestamp.
    SessionCompleted {
        phase: Phase,
        next_phase: Phase,
        record: Option<SessionRecord>,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from: Phase,
        to: Phase,
        completed_work_sessions: u32,
        at: DateTime<Utc>,
    },
    TimerReset {
        phase: Phase,
        time_left_secs: u32,
        at: DateTime<Utc>,
    },
    /// The current phase was given a new length while paused, either by a
    /// custom duration or by a settings change.
    DurationChanged {
        phase: Phase,
        total_secs: u32,
        at: DateTime<Utc>,
    },
    SettingsChanged {
        settings: Settings,
        at: DateTime<Utc>,
    },
    ProgressCredited {
        added_minutes: u32,
        before: u32,
        after: u32,
        at: DateTime<Utc>,
    },
    GoalAchieved {
        goal_minutes: u32,
        current_streak: u32,
        at: DateTime<Utc>,
    },
    StreakChanged {
        streak: StreakData,
        at: DateTime<Utc>,
    },
    DayRolledOver {
        from: Option<NaiveDate>,
        to: NaiveDate,
        at: DateTime<Utc>,
    },
    ThemeChanged {
        dark_mode: bool,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Events emitted by the timer half that change the persisted timer slice.
    pub fn touches_timer(&self) -> bool {
        matches!(
            self,
            Event::TimerStarted { .. }
                | Event::TimerPaused { .. }
                | Event::SessionCompleted { .. }
                | Event::TimerSkipped { .. }
                | Event::TimerReset { .. }
                | Event::DurationChanged { .. }
        )
    }
}
