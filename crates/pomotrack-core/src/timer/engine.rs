//! Timer engine implementation.
//!
//! The timer engine is a tick-counting state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()` once per
//! second while the timer runs.
//!
//! ## State Transitions
//!
//! ```text
//! (Work | ShortBreak | LongBreak) x (Running | Paused)
//!
//! Work --complete/skip--> ShortBreak | LongBreak --complete/skip--> Work
//! ```
//!
//! Every Work phase that ends, naturally or by skip, advances the long-break
//! cadence counter. Only natural completion yields a [`SessionRecord`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::phase::{next_phase, Phase};
use crate::error::ValidationError;
use crate::events::Event;
use crate::settings::Settings;

/// A finished work session. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(rename = "type")]
    pub phase: Phase,
    /// Duration in minutes.
    pub duration: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Timer half of the engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineState {
    pub is_running: bool,
    pub current_session_type: Phase,
    pub time_left_seconds: u32,
    pub total_time_seconds: u32,
    pub completed_work_sessions: u32,
    /// Start of the open logical session. Survives pause, cleared by
    /// completion, reset and skip.
    #[serde(default)]
    pub session_start: Option<DateTime<Utc>>,
}

impl EngineState {
    /// Paused at the start of a work phase.
    pub fn fresh(settings: &Settings) -> Self {
        let total = settings.duration_secs(Phase::Work);
        Self {
            is_running: false,
            current_session_type: Phase::Work,
            time_left_seconds: total,
            total_time_seconds: total,
            completed_work_sessions: 0,
            session_start: None,
        }
    }
}

/// Result of a single tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The timer is paused; nothing happened.
    Idle,
    /// One second was counted.
    Counted(Event),
    /// The phase ran out and the engine moved to the next one.
    Completed {
        ticked: Event,
        completion: Completion,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub finished: Phase,
    pub next: Phase,
    pub record: Option<SessionRecord>,
}

/// Core timer state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerEngine {
    state: EngineState,
}

impl TimerEngine {
    pub fn new(settings: &Settings) -> Self {
        Self {
            state: EngineState::fresh(settings),
        }
    }

    /// Rebuild from a persisted state. A restored timer is always paused;
    /// the session start is kept so resuming continues the same session.
    pub fn restore(mut state: EngineState) -> Self {
        state.is_running = false;
        if state.total_time_seconds == 0 {
            state.total_time_seconds = state.time_left_seconds;
        }
        state.time_left_seconds = state.time_left_seconds.min(state.total_time_seconds);
        Self { state }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.state.is_running
    }

    pub fn phase(&self) -> Phase {
        self.state.current_session_type
    }

    pub fn time_left_secs(&self) -> u32 {
        self.state.time_left_seconds
    }

    pub fn total_secs(&self) -> u32 {
        self.state.total_time_seconds
    }

    /// 0.0 .. 1.0 progress within the current phase.
    pub fn phase_progress(&self) -> f64 {
        let total = self.state.total_time_seconds;
        if total == 0 {
            return 0.0;
        }
        1.0 - (self.state.time_left_seconds as f64 / total as f64)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Returns `None` when the timer was already running.
    pub fn start(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if self.state.is_running {
            return None;
        }
        self.state.is_running = true;
        let session_start = *self.state.session_start.get_or_insert(now);
        Some(Event::TimerStarted {
            phase: self.state.current_session_type,
            time_left_secs: self.state.time_left_seconds,
            session_start,
            at: now,
        })
    }

    /// Returns `None` when the timer was already paused.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Option<Event> {
        if !self.state.is_running {
            return None;
        }
        self.state.is_running = false;
        Some(Event::TimerPaused {
            phase: self.state.current_session_type,
            time_left_secs: self.state.time_left_seconds,
            at: now,
        })
    }

    pub fn reset(&mut self, settings: &Settings, now: DateTime<Utc>) -> Event {
        self.state.is_running = false;
        self.state.session_start = None;
        self.load_phase(self.state.current_session_type, settings);
        Event::TimerReset {
            phase: self.state.current_session_type,
            time_left_secs: self.state.time_left_seconds,
            at: now,
        }
    }

    /// Move to the next phase without recording anything. Skipping a work
    /// phase still counts towards the long-break cadence.
    pub fn skip(&mut self, settings: &Settings, now: DateTime<Utc>) -> Event {
        let from = self.state.current_session_type;
        self.state.is_running = false;
        self.state.session_start = None;
        let to = self.advance(settings);
        Event::TimerSkipped {
            from,
            to,
            completed_work_sessions: self.state.completed_work_sessions,
            at: now,
        }
    }

    /// Count one second. Completes the phase when the countdown reaches zero.
    pub fn tick(&mut self, settings: &Settings, now: DateTime<Utc>) -> TickOutcome {
        if !self.state.is_running {
            return TickOutcome::Idle;
        }
        self.state.time_left_seconds = self.state.time_left_seconds.saturating_sub(1);
        let ticked = Event::TimerTicked {
            phase: self.state.current_session_type,
            time_left_secs: self.state.time_left_seconds,
            total_secs: self.state.total_time_seconds,
            at: now,
        };
        if self.state.time_left_seconds > 0 {
            return TickOutcome::Counted(ticked);
        }
        TickOutcome::Completed {
            ticked,
            completion: self.complete(settings, now),
        }
    }

    /// Override the current phase length. Only allowed while paused; the
    /// configured settings are not touched.
    pub fn set_custom_duration(&mut self, minutes: u32, now: DateTime<Utc>) -> Result<Event, ValidationError> {
        if minutes == 0 {
            return Err(ValidationError::NonPositive {
                field: "customDuration",
            });
        }
        if self.state.is_running {
            return Err(ValidationError::TimerRunning {
                operation: "setCustomDuration",
            });
        }
        let secs = minutes.saturating_mul(60);
        self.state.time_left_seconds = secs;
        self.state.total_time_seconds = secs;
        Ok(Event::DurationChanged {
            phase: self.state.current_session_type,
            total_secs: secs,
            at: now,
        })
    }

    /// React to new settings. A paused timer reloads the current phase
    /// length; a running one keeps counting down.
    pub fn apply_settings(&mut self, settings: &Settings, now: DateTime<Utc>) -> Option<Event> {
        if self.state.is_running {
            return None;
        }
        self.load_phase(self.state.current_session_type, settings);
        Some(Event::DurationChanged {
            phase: self.state.current_session_type,
            total_secs: self.state.total_time_seconds,
            at: now,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete(&mut self, settings: &Settings, now: DateTime<Utc>) -> Completion {
        let finished = self.state.current_session_type;
        let start = self.state.session_start.take();

        let record = match (finished, start) {
            (Phase::Work, Some(start_time)) => Some(SessionRecord {
                phase: Phase::Work,
                duration: self.state.total_time_seconds / 60,
                start_time,
                end_time: now,
            }),
            _ => None,
        };

        let next = self.advance(settings);
        // Auto-advance: the next phase is already running.
        if self.state.is_running {
            self.state.session_start = Some(now);
        }

        Completion {
            finished,
            next,
            record,
        }
    }

    fn advance(&mut self, settings: &Settings) -> Phase {
        let current = self.state.current_session_type;
        if current == Phase::Work {
            self.state.completed_work_sessions = self.state.completed_work_sessions.saturating_add(1);
        }
        let next = next_phase(
            current,
            self.state.completed_work_sessions,
            settings.sessions_before_long_break,
        );
        self.load_phase(next, settings);
        next
    }

    fn load_phase(&mut self, phase: Phase, settings: &Settings) {
        let secs = settings.duration_secs(phase);
        self.state.current_session_type = phase;
        self.state.time_left_seconds = secs;
        self.state.total_time_seconds = secs;
    }
}
