//! Synchronous engine state.
//!
//! `EngineCore` composes the timer, the goal tracker, settings, history and
//! the theme flag. Every method mutates in place and returns the events that
//! describe the change; nothing here touches the store or the notifier.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ValidationError;
use crate::events::Event;
use crate::settings::{Settings, SettingsPatch};
use crate::storage::PersistedState;
use crate::timer::{
    EngineState, GoalTracker, Phase, SessionRecord, StreakData, TickOutcome, TimerEngine,
};

/// Read-only view handed to presentation code.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(flatten)]
    pub timer: EngineState,
    pub phase_label: &'static str,
    /// Fraction of the current phase already elapsed, 0.0 to 1.0.
    pub phase_progress: f64,
    pub settings: Settings,
    pub history: Vec<SessionRecord>,
    pub streak: StreakData,
    pub daily_progress_minutes: u32,
    pub last_active_date: Option<NaiveDate>,
    pub goal_progress_pct: u32,
    pub dark_mode: bool,
}

#[derive(Debug, Clone)]
pub struct EngineCore {
    settings: Settings,
    timer: TimerEngine,
    goals: GoalTracker,
    /// Newest first.
    history: Vec<SessionRecord>,
    dark_mode: bool,
}

impl EngineCore {
    pub fn new(settings: Settings) -> Self {
        Self {
            timer: TimerEngine::new(&settings),
            settings,
            goals: GoalTracker::default(),
            history: Vec::new(),
            dark_mode: false,
        }
    }

    /// Rebuild from what the store held. A stored timer comes back paused.
    pub fn from_persisted(state: PersistedState) -> Self {
        let timer = match state.timer {
            Some(timer) => TimerEngine::restore(timer),
            None => TimerEngine::new(&state.settings),
        };
        Self {
            timer,
            goals: GoalTracker::new(state.daily_progress_minutes, state.last_date, state.streak),
            history: state.history,
            dark_mode: state.dark_mode,
            settings: state.settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn timer(&self) -> &TimerEngine {
        &self.timer
    }

    pub fn goals(&self) -> &GoalTracker {
        &self.goals
    }

    pub fn history(&self) -> &[SessionRecord] {
        &self.history
    }

    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            timer: self.timer.state().clone(),
            phase_label: self.timer.phase().label(),
            phase_progress: self.timer.phase_progress(),
            settings: self.settings.clone(),
            history: self.history.clone(),
            streak: self.goals.streak().clone(),
            daily_progress_minutes: self.goals.daily_progress_minutes(),
            last_active_date: self.goals.last_active_date(),
            goal_progress_pct: self.goals.goal_progress_pct(self.settings.daily_goal_minutes),
            dark_mode: self.dark_mode,
        }
    }

    pub fn start(&mut self, now: DateTime<Local>) -> Vec<Event> {
        let event = self.timer.start(now.with_timezone(&Utc));
        if event.is_some() {
            debug!(phase = self.timer.phase().as_str(), "timer started");
        }
        event.into_iter().collect()
    }

    pub fn pause(&mut self, now: DateTime<Local>) -> Vec<Event> {
        let event = self.timer.pause(now.with_timezone(&Utc));
        if event.is_some() {
            debug!(time_left = self.timer.time_left_secs(), "timer paused");
        }
        event.into_iter().collect()
    }

    pub fn reset(&mut self, now: DateTime<Local>) -> Vec<Event> {
        debug!(phase = self.timer.phase().as_str(), "timer reset");
        vec![self.timer.reset(&self.settings, now.with_timezone(&Utc))]
    }

    pub fn skip(&mut self, now: DateTime<Local>) -> Vec<Event> {
        let event = self.timer.skip(&self.settings, now.with_timezone(&Utc));
        debug!(to = self.timer.phase().as_str(), "phase skipped");
        vec![event]
    }

    /// Count one second. On natural completion of a work phase the session
    /// is recorded and its minutes are credited towards today's goal.
    pub fn tick(&mut self, now: DateTime<Local>) -> Vec<Event> {
        let at = now.with_timezone(&Utc);
        match self.timer.tick(&self.settings, at) {
            TickOutcome::Idle => Vec::new(),
            TickOutcome::Counted(ticked) => vec![ticked],
            TickOutcome::Completed { ticked, completion } => {
                info!(
                    finished = completion.finished.as_str(),
                    next = completion.next.as_str(),
                    "session completed"
                );
                let mut events = vec![
                    ticked,
                    Event::SessionCompleted {
                        phase: completion.finished,
                        next_phase: completion.next,
                        record: completion.record.clone(),
                        at,
                    },
                ];
                if let Some(record) = completion.record {
                    let minutes = record.duration;
                    self.history.insert(0, record);
                    events.extend(self.credit(minutes, now));
                }
                events
            }
        }
    }

    pub fn set_custom_duration(&mut self, minutes: u32, now: DateTime<Local>) -> Result<Vec<Event>, ValidationError> {
        let event = self.timer.set_custom_duration(minutes, now.with_timezone(&Utc))?;
        debug!(minutes, "custom duration set");
        Ok(vec![event])
    }

    /// Merge and validate `patch`. On error nothing changes.
    pub fn update_settings(&mut self, patch: &SettingsPatch, now: DateTime<Local>) -> Result<Vec<Event>, ValidationError> {
        let merged = self.settings.merged(patch)?;
        let at = now.with_timezone(&Utc);
        self.settings = merged;
        let mut events = vec![Event::SettingsChanged {
            settings: self.settings.clone(),
            at,
        }];
        events.extend(self.timer.apply_settings(&self.settings, at));
        debug!(?patch, "settings updated");
        Ok(events)
    }

    pub fn toggle_dark_mode(&mut self, now: DateTime<Local>) -> Vec<Event> {
        self.dark_mode = !self.dark_mode;
        vec![Event::ThemeChanged {
            dark_mode: self.dark_mode,
            at: now.with_timezone(&Utc),
        }]
    }

    /// Roll the goal tracker over to `now`'s local date.
    pub fn check_daily_rollover(&mut self, now: DateTime<Local>) -> Vec<Event> {
        let at = now.with_timezone(&Utc);
        let outcome = self.goals.rollover(now.date_naive(), self.settings.daily_goal_minutes);
        let mut events = Vec::new();
        if outcome.date_changed() {
            info!(from = ?outcome.from, to = %outcome.to, kind = ?outcome.kind, "day rolled over");
            events.push(Event::DayRolledOver {
                from: outcome.from,
                to: outcome.to,
                at,
            });
        }
        if outcome.streak_changed {
            events.push(Event::StreakChanged {
                streak: self.goals.streak().clone(),
                at,
            });
        }
        events
    }

    /// Add finished work minutes to today's progress, rolling the day over
    /// first if the date has changed since the last activity.
    pub fn credit(&mut self, minutes: u32, now: DateTime<Local>) -> Vec<Event> {
        let at = now.with_timezone(&Utc);
        let goal = self.settings.daily_goal_minutes;
        let mut events = self.check_daily_rollover(now);

        let outcome = self.goals.credit(minutes, now.date_naive(), goal);
        events.push(Event::ProgressCredited {
            added_minutes: outcome.added,
            before: outcome.before,
            after: outcome.after,
            at,
        });
        if outcome.goal_achieved {
            let streak = self.goals.streak().clone();
            info!(goal, streak = streak.current_streak, "daily goal achieved");
            events.push(Event::GoalAchieved {
                goal_minutes: goal,
                current_streak: streak.current_streak,
                at,
            });
            events.push(Event::StreakChanged { streak, at });
        }
        events
    }

    pub fn phase(&self) -> Phase {
        self.timer.phase()
    }
}
