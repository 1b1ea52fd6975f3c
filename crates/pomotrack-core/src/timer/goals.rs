//! Daily goal and streak bookkeeping.
//!
//! Progress is counted in work minutes per local calendar day. The streak
//! counts consecutive days on which the daily goal was met. Both the
//! rollover and the crediting path are pure: they take `today` and the goal
//! as arguments and report what changed.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakData {
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub last_completed_date: Option<NaiveDate>,
    #[serde(default)]
    pub highest_streak: u32,
}

impl StreakData {
    /// Count `today` as a completed day.
    pub fn extend(&mut self, today: NaiveDate) {
        self.current_streak = self.current_streak.saturating_add(1);
        self.highest_streak = self.highest_streak.max(self.current_streak);
        self.last_completed_date = Some(today);
    }

    /// Drop the current streak. The record is kept.
    pub fn break_streak(&mut self) {
        self.current_streak = 0;
    }

    /// Repair a snapshot that violates `highest >= current`.
    pub fn normalized(mut self) -> Self {
        self.highest_streak = self.highest_streak.max(self.current_streak);
        self
    }
}

/// What a rollover check found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RolloverKind {
    /// No date was stored yet; today is recorded.
    FirstUse,
    /// Still the same day, nothing changed.
    SameDay,
    /// The previous active day was yesterday.
    NextDay { goal_met: bool },
    /// More than one day passed, or the clock went backwards.
    Gap { days: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloverOutcome {
    pub kind: RolloverKind,
    pub from: Option<NaiveDate>,
    pub to: NaiveDate,
    pub streak_changed: bool,
}

impl RolloverOutcome {
    /// Whether the stored last-active date moved.
    pub fn date_changed(&self) -> bool {
        !matches!(self.kind, RolloverKind::SameDay)
    }

    /// Whether the daily progress counter was cleared.
    pub fn progress_reset(&self) -> bool {
        matches!(self.kind, RolloverKind::NextDay { .. } | RolloverKind::Gap { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreditOutcome {
    pub added: u32,
    pub before: u32,
    pub after: u32,
    /// The goal was crossed by this credit and today's streak day was not
    /// counted yet.
    pub goal_achieved: bool,
}

/// Daily progress plus streak.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalTracker {
    daily_progress_minutes: u32,
    last_active_date: Option<NaiveDate>,
    streak: StreakData,
}

impl GoalTracker {
    pub fn new(daily_progress_minutes: u32, last_active_date: Option<NaiveDate>, streak: StreakData) -> Self {
        Self {
            daily_progress_minutes,
            last_active_date,
            streak: streak.normalized(),
        }
    }

    pub fn daily_progress_minutes(&self) -> u32 {
        self.daily_progress_minutes
    }

    pub fn last_active_date(&self) -> Option<NaiveDate> {
        self.last_active_date
    }

    pub fn streak(&self) -> &StreakData {
        &self.streak
    }

    /// Percentage of the goal reached today, capped at 100.
    pub fn goal_progress_pct(&self, goal_minutes: u32) -> u32 {
        if goal_minutes == 0 {
            return 100;
        }
        let pct = (self.daily_progress_minutes as f64 / goal_minutes as f64 * 100.0).round();
        pct.min(100.0) as u32
    }

    /// Compare the last active date with `today` and roll the day over.
    ///
    /// The comparison is by calendar date only. Yesterday with the goal met
    /// extends the streak, yesterday without it leaves the streak alone, and
    /// any other date resets it.
    pub fn rollover(&mut self, today: NaiveDate, goal_minutes: u32) -> RolloverOutcome {
        let from = self.last_active_date;
        let Some(last) = from else {
            self.last_active_date = Some(today);
            return RolloverOutcome {
                kind: RolloverKind::FirstUse,
                from,
                to: today,
                streak_changed: false,
            };
        };

        if last == today {
            return RolloverOutcome {
                kind: RolloverKind::SameDay,
                from,
                to: today,
                streak_changed: false,
            };
        }

        let days = (today - last).num_days();
        let (kind, streak_changed) = if days == 1 {
            let goal_met = self.daily_progress_minutes >= goal_minutes;
            if goal_met {
                self.streak.extend(today);
            }
            (RolloverKind::NextDay { goal_met }, goal_met)
        } else {
            let changed = self.streak.current_streak != 0;
            self.streak.break_streak();
            (RolloverKind::Gap { days }, changed)
        };

        self.daily_progress_minutes = 0;
        self.last_active_date = Some(today);
        RolloverOutcome {
            kind,
            from,
            to: today,
            streak_changed,
        }
    }

    /// Add finished work minutes to today's progress.
    pub fn credit(&mut self, added: u32, today: NaiveDate, goal_minutes: u32) -> CreditOutcome {
        let before = self.daily_progress_minutes;
        let after = before.saturating_add(added);
        self.daily_progress_minutes = after;

        let crossed = before < goal_minutes && goal_minutes <= after;
        let goal_achieved = crossed && self.streak.last_completed_date != Some(today);
        if goal_achieved {
            self.streak.extend(today);
        }

        CreditOutcome {
            added,
            before,
            after,
            goal_achieved,
        }
    }
}
