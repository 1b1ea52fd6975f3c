//! Daily reminder placement and notification texts.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Timelike};
use rand::Rng;

/// Local working-hours window, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReminderWindow {
    start_hour: u32,
    end_hour: u32,
}

impl Default for ReminderWindow {
    fn default() -> Self {
        Self {
            start_hour: 9,
            end_hour: 17,
        }
    }
}

impl ReminderWindow {
    /// `None` unless `start <= end <= 23`.
    pub fn new(start_hour: u32, end_hour: u32) -> Option<Self> {
        (start_hour <= end_hour && end_hour <= 23).then_some(Self {
            start_hour,
            end_hour,
        })
    }

    pub fn start_hour(&self) -> u32 {
        self.start_hour
    }

    pub fn end_hour(&self) -> u32 {
        self.end_hour
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub title: String,
    pub body: String,
}

pub fn reminder_message(progress_minutes: u32, goal_minutes: u32) -> Message {
    Message {
        title: "Don't forget your Pomodoro goal!".into(),
        body: format!(
            "You've completed {progress_minutes} minutes of your {goal_minutes} minute goal today. Keep going!"
        ),
    }
}

pub fn goal_achieved_message(goal_minutes: u32, current_streak: u32) -> Message {
    Message {
        title: "Daily Goal Achieved! 🎉".into(),
        body: format!(
            "Congratulations! You've reached your daily goal of {goal_minutes} minutes. Current streak: {current_streak} days!"
        ),
    }
}

/// Pick the next reminder instant: a uniformly random hour and minute inside
/// `window`, today if that is still ahead of `now`, otherwise tomorrow.
pub fn plan_reminder<R: Rng + ?Sized>(now: DateTime<Local>, window: ReminderWindow, rng: &mut R) -> DateTime<Local> {
    let hour = rng.gen_range(window.start_hour..=window.end_hour);
    let minute = rng.gen_range(0..60);

    let today = now.date_naive();
    for offset in 0..=2 {
        let Some(date) = today.checked_add_signed(Duration::days(offset)) else {
            break;
        };
        if let Some(at) = local_at(date, hour, minute) {
            if at > now {
                return at;
            }
        }
    }
    // Only reachable when the chosen wall time never exists locally.
    (now + Duration::days(1)).with_second(0).unwrap_or(now + Duration::days(1))
}

fn local_at(date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Local>> {
    let naive = date.and_hms_opt(hour, minute, 0)?;
    Local.from_local_datetime(&naive).earliest()
}
