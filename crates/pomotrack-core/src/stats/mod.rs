//! Read-only views over session history.
//!
//! All grouping is by the local calendar date of a session's start time.

use std::collections::BTreeMap;

use chrono::{Duration, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, SessionRecord};

/// Work totals for a single day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayStats {
    pub date: NaiveDate,
    /// Short weekday name, e.g. `Mon`.
    pub weekday: String,
    pub work_minutes: u32,
    pub sessions: u32,
}

/// The seven days ending today.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklySummary {
    /// Oldest first.
    pub days: Vec<DayStats>,
    pub total_minutes: u32,
    pub total_sessions: u32,
    pub avg_daily_minutes: f64,
    /// First day holding the strict maximum; `None` when the week is empty.
    pub most_productive: Option<DayStats>,
}

/// Sessions sharing a start date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayGroup {
    pub date: NaiveDate,
    pub sessions: Vec<SessionRecord>,
    /// Work minutes only.
    pub total_focus_minutes: u32,
}

fn local_date(record: &SessionRecord) -> NaiveDate {
    record.start_time.with_timezone(&Local).date_naive()
}

pub fn weekly_summary(history: &[SessionRecord], today: NaiveDate) -> WeeklySummary {
    let mut days: Vec<DayStats> = (0..7)
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            DayStats {
                date,
                weekday: date.format("%a").to_string(),
                work_minutes: 0,
                sessions: 0,
            }
        })
        .collect();

    for record in history.iter().filter(|r| r.phase == Phase::Work) {
        let date = local_date(record);
        if let Some(day) = days.iter_mut().find(|d| d.date == date) {
            day.work_minutes += record.duration;
            day.sessions += 1;
        }
    }

    let total_minutes: u32 = days.iter().map(|d| d.work_minutes).sum();
    let total_sessions: u32 = days.iter().map(|d| d.sessions).sum();

    let mut most_productive: Option<&DayStats> = None;
    for day in &days {
        let best = most_productive.map_or(0, |d| d.work_minutes);
        if day.work_minutes > best {
            most_productive = Some(day);
        }
    }
    let most_productive = most_productive.cloned();

    WeeklySummary {
        avg_daily_minutes: total_minutes as f64 / 7.0,
        days,
        total_minutes,
        total_sessions,
        most_productive,
    }
}

/// Group history by start date, newest date first. Sessions keep their
/// order within a group.
pub fn group_by_date(history: &[SessionRecord]) -> Vec<DayGroup> {
    let mut grouped: BTreeMap<NaiveDate, Vec<SessionRecord>> = BTreeMap::new();
    for record in history {
        grouped.entry(local_date(record)).or_default().push(record.clone());
    }

    grouped
        .into_iter()
        .rev()
        .map(|(date, sessions)| {
            let total_focus_minutes = sessions
                .iter()
                .filter(|s| s.phase == Phase::Work)
                .map(|s| s.duration)
                .sum();
            DayGroup {
                date,
                sessions,
                total_focus_minutes,
            }
        })
        .collect()
}

/// Encouragement for a week's total focus minutes.
pub fn motivation(total_weekly_minutes: u32) -> &'static str {
    match total_weekly_minutes {
        0 => "Start your focus journey this week! ✨",
        1..=59 => "Great start to your focus practice! 🌱",
        60..=179 => "You're building a solid focus habit! 🌟",
        180..=299 => "Impressive focus consistency this week! 🔥",
        _ => "Outstanding dedication to your focus practice! 🏆",
    }
}

/// Encouragement for today's goal percentage.
pub fn daily_motivation(goal_pct: u32) -> &'static str {
    match goal_pct {
        0 => "Start your day with focus ✨",
        1..=24 => "Great start! Keep going 🌱",
        25..=49 => "You're making progress! 🌟",
        50..=74 => "Well done! You're over halfway there 🔥",
        75..=99 => "Almost there! Strong finish 💪",
        _ => "You reached your daily goal! Amazing work 🎉",
    }
}
