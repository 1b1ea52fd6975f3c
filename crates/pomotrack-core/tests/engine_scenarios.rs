//! End-to-end scenarios on the synchronous engine core.

use chrono::{DateTime, Duration, Local, TimeZone};
use pomotrack_core::events::Event;
use pomotrack_core::storage::PersistedState;
use pomotrack_core::{EngineCore, Phase, Settings, StreakData};

fn morning() -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap()
}

fn tick_until_completed(core: &mut EngineCore, now: &mut DateTime<Local>) -> Vec<Event> {
    loop {
        *now += Duration::seconds(1);
        let events = core.tick(*now);
        if events.iter().any(|e| matches!(e, Event::SessionCompleted { .. })) {
            return events;
        }
    }
}

#[test]
fn four_work_sessions_end_in_a_long_break() {
    let mut core = EngineCore::new(Settings::default());
    let mut now = morning();
    core.check_daily_rollover(now);
    core.start(now);

    let mut phases = vec![core.phase()];
    while core.history().len() < 4 {
        tick_until_completed(&mut core, &mut now);
        phases.push(core.phase());
    }

    assert_eq!(
        phases,
        vec![
            Phase::Work,
            Phase::ShortBreak,
            Phase::Work,
            Phase::ShortBreak,
            Phase::Work,
            Phase::ShortBreak,
            Phase::Work,
            Phase::LongBreak,
        ]
    );
    assert_eq!(core.history().len(), 4);
    assert!(core
        .history()
        .iter()
        .all(|r| r.phase == Phase::Work && r.duration == 25));
    // Newest first.
    assert!(core.history()[0].start_time > core.history()[3].start_time);
    assert_eq!(core.goals().daily_progress_minutes(), 100);
}

#[test]
fn crossing_the_daily_goal_extends_the_streak_once() {
    let today = morning();
    let state = PersistedState {
        daily_progress_minutes: 170,
        last_date: Some(today.date_naive()),
        ..Default::default()
    };
    let mut core = EngineCore::from_persisted(state);
    let mut now = today;
    core.start(now);

    let events = tick_until_completed(&mut core, &mut now);
    assert_eq!(core.goals().daily_progress_minutes(), 195);
    assert_eq!(core.goals().streak().current_streak, 1);
    let achieved = events
        .iter()
        .filter(|e| matches!(e, Event::GoalAchieved { .. }))
        .count();
    assert_eq!(achieved, 1);

    // The next session the same day adds progress but no second goal event.
    tick_until_completed(&mut core, &mut now);
    let events = tick_until_completed(&mut core, &mut now);
    assert!(!events.iter().any(|e| matches!(e, Event::GoalAchieved { .. })));
    assert_eq!(core.goals().daily_progress_minutes(), 220);
    assert_eq!(core.goals().streak().current_streak, 1);
}

#[test]
fn two_day_gap_resets_the_streak() {
    let state = PersistedState {
        daily_progress_minutes: 200,
        last_date: Some(morning().date_naive()),
        streak: StreakData {
            current_streak: 5,
            last_completed_date: Some(morning().date_naive()),
            highest_streak: 9,
        },
        ..Default::default()
    };
    let mut core = EngineCore::from_persisted(state);

    let events = core.check_daily_rollover(morning() + Duration::days(3));
    assert_eq!(core.goals().streak().current_streak, 0);
    assert_eq!(core.goals().streak().highest_streak, 9);
    assert_eq!(core.goals().daily_progress_minutes(), 0);
    assert!(events.iter().any(|e| matches!(e, Event::StreakChanged { .. })));
}

#[test]
fn custom_duration_leaves_settings_alone() {
    let mut core = EngineCore::new(Settings::default());
    core.set_custom_duration(10, morning()).unwrap();

    let snapshot = core.snapshot();
    assert_eq!(snapshot.timer.time_left_seconds, 600);
    assert_eq!(snapshot.timer.total_time_seconds, 600);
    assert_eq!(snapshot.settings.work_duration, 25);
}

#[test]
fn running_countdown_ignores_new_settings_until_next_phase() {
    let settings = Settings {
        work_duration: 1,
        ..Settings::default()
    };
    let mut core = EngineCore::new(settings);
    let mut now = morning();
    core.start(now);
    now += Duration::seconds(10);
    core.tick(now);

    let patch = pomotrack_core::SettingsPatch {
        work_duration: Some(50),
        short_break_duration: Some(7),
        ..Default::default()
    };
    core.update_settings(&patch, now).unwrap();
    assert_eq!(core.timer().total_secs(), 60);
    assert_eq!(core.timer().time_left_secs(), 59);

    tick_until_completed(&mut core, &mut now);
    assert_eq!(core.phase(), Phase::ShortBreak);
    assert_eq!(core.timer().total_secs(), 7 * 60);
}
