//! Integration tests for the async session engine: ticker, persistence
//! round-trips and notifier behaviour.

mod common;

use std::sync::Arc;
use std::time::Duration;

use chrono::Duration as ChronoDuration;
use pomotrack_core::notify::NotifierCall;
use pomotrack_core::storage::keys;
use pomotrack_core::{
    EngineState, Event, ManualClock, MemoryNotifier, MemoryStore, Phase, SessionEngine, SettingsPatch, SqliteStore,
    Store, ValidationError,
};

use common::{manual_options, morning, ticking_options};

async fn tick_n(engine: &SessionEngine, clock: &ManualClock, n: u32) {
    for _ in 0..n {
        clock.advance(ChronoDuration::seconds(1));
        engine.tick().await;
    }
}

fn stored_timer(store: &MemoryStore) -> EngineState {
    serde_json::from_str(&store.value(keys::TIMER).expect("timer persisted")).unwrap()
}

#[tokio::test(start_paused = true)]
async fn ticker_counts_down_and_pause_stops_it() {
    let store = MemoryStore::new();
    let engine = SessionEngine::load(Arc::new(store.clone()), Arc::new(MemoryNotifier::new()), ticking_options()).await;

    engine.start().await;
    tokio::time::sleep(Duration::from_millis(5_500)).await;
    engine.pause().await;
    assert_eq!(engine.snapshot().await.timer.time_left_seconds, 1500 - 5);

    tokio::time::sleep(Duration::from_secs(30)).await;
    let snapshot = engine.snapshot().await;
    assert!(!snapshot.timer.is_running);
    assert_eq!(snapshot.timer.time_left_seconds, 1500 - 5);

    engine.shutdown().await;
    assert_eq!(stored_timer(&store).time_left_seconds, 1500 - 5);
}

#[tokio::test(start_paused = true)]
async fn starting_twice_runs_a_single_ticker() {
    let engine = SessionEngine::load(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryNotifier::new()),
        ticking_options(),
    )
    .await;

    engine.start().await;
    let first_start = engine.snapshot().await.timer.session_start;
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    engine.start().await;
    tokio::time::sleep(Duration::from_secs(8)).await;

    let snapshot = engine.snapshot().await;
    assert_eq!(snapshot.timer.time_left_seconds, 1500 - 10);
    assert_eq!(snapshot.timer.session_start, first_start);
    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn ticker_completes_a_work_session_and_keeps_running() {
    let engine = SessionEngine::load(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryNotifier::new()),
        ticking_options(),
    )
    .await;
    engine
        .update_settings(SettingsPatch {
            work_duration: Some(1),
            ..Default::default()
        })
        .await
        .unwrap();

    engine.start().await;
    tokio::time::sleep(Duration::from_millis(60_500)).await;

    let snapshot = engine.snapshot().await;
    assert_eq!(snapshot.history.len(), 1);
    assert_eq!(snapshot.history[0].duration, 1);
    assert_eq!(snapshot.timer.current_session_type, Phase::ShortBreak);
    assert!(snapshot.timer.is_running);
    assert_eq!(snapshot.daily_progress_minutes, 1);

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(engine.snapshot().await.timer.time_left_seconds, 300 - 3);
    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn heartbeat_persists_the_running_countdown() {
    let store = MemoryStore::new();
    let engine = SessionEngine::load(Arc::new(store.clone()), Arc::new(MemoryNotifier::new()), ticking_options()).await;

    engine.start().await;
    tokio::time::sleep(Duration::from_millis(10_500)).await;
    assert_eq!(stored_timer(&store).time_left_seconds, 1500 - 10);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(stored_timer(&store).time_left_seconds, 1500 - 10);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(stored_timer(&store).time_left_seconds, 1500 - 20);
    engine.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn failing_store_never_stops_the_countdown() {
    let store = MemoryStore::new();
    store.fail_writes(true);
    let engine = SessionEngine::load(Arc::new(store.clone()), Arc::new(MemoryNotifier::new()), ticking_options()).await;

    engine.start().await;
    tokio::time::sleep(Duration::from_millis(12_500)).await;
    assert_eq!(engine.snapshot().await.timer.time_left_seconds, 1500 - 12);
    assert!(engine.toggle_dark_mode().await);

    engine.shutdown().await;
    assert_eq!(store.write_count(), 0);
    assert!(store.value(keys::THEME).is_none());
}

#[tokio::test]
async fn round_trip_through_memory_store() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(morning()));
    let engine = SessionEngine::load(
        Arc::new(store.clone()),
        Arc::new(MemoryNotifier::new()),
        manual_options(clock.clone()),
    )
    .await;

    engine
        .update_settings(SettingsPatch {
            work_duration: Some(2),
            daily_goal_minutes: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    engine.toggle_dark_mode().await;
    engine.start().await;
    tick_n(&engine, &clock, 120).await;
    tick_n(&engine, &clock, 30).await;
    let before = engine.snapshot().await;
    engine.shutdown().await;

    assert_eq!(before.history.len(), 1);
    assert_eq!(before.streak.current_streak, 1);

    let reloaded = SessionEngine::load(
        Arc::new(store.clone()),
        Arc::new(MemoryNotifier::new()),
        manual_options(clock.clone()),
    )
    .await;
    let after = reloaded.snapshot().await;

    assert_eq!(after.settings, before.settings);
    assert_eq!(after.history, before.history);
    assert_eq!(after.streak, before.streak);
    assert_eq!(after.daily_progress_minutes, before.daily_progress_minutes);
    assert_eq!(after.last_active_date, before.last_active_date);
    assert!(after.dark_mode);
    assert_eq!(after.timer.current_session_type, Phase::ShortBreak);
    assert_eq!(after.timer.time_left_seconds, before.timer.time_left_seconds);
    assert!(!after.timer.is_running);
    reloaded.shutdown().await;
}

#[tokio::test]
async fn round_trip_through_sqlite_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pomotrack.db");
    let clock = Arc::new(ManualClock::new(morning()));

    let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&path).unwrap());
    let engine = SessionEngine::load(store, Arc::new(MemoryNotifier::new()), manual_options(clock.clone())).await;
    engine.set_custom_duration(1).await.unwrap();
    engine.start().await;
    tick_n(&engine, &clock, 60).await;
    engine
        .update_settings(SettingsPatch {
            sessions_before_long_break: Some(2),
            ..Default::default()
        })
        .await
        .unwrap();
    let before = engine.snapshot().await;
    engine.shutdown().await;

    let store: Arc<dyn Store> = Arc::new(SqliteStore::open(&path).unwrap());
    let reloaded = SessionEngine::load(store, Arc::new(MemoryNotifier::new()), manual_options(clock)).await;
    let after = reloaded.snapshot().await;

    assert_eq!(after.history, before.history);
    assert_eq!(after.history.len(), 1);
    assert_eq!(after.settings.sessions_before_long_break, 2);
    assert_eq!(after.daily_progress_minutes, 1);
    assert_eq!(after.timer.completed_work_sessions, 1);
    reloaded.shutdown().await;
}

#[tokio::test]
async fn goal_notification_fires_once_and_reminder_is_planned() {
    let today = morning().date_naive().format("%Y-%m-%d").to_string();
    let store = MemoryStore::with_values([
        (keys::DAILY_PROGRESS, "170".to_string()),
        (keys::LAST_DATE, today),
    ]);
    let notifier = MemoryNotifier::new();
    let clock = Arc::new(ManualClock::new(morning()));
    let engine = SessionEngine::load(Arc::new(store.clone()), Arc::new(notifier.clone()), manual_options(clock.clone())).await;

    engine.start().await;
    tick_n(&engine, &clock, 1500).await;
    tick_n(&engine, &clock, 300).await;
    tick_n(&engine, &clock, 1500).await;
    engine.shutdown().await;

    let shown = notifier.shown();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].0, "Daily Goal Achieved! 🎉");
    assert_eq!(
        shown[0].1,
        "Congratulations! You've reached your daily goal of 180 minutes. Current streak: 1 days!"
    );

    let pending = notifier.pending();
    assert_eq!(pending.len(), 1);
    assert!(pending[0] > morning());
    assert_eq!(store.value(keys::DAILY_PROGRESS).as_deref(), Some("220"));
}

#[tokio::test]
async fn goal_notification_ignores_the_reminder_switch() {
    let today = morning().date_naive().format("%Y-%m-%d").to_string();
    let store = MemoryStore::with_values([
        (keys::DAILY_PROGRESS, "170".to_string()),
        (keys::LAST_DATE, today),
        (keys::SETTINGS, r#"{"notificationsEnabled":false}"#.to_string()),
    ]);
    let notifier = MemoryNotifier::new();
    let clock = Arc::new(ManualClock::new(morning()));
    let engine = SessionEngine::load(Arc::new(store.clone()), Arc::new(notifier.clone()), manual_options(clock.clone())).await;

    engine.start().await;
    tick_n(&engine, &clock, 1500).await;
    engine.shutdown().await;

    let snapshot = engine.snapshot().await;
    assert_eq!(snapshot.daily_progress_minutes, 195);
    assert_eq!(snapshot.streak.current_streak, 1);
    assert_eq!(notifier.shown().len(), 1);
    assert_eq!(notifier.shown()[0].0, "Daily Goal Achieved! 🎉");
    assert!(notifier.pending().is_empty());
}

#[tokio::test]
async fn failing_notifier_never_blocks_progress() {
    let today = morning().date_naive().format("%Y-%m-%d").to_string();
    let store = MemoryStore::with_values([
        (keys::DAILY_PROGRESS, "170".to_string()),
        (keys::LAST_DATE, today),
    ]);
    let notifier = MemoryNotifier::failing();
    let clock = Arc::new(ManualClock::new(morning()));
    let engine = SessionEngine::load(Arc::new(store.clone()), Arc::new(notifier.clone()), manual_options(clock.clone())).await;

    engine.start().await;
    tick_n(&engine, &clock, 1500).await;
    engine.shutdown().await;

    // Every call still reached the backend even though each one failed.
    assert_eq!(notifier.shown().len(), 1);
    assert!(notifier.pending().is_empty());
    assert!(notifier
        .calls()
        .iter()
        .any(|call| matches!(call, NotifierCall::ScheduleAt { .. })));
    assert_eq!(store.value(keys::DAILY_PROGRESS).as_deref(), Some("195"));
    assert_eq!(engine.snapshot().await.timer.current_session_type, Phase::ShortBreak);
}

#[tokio::test]
async fn disabling_notifications_cancels_the_reminder() {
    let notifier = MemoryNotifier::new();
    let clock = Arc::new(ManualClock::new(morning()));
    let engine = SessionEngine::load(Arc::new(MemoryStore::new()), Arc::new(notifier.clone()), manual_options(clock)).await;

    engine
        .update_settings(SettingsPatch {
            notifications_enabled: Some(false),
            ..Default::default()
        })
        .await
        .unwrap();
    engine.shutdown().await;

    assert!(notifier.pending().is_empty());
    assert_eq!(notifier.calls().last(), Some(&NotifierCall::CancelAll));
}

#[tokio::test]
async fn denied_permission_silences_every_call() {
    let notifier = MemoryNotifier::denying();
    let clock = Arc::new(ManualClock::new(morning()));
    let engine = SessionEngine::load(Arc::new(MemoryStore::new()), Arc::new(notifier.clone()), manual_options(clock)).await;

    engine
        .update_settings(SettingsPatch {
            daily_goal_minutes: Some(60),
            ..Default::default()
        })
        .await
        .unwrap();
    engine.shutdown().await;

    assert_eq!(notifier.calls(), vec![NotifierCall::RequestPermission]);
}

#[tokio::test]
async fn rollover_on_load_resets_streak_after_a_gap() {
    let three_days_ago = (morning() - ChronoDuration::days(3)).date_naive();
    let store = MemoryStore::with_values([
        (keys::LAST_DATE, three_days_ago.format("%Y-%m-%d").to_string()),
        (keys::DAILY_PROGRESS, "200".to_string()),
        (
            keys::STREAK,
            r#"{"currentStreak":4,"lastCompletedDate":null,"highestStreak":6}"#.to_string(),
        ),
    ]);
    let clock = Arc::new(ManualClock::new(morning()));
    let engine = SessionEngine::load(Arc::new(store.clone()), Arc::new(MemoryNotifier::new()), manual_options(clock)).await;

    let snapshot = engine.snapshot().await;
    assert_eq!(snapshot.streak.current_streak, 0);
    assert_eq!(snapshot.streak.highest_streak, 6);
    assert_eq!(snapshot.daily_progress_minutes, 0);
    engine.shutdown().await;

    let today = morning().date_naive().format("%Y-%m-%d").to_string();
    assert_eq!(store.value(keys::LAST_DATE), Some(today));
    assert_eq!(store.value(keys::DAILY_PROGRESS).as_deref(), Some("0"));
}

#[tokio::test]
async fn invalid_input_is_rejected_without_side_effects() {
    let store = MemoryStore::new();
    let clock = Arc::new(ManualClock::new(morning()));
    let engine = SessionEngine::load(Arc::new(store.clone()), Arc::new(MemoryNotifier::new()), manual_options(clock)).await;

    let err = engine
        .update_settings(SettingsPatch {
            work_duration: Some(0),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err, ValidationError::NonPositive { field: "workDuration" });

    engine.start().await;
    assert_eq!(
        engine.set_custom_duration(5).await,
        Err(ValidationError::TimerRunning {
            operation: "setCustomDuration"
        })
    );
    engine.shutdown().await;
    assert!(store.value(keys::SETTINGS).is_none());
}

#[tokio::test]
async fn subscribers_see_events_in_order() {
    let clock = Arc::new(ManualClock::new(morning()));
    let engine = SessionEngine::load(
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryNotifier::new()),
        manual_options(clock.clone()),
    )
    .await;
    let mut events = engine.subscribe();

    engine.start().await;
    tick_n(&engine, &clock, 1).await;
    engine.pause().await;
    engine.skip().await;

    assert!(matches!(events.recv().await.unwrap(), Event::TimerStarted { .. }));
    assert!(matches!(
        events.recv().await.unwrap(),
        Event::TimerTicked {
            time_left_secs: 1499,
            ..
        }
    ));
    assert!(matches!(events.recv().await.unwrap(), Event::TimerPaused { .. }));
    assert!(matches!(
        events.recv().await.unwrap(),
        Event::TimerSkipped {
            to: Phase::ShortBreak,
            ..
        }
    ));
    engine.shutdown().await;
}
