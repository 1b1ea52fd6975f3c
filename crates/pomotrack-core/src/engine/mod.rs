//! Asynchronous session engine.
//!
//! [`SessionEngine`] is a cheap, clonable handle. All state sits behind one
//! `tokio::sync::Mutex`, and every action, the periodic tick included, runs
//! its whole mutation while holding it. Each mutation:
//!
//! 1. runs on the synchronous [`EngineCore`] and yields events,
//! 2. queues store writes and notifier calls for those events,
//! 3. broadcasts the events to subscribers.
//!
//! The countdown is driven by a ticker task that only exists while the timer
//! runs. A generation counter lets a tick that raced with `pause()` notice it
//! is stale and exit without touching state.

mod machine;
mod effects;
mod ticker;

pub use self::machine::{EngineCore, Snapshot};

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use self::effects::{dirty_keys, encode_key, Effects, NotifyJob};
use crate::clock::{Clock, SystemClock};
use crate::error::{ConfigError, ValidationError};
use crate::events::Event;
use crate::notify::{goal_achieved_message, plan_reminder, reminder_message, Notifier, ReminderWindow};
use crate::settings::SettingsPatch;
use crate::stats::{self, WeeklySummary};
use crate::storage::{keys, Config, PersistedState, Store};
use crate::timer::SessionRecord;

const EVENT_CAPACITY: usize = 256;

/// Construction options for [`SessionEngine`].
#[derive(Clone)]
pub struct EngineOptions {
    pub clock: Arc<dyn Clock>,
    pub tick_interval: Duration,
    /// Persist the running countdown every this many ticks.
    pub heartbeat_every_ticks: u32,
    pub reminder_window: ReminderWindow,
    /// Seed for reminder placement. `None` seeds from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            tick_interval: Duration::from_secs(1),
            heartbeat_every_ticks: 10,
            reminder_window: ReminderWindow::default(),
            rng_seed: None,
        }
    }
}

impl EngineOptions {
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            tick_interval: config.timer.tick_interval(),
            heartbeat_every_ticks: config.timer.heartbeat_every_ticks,
            reminder_window: config.reminder.window()?,
            ..Self::default()
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }
}

pub(crate) struct Shared {
    state: Mutex<Inner>,
    events: broadcast::Sender<Event>,
    clock: Arc<dyn Clock>,
    tick_interval: Duration,
    heartbeat_every_ticks: u32,
    reminder_window: ReminderWindow,
}

struct Inner {
    core: EngineCore,
    ticker: Option<JoinHandle<()>>,
    generation: u64,
    ticks_since_persist: u32,
    rng: StdRng,
    /// `None` after shutdown.
    effects: Option<Effects>,
}

impl Inner {
    fn stop_ticker(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Shared {
    /// Queue side effects for `events` and broadcast them. Must be called
    /// with the state lock held.
    fn commit(&self, inner: &mut Inner, events: Vec<Event>) {
        if events.is_empty() {
            return;
        }

        let mut dirty = dirty_keys(&events);
        if events.iter().any(|e| matches!(e, Event::TimerTicked { .. })) {
            inner.ticks_since_persist += 1;
            if inner.ticks_since_persist >= self.heartbeat_every_ticks {
                dirty.insert(keys::TIMER);
            }
        }
        if dirty.contains(keys::TIMER) {
            inner.ticks_since_persist = 0;
        }

        let mut notifications = Vec::new();
        for event in &events {
            match event {
                // Only the permission gate can silence this one.
                Event::GoalAchieved {
                    goal_minutes,
                    current_streak,
                    ..
                } => {
                    notifications.push(NotifyJob::ShowNow(goal_achieved_message(*goal_minutes, *current_streak)));
                }
                Event::SettingsChanged { .. } => notifications.push(self.reminder_job(inner)),
                _ => {}
            }
        }

        match &inner.effects {
            Some(effects) => {
                for key in dirty {
                    if let Some(job) = encode_key(&inner.core, key) {
                        effects.write(job);
                    }
                }
                for job in notifications {
                    effects.notify(job);
                }
            }
            None => debug!("engine shut down, side effects dropped"),
        }

        for event in events {
            // No subscribers is fine.
            let _ = self.events.send(event);
        }
    }

    fn reminder_job(&self, inner: &mut Inner) -> NotifyJob {
        let settings = inner.core.settings();
        let reminder = if settings.notifications_enabled {
            let at = plan_reminder(self.clock.now(), self.reminder_window, &mut inner.rng);
            let message = reminder_message(inner.core.goals().daily_progress_minutes(), settings.daily_goal_minutes);
            debug!(%at, "reminder planned");
            Some((at, message))
        } else {
            None
        };
        NotifyJob::Reschedule { reminder }
    }

    /// One tick from the ticker task. Returns `false` when the ticker should
    /// stop.
    async fn tick_from_ticker(&self, generation: u64) -> bool {
        let mut inner = self.state.lock().await;
        if inner.generation != generation || !inner.core.timer().is_running() {
            return false;
        }
        let events = inner.core.tick(self.clock.now());
        self.commit(&mut inner, events);
        inner.core.timer().is_running()
    }
}

/// Handle to the running engine.
#[derive(Clone)]
pub struct SessionEngine {
    shared: Arc<Shared>,
}

impl SessionEngine {
    /// Read persisted state, start the side-effect workers, run the daily
    /// rollover check and plan the first reminder.
    ///
    /// Storage failures never fail the load; affected keys fall back to
    /// defaults.
    pub async fn load(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>, options: EngineOptions) -> Self {
        let persisted = PersistedState::load(store.as_ref()).await;
        let core = EngineCore::from_persisted(persisted);
        let rng = match options.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        let shared = Arc::new(Shared {
            state: Mutex::new(Inner {
                core,
                ticker: None,
                generation: 0,
                ticks_since_persist: 0,
                rng,
                effects: Some(Effects::spawn(store, notifier)),
            }),
            events,
            clock: options.clock,
            tick_interval: options.tick_interval,
            heartbeat_every_ticks: options.heartbeat_every_ticks.max(1),
            reminder_window: options.reminder_window,
        });

        {
            let mut inner = shared.state.lock().await;
            let events = inner.core.check_daily_rollover(shared.clock.now());
            shared.commit(&mut inner, events);
            let job = shared.reminder_job(&mut inner);
            if let Some(effects) = &inner.effects {
                effects.notify(job);
            }
        }

        Self { shared }
    }

    /// Receive every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.events.subscribe()
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.shared.state.lock().await.core.snapshot()
    }

    /// Newest first.
    pub async fn history(&self) -> Vec<SessionRecord> {
        self.shared.state.lock().await.core.history().to_vec()
    }

    pub async fn weekly_summary(&self) -> WeeklySummary {
        let today = self.shared.clock.today();
        let inner = self.shared.state.lock().await;
        stats::weekly_summary(inner.core.history(), today)
    }

    /// Start or resume. A no-op while already running.
    pub async fn start(&self) {
        let mut inner = self.shared.state.lock().await;
        let events = inner.core.start(self.shared.clock.now());
        if events.is_empty() {
            return;
        }
        inner.stop_ticker();
        let generation = inner.generation;
        inner.ticker = Some(ticker::spawn(
            Arc::downgrade(&self.shared),
            generation,
            self.shared.tick_interval,
        ));
        self.shared.commit(&mut inner, events);
    }

    pub async fn pause(&self) {
        let mut inner = self.shared.state.lock().await;
        inner.stop_ticker();
        let events = inner.core.pause(self.shared.clock.now());
        self.shared.commit(&mut inner, events);
    }

    pub async fn reset(&self) {
        let mut inner = self.shared.state.lock().await;
        inner.stop_ticker();
        let events = inner.core.reset(self.shared.clock.now());
        self.shared.commit(&mut inner, events);
    }

    pub async fn skip(&self) {
        let mut inner = self.shared.state.lock().await;
        inner.stop_ticker();
        let events = inner.core.skip(self.shared.clock.now());
        self.shared.commit(&mut inner, events);
    }

    /// Count one second by hand. Ignored while paused.
    ///
    /// Only for driving an engine whose periodic ticker never fires, such as
    /// one built with a very long `tick_interval`. Calling it while the ticker
    /// is live counts every such call as an extra second.
    pub async fn tick(&self) {
        let mut inner = self.shared.state.lock().await;
        let events = inner.core.tick(self.shared.clock.now());
        self.shared.commit(&mut inner, events);
    }

    /// Override the current phase length while paused.
    pub async fn set_custom_duration(&self, minutes: u32) -> Result<(), ValidationError> {
        let mut inner = self.shared.state.lock().await;
        let events = inner.core.set_custom_duration(minutes, self.shared.clock.now())?;
        self.shared.commit(&mut inner, events);
        Ok(())
    }

    /// Merge `patch` into the settings and reschedule the reminder.
    pub async fn update_settings(&self, patch: SettingsPatch) -> Result<(), ValidationError> {
        let mut inner = self.shared.state.lock().await;
        let events = inner.core.update_settings(&patch, self.shared.clock.now())?;
        self.shared.commit(&mut inner, events);
        Ok(())
    }

    /// Flip the theme flag and return the new value.
    pub async fn toggle_dark_mode(&self) -> bool {
        let mut inner = self.shared.state.lock().await;
        let events = inner.core.toggle_dark_mode(self.shared.clock.now());
        self.shared.commit(&mut inner, events);
        inner.core.dark_mode()
    }

    /// Run the daily rollover against the current date. Call on every
    /// foreground activation.
    pub async fn check_daily_rollover(&self) {
        let mut inner = self.shared.state.lock().await;
        let events = inner.core.check_daily_rollover(self.shared.clock.now());
        self.shared.commit(&mut inner, events);
    }

    /// Pause a running timer, stop the ticker and wait until every queued
    /// write and notification has been handed to the collaborators. Later
    /// actions still change in-memory state but are no longer persisted.
    pub async fn shutdown(&self) {
        let workers = {
            let mut inner = self.shared.state.lock().await;
            inner.stop_ticker();
            let events = inner.core.pause(self.shared.clock.now());
            self.shared.commit(&mut inner, events);
            inner.effects.take().map(Effects::close).unwrap_or_default()
        };
        for worker in workers {
            if let Err(e) = worker.await {
                warn!(error = %e, "side-effect worker ended abnormally");
            }
        }
        debug!("engine shut down");
    }
}
