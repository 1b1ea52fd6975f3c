//! # pomotrack core library
//!
//! Session sequencing for a focus timer: a countdown that alternates work
//! and break phases, a daily goal with a streak of consecutive successful
//! days, persistence of all of it through a key-value store, and a daily
//! reminder through a notification backend. The `pomotrack` CLI is a thin
//! front end over this crate.
//!
//! ## Architecture
//!
//! - **Timer**: pure state machines ([`TimerEngine`], [`GoalTracker`]) that
//!   take "now" as an argument and return [`Event`]s
//! - **Engine**: [`SessionEngine`] wraps them behind one async lock, owns the
//!   one-second ticker and turns events into store writes and notifications
//! - **Storage**: the [`Store`] trait with SQLite and in-memory backends, plus
//!   TOML-based [`Config`]
//! - **Notify**: the [`Notifier`] trait and reminder placement
//! - **Stats**: weekly and per-day views over session history

pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod notify;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{EngineCore, EngineOptions, SessionEngine, Snapshot};
pub use error::{ConfigError, CoreError, NotifyError, StorageError, ValidationError};
pub use events::Event;
pub use notify::{LogNotifier, MemoryNotifier, Notifier, ReminderWindow};
pub use settings::{Settings, SettingsPatch};
pub use storage::{Config, MemoryStore, SqliteStore, Store};
pub use timer::{EngineState, GoalTracker, Phase, SessionRecord, StreakData, TimerEngine};
