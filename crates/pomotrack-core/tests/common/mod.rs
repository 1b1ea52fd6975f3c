//! Shared helpers for the engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use pomotrack_core::{Clock, EngineOptions, ManualClock};

/// Local wall time that follows tokio's (possibly paused) clock.
pub struct TokioClock {
    base: DateTime<Local>,
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn starting_at(base: DateTime<Local>) -> Self {
        Self {
            base,
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Local> {
        let elapsed = chrono::Duration::from_std(self.origin.elapsed()).unwrap_or_else(|_| chrono::Duration::zero());
        self.base + elapsed
    }
}

pub fn morning() -> DateTime<Local> {
    Local.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap()
}

/// Options for tests that drive ticks by hand: the ticker interval is long
/// enough never to fire.
pub fn manual_options(clock: Arc<ManualClock>) -> EngineOptions {
    EngineOptions {
        tick_interval: Duration::from_secs(24 * 3600),
        ..EngineOptions::default()
    }
    .with_clock(clock)
    .with_seed(42)
}

/// Options for tests running on tokio's paused clock with a real ticker.
pub fn ticking_options() -> EngineOptions {
    EngineOptions::default()
        .with_clock(Arc::new(TokioClock::starting_at(morning())))
        .with_seed(42)
}
