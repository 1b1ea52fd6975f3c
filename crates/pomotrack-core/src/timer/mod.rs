mod engine;
mod goals;
mod phase;

pub use engine::{Completion, EngineState, SessionRecord, TickOutcome, TimerEngine};
pub use goals::{CreditOutcome, GoalTracker, RolloverKind, RolloverOutcome, StreakData};
pub use phase::{next_phase, Phase};
