use std::io::{self, Write};
use std::sync::Arc;

use clap::Subcommand;
use pomotrack_core::{Config, Event, Phase, ValidationError};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;

use crate::notifier::TerminalNotifier;
use crate::session::{self, CliResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Run the countdown in the foreground until Ctrl-C
    Run {
        /// Stop after this many phases have completed
        #[arg(long)]
        phases: Option<u32>,
    },
    /// Print current timer state as JSON
    Status,
    /// Reset the current phase to its full length
    Reset,
    /// Move to the next phase without recording the current one
    Skip,
    /// Give the current (paused) phase a one-off length
    Duration {
        /// Minutes, greater than zero
        minutes: u32,
    },
}

pub fn run(action: TimerAction, config: &Config) -> CliResult {
    let snapshot = match action {
        TimerAction::Run { phases } => return run_foreground(config, phases),
        TimerAction::Status => session::one_shot(config, |engine| async move { engine.snapshot().await })?,
        TimerAction::Reset => session::one_shot(config, |engine| async move {
            engine.reset().await;
            engine.snapshot().await
        })?,
        TimerAction::Skip => session::one_shot(config, |engine| async move {
            engine.skip().await;
            engine.snapshot().await
        })?,
        TimerAction::Duration { minutes } => session::one_shot(config, |engine| async move {
            engine.set_custom_duration(minutes).await?;
            Ok::<_, ValidationError>(engine.snapshot().await)
        })??,
    };
    session::print_json(&snapshot)
}

fn run_foreground(config: &Config, phases: Option<u32>) -> CliResult {
    session::block_on(async {
        let engine = session::open(config, Arc::new(TerminalNotifier)).await?;
        let mut events = engine.subscribe();
        engine.start().await;

        let watched = watch(&mut events, phases).await;
        engine.shutdown().await;

        let snapshot = engine.snapshot().await;
        println!();
        println!(
            "today: {}/{} min ({}%), streak {}",
            snapshot.daily_progress_minutes,
            snapshot.settings.daily_goal_minutes,
            snapshot.goal_progress_pct,
            snapshot.streak.current_streak
        );
        watched
    })?
}

/// Render events until Ctrl-C or until `phases` completions were seen.
async fn watch(events: &mut broadcast::Receiver<Event>, phases: Option<u32>) -> CliResult {
    let mut completed = 0u32;
    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                return Ok(());
            }
            event = events.recv() => match event {
                Ok(Event::TimerStarted { phase, time_left_secs, .. })
                | Ok(Event::TimerTicked { phase, time_left_secs, .. }) => render(phase, time_left_secs)?,
                Ok(Event::SessionCompleted { phase, next_phase, record, .. }) => {
                    completed += 1;
                    match record {
                        Some(record) => println!("\r{} complete ({} min)", phase.label(), record.duration),
                        None => println!("\r{} complete", phase.label()),
                    }
                    println!("next: {}", next_phase.label());
                    if phases.is_some_and(|limit| completed >= limit) {
                        return Ok(());
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => debug!(missed, "status line fell behind"),
                Err(RecvError::Closed) => return Ok(()),
            },
        }
    }
}

fn render(phase: Phase, time_left_secs: u32) -> io::Result<()> {
    let mut out = io::stdout().lock();
    write!(
        out,
        "\r{:<12} {:02}:{:02}",
        phase.label(),
        time_left_secs / 60,
        time_left_secs % 60
    )?;
    out.flush()
}
