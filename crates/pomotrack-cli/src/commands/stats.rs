use clap::Subcommand;
use pomotrack_core::stats::{daily_motivation, group_by_date, motivation};
use pomotrack_core::Config;

use crate::session::{self, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Focus minutes for the last seven days
    Week {
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Completed work sessions grouped by day
    History {
        /// Print the groups as JSON
        #[arg(long)]
        json: bool,
    },
    /// Daily goal progress and streak
    Streak,
}

pub fn run(action: StatsAction, config: &Config) -> CliResult {
    match action {
        StatsAction::Week { json } => {
            let summary = session::one_shot(config, |engine| async move { engine.weekly_summary().await })?;
            if json {
                return session::print_json(&summary);
            }
            for day in &summary.days {
                println!("{} {}  {:>4} min  {} sessions", day.weekday, day.date, day.work_minutes, day.sessions);
            }
            println!(
                "total {} min in {} sessions, {:.1} min/day",
                summary.total_minutes, summary.total_sessions, summary.avg_daily_minutes
            );
            if let Some(best) = &summary.most_productive {
                println!("best day: {} {} ({} min)", best.weekday, best.date, best.work_minutes);
            }
            println!("{}", motivation(summary.total_minutes));
        }
        StatsAction::History { json } => {
            let history = session::one_shot(config, |engine| async move { engine.history().await })?;
            let groups = group_by_date(&history);
            if json {
                return session::print_json(&groups);
            }
            if groups.is_empty() {
                println!("no completed sessions yet");
            }
            for group in &groups {
                println!("{}  {} min", group.date, group.total_focus_minutes);
                for record in &group.sessions {
                    let start = record.start_time.with_timezone(&chrono::Local);
                    println!("  {}  {} min", start.format("%H:%M"), record.duration);
                }
            }
        }
        StatsAction::Streak => {
            let snapshot = session::one_shot(config, |engine| async move { engine.snapshot().await })?;
            println!(
                "today: {}/{} min ({}%)",
                snapshot.daily_progress_minutes, snapshot.settings.daily_goal_minutes, snapshot.goal_progress_pct
            );
            println!(
                "streak: {} day(s), best {}",
                snapshot.streak.current_streak, snapshot.streak.highest_streak
            );
            println!("{}", daily_motivation(snapshot.goal_progress_pct));
        }
    }
    Ok(())
}
