use clap::Subcommand;
use pomotrack_core::Config;

use crate::session::{self, CliResult};

#[derive(Subcommand)]
pub enum ThemeAction {
    /// Print the current theme
    Show,
    /// Switch between light and dark
    Toggle,
}

pub fn run(action: ThemeAction, config: &Config) -> CliResult {
    let dark = match action {
        ThemeAction::Show => session::one_shot(config, |engine| async move { engine.snapshot().await.dark_mode })?,
        ThemeAction::Toggle => session::one_shot(config, |engine| async move { engine.toggle_dark_mode().await })?,
    };
    println!("{}", if dark { "dark" } else { "light" });
    Ok(())
}
