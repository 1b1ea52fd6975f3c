use clap::Subcommand;
use pomotrack_core::{Config, SettingsPatch, ValidationError};

use crate::session::{self, CliResult};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Print the current settings as JSON
    Show,
    /// Change one setting
    Set {
        /// camelCase key (e.g. "workDuration", "dailyGoalMinutes")
        key: String,
        /// New value
        value: String,
    },
}

pub fn run(action: SettingsAction, config: &Config) -> CliResult {
    let settings = match action {
        SettingsAction::Show => {
            session::one_shot(config, |engine| async move { engine.snapshot().await.settings })?
        }
        SettingsAction::Set { key, value } => {
            let patch = SettingsPatch::from_key_value(&key, &value)?;
            session::one_shot(config, |engine| async move {
                engine.update_settings(patch).await?;
                Ok::<_, ValidationError>(engine.snapshot().await.settings)
            })??
        }
    };
    session::print_json(&settings)
}
