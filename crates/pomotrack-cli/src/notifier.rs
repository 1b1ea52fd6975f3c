use std::io::Write;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use pomotrack_core::{Notifier, NotifyError};
use tracing::{debug, info};

/// Shows notifications inline in the terminal. Scheduled reminders cannot
/// outlive the process here, so they are only logged.
pub struct TerminalNotifier;

#[async_trait]
impl Notifier for TerminalNotifier {
    async fn request_permission(&self) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn schedule_at(&self, at: DateTime<Local>, title: &str, _body: &str) -> Result<(), NotifyError> {
        info!(at = %at.format("%Y-%m-%d %H:%M"), title, "next reminder");
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), NotifyError> {
        debug!("reminders cleared");
        Ok(())
    }

    async fn show_now(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let mut out = std::io::stdout().lock();
        writeln!(out, "\x07\n{title}\n  {body}").map_err(|e| NotifyError::Backend(e.to_string()))
    }
}
