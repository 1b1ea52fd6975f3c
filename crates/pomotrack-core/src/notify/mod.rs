//! Local notification collaborator.
//!
//! The engine talks to a [`Notifier`] through a background worker. Before the
//! first call the worker asks for permission once; when the answer is no,
//! every later call is dropped without reaching the backend.

mod reminder;

pub use reminder::{goal_achieved_message, plan_reminder, reminder_message, Message, ReminderWindow};

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Local};
use tracing::{debug, info};

use crate::error::NotifyError;

/// Platform notification backend.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Ask the user for permission. `Err(NotifyError::PermissionDenied)` when
    /// refused.
    async fn request_permission(&self) -> Result<(), NotifyError>;

    async fn schedule_at(&self, at: DateTime<Local>, title: &str, body: &str) -> Result<(), NotifyError>;

    /// Drop every pending scheduled notification.
    async fn cancel_all(&self) -> Result<(), NotifyError>;

    async fn show_now(&self, title: &str, body: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Permission {
    Unknown,
    Granted,
    Denied,
}

/// Wraps a notifier with the ask-once permission rule.
pub(crate) struct PermissionGate {
    notifier: Arc<dyn Notifier>,
    permission: Permission,
}

impl PermissionGate {
    pub(crate) fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self {
            notifier,
            permission: Permission::Unknown,
        }
    }

    /// The wrapped notifier, or `None` when permission was refused.
    pub(crate) async fn notifier(&mut self) -> Option<&dyn Notifier> {
        if self.permission == Permission::Unknown {
            self.permission = match self.notifier.request_permission().await {
                Ok(()) => Permission::Granted,
                Err(e) => {
                    info!(error = %e, "notifications disabled");
                    Permission::Denied
                }
            };
        }
        match self.permission {
            Permission::Granted => Some(self.notifier.as_ref()),
            _ => {
                debug!("notification skipped, permission denied");
                None
            }
        }
    }
}

/// Writes notifications to the log instead of a desktop backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn request_permission(&self) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn schedule_at(&self, at: DateTime<Local>, title: &str, body: &str) -> Result<(), NotifyError> {
        info!(%at, title, body, "reminder scheduled");
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), NotifyError> {
        debug!("pending reminders cancelled");
        Ok(())
    }

    async fn show_now(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        info!(title, body, "notification");
        Ok(())
    }
}

/// One call received by a [`MemoryNotifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    RequestPermission,
    ScheduleAt {
        at: DateTime<Local>,
        title: String,
        body: String,
    },
    CancelAll,
    ShowNow {
        title: String,
        body: String,
    },
}

/// Records every call. Used by tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryNotifier {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    deny: bool,
    broken: bool,
    calls: Vec<NotifierCall>,
    pending: Vec<DateTime<Local>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose permission request is refused.
    pub fn denying() -> Self {
        let notifier = Self::default();
        notifier.lock().deny = true;
        notifier
    }

    /// A notifier that grants permission but whose backend fails every
    /// schedule and show call.
    pub fn failing() -> Self {
        let notifier = Self::default();
        notifier.lock().broken = true;
        notifier
    }

    pub fn calls(&self) -> Vec<NotifierCall> {
        self.lock().calls.clone()
    }

    /// Scheduled instants not yet cancelled.
    pub fn pending(&self) -> Vec<DateTime<Local>> {
        self.lock().pending.clone()
    }

    /// Titles and bodies of immediate notifications, oldest first.
    pub fn shown(&self) -> Vec<(String, String)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                NotifierCall::ShowNow { title, body } => Some((title.clone(), body.clone())),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn request_permission(&self) -> Result<(), NotifyError> {
        let mut inner = self.lock();
        inner.calls.push(NotifierCall::RequestPermission);
        if inner.deny {
            Err(NotifyError::PermissionDenied)
        } else {
            Ok(())
        }
    }

    async fn schedule_at(&self, at: DateTime<Local>, title: &str, body: &str) -> Result<(), NotifyError> {
        let mut inner = self.lock();
        inner.calls.push(NotifierCall::ScheduleAt {
            at,
            title: title.to_string(),
            body: body.to_string(),
        });
        if inner.broken {
            return Err(NotifyError::Backend("scheduler unavailable".into()));
        }
        inner.pending.push(at);
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), NotifyError> {
        let mut inner = self.lock();
        inner.calls.push(NotifierCall::CancelAll);
        inner.pending.clear();
        Ok(())
    }

    async fn show_now(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        let mut inner = self.lock();
        inner.calls.push(NotifierCall::ShowNow {
            title: title.to_string(),
            body: body.to_string(),
        });
        if inner.broken {
            return Err(NotifyError::Backend("display unavailable".into()));
        }
        Ok(())
    }
}
