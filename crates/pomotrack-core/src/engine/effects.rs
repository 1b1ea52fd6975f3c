//! Background workers that carry engine events out to the store and the
//! notifier.
//!
//! Jobs are queued while the engine lock is held, so each worker sees them in
//! mutation order. Failures are logged and dropped.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::machine::EngineCore;
use crate::events::Event;
use crate::notify::{Message, Notifier, PermissionGate};
use crate::storage::{encode, keys, Store};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct WriteJob {
    pub key: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NotifyJob {
    /// Cancel everything, then schedule `reminder` if present.
    Reschedule {
        reminder: Option<(DateTime<Local>, Message)>,
    },
    ShowNow(Message),
}

/// Sending halves of both worker queues plus the worker handles.
pub(crate) struct Effects {
    writes: mpsc::UnboundedSender<WriteJob>,
    notifications: mpsc::UnboundedSender<NotifyJob>,
    workers: Vec<JoinHandle<()>>,
}

impl Effects {
    pub(crate) fn spawn(store: Arc<dyn Store>, notifier: Arc<dyn Notifier>) -> Self {
        let (writes, write_rx) = mpsc::unbounded_channel();
        let (notifications, notify_rx) = mpsc::unbounded_channel();
        let workers = vec![
            tokio::spawn(persistence_worker(store, write_rx)),
            tokio::spawn(notification_worker(notifier, notify_rx)),
        ];
        Self {
            writes,
            notifications,
            workers,
        }
    }

    pub(crate) fn write(&self, job: WriteJob) {
        if self.writes.send(job).is_err() {
            warn!("persistence worker is gone, write dropped");
        }
    }

    pub(crate) fn notify(&self, job: NotifyJob) {
        if self.notifications.send(job).is_err() {
            warn!("notification worker is gone, job dropped");
        }
    }

    /// Close both queues and hand back the worker handles so the caller can
    /// wait for them to drain.
    pub(crate) fn close(self) -> Vec<JoinHandle<()>> {
        self.workers
    }
}

async fn persistence_worker(store: Arc<dyn Store>, mut rx: mpsc::UnboundedReceiver<WriteJob>) {
    while let Some(job) = rx.recv().await {
        match store.set(job.key, &job.value).await {
            Ok(()) => debug!(key = job.key, "persisted"),
            Err(e) => warn!(key = job.key, error = %e, "failed to persist value"),
        }
    }
    debug!("persistence worker stopped");
}

async fn notification_worker(notifier: Arc<dyn Notifier>, mut rx: mpsc::UnboundedReceiver<NotifyJob>) {
    let mut gate = PermissionGate::new(notifier);
    while let Some(job) = rx.recv().await {
        let Some(notifier) = gate.notifier().await else {
            continue;
        };
        let result = match job {
            NotifyJob::Reschedule { reminder } => match notifier.cancel_all().await {
                Ok(()) => match reminder {
                    Some((at, message)) => notifier.schedule_at(at, &message.title, &message.body).await,
                    None => Ok(()),
                },
                Err(e) => Err(e),
            },
            NotifyJob::ShowNow(message) => notifier.show_now(&message.title, &message.body).await,
        };
        if let Err(e) = result {
            warn!(error = %e, "notification call failed");
        }
    }
    debug!("notification worker stopped");
}

/// Store keys whose value changed because of `events`.
pub(crate) fn dirty_keys(events: &[Event]) -> BTreeSet<&'static str> {
    let mut dirty = BTreeSet::new();
    for event in events {
        if event.touches_timer() {
            dirty.insert(keys::TIMER);
        }
        match event {
            Event::SessionCompleted { record: Some(_), .. } => {
                dirty.insert(keys::HISTORY);
            }
            Event::SettingsChanged { .. } => {
                dirty.insert(keys::SETTINGS);
            }
            Event::ProgressCredited { .. } => {
                dirty.insert(keys::DAILY_PROGRESS);
            }
            Event::StreakChanged { .. } => {
                dirty.insert(keys::STREAK);
            }
            Event::DayRolledOver { .. } => {
                dirty.insert(keys::LAST_DATE);
                dirty.insert(keys::DAILY_PROGRESS);
            }
            Event::ThemeChanged { .. } => {
                dirty.insert(keys::THEME);
            }
            _ => {}
        }
    }
    dirty
}

/// Current stored form of `key`.
pub(crate) fn encode_key(core: &EngineCore, key: &'static str) -> Option<WriteJob> {
    let value = match key {
        keys::SETTINGS => encode::json(core.settings()),
        keys::HISTORY => encode::json(core.history()),
        keys::THEME => encode::json(&core.dark_mode()),
        keys::STREAK => encode::json(core.goals().streak()),
        keys::TIMER => encode::json(core.timer().state()),
        keys::DAILY_PROGRESS => Ok(encode::minutes(core.goals().daily_progress_minutes())),
        keys::LAST_DATE => match core.goals().last_active_date() {
            Some(date) => Ok(encode::date(date)),
            None => return None,
        },
        _ => return None,
    };
    match value {
        Ok(value) => Some(WriteJob { key, value }),
        Err(e) => {
            warn!(key, error = %e, "failed to encode value");
            None
        }
    }
}
