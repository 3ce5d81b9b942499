//! Notification emitter: permission-gated dispatch over a pluggable backend.
//!
//! The emitter owns the permission state for one scheduler lifetime. It asks
//! the backend for permission at most once, reports a missing capability or a
//! refusal once, and afterwards silently suppresses alerts it may not show.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use vitals_core::{Notification, ReminderCategory};

use crate::error::{Result, SchedulerError};

/// Permission to show notifications, as tracked by the emitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionState {
    Unrequested,
    Granted,
    Denied,
}

/// Whether alerts emitted now would reach the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Readiness {
    Ready,
    PermissionDenied,
    /// The host has no way to show notifications at all.
    Unsupported,
}

/// Platform-side notification delivery.
pub trait NotificationBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Whether this host can show notifications at all.
    fn is_supported(&self) -> bool;

    /// Ask for permission to show notifications. Must answer `Granted` or
    /// `Denied`; the emitter calls this at most once.
    fn request_permission(&self) -> PermissionState;

    /// Dispatch one alert. Must not block.
    fn deliver(&self, notification: &Notification) -> Result<()>;
}

#[derive(Debug)]
struct EmitterState {
    supported: Option<bool>,
    permission: PermissionState,
}

pub struct NotificationEmitter {
    backend: Box<dyn NotificationBackend>,
    state: Mutex<EmitterState>,
}

impl NotificationEmitter {
    pub fn new(backend: Box<dyn NotificationBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(EmitterState {
                supported: None,
                permission: PermissionState::Unrequested,
            }),
        }
    }

    pub fn permission(&self) -> PermissionState {
        self.lock().permission
    }

    /// Resolve capability and permission before any alarm is armed.
    ///
    /// The first call checks the backend and, if it is supported, requests
    /// permission; failures are logged here and only here. Later calls return
    /// the recorded outcome without touching the backend.
    pub fn prepare(&self) -> Readiness {
        let mut state = self.lock();

        let supported = match state.supported {
            Some(s) => s,
            None => {
                let s = self.backend.is_supported();
                state.supported = Some(s);
                if !s {
                    warn!(
                        backend = self.backend.name(),
                        "notifications are not supported on this host; reminders will be tracked but not shown"
                    );
                }
                s
            }
        };
        if !supported {
            return Readiness::Unsupported;
        }

        if state.permission == PermissionState::Unrequested {
            let answer = match self.backend.request_permission() {
                PermissionState::Granted => PermissionState::Granted,
                _ => PermissionState::Denied,
            };
            state.permission = answer;
            match answer {
                PermissionState::Granted => {
                    info!(backend = self.backend.name(), "notification permission granted")
                }
                _ => warn!(
                    backend = self.backend.name(),
                    "notification permission denied; reminder alerts will be suppressed"
                ),
            }
        }

        readiness_of(&state)
    }

    /// Raise the alert for a fired reminder.
    ///
    /// Suppressed when the host is unsupported or permission is not granted.
    /// Delivery errors are logged and swallowed; nothing is retried.
    pub fn emit(&self, category: ReminderCategory, reminder_id: &str) {
        let readiness = readiness_of(&self.lock());
        if readiness != Readiness::Ready {
            debug!(reminder_id, ?readiness, "notification suppressed");
            return;
        }

        let notification = Notification::for_reminder(category, reminder_id);
        match self.backend.deliver(&notification) {
            Ok(()) => debug!(reminder_id, body = %notification.body, "notification dispatched"),
            Err(e) => warn!(reminder_id, backend = self.backend.name(), "notification delivery failed: {e}"),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EmitterState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn readiness_of(state: &EmitterState) -> Readiness {
    match (state.supported, state.permission) {
        (Some(false), _) => Readiness::Unsupported,
        (_, PermissionState::Granted) => Readiness::Ready,
        _ => Readiness::PermissionDenied,
    }
}

/// Forwards notifications over a bounded mpsc channel.
///
/// Always supported and always granted; the receiving task decides what to do
/// with each alert. `deliver` uses `try_send` so a timer never waits on a slow
/// consumer.
pub struct ChannelBackend {
    tx: mpsc::Sender<Notification>,
}

impl ChannelBackend {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl NotificationBackend for ChannelBackend {
    fn name(&self) -> &str {
        "channel"
    }

    fn is_supported(&self) -> bool {
        true
    }

    fn request_permission(&self) -> PermissionState {
        PermissionState::Granted
    }

    fn deliver(&self, notification: &Notification) -> Result<()> {
        self.tx.try_send(notification.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SchedulerError::ChannelFull,
            mpsc::error::TrySendError::Closed(_) => SchedulerError::ChannelClosed,
        })
    }
}
