//! Desktop notifications through the freedesktop `notify-send` command.
//!
//! Capability is the notifier being present on PATH. Permission comes from
//! the configured policy, since a desktop session has no prompt of its own.
//! The reminder id is sent as the `x-canonical-private-synchronous` hint so
//! notification daemons replace, rather than stack, repeats for one reminder.

use std::path::PathBuf;
use std::process::Stdio;

use tracing::{debug, warn};
use vitals_core::config::{NotificationsConfig, PermissionPolicy};
use vitals_core::Notification;

use crate::error::{Result, SchedulerError};
use crate::notify::{NotificationBackend, PermissionState};

pub struct DesktopBackend {
    command: String,
    program: Option<PathBuf>,
    app_name: String,
    icon: Option<String>,
    policy: PermissionPolicy,
}

impl DesktopBackend {
    /// Build from config, resolving the notifier on PATH once.
    pub fn from_config(config: &NotificationsConfig) -> Self {
        let program = which::which(&config.command).ok();
        match &program {
            Some(path) => debug!(path = %path.display(), "notifier resolved"),
            None => debug!(command = %config.command, "notifier not found on PATH"),
        }
        Self {
            command: config.command.clone(),
            program,
            app_name: config.app_name.clone(),
            icon: config.icon.clone(),
            policy: config.permission,
        }
    }

    fn args(&self, notification: &Notification) -> Vec<String> {
        let mut args = vec![
            "--app-name".to_string(),
            self.app_name.clone(),
            "--hint".to_string(),
            format!("string:x-canonical-private-synchronous:{}", notification.tag),
        ];
        if let Some(ref icon) = self.icon {
            args.push("--icon".to_string());
            args.push(icon.clone());
        }
        args.push(notification.title.clone());
        args.push(notification.body.clone());
        args
    }
}

impl NotificationBackend for DesktopBackend {
    fn name(&self) -> &str {
        "desktop"
    }

    fn is_supported(&self) -> bool {
        self.program.is_some()
    }

    fn request_permission(&self) -> PermissionState {
        match self.policy {
            PermissionPolicy::Allow => PermissionState::Granted,
            PermissionPolicy::Deny => PermissionState::Denied,
        }
    }

    /// Spawn the notifier and reap it on a background task.
    fn deliver(&self, notification: &Notification) -> Result<()> {
        let program = self
            .program
            .as_ref()
            .ok_or_else(|| SchedulerError::CommandNotFound {
                command: self.command.clone(),
            })?;
        let handle = tokio::runtime::Handle::try_current().map_err(|_| SchedulerError::NoRuntime)?;

        let mut child = {
            let _guard = handle.enter();
            tokio::process::Command::new(program)
                .args(self.args(notification))
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()?
        };

        let tag = notification.tag.clone();
        handle.spawn(async move {
            match child.wait().await {
                Ok(status) if !status.success() => {
                    warn!(reminder_id = %tag, %status, "notifier exited with failure")
                }
                Err(e) => warn!(reminder_id = %tag, "waiting on notifier failed: {e}"),
                Ok(_) => {}
            }
        });
        Ok(())
    }
}
