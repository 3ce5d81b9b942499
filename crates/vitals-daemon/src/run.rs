//! Long-running scheduler loop.
//!
//! Loads the user's snapshot, activates the scheduler, then reloads on every
//! refresh tick. The scheduler is re-activated only when the snapshot changed
//! or an alarm has fired since the last activation; a fired reminder's time
//! has just passed, so re-activation arms it for the same time tomorrow.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info};
use vitals_core::{Snapshot, UserId};
use vitals_reminders::ReminderStore;
use vitals_scheduler::ReminderScheduler;

/// Why a refresh did or did not re-activate the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Unchanged,
    SnapshotChanged,
    AlarmFired,
    LoadFailed,
}

pub struct ReminderLoop {
    store: ReminderStore,
    user: UserId,
    scheduler: ReminderScheduler,
    live: Snapshot,
}

impl ReminderLoop {
    /// Load the first snapshot and activate.
    pub fn start(
        store: ReminderStore,
        user: UserId,
        mut scheduler: ReminderScheduler,
    ) -> anyhow::Result<Self> {
        let live = store.snapshot(&user)?;
        let report = scheduler.activate(&live);
        info!(user_id = %user, reminders = live.len(), armed = report.armed, "reminder loop started");
        Ok(Self {
            store,
            user,
            scheduler,
            live,
        })
    }

    pub fn scheduler(&self) -> &ReminderScheduler {
        &self.scheduler
    }

    #[cfg(test)]
    pub fn store(&self) -> &ReminderStore {
        &self.store
    }

    /// Reload the snapshot and re-activate if needed.
    ///
    /// A failed reload keeps the current alarms armed.
    pub fn refresh(&mut self) -> RefreshOutcome {
        let next = match self.store.snapshot(&self.user) {
            Ok(s) => s,
            Err(e) => {
                error!(user_id = %self.user, "snapshot reload failed: {e}");
                return RefreshOutcome::LoadFailed;
            }
        };

        let outcome = if next != self.live {
            RefreshOutcome::SnapshotChanged
        } else if self.scheduler.has_fired() {
            RefreshOutcome::AlarmFired
        } else {
            debug!("snapshot unchanged");
            return RefreshOutcome::Unchanged;
        };

        info!(?outcome, reminders = next.len(), "re-activating scheduler");
        self.scheduler.activate(&next);
        self.live = next;
        outcome
    }

    /// Refresh every `every` until `shutdown` flips to `true` or its sender
    /// is dropped, then cancel all alarms.
    pub async fn run(mut self, every: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; start() already activated.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.refresh();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        let cancelled = self.scheduler.deactivate();
        info!(cancelled, "reminder loop stopped");
    }
}
