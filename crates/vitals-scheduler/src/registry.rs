//! Alarm registry: owns the one-shot timer set for the latest snapshot.
//!
//! Every activation is a transactional replace: all alarms of the previous
//! activation are cancelled first, then one alarm is armed per active
//! reminder. Cancellation and firing are linearised through the alarm table
//! lock and an activation generation counter, so once `activate` or
//! `deactivate` returns, no timer from a superseded activation can emit.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::NaiveDateTime;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use vitals_core::{ReminderCategory, Snapshot};

use crate::clock::{Clock, SystemClock};
use crate::notify::NotificationEmitter;
use crate::schedule::{delay_until, next_fire_at};
use crate::types::{ActivationReport, AlarmInfo, AlarmState};

#[derive(Debug)]
struct AlarmSlot {
    category: ReminderCategory,
    delay: Duration,
    fires_at: NaiveDateTime,
    state: AlarmState,
}

#[derive(Debug, Default)]
struct AlarmTable {
    /// Bumped on every teardown; timers carry the value they were armed with.
    generation: u64,
    slots: BTreeMap<String, AlarmSlot>,
}

type SharedTable = Arc<Mutex<AlarmTable>>;

/// Reminder notification scheduler.
///
/// Must be used from within a Tokio runtime: each alarm is a spawned task.
/// Dropping the scheduler deactivates it.
pub struct ReminderScheduler {
    clock: Arc<dyn Clock>,
    emitter: Arc<NotificationEmitter>,
    table: SharedTable,
    timers: Vec<JoinHandle<()>>,
}

impl ReminderScheduler {
    pub fn new(emitter: NotificationEmitter) -> Self {
        Self {
            clock: Arc::new(SystemClock),
            emitter: Arc::new(emitter),
            table: Arc::new(Mutex::new(AlarmTable::default())),
            timers: Vec::new(),
        }
    }

    /// Replace the wall-clock source used to compute delays.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn emitter(&self) -> &NotificationEmitter {
        &self.emitter
    }

    /// Tear down the current alarms and arm one per active reminder.
    ///
    /// Notification capability and permission are resolved before anything
    /// is armed. Alarms are armed even when alerts cannot be shown, so the
    /// table always mirrors the snapshot.
    pub fn activate(&mut self, snapshot: &Snapshot) -> ActivationReport {
        let cancelled = self.teardown();
        let readiness = self.emitter.prepare();
        let now = self.clock.now();
        // Deadlines are anchored here, not at each task's first poll.
        let armed_at = Instant::now();

        let mut pending = Vec::new();
        let mut skipped_inactive = 0;
        let generation = {
            let mut table = lock(&self.table);
            table.slots.clear();
            for reminder in snapshot.iter() {
                if !reminder.active {
                    skipped_inactive += 1;
                    debug!(reminder_id = %reminder.id, "reminder inactive, not scheduled");
                    continue;
                }
                let delay = delay_until(reminder.time, now);
                table.slots.insert(
                    reminder.id.clone(),
                    AlarmSlot {
                        category: reminder.category,
                        delay,
                        fires_at: next_fire_at(reminder.time, now),
                        state: AlarmState::Scheduled,
                    },
                );
                info!(
                    reminder_id = %reminder.id,
                    category = %reminder.category,
                    time = %reminder.time,
                    delay_ms = delay.as_millis() as u64,
                    "reminder alarm armed"
                );
                pending.push((reminder.id.clone(), delay));
            }
            table.generation
        };

        let armed = pending.len();
        for (reminder_id, delay) in pending {
            let table = Arc::clone(&self.table);
            let emitter = Arc::clone(&self.emitter);
            self.timers.push(tokio::spawn(fire_at(
                table,
                emitter,
                generation,
                reminder_id,
                armed_at + delay,
            )));
        }

        info!(armed, skipped_inactive, cancelled, ?readiness, "scheduler activated");
        ActivationReport {
            cancelled,
            armed,
            skipped_inactive,
            readiness,
        }
    }

    /// Cancel every pending alarm. Returns how many were still scheduled.
    ///
    /// Cancelled entries stay visible through [`alarms`](Self::alarms) until
    /// the next activation replaces them.
    pub fn deactivate(&mut self) -> usize {
        let cancelled = self.teardown();
        if cancelled > 0 {
            info!(cancelled, "scheduler deactivated");
        }
        cancelled
    }

    /// Snapshot of the alarm table, ordered by reminder id.
    pub fn alarms(&self) -> Vec<AlarmInfo> {
        lock(&self.table)
            .slots
            .iter()
            .map(|(id, slot)| AlarmInfo {
                reminder_id: id.clone(),
                category: slot.category,
                delay: slot.delay,
                fires_at: slot.fires_at,
                state: slot.state,
            })
            .collect()
    }

    pub fn state_of(&self, reminder_id: &str) -> Option<AlarmState> {
        lock(&self.table).slots.get(reminder_id).map(|s| s.state)
    }

    /// Number of alarms still waiting to fire.
    pub fn pending(&self) -> usize {
        self.count(AlarmState::Scheduled)
    }

    /// True once any alarm of the live activation has fired.
    pub fn has_fired(&self) -> bool {
        self.count(AlarmState::Fired) > 0
    }

    fn count(&self, state: AlarmState) -> usize {
        lock(&self.table)
            .slots
            .values()
            .filter(|s| s.state == state)
            .count()
    }

    fn teardown(&mut self) -> usize {
        let mut table = lock(&self.table);
        table.generation += 1;
        let mut cancelled = 0;
        for (id, slot) in table.slots.iter_mut() {
            if slot.state == AlarmState::Scheduled {
                slot.state = AlarmState::Cancelled;
                cancelled += 1;
                debug!(reminder_id = %id, "reminder alarm cancelled");
            }
        }
        for timer in self.timers.drain(..) {
            timer.abort();
        }
        cancelled
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.teardown();
    }
}

async fn fire_at(
    table: SharedTable,
    emitter: Arc<NotificationEmitter>,
    generation: u64,
    reminder_id: String,
    deadline: Instant,
) {
    tokio::time::sleep_until(deadline).await;

    let mut table = lock(&table);
    if table.generation != generation {
        return;
    }
    let Some(slot) = table.slots.get_mut(&reminder_id) else {
        return;
    };
    if slot.state != AlarmState::Scheduled {
        return;
    }
    slot.state = AlarmState::Fired;
    info!(reminder_id = %reminder_id, category = %slot.category, "reminder alarm fired");
    // Emitting under the lock keeps fire and teardown mutually exclusive.
    emitter.emit(slot.category, &reminder_id);
}

fn lock(table: &Mutex<AlarmTable>) -> MutexGuard<'_, AlarmTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::notify::testing::RecordingBackend;
    use crate::notify::ChannelBackend;
    use crate::notify::Readiness;
    use chrono::NaiveDate;
    use vitals_core::Reminder;

    const HOUR: Duration = Duration::from_secs(3600);

    fn clock_at(h: u32, m: u32) -> Arc<dyn Clock> {
        Arc::new(FixedClock(
            NaiveDate::from_ymd_opt(2025, 3, 14)
                .unwrap()
                .and_hms_opt(h, m, 0)
                .unwrap(),
        ))
    }

    fn reminder(id: &str, category: ReminderCategory, time: &str, active: bool) -> Reminder {
        Reminder {
            id: id.to_string(),
            category,
            time: time.parse().unwrap(),
            active,
        }
    }

    fn scheduler(backend: &RecordingBackend, clock: Arc<dyn Clock>) -> ReminderScheduler {
        ReminderScheduler::new(NotificationEmitter::new(Box::new(backend.clone()))).with_clock(clock)
    }

    /// Let spawned timers whose deadline has passed run to completion.
    async fn settle() {
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn arms_one_alarm_per_active_reminder() {
        let backend = RecordingBackend::granting();
        let mut sched = scheduler(&backend, clock_at(7, 0));
        let snapshot: Snapshot = [
            reminder("r1", ReminderCategory::Water, "08:00", true),
            reminder("r2", ReminderCategory::Medication, "09:30", true),
            reminder("r3", ReminderCategory::Other, "10:00", false),
        ]
        .into_iter()
        .collect();

        let report = sched.activate(&snapshot);
        assert_eq!(report.armed, 2);
        assert_eq!(report.skipped_inactive, 1);
        assert_eq!(report.cancelled, 0);
        assert_eq!(report.readiness, Readiness::Ready);

        let alarms = sched.alarms();
        assert_eq!(alarms.len(), 2);
        assert_eq!(alarms[0].reminder_id, "r1");
        assert_eq!(alarms[0].delay, HOUR);
        assert_eq!(alarms[1].delay, HOUR * 2 + Duration::from_secs(30 * 60));
        assert_eq!(sched.state_of("r3"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_at_delay_and_is_not_rearmed() {
        let backend = RecordingBackend::granting();
        let mut sched = scheduler(&backend, clock_at(7, 0));
        let snapshot: Snapshot = [reminder("r1", ReminderCategory::Water, "08:00", true)]
            .into_iter()
            .collect();
        sched.activate(&snapshot);

        tokio::time::advance(HOUR - Duration::from_millis(1)).await;
        settle().await;
        assert!(backend.delivered().is_empty());
        assert_eq!(sched.state_of("r1"), Some(AlarmState::Scheduled));

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(backend.delivered().len(), 1);
        assert_eq!(backend.delivered()[0].tag, "r1");
        assert_eq!(sched.state_of("r1"), Some(AlarmState::Fired));
        assert!(sched.has_fired());

        tokio::time::advance(HOUR * 48).await;
        settle().await;
        assert_eq!(backend.delivered().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deactivate_prevents_pending_notification() {
        let backend = RecordingBackend::granting();
        let mut sched = scheduler(&backend, clock_at(7, 0));
        let snapshot: Snapshot = [reminder("r1", ReminderCategory::Water, "08:00", true)]
            .into_iter()
            .collect();
        sched.activate(&snapshot);
        assert_eq!(sched.pending(), 1);

        tokio::time::advance(HOUR / 2).await;
        assert_eq!(sched.deactivate(), 1);
        assert_eq!(sched.state_of("r1"), Some(AlarmState::Cancelled));

        tokio::time::advance(HOUR * 48).await;
        settle().await;
        assert!(backend.delivered().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn reminder_removed_from_snapshot_never_fires() {
        let backend = RecordingBackend::granting();
        let mut sched = scheduler(&backend, clock_at(7, 0));
        let first: Snapshot = [
            reminder("r1", ReminderCategory::Water, "08:00", true),
            reminder("r2", ReminderCategory::Other, "08:00", true),
        ]
        .into_iter()
        .collect();
        sched.activate(&first);

        let second: Snapshot = [reminder("r2", ReminderCategory::Other, "08:00", true)]
            .into_iter()
            .collect();
        let report = sched.activate(&second);
        assert_eq!(report.cancelled, 2);
        assert_eq!(report.armed, 1);
        assert_eq!(sched.state_of("r1"), None);

        tokio::time::advance(HOUR * 48).await;
        settle().await;
        let tags: Vec<_> = backend.delivered().into_iter().map(|n| n.tag).collect();
        assert_eq!(tags, vec!["r2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn reactivation_with_same_reminder_fires_once() {
        let backend = RecordingBackend::granting();
        let mut sched = scheduler(&backend, clock_at(7, 0));
        let snapshot: Snapshot = [reminder("r2", ReminderCategory::Medication, "08:00", true)]
            .into_iter()
            .collect();
        sched.activate(&snapshot);
        sched.activate(&snapshot.clone());

        tokio::time::advance(HOUR).await;
        settle().await;
        assert_eq!(backend.delivered().len(), 1);
        assert_eq!(backend.delivered()[0].body, "Hora de: remédio");
    }

    #[tokio::test(start_paused = true)]
    async fn inactive_reminder_gets_no_timer() {
        let backend = RecordingBackend::granting();
        let mut sched = scheduler(&backend, clock_at(7, 0));
        let snapshot: Snapshot = [reminder("r1", ReminderCategory::Water, "08:00", false)]
            .into_iter()
            .collect();
        let report = sched.activate(&snapshot);
        assert_eq!(report.armed, 0);
        assert!(sched.alarms().is_empty());

        tokio::time::advance(HOUR * 48).await;
        settle().await;
        assert!(backend.delivered().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn capability_and_permission_checked_once_across_activations() {
        let backend = RecordingBackend::granting();
        let mut sched = scheduler(&backend, clock_at(7, 0));
        let snapshot: Snapshot = [reminder("r1", ReminderCategory::Water, "08:00", true)]
            .into_iter()
            .collect();
        sched.activate(&snapshot);
        sched.activate(&snapshot);
        sched.activate(&Snapshot::new());
        assert_eq!(backend.requests(), 1);
        assert_eq!(backend.capability_checks(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn unsupported_host_still_tracks_alarms() {
        let backend = RecordingBackend {
            supported: false,
            ..RecordingBackend::granting()
        };
        let mut sched = scheduler(&backend, clock_at(7, 0));
        let snapshot: Snapshot = [reminder("r1", ReminderCategory::Water, "08:00", true)]
            .into_iter()
            .collect();
        let report = sched.activate(&snapshot);
        assert_eq!(report.readiness, Readiness::Unsupported);
        assert_eq!(report.armed, 1);

        tokio::time::advance(HOUR).await;
        settle().await;
        assert_eq!(sched.state_of("r1"), Some(AlarmState::Fired));
        assert!(backend.delivered().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn denied_permission_suppresses_but_consumes_alarm() {
        let backend = RecordingBackend {
            grant: false,
            ..RecordingBackend::granting()
        };
        let mut sched = scheduler(&backend, clock_at(7, 0));
        let snapshot: Snapshot = [reminder("r1", ReminderCategory::Water, "08:00", true)]
            .into_iter()
            .collect();
        assert_eq!(sched.activate(&snapshot).readiness, Readiness::PermissionDenied);

        tokio::time::advance(HOUR).await;
        settle().await;
        assert_eq!(sched.state_of("r1"), Some(AlarmState::Fired));
        assert!(backend.delivered().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_scheduler_cancels_timers() {
        let backend = RecordingBackend::granting();
        {
            let mut sched = scheduler(&backend, clock_at(7, 0));
            let snapshot: Snapshot = [reminder("r1", ReminderCategory::Water, "08:00", true)]
                .into_iter()
                .collect();
            sched.activate(&snapshot);
        }
        tokio::time::advance(HOUR * 48).await;
        settle().await;
        assert!(backend.delivered().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn delay_counts_from_activation_not_first_poll() {
        let (backend, mut rx) = ChannelBackend::new(4);
        let mut sched = ReminderScheduler::new(NotificationEmitter::new(Box::new(backend)))
            .with_clock(clock_at(7, 0));
        let snapshot: Snapshot = [reminder("r1", ReminderCategory::Water, "08:00", true)]
            .into_iter()
            .collect();
        let activated = tokio::time::Instant::now();
        sched.activate(&snapshot);

        // Half an hour passes before the timer task is first polled.
        tokio::time::advance(HOUR / 2).await;
        let n = rx.recv().await.unwrap();
        assert_eq!(n.tag, "r1");

        let waited = activated.elapsed();
        assert!(waited >= HOUR && waited < HOUR + Duration::from_secs(1), "fired after {waited:?}");
    }
}
