use std::time::Duration;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use vitals_core::TimeOfDay;

/// Delay from `now` until the next occurrence of `time` on the local clock.
///
/// The candidate is today's date at HH:MM:00. If that instant is not strictly
/// after `now` the delay is pushed by exactly 24 hours, so a reminder whose
/// time equals the activation instant fires tomorrow, never immediately.
///
/// Both sides are naive local times: a DST shift or manual clock change
/// between scheduling and expiry is not compensated.
pub fn delay_until(time: TimeOfDay, now: NaiveDateTime) -> Duration {
    let target = now.date().and_time(naive_time(time));
    let mut delta = target - now;
    if delta <= TimeDelta::zero() {
        // Today's window has passed, advance to tomorrow.
        delta += TimeDelta::days(1);
    }
    delta.to_std().unwrap_or_default()
}

/// Local instant at which an alarm armed at `now` for `time` will fire.
pub fn next_fire_at(time: TimeOfDay, now: NaiveDateTime) -> NaiveDateTime {
    let delay = delay_until(time, now);
    now + TimeDelta::from_std(delay).unwrap_or_default()
}

fn naive_time(time: TimeOfDay) -> NaiveTime {
    // TimeOfDay is range-checked on construction, so this is always Some.
    NaiveTime::from_hms_opt(u32::from(time.hour()), u32::from(time.minute()), 0)
        .unwrap_or_default()
}
