//! Start/stop timer for work items.
//!
//! An item is either idle or running since some instant. Stopping folds the
//! whole elapsed minutes into `timeSpent`; partial minutes are dropped.

use chrono::{DateTime, Utc};

use crate::model::{Tracking, WorkItem};

const MILLIS_PER_MINUTE: i64 = 60_000;

/// Move an idle item to running. A running item keeps its original start.
pub fn start<T: WorkItem>(item: &mut T, now: DateTime<Utc>) -> bool {
    if item.tracking().is_tracking() {
        return false;
    }
    item.set_tracking(Tracking::Running { started_at: now });
    true
}

/// Stop a running item and return the minutes added. Idle items are untouched.
pub fn stop<T: WorkItem>(item: &mut T, now: DateTime<Utc>) -> Option<u32> {
    let Tracking::Running { started_at } = item.tracking() else {
        return None;
    };
    let minutes = elapsed_minutes(started_at, now);
    item.set_time_spent(item.time_spent().saturating_add(minutes));
    item.set_tracking(Tracking::Idle);
    Some(minutes)
}

/// Whole minutes between two instants; zero if the clock went backwards.
pub fn elapsed_minutes(started_at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
    let millis = (now - started_at).num_milliseconds();
    if millis <= 0 {
        return 0;
    }
    u32::try_from(millis / MILLIS_PER_MINUTE).unwrap_or(u32::MAX)
}

/// Recorded minutes plus whatever a running timer has accumulated so far.
pub fn live_minutes<T: WorkItem>(item: &T, now: DateTime<Utc>) -> u32 {
    match item.tracking() {
        Tracking::Idle => item.time_spent(),
        Tracking::Running { started_at } => item
            .time_spent()
            .saturating_add(elapsed_minutes(started_at, now)),
    }
}
