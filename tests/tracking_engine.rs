mod support;

use chrono::Duration;
use taskboard::model::{Priority, Status, Tracking};
use taskboard::tracking;

use support::{bug, store_with, t0, task};

#[test]
fn start_then_stop_after_125_seconds_adds_two_minutes() {
    let mut store = store_with(vec![task("t1", "u2", Status::Open, Priority::Low)], Vec::new());

    assert!(store.start_tracking("t1", t0()));
    let added = store.stop_tracking("t1", t0() + Duration::milliseconds(125_000));

    assert_eq!(added, Some(2));
    let task = store.find_task("t1").expect("task");
    assert_eq!(task.time_spent, 2);
    assert!(!task.tracking.is_tracking());
    assert_eq!(task.tracking.started_at(), None);
}

#[test]
fn second_start_keeps_original_start_time() {
    let mut store = store_with(vec![task("t1", "u2", Status::Open, Priority::Low)], Vec::new());
    assert!(store.start_tracking("t1", t0()));
    assert!(!store.start_tracking("t1", t0() + Duration::minutes(10)));

    let task = store.find_task("t1").expect("task");
    assert_eq!(task.tracking, Tracking::Running { started_at: t0() });
}

#[test]
fn stop_while_idle_changes_nothing() {
    let mut store = store_with(vec![task("t1", "u2", Status::Open, Priority::Low)], Vec::new());
    let before = store.find_task("t1").cloned();
    let revision = store.revision();

    assert_eq!(store.stop_tracking("t1", t0()), None);
    assert_eq!(store.find_task("t1").cloned(), before);
    assert_eq!(store.revision(), revision);
}

#[test]
fn unknown_ids_are_no_ops() {
    let mut store = store_with(Vec::new(), Vec::new());
    assert!(!store.start_tracking("nope", t0()));
    assert_eq!(store.stop_tracking("nope", t0()), None);
    assert_eq!(store.revision(), 0);
}

#[test]
fn bugs_track_time_too() {
    let mut store = store_with(Vec::new(), vec![bug("b1", "u2", Status::Open, Priority::High)]);
    assert!(store.start_bug_tracking("b1", t0()));
    assert_eq!(store.stop_bug_tracking("b1", t0() + Duration::minutes(61)), Some(61));
    assert_eq!(store.find_bug("b1").map(|b| b.time_spent), Some(61));
}

#[test]
fn clock_running_backwards_adds_nothing() {
    let mut item = task("t1", "u2", Status::Open, Priority::Low);
    item.time_spent = 10;
    assert!(tracking::start(&mut item, t0()));
    assert_eq!(tracking::stop(&mut item, t0() - Duration::minutes(5)), Some(0));
    assert_eq!(item.time_spent, 10);
}

#[test]
fn live_minutes_include_running_timer() {
    let mut item = task("t1", "u2", Status::Open, Priority::Low);
    item.time_spent = 15;
    assert_eq!(tracking::live_minutes(&item, t0()), 15);

    tracking::start(&mut item, t0());
    assert_eq!(
        tracking::live_minutes(&item, t0() + Duration::seconds(150)),
        17
    );
    assert_eq!(item.time_spent, 15);
}
