mod support;

use chrono::Weekday;
use taskboard::fixtures::Seed;
use taskboard::model::{Role, Session, Status};
use taskboard::views::{
    bug_rows, completion_periods_by_user, dashboard, task_rows, time_spent_by_user,
    CompletionPeriods, ItemFilter, TimeSort, NO_DESCRIPTION, UNKNOWN_ASSIGNEE,
};

use support::at;

fn seeded() -> (taskboard::store::Store, Session) {
    let seed = Seed::builtin().expect("builtin seed");
    let session = seed.default_session().expect("session");
    (seed.into_store().expect("store"), session)
}

#[test]
fn manager_dashboard_counts_everything() {
    let (store, session) = seeded();
    let board = dashboard(&store, &session, 3);

    assert_eq!(board.user_name, "Harshith");
    assert_eq!(board.role, Role::Manager);
    assert_eq!(board.tasks_total, 5);
    assert_eq!(board.bugs_total, 3);
    assert_eq!(board.tasks.len(), 3);
    assert_eq!(board.bugs.len(), 3);
    assert_eq!(board.tasks[2].id, "t-003");
    assert_eq!(board.tasks[2].description, NO_DESCRIPTION);
}

#[test]
fn developer_dashboard_counts_own_work() {
    let (store, _) = seeded();
    let alice = Session::for_user(store.users(), "u-002").expect("alice");
    let board = dashboard(&store, &alice, 1);

    assert_eq!(board.user_name, "Alice");
    assert_eq!(board.tasks_total, 2);
    assert_eq!(board.bugs_total, 1);
    assert_eq!(board.tasks.len(), 1);
}

#[test]
fn rows_apply_role_then_table_filter() {
    let (store, session) = seeded();
    let closed = ItemFilter {
        status: Some(Status::Closed),
        ..ItemFilter::default()
    };

    let ids: Vec<String> = task_rows(&store, &session, &closed)
        .into_iter()
        .map(|row| row.id)
        .collect();
    assert_eq!(ids, vec!["t-001", "t-005"]);

    let bob = Session::for_user(store.users(), "u-003").expect("bob");
    let rows = bug_rows(&store, &bob, &ItemFilter::default());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].assignee, "Bob");
}

#[test]
fn dangling_assignee_renders_unknown() {
    let (mut store, session) = seeded();
    let mut orphan = store.find_task("t-002").cloned().expect("task");
    orphan.assignee_id = "u-404".to_string();
    assert!(store.update_task(orphan).expect("update"));

    let rows = task_rows(&store, &session, &ItemFilter::default());
    let row = rows.iter().find(|row| row.id == "t-002").expect("row");
    assert_eq!(row.assignee, UNKNOWN_ASSIGNEE);
}

#[test]
fn completion_periods_are_split_per_user_for_managers() {
    let (store, session) = seeded();
    // Wednesday 2024-01-10 is the end date of t-005.
    let now = at(2024, 1, 10, 15, 0);
    let rows = completion_periods_by_user(&store, &session, now, Weekday::Sun);

    let names: Vec<&str> = rows.iter().map(|row| row.user_name.as_str()).collect();
    assert_eq!(names, vec!["Harshith", "Alice", "Bob"]);

    // Week of Sunday 2024-01-07: t-004 (01-09) and t-005 (01-10).
    assert_eq!(
        rows[0].tasks,
        CompletionPeriods {
            today: 1,
            this_week: 2,
            this_month: 2
        }
    );
    assert_eq!(rows[0].bugs, CompletionPeriods::default());
    assert_eq!(rows[1].tasks.this_month, 1);
    assert_eq!(rows[1].tasks.this_week, 0);
    assert_eq!(rows[1].bugs.this_month, 1);
    assert_eq!(rows[2].tasks, CompletionPeriods::default());
}

#[test]
fn developer_sees_only_own_completion_periods() {
    let (store, _) = seeded();
    let alice = Session::for_user(store.users(), "u-002").expect("alice");
    let rows = completion_periods_by_user(&store, &alice, at(2024, 1, 10, 15, 0), Weekday::Sun);
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, "u-002");
    assert_eq!(rows[0].bugs.this_month, 1);
}

#[test]
fn time_spent_report_over_seed() {
    let (store, _) = seeded();
    let report = time_spent_by_user(store.tasks(), store.users(), None, TimeSort::Total);

    let names: Vec<&str> = report.users.iter().map(|u| u.user_name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Harshith", "Bob"]);
    assert_eq!(report.total_minutes, 500);
    assert_eq!(report.total_tasks, 5);
}
