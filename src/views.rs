//! Read views behind the dashboard pages.
//!
//! Functions that read from the store apply the role filter themselves; the
//! ones taking plain slices count whatever they are given.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::Serialize;

use crate::model::{Priority, Role, Session, Status, Task, User, WorkItem};
use crate::role::filter_by_role;
use crate::series::parse_day;
use crate::store::Store;

pub const UNKNOWN_ASSIGNEE: &str = "Unknown";
pub const NO_DESCRIPTION: &str = "No description provided.";

/// Display name of an assignee, or `"Unknown"` for a dangling id.
pub fn assignee_name<'a>(users: &'a [User], assignee_id: &str) -> &'a str {
    users
        .iter()
        .find(|user| user.id == assignee_id)
        .map(|user| user.name.as_str())
        .unwrap_or(UNKNOWN_ASSIGNEE)
}

/// Table filter; `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemFilter {
    pub status: Option<Status>,
    pub priority: Option<Priority>,
    /// Only honoured for managers; developers already see only their own.
    pub assignee: Option<String>,
}

impl ItemFilter {
    pub fn matches<T: WorkItem>(&self, item: &T, session: &Session) -> bool {
        let status_ok = self.status.map_or(true, |status| item.status() == status);
        let priority_ok = self
            .priority
            .map_or(true, |priority| item.priority() == priority);
        let assignee_ok = match (&self.assignee, session.is_manager()) {
            (Some(assignee), true) => item.assignee_id() == assignee,
            _ => true,
        };
        status_ok && priority_ok && assignee_ok
    }
}

/// Role filter followed by the table filter.
pub fn filter_items<'a, T: WorkItem>(
    items: &'a [T],
    session: &Session,
    filter: &ItemFilter,
) -> Vec<&'a T> {
    filter_by_role(items, session)
        .into_iter()
        .filter(|item| filter.matches(*item, session))
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ItemRow {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub priority: Priority,
    pub assignee: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_on: Option<NaiveDate>,
    pub time_spent: u32,
    pub is_tracking: bool,
}

impl ItemRow {
    pub fn new<T: WorkItem>(item: &T, users: &[User]) -> Self {
        Self {
            id: item.id().to_string(),
            title: item.title().to_string(),
            status: item.status(),
            priority: item.priority(),
            assignee: assignee_name(users, item.assignee_id()).to_string(),
            created_on: parse_day(item.created_at()),
            time_spent: item.time_spent(),
            is_tracking: item.tracking().is_tracking(),
        }
    }
}

pub fn task_rows(store: &Store, session: &Session, filter: &ItemFilter) -> Vec<ItemRow> {
    filter_items(store.tasks(), session, filter)
        .into_iter()
        .map(|task| ItemRow::new(task, store.users()))
        .collect()
}

pub fn bug_rows(store: &Store, session: &Session, filter: &ItemFilter) -> Vec<ItemRow> {
    filter_items(store.bugs(), session, filter)
        .into_iter()
        .map(|bug| ItemRow::new(bug, store.users()))
        .collect()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PreviewCard {
    pub id: String,
    pub title: String,
    pub status: Status,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub user_name: String,
    pub role: Role,
    pub tasks_total: usize,
    pub bugs_total: usize,
    pub tasks: Vec<PreviewCard>,
    pub bugs: Vec<PreviewCard>,
}

fn preview(id: &str, title: &str, status: Status, description: &str) -> PreviewCard {
    let description = if description.trim().is_empty() {
        NO_DESCRIPTION.to_string()
    } else {
        description.to_string()
    };
    PreviewCard {
        id: id.to_string(),
        title: title.to_string(),
        status,
        description,
    }
}

/// Landing page: counts of visible work and the first `limit` of each kind.
pub fn dashboard(store: &Store, session: &Session, limit: usize) -> Dashboard {
    let tasks = filter_by_role(store.tasks(), session);
    let bugs = filter_by_role(store.bugs(), session);
    Dashboard {
        user_name: assignee_name(store.users(), &session.user_id).to_string(),
        role: session.role,
        tasks_total: tasks.len(),
        bugs_total: bugs.len(),
        tasks: tasks
            .iter()
            .take(limit)
            .map(|task| preview(&task.id, &task.title, task.status, &task.description))
            .collect(),
        bugs: bugs
            .iter()
            .take(limit)
            .map(|bug| preview(&bug.id, &bug.title, bug.status, &bug.description))
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPeriods {
    pub today: usize,
    pub this_week: usize,
    pub this_month: usize,
}

/// Items ending today, since the start of this week, and since the start of
/// this month. Only the end date is looked at, not the status.
pub fn completion_periods<'a, T, I>(
    items: I,
    now: DateTime<Utc>,
    week_start: Weekday,
) -> CompletionPeriods
where
    T: WorkItem + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let today = now.date_naive();
    let days_into_week = i64::from(
        (7 + today.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7,
    );
    let week_begins = today - Duration::days(days_into_week);
    let month_begins = today.with_day(1).unwrap_or(today);

    let mut periods = CompletionPeriods::default();
    for day in items.into_iter().filter_map(|item| item.end_date().and_then(parse_day)) {
        if day == today {
            periods.today += 1;
        }
        if day >= week_begins {
            periods.this_week += 1;
        }
        if day >= month_begins {
            periods.this_month += 1;
        }
    }
    periods
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserCompletion {
    pub user_id: String,
    pub user_name: String,
    pub tasks: CompletionPeriods,
    pub bugs: CompletionPeriods,
}

/// Completion periods per assignee, in user order. Managers get a row for
/// every user; a developer gets only their own.
pub fn completion_periods_by_user(
    store: &Store,
    session: &Session,
    now: DateTime<Utc>,
    week_start: Weekday,
) -> Vec<UserCompletion> {
    store
        .users()
        .iter()
        .filter(|user| session.is_manager() || user.id == session.user_id)
        .map(|user| UserCompletion {
            user_id: user.id.clone(),
            user_name: user.name.clone(),
            tasks: completion_periods(
                store.tasks().iter().filter(|task| task.assignee_id == user.id),
                now,
                week_start,
            ),
            bugs: completion_periods(
                store.bugs().iter().filter(|bug| bug.assignee_id == user.id),
                now,
                week_start,
            ),
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PriorityCount {
    pub priority: Priority,
    pub count: usize,
}

/// Count per priority, always all three in low/medium/high order.
pub fn priority_distribution<'a, T, I>(items: I) -> Vec<PriorityCount>
where
    T: WorkItem + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let mut counts: BTreeMap<Priority, usize> =
        Priority::ALL.iter().map(|priority| (*priority, 0)).collect();
    for item in items {
        *counts.entry(item.priority()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(priority, count)| PriorityCount { priority, count })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeSort {
    Name,
    #[default]
    Total,
}

impl std::str::FromStr for TimeSort {
    type Err = crate::error::Error;

    fn from_str(raw: &str) -> crate::error::Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "name" => Ok(TimeSort::Name),
            "total" | "total_time" | "totaltime" => Ok(TimeSort::Total),
            other => Err(crate::error::Error::InvalidArgument(format!(
                "unknown sort '{other}' (expected name|total)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskTime {
    pub title: String,
    pub minutes: u32,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserTime {
    pub user_id: String,
    pub user_name: String,
    pub total_minutes: u32,
    pub tasks: Vec<TaskTime>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeSpentReport {
    pub users: Vec<UserTime>,
    pub total_users: usize,
    pub total_tasks: usize,
    pub total_minutes: u32,
}

/// Minutes logged per assignee, broken down by task title.
///
/// Tasks whose assignee is unknown are left out. Tasks sharing a title under
/// one user are summed. `search` matches user names case-insensitively.
pub fn time_spent_by_user(
    tasks: &[Task],
    users: &[User],
    search: Option<&str>,
    sort: TimeSort,
) -> TimeSpentReport {
    let mut by_user: BTreeMap<&str, UserTime> = BTreeMap::new();
    for task in tasks {
        let Some(user) = users.iter().find(|user| user.id == task.assignee_id) else {
            continue;
        };
        let entry = by_user.entry(user.id.as_str()).or_insert_with(|| UserTime {
            user_id: user.id.clone(),
            user_name: user.name.clone(),
            total_minutes: 0,
            tasks: Vec::new(),
        });
        entry.total_minutes = entry.total_minutes.saturating_add(task.time_spent);
        match entry.tasks.iter_mut().find(|row| row.title == task.title) {
            Some(row) => row.minutes = row.minutes.saturating_add(task.time_spent),
            None => entry.tasks.push(TaskTime {
                title: task.title.clone(),
                minutes: task.time_spent,
            }),
        }
    }

    let needle = search.map(|term| term.trim().to_lowercase()).unwrap_or_default();
    let mut rows: Vec<UserTime> = by_user
        .into_values()
        .filter(|row| row.user_name.to_lowercase().contains(&needle))
        .collect();

    match sort {
        TimeSort::Name => rows.sort_by(|a, b| {
            a.user_name
                .to_lowercase()
                .cmp(&b.user_name.to_lowercase())
                .then_with(|| a.user_id.cmp(&b.user_id))
        }),
        TimeSort::Total => rows.sort_by(|a, b| {
            b.total_minutes
                .cmp(&a.total_minutes)
                .then_with(|| a.user_name.cmp(&b.user_name))
        }),
    }

    let total_tasks = tasks
        .iter()
        .map(|task| task.title.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    let total_minutes = rows
        .iter()
        .fold(0u32, |sum, row| sum.saturating_add(row.total_minutes));

    TimeSpentReport {
        total_users: rows.len(),
        users: rows,
        total_tasks,
        total_minutes,
    }
}

/// `45m`, `2h 5m`, or `3d 4h`.
pub fn format_minutes(minutes: u32) -> String {
    if minutes < 60 {
        format!("{minutes}m")
    } else if minutes < 1440 {
        format!("{}h {}m", minutes / 60, minutes % 60)
    } else {
        format!("{}d {}h", minutes / 1440, (minutes % 1440) / 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn user(id: &str, name: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            name: name.to_string(),
            email: format!("{id}@example.com"),
            role,
            is_current_user: false,
        }
    }

    fn task(id: &str, title: &str, assignee: &str, minutes: u32) -> Task {
        let mut task = Task::new(
            id,
            title,
            assignee,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        );
        task.time_spent = minutes;
        task
    }

    #[test]
    fn format_minutes_matches_ranges() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(59), "59m");
        assert_eq!(format_minutes(125), "2h 5m");
        assert_eq!(format_minutes(1439), "23h 59m");
        assert_eq!(format_minutes(1500), "1d 1h");
    }

    #[test]
    fn unknown_assignee_renders_fallback() {
        let users = vec![user("u1", "Alice", Role::Developer)];
        assert_eq!(assignee_name(&users, "u1"), "Alice");
        assert_eq!(assignee_name(&users, "ghost"), UNKNOWN_ASSIGNEE);
    }

    #[test]
    fn assignee_filter_only_applies_to_managers() {
        let tasks = vec![task("t1", "A", "u2", 0), task("t2", "B", "u3", 0)];
        let filter = ItemFilter {
            assignee: Some("u3".to_string()),
            ..ItemFilter::default()
        };

        let manager = Session::new("u1", Role::Manager);
        let ids: Vec<_> = filter_items(&tasks, &manager, &filter)
            .iter()
            .map(|task| task.id.as_str())
            .collect();
        assert_eq!(ids, vec!["t2"]);

        let developer = Session::new("u2", Role::Developer);
        let ids: Vec<_> = filter_items(&tasks, &developer, &filter)
            .iter()
            .map(|task| task.id.as_str())
            .collect();
        assert_eq!(ids, vec!["t1"]);
    }

    #[test]
    fn completion_periods_respect_week_start() {
        // 2024-03-13 is a Wednesday.
        let now = Utc.with_ymd_and_hms(2024, 3, 13, 12, 0, 0).unwrap();
        let mut items = Vec::new();
        for (id, end) in [
            ("a", "2024-03-13"),
            ("b", "2024-03-11"),
            ("c", "2024-03-10"),
            ("d", "2024-03-01"),
            ("e", "2024-02-28"),
        ] {
            let mut t = task(id, id, "u2", 0);
            t.end_date = Some(end.to_string());
            items.push(t);
        }
        items.push(task("f", "no end", "u2", 0));

        let sunday = completion_periods(&items, now, Weekday::Sun);
        assert_eq!(
            sunday,
            CompletionPeriods {
                today: 1,
                this_week: 3,
                this_month: 4
            }
        );
        let monday = completion_periods(&items, now, Weekday::Mon);
        assert_eq!(monday.this_week, 2);
    }

    #[test]
    fn priority_distribution_lists_every_priority() {
        let mut high = task("t1", "A", "u2", 0);
        high.priority = Priority::High;
        let counts = priority_distribution(&[high, task("t2", "B", "u2", 0)]);
        assert_eq!(
            counts,
            vec![
                PriorityCount { priority: Priority::Low, count: 0 },
                PriorityCount { priority: Priority::Medium, count: 1 },
                PriorityCount { priority: Priority::High, count: 1 },
            ]
        );
    }

    #[test]
    fn time_spent_groups_sorts_and_searches() {
        let users = vec![
            user("u2", "Alice", Role::Developer),
            user("u3", "Bob", Role::Developer),
        ];
        let tasks = vec![
            task("t1", "Docs", "u2", 30),
            task("t2", "API", "u3", 90),
            task("t3", "Docs", "u2", 15),
            task("t4", "Ghost", "nobody", 500),
        ];

        let report = time_spent_by_user(&tasks, &users, None, TimeSort::Total);
        assert_eq!(report.total_users, 2);
        assert_eq!(report.total_tasks, 3);
        assert_eq!(report.total_minutes, 135);
        assert_eq!(report.users[0].user_name, "Bob");
        assert_eq!(report.users[1].total_minutes, 45);
        assert_eq!(
            report.users[1].tasks,
            vec![TaskTime { title: "Docs".to_string(), minutes: 45 }]
        );

        let by_name = time_spent_by_user(&tasks, &users, None, TimeSort::Name);
        assert_eq!(by_name.users[0].user_name, "Alice");

        let searched = time_spent_by_user(&tasks, &users, Some("BO"), TimeSort::Total);
        assert_eq!(searched.total_users, 1);
        assert_eq!(searched.total_minutes, 90);
    }
}
