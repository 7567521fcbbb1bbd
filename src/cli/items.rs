//! taskboard tasks / bugs / show command implementations

use chrono::Utc;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{Bug, ItemType, Priority, Status, Task, WorkItem};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::role::is_visible;
use crate::series::parse_instant;
use crate::store::Store;
use crate::tracking::live_minutes;
use crate::updates::{update_trail, TrailEntry, TrailSource};
use crate::views::{assignee_name, bug_rows, format_minutes, task_rows, ItemFilter, ItemRow};

use super::{Board, FilterArgs};

#[derive(Serialize)]
struct ItemList {
    filter: FilterReport,
    total: usize,
    items: Vec<ItemRow>,
}

#[derive(Serialize)]
struct FilterReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    assignee: Option<String>,
}

pub fn list_tasks(board: &Board, args: &FilterArgs, output: OutputOptions) -> Result<()> {
    let filter = parse_filter(args)?;
    let rows = task_rows(&board.store, &board.session, &filter);
    emit_list(board, "tasks", "Tasks", &filter, rows, output)
}

pub fn list_bugs(board: &Board, args: &FilterArgs, output: OutputOptions) -> Result<()> {
    let filter = parse_filter(args)?;
    let rows = bug_rows(&board.store, &board.session, &filter);
    emit_list(board, "bugs", "Bugs", &filter, rows, output)
}

fn parse_filter(args: &FilterArgs) -> Result<ItemFilter> {
    Ok(ItemFilter {
        status: args.status.as_deref().map(str::parse::<Status>).transpose()?,
        priority: args
            .priority
            .as_deref()
            .map(str::parse::<Priority>)
            .transpose()?,
        assignee: args
            .assignee
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string),
    })
}

fn emit_list(
    board: &Board,
    command: &str,
    header: &str,
    filter: &ItemFilter,
    rows: Vec<ItemRow>,
    output: OutputOptions,
) -> Result<()> {
    let report = ItemList {
        filter: FilterReport {
            status: filter.status.map(|status| status.to_string()),
            priority: filter.priority.map(|priority| priority.to_string()),
            assignee: filter.assignee.clone(),
        },
        total: rows.len(),
        items: rows,
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("Visible", report.total.to_string());
    if let Some(status) = &report.filter.status {
        human.push_summary("Status", status.clone());
    }
    if let Some(priority) = &report.filter.priority {
        human.push_summary("Priority", priority.clone());
    }
    for row in &report.items {
        let tracking = if row.is_tracking { ", tracking" } else { "" };
        human.push_detail(format!(
            "{} [{}/{}] {} ({}, {}{})",
            row.id,
            row.status,
            row.priority,
            row.title,
            row.assignee,
            format_minutes(row.time_spent),
            tracking
        ));
    }
    if filter.assignee.is_some() && !board.session.is_manager() {
        human.push_warning("--assignee is ignored for developers");
    }

    emit_success(output, command, &report, Some(&human))
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ShownItem<'a> {
    Task(&'a Task),
    Bug(&'a Bug),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ShowReport<'a> {
    item: ShownItem<'a>,
    assignee: String,
    live_minutes: u32,
    trail: Vec<TrailEntry>,
}

/// Show one task or bug. Items hidden from a developer read as not found.
pub fn show(board: &Board, id: &str, output: OutputOptions) -> Result<()> {
    let store = &board.store;
    let id = id.trim();
    let now = Utc::now();

    let task = store
        .find_task(id)
        .filter(|task| is_visible(*task, &board.session));
    let bug = store
        .find_bug(id)
        .filter(|bug| is_visible(*bug, &board.session));

    let (item, human) = match (task, bug) {
        (Some(task), _) => (ShownItem::Task(task), describe(task, board, now)),
        (None, Some(bug)) => {
            let mut human = describe(bug, board, now);
            human.push_summary("Severity", bug.severity.to_string());
            human.push_summary("Impact", bug.impact.to_string());
            if !bug.environment.trim().is_empty() {
                human.push_summary("Environment", bug.environment.clone());
            }
            (ShownItem::Bug(bug), human)
        }
        (None, None) => return Err(not_found(store, id)),
    };

    let (assignee_id, live) = match &item {
        ShownItem::Task(task) => (task.assignee_id.as_str(), live_minutes(*task, now)),
        ShownItem::Bug(bug) => (bug.assignee_id.as_str(), live_minutes(*bug, now)),
    };
    let report = ShowReport {
        assignee: assignee_name(store.users(), assignee_id).to_string(),
        live_minutes: live,
        trail: update_trail(store, id),
        item,
    };

    let mut human = human;
    for entry in &report.trail {
        match (entry.source, &entry.created_at) {
            (TrailSource::Log, Some(at)) => {
                let author = entry
                    .created_by
                    .as_deref()
                    .map(|user| assignee_name(store.users(), user))
                    .unwrap_or(crate::views::UNKNOWN_ASSIGNEE);
                let at = parse_instant(at)
                    .map(|instant| instant.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| at.clone());
                human.push_detail(format!("{at} {author}: {}", entry.message));
            }
            _ => human.push_detail(entry.message.clone()),
        }
    }

    emit_success(output, "show", &report, Some(&human))
}

/// "Task not found" or "Bug not found", labelled by the collection the id
/// lives in even when it is hidden from the session.
pub(super) fn not_found(store: &Store, id: &str) -> Error {
    let noun = match store.item_type_of(id) {
        Some(ItemType::Bug) => "Bug",
        Some(ItemType::Task) => "Task",
        None => "Task or bug",
    };
    Error::InvalidArgument(format!("{noun} not found: {id}"))
}

fn describe<T: WorkItem>(item: &T, board: &Board, now: chrono::DateTime<Utc>) -> HumanOutput {
    let mut human = HumanOutput::new(format!("{} {}", item.id(), item.title()));
    human.push_summary("Type", T::ITEM_TYPE.to_string());
    human.push_summary("Status", item.status().to_string());
    human.push_summary("Priority", item.priority().to_string());
    human.push_summary(
        "Assignee",
        assignee_name(board.store.users(), item.assignee_id()),
    );
    if let Some(end) = item.end_date() {
        human.push_summary("End date", end);
    }
    let spent = format_minutes(live_minutes(item, now));
    if item.tracking().is_tracking() {
        human.push_summary("Time spent", format!("{spent} (tracking)"));
    } else {
        human.push_summary("Time spent", spent);
    }
    human
}
