//! taskboard init / add-task / add-bug / edit / delete / track / note
//!
//! Write commands apply to the seeded store and save it back to the seed
//! file the board was loaded from.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::config::{Config, CONFIG_FILE};
use crate::error::{Error, Result};
use crate::fixtures::{Seed, DEFAULT_SEED_FILE};
use crate::model::{new_item_id, Bug, ItemType, Priority, Severity, Status, Task};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::series::parse_day;
use crate::updates::{append_update, push_inline_update};
use crate::views::format_minutes;

use super::items::not_found;
use super::{Board, BugArgs, ItemArgs, TrackCommands};

#[derive(Serialize)]
struct InitReport {
    dir: PathBuf,
    seed: PathBuf,
    created: InitCreated,
}

#[derive(Serialize)]
struct InitCreated {
    config: bool,
    seed: bool,
}

/// Write `.taskboard.toml` pointing at a seed file and copy the built-in
/// seed there. Existing files are left alone apart from the config's seed
/// path when `--seed` names a different one.
pub fn init(dir: &Path, seed: Option<&Path>, output: OutputOptions) -> Result<()> {
    std::fs::create_dir_all(dir)?;
    let config_path = dir.join(CONFIG_FILE);
    let mut config = Config::load_from_dir(dir)?;

    let wanted = match seed {
        Some(path) if path.is_relative() => std::env::current_dir()?.join(path),
        Some(path) => path.to_path_buf(),
        None => config
            .seed
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SEED_FILE)),
    };
    let wrote_config = !config_path.exists() || config.seed.path.as_ref() != Some(&wanted);
    if wrote_config {
        config.seed.path = Some(wanted);
        config.save(&config_path)?;
    }

    let seed_path = config
        .seed_path(dir)
        .unwrap_or_else(|| dir.join(DEFAULT_SEED_FILE));
    let wrote_seed = !seed_path.exists();
    if wrote_seed {
        Seed::builtin()?.save(&seed_path)?;
    }

    let report = InitReport {
        dir: dir.to_path_buf(),
        seed: seed_path,
        created: InitCreated {
            config: wrote_config,
            seed: wrote_seed,
        },
    };

    let header = if wrote_config || wrote_seed {
        "taskboard init: board ready"
    } else {
        "taskboard init: nothing to do"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("dir", report.dir.display().to_string());
    human.push_summary("seed", report.seed.display().to_string());
    human.push_next_step("taskboard add-task <title>");
    human.push_next_step("taskboard dashboard");

    emit_success(output, "init", &report, Some(&human))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WriteReport {
    id: String,
    item_type: ItemType,
    changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    minutes_added: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    update_id: Option<String>,
    seed: PathBuf,
}

impl WriteReport {
    fn new(id: &str, item_type: ItemType, changed: bool, seed: PathBuf) -> Self {
        Self {
            id: id.to_string(),
            item_type,
            changed,
            minutes_added: None,
            update_id: None,
            seed,
        }
    }
}

/// Parsed `ItemArgs`; `None` leaves a field as it is.
#[derive(Debug, Default)]
struct ItemChanges {
    title: Option<String>,
    description: Option<String>,
    priority: Option<Priority>,
    status: Option<Status>,
    assignee_id: Option<String>,
    start_date: Option<Option<String>>,
    end_date: Option<Option<String>>,
}

impl ItemChanges {
    fn parse(board: &Board, title: Option<&str>, args: &ItemArgs) -> Result<Self> {
        let assignee_id = match args.assignee.as_deref().map(str::trim) {
            Some(id) => match board.store.user(id) {
                Some(user) => Some(user.id.clone()),
                None => return Err(Error::UserNotFound(id.to_string())),
            },
            None => None,
        };
        Ok(Self {
            title: title.map(|title| title.trim().to_string()),
            description: args.description.clone(),
            priority: args
                .priority
                .as_deref()
                .map(str::parse::<Priority>)
                .transpose()?,
            status: args.status.as_deref().map(str::parse::<Status>).transpose()?,
            assignee_id,
            start_date: args
                .start_date
                .as_deref()
                .map(|raw| date_arg("--start-date", raw))
                .transpose()?,
            end_date: args
                .end_date
                .as_deref()
                .map(|raw| date_arg("--end-date", raw))
                .transpose()?,
        })
    }

    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.assignee_id.is_none()
            && self.start_date.is_none()
            && self.end_date.is_none()
    }
}

/// Parsed `BugArgs`.
#[derive(Debug, Default)]
struct BugChanges {
    severity: Option<Severity>,
    impact: Option<Severity>,
    steps_to_reproduce: Option<String>,
    environment: Option<String>,
}

impl BugChanges {
    fn parse(args: &BugArgs) -> Result<Self> {
        Ok(Self {
            severity: args
                .severity
                .as_deref()
                .map(str::parse::<Severity>)
                .transpose()?,
            impact: args
                .impact
                .as_deref()
                .map(str::parse::<Severity>)
                .transpose()?,
            steps_to_reproduce: args.steps.clone(),
            environment: args.environment.clone(),
        })
    }

    fn is_empty(&self) -> bool {
        self.severity.is_none()
            && self.impact.is_none()
            && self.steps_to_reproduce.is_none()
            && self.environment.is_none()
    }

    fn apply(self, bug: &mut Bug) {
        if let Some(severity) = self.severity {
            bug.severity = severity;
        }
        if let Some(impact) = self.impact {
            bug.impact = impact;
        }
        if let Some(steps) = self.steps_to_reproduce {
            bug.steps_to_reproduce = steps;
        }
        if let Some(environment) = self.environment {
            bug.environment = environment;
        }
    }
}

/// Tasks and bugs share every field `ItemChanges` touches.
macro_rules! apply_item_changes {
    ($changes:expr, $record:expr) => {{
        let changes = $changes;
        let record = $record;
        if let Some(title) = changes.title {
            record.title = title;
        }
        if let Some(description) = changes.description {
            record.description = description;
        }
        if let Some(priority) = changes.priority {
            record.priority = priority;
        }
        if let Some(status) = changes.status {
            record.status = status;
        }
        if let Some(assignee_id) = changes.assignee_id {
            record.assignee_id = assignee_id;
        }
        if let Some(start_date) = changes.start_date {
            record.start_date = start_date;
        }
        if let Some(end_date) = changes.end_date {
            record.end_date = end_date;
        }
    }};
}

/// A date flag value: empty clears, anything else must read as a day.
fn date_arg(flag: &str, raw: &str) -> Result<Option<String>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if parse_day(raw).is_none() {
        return Err(Error::InvalidArgument(format!(
            "{flag}: unreadable date '{raw}' (expected YYYY-MM-DD)"
        )));
    }
    Ok(Some(raw.to_string()))
}

pub fn add_task(
    board: &mut Board,
    title: &str,
    fields: &ItemArgs,
    output: OutputOptions,
) -> Result<()> {
    let changes = ItemChanges::parse(board, Some(title), fields)?;
    let mut task = Task::new(
        new_item_id(ItemType::Task),
        title.trim(),
        board.session.user_id.clone(),
        Utc::now(),
    );
    apply_item_changes!(changes, &mut task);

    let id = task.id.clone();
    board.store.add_task(task)?;
    let seed = board.save()?;

    let mut human = HumanOutput::new("Task added");
    human.push_summary("ID", id.clone());
    human.push_summary("Title", title.trim());
    human.push_next_step(format!("taskboard show {id}"));

    let report = WriteReport::new(&id, ItemType::Task, true, seed);
    emit_success(output, "add-task", &report, Some(&human))
}

pub fn add_bug(
    board: &mut Board,
    title: &str,
    fields: &ItemArgs,
    bug_fields: &BugArgs,
    output: OutputOptions,
) -> Result<()> {
    let changes = ItemChanges::parse(board, Some(title), fields)?;
    let bug_changes = BugChanges::parse(bug_fields)?;
    let mut bug = Bug::new(
        new_item_id(ItemType::Bug),
        title.trim(),
        board.session.user_id.clone(),
        Utc::now(),
    );
    apply_item_changes!(changes, &mut bug);
    bug_changes.apply(&mut bug);

    let id = bug.id.clone();
    board.store.add_bug(bug)?;
    let seed = board.save()?;

    let mut human = HumanOutput::new("Bug added");
    human.push_summary("ID", id.clone());
    human.push_summary("Title", title.trim());
    human.push_next_step(format!("taskboard show {id}"));

    let report = WriteReport::new(&id, ItemType::Bug, true, seed);
    emit_success(output, "add-bug", &report, Some(&human))
}

/// Change fields of a task or bug against the version read at the start.
pub fn edit(
    board: &mut Board,
    id: &str,
    title: Option<&str>,
    fields: &ItemArgs,
    bug_fields: &BugArgs,
    output: OutputOptions,
) -> Result<()> {
    let id = id.trim();
    let changes = ItemChanges::parse(board, title, fields)?;
    let bug_changes = BugChanges::parse(bug_fields)?;
    if changes.is_empty() && bug_changes.is_empty() {
        return Err(Error::InvalidArgument(
            "edit requires at least one field to change".to_string(),
        ));
    }

    let item_type = board
        .store
        .item_type_of(id)
        .ok_or_else(|| not_found(&board.store, id))?;
    let changed = match item_type {
        ItemType::Task => {
            if !bug_changes.is_empty() {
                return Err(Error::InvalidArgument(format!(
                    "{id} is a task; --severity, --impact, --steps and --environment apply to bugs"
                )));
            }
            let (Some(mut task), Some(version)) = (
                board.store.find_task(id).cloned(),
                board.store.task_version(id),
            ) else {
                return Err(not_found(&board.store, id));
            };
            apply_item_changes!(changes, &mut task);
            board.store.update_task_if(task, version)?
        }
        ItemType::Bug => {
            let (Some(mut bug), Some(version)) = (
                board.store.find_bug(id).cloned(),
                board.store.bug_version(id),
            ) else {
                return Err(not_found(&board.store, id));
            };
            apply_item_changes!(changes, &mut bug);
            bug_changes.apply(&mut bug);
            board.store.update_bug_if(bug, version)?
        }
    };
    let seed = board.save()?;

    let mut human = HumanOutput::new(format!("{} updated", capitalized(item_type)));
    human.push_summary("ID", id);
    human.push_next_step(format!("taskboard show {id}"));

    let report = WriteReport::new(id, item_type, changed, seed);
    emit_success(output, "edit", &report, Some(&human))
}

/// Delete a task or bug. Its log entries are kept and show as orphans.
pub fn delete(board: &mut Board, id: &str, output: OutputOptions) -> Result<()> {
    let id = id.trim();
    let item_type = board
        .store
        .item_type_of(id)
        .ok_or_else(|| not_found(&board.store, id))?;
    let removed = match item_type {
        ItemType::Task => board.store.delete_task(id),
        ItemType::Bug => board.store.delete_bug(id),
    };
    let seed = board.save()?;

    let mut human = HumanOutput::new(format!("{} deleted", capitalized(item_type)));
    human.push_summary("ID", id);

    let report = WriteReport::new(id, item_type, removed, seed);
    emit_success(output, "delete", &report, Some(&human))
}

pub fn track(board: &mut Board, action: &TrackCommands, output: OutputOptions) -> Result<()> {
    let now = Utc::now();
    let (id, starting) = match action {
        TrackCommands::Start { id } => (id.trim(), true),
        TrackCommands::Stop { id } => (id.trim(), false),
    };
    let item_type = board
        .store
        .item_type_of(id)
        .ok_or_else(|| not_found(&board.store, id))?;

    let (changed, minutes_added) = match (item_type, starting) {
        (ItemType::Task, true) => (board.store.start_tracking(id, now), None),
        (ItemType::Bug, true) => (board.store.start_bug_tracking(id, now), None),
        (ItemType::Task, false) => {
            let added = board.store.stop_tracking(id, now);
            (added.is_some(), added)
        }
        (ItemType::Bug, false) => {
            let added = board.store.stop_bug_tracking(id, now);
            (added.is_some(), added)
        }
    };
    let seed = if changed {
        board.save()?
    } else {
        debug!(id, starting, "tracking unchanged; seed not written");
        board.writable_seed()?.to_path_buf()
    };

    let header = if starting {
        "Tracking started"
    } else {
        "Tracking stopped"
    };
    let mut human = HumanOutput::new(header);
    human.push_summary("ID", id);
    if let Some(minutes) = minutes_added {
        human.push_summary("Added", format_minutes(minutes));
    }
    if !changed {
        human.push_warning(if starting {
            "timer was already running"
        } else {
            "timer was not running"
        });
    }

    let mut report = WriteReport::new(id, item_type, changed, seed);
    report.minutes_added = minutes_added;
    emit_success(output, "track", &report, Some(&human))
}

/// Add an update: a log entry by the acting user, or with `inline` a note
/// on the item itself.
pub fn note(
    board: &mut Board,
    id: &str,
    message: &str,
    inline: bool,
    output: OutputOptions,
) -> Result<()> {
    let id = id.trim();
    let item_type = board
        .store
        .item_type_of(id)
        .ok_or_else(|| not_found(&board.store, id))?;

    let update_id = if inline {
        push_inline_update(&mut board.store, id, message)?;
        None
    } else {
        let author = board.session.user_id.clone();
        Some(append_update(&mut board.store, id, message, &author, Utc::now())?.id)
    };
    let seed = board.save()?;

    let mut human = HumanOutput::new(format!("Update added to {item_type}"));
    human.push_summary("ID", id);
    human.push_summary("Update", message.trim());

    let mut report = WriteReport::new(id, item_type, true, seed);
    report.update_id = update_id;
    emit_success(output, "note", &report, Some(&human))
}

fn capitalized(item_type: ItemType) -> &'static str {
    match item_type {
        ItemType::Task => "Task",
        ItemType::Bug => "Bug",
    }
}
