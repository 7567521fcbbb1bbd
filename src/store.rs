//! In-memory entity store.
//!
//! The store owns the four collections (users, tasks, bugs, updates) and is
//! the only place records are mutated. Each task and bug collection is keyed
//! by id and keeps a per-record version so edit paths can detect that the
//! record changed under them.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Bug, ItemType, Task, Update, User, WorkItem};
use crate::tracking;

const INITIAL_VERSION: u64 = 1;

/// Ordered, id-unique collection of work items.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    records: Vec<T>,
    versions: HashMap<String, u64>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            versions: HashMap::new(),
        }
    }
}

impl<T: WorkItem> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<T>) -> Result<Self> {
        let mut collection = Self::new();
        for record in records {
            collection.insert(record)?;
        }
        Ok(collection)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.records
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.records.iter().find(|record| record.id() == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.versions.contains_key(id)
    }

    pub fn version(&self, id: &str) -> Option<u64> {
        self.versions.get(id).copied()
    }

    /// Append a record; its id must not already be present.
    pub fn insert(&mut self, record: T) -> Result<()> {
        if self.contains(record.id()) {
            return Err(Error::DuplicateId(record.id().to_string()));
        }
        self.versions.insert(record.id().to_string(), INITIAL_VERSION);
        self.records.push(record);
        Ok(())
    }

    /// Replace the record with the same id. Returns `false` when there is none.
    pub fn replace(&mut self, record: T) -> bool {
        let Some(index) = self.position(record.id()) else {
            return false;
        };
        self.bump_version(record.id());
        self.records[index] = record;
        true
    }

    /// Replace only if the stored version still equals `expected`.
    pub fn replace_if(&mut self, record: T, expected: u64) -> Result<bool> {
        let Some(actual) = self.version(record.id()) else {
            return Ok(false);
        };
        if actual != expected {
            return Err(Error::VersionConflict {
                id: record.id().to_string(),
                expected,
                actual,
            });
        }
        Ok(self.replace(record))
    }

    /// Remove every record with this id.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.id() != id);
        self.versions.remove(id);
        self.records.len() != before
    }

    /// Run `apply` on the record in place; the version moves only when
    /// `apply` reports a change. `None` when the id is unknown.
    pub fn apply<F>(&mut self, id: &str, apply: F) -> Option<bool>
    where
        F: FnOnce(&mut T) -> bool,
    {
        let index = self.position(id)?;
        let changed = apply(&mut self.records[index]);
        if changed {
            self.bump_version(id);
        }
        Some(changed)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.records.iter().position(|record| record.id() == id)
    }

    fn bump_version(&mut self, id: &str) {
        if let Some(version) = self.versions.get_mut(id) {
            *version += 1;
        }
    }
}

/// Reject titles that are empty after trimming.
pub fn validate_title(title: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::Validation("title cannot be empty".to_string()));
    }
    Ok(())
}

/// The board's single source of truth.
#[derive(Debug, Clone, Default)]
pub struct Store {
    users: Vec<User>,
    tasks: Collection<Task>,
    bugs: Collection<Bug>,
    updates: Vec<Update>,
    revision: u64,
}

impl Store {
    pub fn new(users: Vec<User>, tasks: Vec<Task>, bugs: Vec<Bug>) -> Result<Self> {
        Ok(Self {
            users,
            tasks: Collection::from_records(tasks)?,
            bugs: Collection::from_records(bugs)?,
            updates: Vec::new(),
            revision: 0,
        })
    }

    /// Monotonic counter bumped by every mutation that changed something.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn user(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    pub fn tasks(&self) -> &[Task] {
        self.tasks.as_slice()
    }

    pub fn bugs(&self) -> &[Bug] {
        self.bugs.as_slice()
    }

    pub fn updates(&self) -> &[Update] {
        &self.updates
    }

    pub fn find_task(&self, id: &str) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn find_bug(&self, id: &str) -> Option<&Bug> {
        self.bugs.get(id)
    }

    pub fn task_version(&self, id: &str) -> Option<u64> {
        self.tasks.version(id)
    }

    pub fn bug_version(&self, id: &str) -> Option<u64> {
        self.bugs.version(id)
    }

    /// Which collection an id lives in, if any.
    pub fn item_type_of(&self, id: &str) -> Option<ItemType> {
        if self.tasks.contains(id) {
            Some(ItemType::Task)
        } else if self.bugs.contains(id) {
            Some(ItemType::Bug)
        } else {
            None
        }
    }

    pub fn add_task(&mut self, task: Task) -> Result<()> {
        validate_title(&task.title)?;
        let id = task.id.clone();
        self.tasks.insert(task)?;
        self.touch();
        info!(task = %id, "task added");
        Ok(())
    }

    /// Overwrite a task. Unknown ids are a silent no-op returning `false`.
    pub fn update_task(&mut self, task: Task) -> Result<bool> {
        validate_title(&task.title)?;
        let id = task.id.clone();
        let replaced = self.tasks.replace(task);
        self.record_replace(ItemType::Task, &id, replaced);
        Ok(replaced)
    }

    /// Overwrite a task only if nobody changed it since `expected_version`.
    pub fn update_task_if(&mut self, task: Task, expected_version: u64) -> Result<bool> {
        validate_title(&task.title)?;
        let id = task.id.clone();
        let replaced = self.tasks.replace_if(task, expected_version)?;
        self.record_replace(ItemType::Task, &id, replaced);
        Ok(replaced)
    }

    pub fn delete_task(&mut self, id: &str) -> bool {
        let removed = self.tasks.remove(id);
        self.record_remove(ItemType::Task, id, removed);
        removed
    }

    pub fn add_bug(&mut self, bug: Bug) -> Result<()> {
        validate_title(&bug.title)?;
        let id = bug.id.clone();
        self.bugs.insert(bug)?;
        self.touch();
        info!(bug = %id, "bug added");
        Ok(())
    }

    /// Overwrite a bug. Unknown ids are a silent no-op returning `false`.
    pub fn update_bug(&mut self, bug: Bug) -> Result<bool> {
        validate_title(&bug.title)?;
        let id = bug.id.clone();
        let replaced = self.bugs.replace(bug);
        self.record_replace(ItemType::Bug, &id, replaced);
        Ok(replaced)
    }

    /// Overwrite a bug only if nobody changed it since `expected_version`.
    pub fn update_bug_if(&mut self, bug: Bug, expected_version: u64) -> Result<bool> {
        validate_title(&bug.title)?;
        let id = bug.id.clone();
        let replaced = self.bugs.replace_if(bug, expected_version)?;
        self.record_replace(ItemType::Bug, &id, replaced);
        Ok(replaced)
    }

    pub fn delete_bug(&mut self, id: &str) -> bool {
        let removed = self.bugs.remove(id);
        self.record_remove(ItemType::Bug, id, removed);
        removed
    }

    /// Append to the update log. The parent is not checked.
    pub fn add_update(&mut self, update: Update) {
        debug!(update = %update.id, parent = %update.parent_id, "update appended");
        self.updates.push(update);
        self.touch();
    }

    pub fn clear_updates(&mut self) {
        if self.updates.is_empty() {
            return;
        }
        info!(count = self.updates.len(), "update log cleared");
        self.updates.clear();
        self.touch();
    }

    /// Start the timer on a task. `false` when already running or unknown.
    pub fn start_tracking(&mut self, task_id: &str, now: DateTime<Utc>) -> bool {
        let started = start_in(&mut self.tasks, task_id, now);
        self.record_tracking(ItemType::Task, task_id, started, "started");
        started
    }

    /// Stop the timer on a task, returning the minutes added to `timeSpent`.
    pub fn stop_tracking(&mut self, task_id: &str, now: DateTime<Utc>) -> Option<u32> {
        let added = stop_in(&mut self.tasks, task_id, now);
        self.record_tracking(ItemType::Task, task_id, added.is_some(), "stopped");
        added
    }

    pub fn start_bug_tracking(&mut self, bug_id: &str, now: DateTime<Utc>) -> bool {
        let started = start_in(&mut self.bugs, bug_id, now);
        self.record_tracking(ItemType::Bug, bug_id, started, "started");
        started
    }

    pub fn stop_bug_tracking(&mut self, bug_id: &str, now: DateTime<Utc>) -> Option<u32> {
        let added = stop_in(&mut self.bugs, bug_id, now);
        self.record_tracking(ItemType::Bug, bug_id, added.is_some(), "stopped");
        added
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    fn record_replace(&mut self, item_type: ItemType, id: &str, replaced: bool) {
        if replaced {
            self.touch();
            info!(kind = %item_type, id, "item updated");
        } else {
            debug!(kind = %item_type, id, "update ignored: no such item");
        }
    }

    fn record_remove(&mut self, item_type: ItemType, id: &str, removed: bool) {
        if removed {
            self.touch();
            info!(kind = %item_type, id, "item deleted");
        } else {
            debug!(kind = %item_type, id, "delete ignored: no such item");
        }
    }

    fn record_tracking(&mut self, item_type: ItemType, id: &str, changed: bool, action: &str) {
        if changed {
            self.touch();
            debug!(kind = %item_type, id, action, "tracking transition");
        } else {
            debug!(kind = %item_type, id, action, "tracking transition ignored");
        }
    }
}

fn start_in<T: WorkItem>(collection: &mut Collection<T>, id: &str, now: DateTime<Utc>) -> bool {
    collection
        .apply(id, |item| tracking::start(item, now))
        .unwrap_or(false)
}

fn stop_in<T: WorkItem>(
    collection: &mut Collection<T>,
    id: &str,
    now: DateTime<Utc>,
) -> Option<u32> {
    let mut added = None;
    collection.apply(id, |item| {
        added = tracking::stop(item, now);
        added.is_some()
    });
    added
}
