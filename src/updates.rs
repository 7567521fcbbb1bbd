//! Update trail of tasks and bugs.
//!
//! Updates are appended to the store's log. Older records also carry short
//! inline notes in their own `updates` list; both are shown together.

use chrono::{DateTime, Utc};
use serde::Serialize;
use ulid::Ulid;

use crate::error::{Error, Result};
use crate::model::{timestamp, ItemType, Update, WorkItem};
use crate::series::parse_instant;
use crate::store::Store;

/// Trim an update message, rejecting one that is empty.
pub fn validate_message(raw: &str) -> Result<String> {
    let message = raw.trim();
    if message.is_empty() {
        return Err(Error::Validation("update text cannot be empty".to_string()));
    }
    Ok(message.to_string())
}

/// Append an update for an existing task or bug and return it.
pub fn append_update(
    store: &mut Store,
    parent_id: &str,
    message: &str,
    created_by: &str,
    now: DateTime<Utc>,
) -> Result<Update> {
    let message = validate_message(message)?;
    let item_type = store
        .item_type_of(parent_id)
        .ok_or_else(|| Error::InvalidArgument(format!("no task or bug with id '{parent_id}'")))?;

    let update = Update {
        id: Ulid::new().to_string().to_lowercase(),
        parent_id: parent_id.to_string(),
        item_type,
        message,
        created_by: created_by.to_string(),
        created_at: timestamp(now),
    };
    store.add_update(update.clone());
    Ok(update)
}

/// Push a note onto the parent's inline `updates` list.
///
/// Returns `false` when there is no such parent.
pub fn push_inline_update(store: &mut Store, parent_id: &str, text: &str) -> Result<bool> {
    let text = validate_message(text)?;
    match store.item_type_of(parent_id) {
        Some(ItemType::Task) => {
            let Some(mut task) = store.find_task(parent_id).cloned() else {
                return Ok(false);
            };
            task.updates.push(text);
            store.update_task(task)
        }
        Some(ItemType::Bug) => {
            let Some(mut bug) = store.find_bug(parent_id).cloned() else {
                return Ok(false);
            };
            bug.updates.push(text);
            store.update_bug(bug)
        }
        None => Ok(false),
    }
}

/// Log entries for one parent, oldest first. Entries with an unreadable
/// timestamp keep their stored order after the dated ones.
pub fn updates_for<'a>(store: &'a Store, parent_id: &str) -> Vec<&'a Update> {
    let mut updates: Vec<&Update> = store
        .updates()
        .iter()
        .filter(|update| update.parent_id == parent_id)
        .collect();
    updates.sort_by_key(|update| {
        let at = parse_instant(&update.created_at);
        (at.is_none(), at)
    });
    updates
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrailSource {
    Inline,
    Log,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrailEntry {
    pub message: String,
    pub source: TrailSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Everything said about one item: inline notes in stored order, then log
/// entries by time. Unknown parents still show their orphaned log entries.
pub fn update_trail(store: &Store, parent_id: &str) -> Vec<TrailEntry> {
    let inline: &[String] = match store.item_type_of(parent_id) {
        Some(ItemType::Task) => store
            .find_task(parent_id)
            .map(WorkItem::inline_updates)
            .unwrap_or_default(),
        Some(ItemType::Bug) => store
            .find_bug(parent_id)
            .map(WorkItem::inline_updates)
            .unwrap_or_default(),
        None => &[],
    };

    inline
        .iter()
        .map(|message| TrailEntry {
            message: message.clone(),
            source: TrailSource::Inline,
            created_by: None,
            created_at: None,
        })
        .chain(updates_for(store, parent_id).into_iter().map(|update| TrailEntry {
            message: update.message.clone(),
            source: TrailSource::Log,
            created_by: Some(update.created_by.clone()),
            created_at: Some(update.created_at.clone()),
        }))
        .collect()
}
