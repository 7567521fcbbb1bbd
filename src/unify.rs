//! Common projection of tasks and bugs.
//!
//! Anything that counts tasks and bugs together works on `UnifiedItem`s,
//! derived fresh from the store on every read.

use serde::Serialize;

use crate::model::{Assigned, Bug, ItemType, Priority, Status, Task, WorkItem};
use crate::store::Store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedItem {
    pub id: String,
    pub status: Status,
    pub priority: Priority,
    pub assignee_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    pub item_type: ItemType,
}

impl Assigned for UnifiedItem {
    fn assignee_id(&self) -> &str {
        &self.assignee_id
    }
}

pub fn unify<T: WorkItem>(item: &T) -> UnifiedItem {
    UnifiedItem {
        id: item.id().to_string(),
        status: item.status(),
        priority: item.priority(),
        assignee_id: item.assignee_id().to_string(),
        end_date: item.end_date().map(str::to_string),
        item_type: T::ITEM_TYPE,
    }
}

/// Tasks first, then bugs, each in collection order.
pub fn unify_all(tasks: &[Task], bugs: &[Bug]) -> Vec<UnifiedItem> {
    tasks
        .iter()
        .map(unify)
        .chain(bugs.iter().map(unify))
        .collect()
}

pub fn unified_items(store: &Store) -> Vec<UnifiedItem> {
    unify_all(store.tasks(), store.bugs())
}
