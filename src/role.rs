//! Viewer-based visibility.
//!
//! Managers see everything; developers see only what is assigned to them.
//! There is no global gate: each view calls into this module itself.

use crate::model::{Assigned, Session};

pub fn is_visible<T: Assigned + ?Sized>(item: &T, session: &Session) -> bool {
    session.is_manager() || item.assignee_id() == session.user_id
}

/// The visible subset of `items`, in input order.
pub fn filter_by_role<'a, T: Assigned>(items: &'a [T], session: &Session) -> Vec<&'a T> {
    items
        .iter()
        .filter(|item| is_visible(*item, session))
        .collect()
}

/// Owned variant of [`filter_by_role`].
pub fn retain_visible<T: Assigned>(mut items: Vec<T>, session: &Session) -> Vec<T> {
    if !session.is_manager() {
        items.retain(|item| is_visible(item, session));
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, Task};
    use chrono::{TimeZone, Utc};

    fn tasks() -> Vec<Task> {
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        vec![
            Task::new("t1", "A", "u2", created),
            Task::new("t2", "B", "u3", created),
            Task::new("t3", "C", "u2", created),
        ]
    }

    #[test]
    fn manager_sees_everything() {
        let tasks = tasks();
        let session = Session::new("u1", Role::Manager);
        assert_eq!(filter_by_role(&tasks, &session).len(), 3);
        assert_eq!(retain_visible(tasks.clone(), &session), tasks);
    }

    #[test]
    fn developer_sees_own_assignments() {
        let tasks = tasks();
        let session = Session::new("u2", Role::Developer);
        let ids: Vec<_> = filter_by_role(&tasks, &session)
            .into_iter()
            .map(|task| task.id.as_str())
            .collect();
        assert_eq!(ids, vec!["t1", "t3"]);
        assert_eq!(retain_visible(tasks, &session).len(), 2);
    }
}
