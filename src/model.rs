//! Entity records for the board: users, tasks, bugs and updates.
//!
//! Records serialize with camelCase field names and snake_case enum values so
//! fixture files read the same way the dashboard data always has
//! (`assigneeId`, `in_progress`, `pending_approval`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Developer,
    Manager,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Developer => "developer",
            Role::Manager => "manager",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Closed,
    PendingApproval,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::Open,
        Status::InProgress,
        Status::Closed,
        Status::PendingApproval,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::InProgress => "in_progress",
            Status::Closed => "closed",
            Status::PendingApproval => "pending_approval",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

/// Shared scale for a bug's severity and impact.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Task,
    Bug,
}

impl ItemType {
    pub const ALL: [ItemType; 2] = [ItemType::Task, ItemType::Bug];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Task => "task",
            ItemType::Bug => "bug",
        }
    }

    fn id_prefix(&self) -> &'static str {
        match self {
            ItemType::Task => "t",
            ItemType::Bug => "b",
        }
    }
}

macro_rules! impl_name_traits {
    ($ty:ty, $what:literal, [$($variant:expr),+ $(,)?]) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(raw: &str) -> Result<Self> {
                let wanted = raw.trim().to_ascii_lowercase().replace('-', "_");
                [$($variant),+]
                    .into_iter()
                    .find(|candidate| candidate.as_str() == wanted)
                    .ok_or_else(|| {
                        Error::InvalidArgument(format!("unknown {} '{}'", $what, raw.trim()))
                    })
            }
        }
    };
}

impl_name_traits!(Role, "role", [Role::Developer, Role::Manager]);
impl_name_traits!(
    Status,
    "status",
    [Status::Open, Status::InProgress, Status::Closed, Status::PendingApproval]
);
impl_name_traits!(Priority, "priority", [Priority::Low, Priority::Medium, Priority::High]);
impl_name_traits!(
    Severity,
    "severity",
    [Severity::Low, Severity::Medium, Severity::High, Severity::Critical]
);
impl_name_traits!(ItemType, "item type", [ItemType::Task, ItemType::Bug]);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub is_current_user: bool,
}

/// Timer state of a work item.
///
/// Serialized as the `isTracking` / `trackingStartedAt` pair (start time in
/// epoch milliseconds). A pair that disagrees with itself reads back as idle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TrackingFields", into = "TrackingFields")]
pub enum Tracking {
    #[default]
    Idle,
    Running { started_at: DateTime<Utc> },
}

impl Tracking {
    pub fn is_tracking(&self) -> bool {
        matches!(self, Tracking::Running { .. })
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Tracking::Idle => None,
            Tracking::Running { started_at } => Some(*started_at),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TrackingFields {
    #[serde(default)]
    is_tracking: bool,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    tracking_started_at: Option<DateTime<Utc>>,
}

impl From<TrackingFields> for Tracking {
    fn from(fields: TrackingFields) -> Self {
        match (fields.is_tracking, fields.tracking_started_at) {
            (true, Some(started_at)) => Tracking::Running { started_at },
            _ => Tracking::Idle,
        }
    }
}

impl From<Tracking> for TrackingFields {
    fn from(tracking: Tracking) -> Self {
        TrackingFields {
            is_tracking: tracking.is_tracking(),
            tracking_started_at: tracking.started_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    pub status: Status,
    pub assignee_id: String,
    /// Stored as written; read leniently wherever a day is needed.
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub updates: Vec<String>,
    #[serde(default)]
    pub time_spent: u32,
    #[serde(flatten)]
    pub tracking: Tracking,
}

impl Task {
    /// A new open, medium-priority task.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        assignee_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            priority: Priority::Medium,
            status: Status::Open,
            assignee_id: assignee_id.into(),
            created_at: timestamp(created_at),
            start_date: None,
            end_date: None,
            updates: Vec::new(),
            time_spent: 0,
            tracking: Tracking::Idle,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Bug {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub impact: Severity,
    pub priority: Priority,
    pub status: Status,
    pub severity: Severity,
    #[serde(default)]
    pub steps_to_reproduce: String,
    #[serde(default)]
    pub environment: String,
    pub assignee_id: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default)]
    pub updates: Vec<String>,
    #[serde(default)]
    pub time_spent: u32,
    #[serde(flatten)]
    pub tracking: Tracking,
}

impl Bug {
    /// A new open, low-priority, low-severity bug.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        assignee_id: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            impact: Severity::Low,
            priority: Priority::Low,
            status: Status::Open,
            severity: Severity::Low,
            steps_to_reproduce: String::new(),
            environment: String::new(),
            assignee_id: assignee_id.into(),
            created_at: timestamp(created_at),
            start_date: None,
            end_date: None,
            updates: Vec::new(),
            time_spent: 0,
            tracking: Tracking::Idle,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Update {
    pub id: String,
    pub parent_id: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub message: String,
    pub created_by: String,
    pub created_at: String,
}

/// Anything carrying an assignee; the unit the role filter works on.
pub trait Assigned {
    fn assignee_id(&self) -> &str;
}

/// Behaviour shared by tasks and bugs.
pub trait WorkItem: Assigned + Clone {
    const ITEM_TYPE: ItemType;

    fn id(&self) -> &str;
    fn title(&self) -> &str;
    fn status(&self) -> Status;
    fn priority(&self) -> Priority;
    fn created_at(&self) -> &str;
    fn end_date(&self) -> Option<&str>;
    fn time_spent(&self) -> u32;
    fn set_time_spent(&mut self, minutes: u32);
    fn tracking(&self) -> Tracking;
    fn set_tracking(&mut self, tracking: Tracking);
    fn inline_updates(&self) -> &[String];
    fn inline_updates_mut(&mut self) -> &mut Vec<String>;
}

macro_rules! impl_work_item {
    ($ty:ty, $item_type:expr) => {
        impl Assigned for $ty {
            fn assignee_id(&self) -> &str {
                &self.assignee_id
            }
        }

        impl WorkItem for $ty {
            const ITEM_TYPE: ItemType = $item_type;

            fn id(&self) -> &str {
                &self.id
            }

            fn title(&self) -> &str {
                &self.title
            }

            fn status(&self) -> Status {
                self.status
            }

            fn priority(&self) -> Priority {
                self.priority
            }

            fn created_at(&self) -> &str {
                &self.created_at
            }

            fn end_date(&self) -> Option<&str> {
                self.end_date.as_deref()
            }

            fn time_spent(&self) -> u32 {
                self.time_spent
            }

            fn set_time_spent(&mut self, minutes: u32) {
                self.time_spent = minutes;
            }

            fn tracking(&self) -> Tracking {
                self.tracking
            }

            fn set_tracking(&mut self, tracking: Tracking) {
                self.tracking = tracking;
            }

            fn inline_updates(&self) -> &[String] {
                &self.updates
            }

            fn inline_updates_mut(&mut self) -> &mut Vec<String> {
                &mut self.updates
            }
        }
    };
}

impl_work_item!(Task, ItemType::Task);
impl_work_item!(Bug, ItemType::Bug);

/// RFC 3339 form used for every timestamp the board writes.
pub fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Generate a fresh item id such as `t-01j9...` or `b-01j9...`.
pub fn new_item_id(item_type: ItemType) -> String {
    format!(
        "{}-{}",
        item_type.id_prefix(),
        Ulid::new().to_string().to_lowercase()
    )
}

/// Who is looking at the board.
///
/// Every read that depends on the viewer takes a session explicitly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: String,
    pub role: Role,
}

impl Session {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    /// Build the session from the one user flagged as current.
    pub fn from_users(users: &[User]) -> Result<Self> {
        let mut flagged = users.iter().filter(|user| user.is_current_user);
        let current = flagged.next().ok_or(Error::NoCurrentUser)?;
        let extra = flagged.count();
        if extra > 0 {
            return Err(Error::AmbiguousCurrentUser(extra + 1));
        }
        Ok(Self::new(current.id.clone(), current.role))
    }

    /// Build the session for an explicit user id.
    pub fn for_user(users: &[User], user_id: &str) -> Result<Self> {
        let user_id = user_id.trim();
        users
            .iter()
            .find(|user| user.id == user_id)
            .map(|user| Self::new(user.id.clone(), user.role))
            .ok_or_else(|| Error::UserNotFound(user_id.to_string()))
    }

    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }
}
