//! Day-bucketed chart series.
//!
//! Records are grouped by calendar day (UTC) and counted along one
//! dimension. Every bucket carries the full key vocabulary of its dimension,
//! zeros included, so stacked charts never see a missing series.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Session, Status, Update};
use crate::unify::UnifiedItem;

const TYPE_KEYS: [&str; 2] = ["task", "bug"];
const STATUS_KEYS: [&str; 4] = ["open", "in_progress", "closed", "pending_approval"];
const PRIORITY_KEYS: [&str; 3] = ["low", "medium", "high"];

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    #[default]
    Type,
    Status,
    Priority,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Type, Dimension::Status, Dimension::Priority];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Type => "type",
            Dimension::Status => "status",
            Dimension::Priority => "priority",
        }
    }

    /// Fixed, ordered key vocabulary of this dimension.
    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            Dimension::Type => &TYPE_KEYS,
            Dimension::Status => &STATUS_KEYS,
            Dimension::Priority => &PRIORITY_KEYS,
        }
    }

    /// The key `item` contributes to along this dimension.
    pub fn key_of(&self, item: &UnifiedItem) -> &'static str {
        match self {
            Dimension::Type => item.item_type.as_str(),
            Dimension::Status => item.status.as_str(),
            Dimension::Priority => item.priority.as_str(),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        let wanted = raw.trim().to_ascii_lowercase();
        Dimension::ALL
            .into_iter()
            .find(|dimension| dimension.as_str() == wanted)
            .ok_or_else(|| {
                Error::InvalidArgument(format!(
                    "unknown dimension '{}' (expected type|status|priority)",
                    raw.trim()
                ))
            })
    }
}

/// One calendar day of counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayBucket {
    pub date: NaiveDate,
    counts: Vec<(&'static str, u32)>,
}

impl DayBucket {
    pub fn new(date: NaiveDate, dimension: Dimension) -> Self {
        Self {
            date,
            counts: dimension.keys().iter().map(|key| (*key, 0)).collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<u32> {
        self.counts
            .iter()
            .find(|(candidate, _)| *candidate == key)
            .map(|(_, count)| *count)
    }

    /// Keys and counts in vocabulary order.
    pub fn counts(&self) -> &[(&'static str, u32)] {
        &self.counts
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().map(|(_, count)| count).sum()
    }

    /// Count one record under `key`. Keys outside the vocabulary are ignored.
    fn increment(&mut self, key: &str) -> bool {
        match self.counts.iter_mut().find(|(candidate, _)| *candidate == key) {
            Some((_, count)) => {
                *count += 1;
                true
            }
            None => false,
        }
    }
}

impl Serialize for DayBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.counts.len() + 1))?;
        map.serialize_entry("date", &self.date.format("%Y-%m-%d").to_string())?;
        for (key, count) in &self.counts {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

/// Day buckets in ascending date order.
pub type ChartSeries = Vec<DayBucket>;

/// Records that may be limited to one assignee.
pub trait SeriesRecord {
    /// `None` for records without an assignee; those are never skipped by
    /// the current-user restriction.
    fn assignee(&self) -> Option<&str>;
}

impl SeriesRecord for Update {
    fn assignee(&self) -> Option<&str> {
        None
    }
}

impl SeriesRecord for UnifiedItem {
    fn assignee(&self) -> Option<&str> {
        Some(&self.assignee_id)
    }
}

/// Group `items` into day buckets.
///
/// Records with no date, or with an assignee other than `only_user` when it
/// is set, are skipped. A record whose key is `None` or outside the
/// dimension's vocabulary still opens its day's bucket but adds no count.
pub fn group_by_day<T, D, K>(
    items: &[T],
    date_of: D,
    key_of: K,
    dimension: Dimension,
    only_user: Option<&str>,
) -> ChartSeries
where
    T: SeriesRecord,
    D: Fn(&T) -> Option<NaiveDate>,
    K: Fn(&T) -> Option<&'static str>,
{
    let mut buckets: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
    let mut skipped = 0usize;

    for item in items {
        if let (Some(user), Some(assignee)) = (only_user, item.assignee()) {
            if assignee != user {
                continue;
            }
        }
        let Some(date) = date_of(item) else {
            skipped += 1;
            continue;
        };
        let bucket = buckets
            .entry(date)
            .or_insert_with(|| DayBucket::new(date, dimension));
        if let Some(key) = key_of(item) {
            bucket.increment(key);
        }
    }

    if skipped > 0 {
        debug!(skipped, "records without a usable date left out of series");
    }
    buckets.into_values().collect()
}

/// Update activity per day. Each update counts under its parent item's
/// type, status or priority; an update whose parent is gone falls back to
/// its own type for the type dimension and counts nowhere otherwise.
pub fn activity_series(
    updates: &[Update],
    items: &[UnifiedItem],
    dimension: Dimension,
) -> ChartSeries {
    let by_id: HashMap<&str, &UnifiedItem> =
        items.iter().map(|item| (item.id.as_str(), item)).collect();

    group_by_day(
        updates,
        |update| parse_day(&update.created_at),
        |update| match by_id.get(update.parent_id.as_str()) {
            Some(parent) => Some(dimension.key_of(parent)),
            None if dimension == Dimension::Type => Some(update.item_type.as_str()),
            None => None,
        },
        dimension,
        None,
    )
}

/// Items the session's user completed, per day of their end date.
///
/// Completion means `closed` with an end date; a closed item without one is
/// not counted. Always limited to the session's own user, managers included.
pub fn completion_series(
    items: &[UnifiedItem],
    dimension: Dimension,
    session: &Session,
) -> ChartSeries {
    let completed: Vec<UnifiedItem> = items
        .iter()
        .filter(|item| is_completed(item))
        .cloned()
        .collect();

    group_by_day(
        &completed,
        |item| item.end_date.as_deref().and_then(parse_day),
        |item| Some(dimension.key_of(item)),
        dimension,
        Some(&session.user_id),
    )
}

pub fn is_completed(item: &UnifiedItem) -> bool {
    item.status == Status::Closed && item.end_date.is_some()
}

/// Parse a stored timestamp into an instant.
///
/// Accepts RFC 3339 timestamps (converted to UTC), naive `YYYY-MM-DDTHH:MM:SS`
/// timestamps read as UTC, and plain `YYYY-MM-DD` dates read as UTC midnight.
/// Anything else is `None`.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(timestamp.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(timestamp.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
}

/// Calendar day (UTC) of a stored date; see [`parse_instant`].
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    parse_instant(raw).map(|instant| instant.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ItemType, Priority};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn item(id: &str, status: Status, priority: Priority, end: Option<&str>) -> UnifiedItem {
        UnifiedItem {
            id: id.to_string(),
            status,
            priority,
            assignee_id: "u2".to_string(),
            end_date: end.map(str::to_string),
            item_type: ItemType::Task,
        }
    }

    #[test]
    fn vocabularies_match_enums() {
        let statuses: Vec<_> = Status::ALL.iter().map(Status::as_str).collect();
        assert_eq!(Dimension::Status.keys(), statuses.as_slice());
        let priorities: Vec<_> = Priority::ALL.iter().map(Priority::as_str).collect();
        assert_eq!(Dimension::Priority.keys(), priorities.as_slice());
        let types: Vec<_> = ItemType::ALL.iter().map(ItemType::as_str).collect();
        assert_eq!(Dimension::Type.keys(), types.as_slice());
    }

    #[test]
    fn new_bucket_is_prepopulated() {
        let bucket = DayBucket::new(day(2024, 1, 1), Dimension::Status);
        for key in Dimension::Status.keys() {
            assert_eq!(bucket.get(key), Some(0));
        }
        assert_eq!(bucket.get("task"), None);
        assert_eq!(bucket.total(), 0);
    }

    #[test]
    fn bucket_serializes_flat() {
        let mut bucket = DayBucket::new(day(2024, 1, 2), Dimension::Priority);
        bucket.increment("high");
        assert!(!bucket.increment("urgent"));
        let value = serde_json::to_value(&bucket).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({"date": "2024-01-02", "low": 0, "medium": 0, "high": 1})
        );
    }

    #[test]
    fn empty_input_gives_empty_series() {
        let series = activity_series(&[], &[], Dimension::Type);
        assert!(series.is_empty());
    }

    #[test]
    fn series_is_sorted_by_date() {
        let items = vec![
            item("a", Status::Closed, Priority::Low, Some("2024-02-03")),
            item("b", Status::Closed, Priority::Low, Some("2024-01-15")),
            item("c", Status::Closed, Priority::High, Some("2024-01-15T18:30:00Z")),
        ];
        let session = Session::new("u2", crate::model::Role::Developer);
        let series = completion_series(&items, Dimension::Priority, &session);
        let dates: Vec<_> = series.iter().map(|bucket| bucket.date).collect();
        assert_eq!(dates, vec![day(2024, 1, 15), day(2024, 2, 3)]);
        assert_eq!(series[0].get("low"), Some(1));
        assert_eq!(series[0].get("high"), Some(1));
    }

    #[test]
    fn unparseable_dates_are_skipped() {
        let items = vec![
            item("a", Status::Closed, Priority::Low, Some("not a date")),
            item("b", Status::Closed, Priority::Low, Some("2024-01-15")),
        ];
        let session = Session::new("u2", crate::model::Role::Developer);
        let series = completion_series(&items, Dimension::Type, &session);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].get("task"), Some(1));
    }

    #[test]
    fn parse_day_accepts_common_shapes() {
        assert_eq!(parse_day("2024-01-05"), Some(day(2024, 1, 5)));
        assert_eq!(parse_day("2024-01-05T10:00:00"), Some(day(2024, 1, 5)));
        assert_eq!(parse_day("2024-01-05T10:00:00.250Z"), Some(day(2024, 1, 5)));
        assert_eq!(parse_day("2024-01-05T23:30:00-05:00"), Some(day(2024, 1, 6)));
        assert_eq!(parse_day(""), None);
        assert_eq!(parse_day("05/01/2024"), None);
    }

    #[test]
    fn orphan_update_falls_back_to_own_type_only_for_type_dimension() {
        let update = Update {
            id: "up1".to_string(),
            parent_id: "gone".to_string(),
            item_type: ItemType::Bug,
            message: "still here".to_string(),
            created_by: "u1".to_string(),
            created_at: "2024-01-03T12:00:00Z".to_string(),
        };

        let by_type = activity_series(std::slice::from_ref(&update), &[], Dimension::Type);
        assert_eq!(by_type[0].get("bug"), Some(1));

        let by_status = activity_series(std::slice::from_ref(&update), &[], Dimension::Status);
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].total(), 0);
    }

    #[test]
    fn update_with_bad_date_is_skipped_and_the_rest_chart() {
        let update = |id: &str, created_at: &str| Update {
            id: id.to_string(),
            parent_id: "gone".to_string(),
            item_type: ItemType::Task,
            message: "note".to_string(),
            created_by: "u1".to_string(),
            created_at: created_at.to_string(),
        };
        let updates = vec![
            update("up1", "2024-01-01"),
            update("up2", "yesterday-ish"),
            update("up3", "2024-01-02T10:00:00Z"),
        ];

        let series = activity_series(&updates, &[], Dimension::Type);
        let dates: Vec<_> = series.iter().map(|bucket| bucket.date).collect();
        assert_eq!(dates, vec![day(2024, 1, 1), day(2024, 1, 2)]);
        assert_eq!(series[0].get("task"), Some(1));
        assert_eq!(series[1].get("task"), Some(1));
    }

    #[test]
    fn parse_instant_orders_mixed_shapes() {
        let date_only = parse_instant("2024-01-05").expect("date");
        let timestamp = parse_instant("2024-01-05T08:00:00+02:00").expect("timestamp");
        assert_eq!(date_only.to_rfc3339(), "2024-01-05T00:00:00+00:00");
        assert!(timestamp > date_only);
        assert_eq!(parse_instant("soon"), None);
    }

    #[test]
    fn dimension_parses_names() {
        assert_eq!("Priority".parse::<Dimension>().unwrap(), Dimension::Priority);
        assert!("owner".parse::<Dimension>().is_err());
    }
}
