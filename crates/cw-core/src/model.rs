//! Projects, categories and time entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, ProjectId, TimeEntryId};

/// A named container for a category forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    /// Trimmed, never empty.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A node in a project's category forest.
///
/// `project_id` is fixed at creation. `parent_category_id`, when set, always
/// points at a category of the same project, and following parents never
/// leads back to this category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub project_id: ProjectId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_category_id: Option<CategoryId>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A recorded (or running) stretch of work against one category.
///
/// `stopped_at` and `duration_seconds` are either both set or both absent.
/// An entry with neither is the active entry; there is at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: TimeEntryId,
    pub category_id: CategoryId,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TimeEntry {
    /// Whether this entry is still running.
    pub const fn is_active(&self) -> bool {
        self.stopped_at.is_none()
    }

    /// Recorded duration, or time elapsed up to `now` for a running entry.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        self.duration_seconds
            .unwrap_or_else(|| elapsed_seconds(self.started_at, now))
    }
}

/// Whole seconds between `started_at` and `now`.
///
/// Truncates toward zero and clamps at zero when the clock reports `now`
/// before `started_at`.
pub fn elapsed_seconds(started_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - started_at).num_seconds().max(0)
}

/// Insert payload for a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub id: ProjectId,
    pub name: String,
    pub description: Option<String>,
}

/// Insert payload for a category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCategory {
    pub id: CategoryId,
    pub project_id: ProjectId,
    pub parent_category_id: Option<CategoryId>,
    pub name: String,
    pub description: Option<String>,
}

/// Insert payload for a running time entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimeEntry {
    pub id: TimeEntryId,
    pub category_id: CategoryId,
    pub started_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 2, h, m, s).unwrap()
    }

    #[test]
    fn elapsed_seconds_truncates_fractions() {
        let start = at(10, 0, 0);
        let now = start + Duration::milliseconds(2_999);
        assert_eq!(elapsed_seconds(start, now), 2);
    }

    #[test]
    fn elapsed_seconds_clamps_backwards_clock() {
        assert_eq!(elapsed_seconds(at(10, 0, 5), at(10, 0, 0)), 0);
    }

    #[test]
    fn running_entry_reports_elapsed_until_now() {
        let entry = TimeEntry {
            id: TimeEntryId::new(),
            category_id: CategoryId::new(),
            started_at: at(9, 0, 0),
            stopped_at: None,
            duration_seconds: None,
            created_at: at(9, 0, 0),
            updated_at: at(9, 0, 0),
        };
        assert!(entry.is_active());
        assert_eq!(entry.elapsed_seconds(at(9, 1, 30)), 90);
    }

    #[test]
    fn entry_json_omits_stop_fields_while_running() {
        let entry = TimeEntry {
            id: TimeEntryId::new(),
            category_id: CategoryId::new(),
            started_at: at(9, 0, 0),
            stopped_at: None,
            duration_seconds: None,
            created_at: at(9, 0, 0),
            updated_at: at(9, 0, 0),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("stoppedAt").is_none());
        assert!(json.get("durationSeconds").is_none());
        assert_eq!(json["startedAt"], "2025-11-02T09:00:00Z");
    }
}
