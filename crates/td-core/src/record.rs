//! Tab records, time accounting entries and their merged snapshots.

use serde::{Deserialize, Serialize};

use crate::transition::TransitionType;
use crate::types::{TabId, Timestamp};

/// Title given to tabs the host reports without one.
pub const DEFAULT_TAB_TITLE: &str = "New Tab";

/// What the host reports about a freshly created tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTab {
    pub id: TabId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// URL the tab is about to load; preferred over `url` when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl NewTab {
    pub fn new(id: TabId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// The URL to record: pending URL first, then the current one.
    pub fn initial_url(&self) -> String {
        self.pending_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .or_else(|| self.url.as_deref())
            .unwrap_or_default()
            .to_string()
    }

    pub fn initial_title(&self) -> String {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TAB_TITLE)
            .to_string()
    }
}

/// One tracked tab and its place in the opener tree.
///
/// `children` and `parent_id` are mutual inverses while every mutation goes
/// through [`crate::TabStore`]: `c` is in `a.children` exactly when
/// `records[c].parent_id == Some(a.id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabRecord {
    pub id: TabId,
    #[serde(default)]
    pub parent_id: Option<TabId>,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    /// Fixed when the record is created.
    pub creation_time: Timestamp,
    /// Child tab ids in the order they were opened.
    #[serde(default)]
    pub children: Vec<TabId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_type: Option<TransitionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

impl TabRecord {
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Active-time accounting for one tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub start_time: Timestamp,
    /// Set only while this tab is the active one.
    #[serde(default)]
    pub last_active_time: Option<Timestamp>,
    /// Accumulated active milliseconds, excluding the running span.
    #[serde(default)]
    pub total_time_spent: i64,
}

impl TimeEntry {
    pub const fn new(start_time: Timestamp) -> Self {
        Self {
            start_time,
            last_active_time: None,
            total_time_spent: 0,
        }
    }

    pub const fn is_active(&self) -> bool {
        self.last_active_time.is_some()
    }

    /// Moves the running span into `total_time_spent` and marks the entry
    /// inactive. Returns the milliseconds added.
    pub fn flush(&mut self, now: Timestamp) -> i64 {
        let Some(since) = self.last_active_time.take() else {
            return 0;
        };
        let delta = now.saturating_sub(since).max(0);
        self.total_time_spent = self.total_time_spent.saturating_add(delta);
        delta
    }

    /// Total time including the running span, without mutating the entry.
    pub fn time_spent_at(&self, now: Timestamp) -> i64 {
        let running = self
            .last_active_time
            .map_or(0, |since| now.saturating_sub(since).max(0));
        self.total_time_spent.saturating_add(running)
    }
}

/// A tab record merged with its time accounting, as stored in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabSnapshot {
    #[serde(flatten)]
    pub record: TabRecord,
    pub time_data: TimeEntry,
}

impl TabSnapshot {
    /// Merges a record with its time entry. Tabs that were never activated
    /// get an empty entry starting at the record's creation time.
    pub fn merge(record: &TabRecord, time: Option<&TimeEntry>) -> Self {
        Self {
            record: record.clone(),
            time_data: time
                .copied()
                .unwrap_or_else(|| TimeEntry::new(record.creation_time)),
        }
    }
}
