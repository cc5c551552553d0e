//! Shared utilities for CLI commands.

use chrono::{DateTime, SecondsFormat, Utc};

use td_core::{Session, StateStore, Timestamp, Tracker};

/// Formats epoch milliseconds as an RFC 3339 UTC timestamp, falling back to
/// the raw number when it is out of range.
pub fn format_timestamp(ms: Timestamp) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms).map_or_else(
        || ms.to_string(),
        |dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

/// Looks up `id`, or the current session when no id is given.
pub fn resolve_session<'a, S: StateStore>(
    tracker: &'a Tracker<S>,
    id: Option<&str>,
) -> anyhow::Result<&'a Session> {
    match id {
        None => Ok(tracker.sessions().current()),
        Some(id) => tracker
            .sessions()
            .get_session(id)
            .ok_or_else(|| anyhow::anyhow!("session not found: {id}")),
    }
}
