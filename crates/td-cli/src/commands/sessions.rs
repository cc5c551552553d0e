//! Session listing and rotation.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use td_core::format::format_time_spent;
use td_core::{Session, StateStore, Timestamp, Tracker};

use super::util::format_timestamp;

/// One row of `tabdna sessions --json`.
#[derive(Debug, Serialize)]
struct SessionSummary<'a> {
    id: &'a str,
    start_time: Timestamp,
    tab_count: usize,
    total_time_spent: i64,
    current: bool,
}

impl<'a> SessionSummary<'a> {
    fn new(session: &'a Session, current: bool) -> Self {
        Self {
            id: session.id.as_str(),
            start_time: session.start_time,
            tab_count: session.tabs.len(),
            total_time_spent: session.total_time_spent(),
            current,
        }
    }
}

/// Lists sessions oldest first, the current session last.
pub fn run<W: Write, S: StateStore>(writer: &mut W, tracker: &Tracker<S>, json: bool) -> Result<()> {
    let current_id = &tracker.sessions().current().id;
    let summaries: Vec<_> = tracker
        .sessions()
        .list_sessions()
        .map(|session| SessionSummary::new(session, &session.id == current_id))
        .collect();

    if json {
        serde_json::to_writer_pretty(&mut *writer, &summaries)
            .context("failed to serialize sessions")?;
        writeln!(writer)?;
        return Ok(());
    }

    for summary in &summaries {
        let marker = if summary.current { "  (current)" } else { "" };
        let noun = if summary.tab_count == 1 { "tab" } else { "tabs" };
        writeln!(
            writer,
            "{}  {}  {} {noun}  {}{marker}",
            summary.id,
            format_timestamp(summary.start_time),
            summary.tab_count,
            format_time_spent(summary.total_time_spent),
        )?;
    }
    Ok(())
}

/// Archives the current session and starts a new one.
pub fn start_new<W: Write, S: StateStore>(
    writer: &mut W,
    tracker: &mut Tracker<S>,
    now: Timestamp,
) -> Result<()> {
    let archived = tracker.sessions().current().id.clone();
    let session = tracker
        .start_new_session(now)
        .context("failed to start a new session")?;
    writeln!(writer, "Archived session {archived}")?;
    writeln!(writer, "Started session {}", session.id)?;
    Ok(())
}
