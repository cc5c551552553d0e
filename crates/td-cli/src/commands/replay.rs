//! Replays a JSONL log of host tab events into the tracker.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use td_core::{StateStore, TimedEvent, Timestamp, Tracker};

/// Outcome of a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub applied: usize,
    pub skipped: usize,
}

/// Applies every event line from `reader`.
///
/// Blank lines are ignored and malformed lines are skipped with a warning.
/// Events without a timestamp are applied at `fallback_now`. A persistence
/// failure aborts the replay.
pub fn apply<R: BufRead, S: StateStore>(
    tracker: &mut Tracker<S>,
    reader: R,
    fallback_now: Timestamp,
) -> Result<ReplayStats> {
    let mut stats = ReplayStats::default();

    for (index, line) in reader.lines().enumerate() {
        let line_number = index + 1;
        let line = line.with_context(|| format!("failed to read line {line_number}"))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let timed: TimedEvent = match serde_json::from_str(line) {
            Ok(timed) => timed,
            Err(err) => {
                tracing::warn!(line = line_number, error = %err, "skipping malformed event");
                stats.skipped += 1;
                continue;
            }
        };

        let now = timed.timestamp.unwrap_or(fallback_now);
        tracker
            .handle(timed.event, now)
            .with_context(|| format!("failed to persist event on line {line_number}"))?;
        stats.applied += 1;
    }

    Ok(stats)
}

pub fn run<W: Write, R: BufRead, S: StateStore>(
    writer: &mut W,
    tracker: &mut Tracker<S>,
    reader: R,
    fallback_now: Timestamp,
) -> Result<()> {
    let stats = apply(tracker, reader, fallback_now)?;

    writeln!(
        writer,
        "Replayed {} events ({} skipped)",
        stats.applied, stats.skipped
    )?;
    writeln!(writer, "Open tabs: {}", tracker.tabs().len())?;
    writeln!(
        writer,
        "Current session: {} ({} tabs)",
        tracker.sessions().current().id,
        tracker.sessions().current().tabs.len()
    )?;
    Ok(())
}
