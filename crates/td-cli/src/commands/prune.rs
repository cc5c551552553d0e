//! Drops archived sessions past the configured retention.

use std::io::Write;

use anyhow::{Context, Result};

use td_core::{StateStore, Timestamp, Tracker};

use crate::Config;

pub fn run<W: Write, S: StateStore>(
    writer: &mut W,
    tracker: &mut Tracker<S>,
    config: &Config,
    now: Timestamp,
) -> Result<()> {
    let Some(cutoff) = config.retention_cutoff(now) else {
        writeln!(writer, "Retention is unlimited; nothing pruned.")?;
        return Ok(());
    };

    let pruned = tracker
        .prune_sessions(cutoff)
        .context("failed to prune sessions")?;
    let noun = if pruned == 1 { "session" } else { "sessions" };
    writeln!(
        writer,
        "Pruned {pruned} archived {noun} older than {} days.",
        config.data_retention_days
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use insta::assert_snapshot;
    use td_core::MemoryStore;

    const DAY: i64 = 24 * 60 * 60 * 1000;

    #[test]
    fn prunes_sessions_older_than_retention() {
        let mut tracker = Tracker::start(MemoryStore::new(), 0).unwrap();
        tracker.start_new_session(5 * DAY).unwrap();
        tracker.start_new_session(9 * DAY).unwrap();

        let config = Config {
            data_retention_days: 3,
            ..Config::default()
        };
        let mut output = Vec::new();
        run(&mut output, &mut tracker, &config, 10 * DAY).unwrap();

        let state = tracker.persisted_state();
        assert_eq!(state.sessions.len(), 0);
        assert_eq!(state.current_session.start_time, 9 * DAY);
        assert_snapshot!(String::from_utf8(output).unwrap(), @"Pruned 2 archived sessions older than 3 days.");
    }

    #[test]
    fn unlimited_retention_keeps_everything() {
        let mut tracker = Tracker::start(MemoryStore::new(), 0).unwrap();
        tracker.start_new_session(DAY).unwrap();

        let config = Config {
            data_retention_days: 0,
            ..Config::default()
        };
        let mut output = Vec::new();
        run(&mut output, &mut tracker, &config, 1_000 * DAY).unwrap();

        assert_eq!(tracker.persisted_state().sessions.len(), 1);
        assert_snapshot!(String::from_utf8(output).unwrap(), @"Retention is unlimited; nothing pruned.");
    }
}
