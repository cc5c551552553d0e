//! Status command for showing the current session and storage settings.

use std::io::Write;

use anyhow::Result;

use td_core::{StateStore, Tracker};

use super::util::format_timestamp;
use crate::Config;

pub fn run<W: Write, S: StateStore>(
    writer: &mut W,
    tracker: &Tracker<S>,
    config: &Config,
) -> Result<()> {
    let current = tracker.sessions().current();

    writeln!(writer, "Tab lineage status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    if config.store_locally_only {
        writeln!(writer, "Storage: local only")?;
    }
    if config.data_retention_days == 0 {
        writeln!(writer, "Retention: forever")?;
    } else {
        writeln!(writer, "Retention: {} days", config.data_retention_days)?;
    }
    writeln!(writer, "Current session: {}", current.id)?;
    writeln!(writer, "Started: {}", format_timestamp(current.start_time))?;
    writeln!(writer, "Tabs in current session: {}", current.tabs.len())?;
    writeln!(
        writer,
        "Archived sessions: {}",
        tracker.persisted_state().sessions.len()
    )?;

    Ok(())
}
