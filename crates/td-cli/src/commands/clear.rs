//! Deletes every recorded session.

use std::io::Write;

use anyhow::{Context, Result, bail};

use td_core::{StateStore, Timestamp, Tracker};

pub fn run<W: Write, S: StateStore>(
    writer: &mut W,
    tracker: &mut Tracker<S>,
    confirmed: bool,
    now: Timestamp,
) -> Result<()> {
    if !confirmed {
        bail!("refusing to delete all sessions without --yes");
    }

    let dropped = tracker.persisted_state().sessions.len() + 1;
    tracker.clear_data(now).context("failed to clear data")?;
    writeln!(
        writer,
        "Deleted {dropped} sessions; started session {}",
        tracker.sessions().current().id
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use td_core::MemoryStore;

    #[test]
    fn clear_requires_confirmation() {
        let mut tracker = Tracker::start(MemoryStore::new(), 0).unwrap();
        tracker.start_new_session(10).unwrap();
        let mut output = Vec::new();

        assert!(run(&mut output, &mut tracker, false, 20).is_err());
        assert_eq!(tracker.persisted_state().sessions.len(), 1);

        run(&mut output, &mut tracker, true, 20).unwrap();
        let state = tracker.persisted_state();
        assert!(state.sessions.is_empty());
        assert_eq!(state.current_session.start_time, 20);

        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("Deleted 2 sessions; started session "), "{output}");
    }
}
