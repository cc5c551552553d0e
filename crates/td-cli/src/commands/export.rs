//! Implementation of the `tabdna export` command.
//!
//! Writes every archived session and the current one as a single pretty JSON
//! document, in the same layout the store persists.

use std::io::Write;

use anyhow::{Context, Result};

use td_core::{StateStore, Tracker};

pub fn run<W: Write, S: StateStore>(writer: &mut W, tracker: &Tracker<S>) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, tracker.persisted_state())
        .context("failed to serialize sessions")?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use td_core::{HostEvent, MemoryStore, PersistedState, TabId};

    #[test]
    fn export_round_trips_persisted_state() {
        let mut tracker = Tracker::start(MemoryStore::new(), 0).unwrap();
        tracker
            .handle(
                HostEvent::TabCreated {
                    tab_id: TabId::new(7),
                    opener_id: None,
                    url: Some("https://example.com/".into()),
                    pending_url: None,
                    title: Some("Example".into()),
                },
                100,
            )
            .unwrap();
        tracker.start_new_session(200).unwrap();

        let mut output = Vec::new();
        run(&mut output, &tracker).unwrap();

        let parsed: PersistedState = serde_json::from_slice(&output).unwrap();
        assert_eq!(&parsed, tracker.persisted_state());
        assert_eq!(parsed.sessions[0].tabs[&TabId::new(7)].record.title, "Example");
    }
}
