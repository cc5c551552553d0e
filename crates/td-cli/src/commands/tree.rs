//! Renders the opener tree of a session.

use std::io::Write;

use anyhow::{Context, Result};

use td_core::format::{format_time_spent, truncate};
use td_core::{HierarchyNode, Session, StateStore, TabId, Tracker, build_hierarchy, find_root, forest};

use super::util::resolve_session;

const MAX_TITLE_LEN: usize = 60;

/// Prints the forest of `session_id` (the current session by default), or
/// only the tree containing `tab` when given.
pub fn run<W: Write, S: StateStore>(
    writer: &mut W,
    tracker: &Tracker<S>,
    session_id: Option<&str>,
    tab: Option<TabId>,
    json: bool,
) -> Result<()> {
    let session = resolve_session(tracker, session_id)?;

    let trees = match tab {
        Some(tab) => {
            let root = find_root(tab, session)
                .with_context(|| format!("tab {tab} not found in session {}", session.id))?;
            build_hierarchy(root.id, session).into_iter().collect()
        }
        None => forest(session),
    };

    if json {
        serde_json::to_writer_pretty(&mut *writer, &trees)
            .context("failed to serialize hierarchy")?;
        writeln!(writer)?;
        return Ok(());
    }

    if trees.is_empty() {
        writeln!(writer, "No tabs recorded in this session.")?;
        return Ok(());
    }
    for tree in &trees {
        write_node(writer, session, tree, 0)?;
    }
    Ok(())
}

fn write_node<W: Write>(
    writer: &mut W,
    session: &Session,
    node: &HierarchyNode,
    depth: usize,
) -> Result<()> {
    let spent = session
        .tabs
        .get(&node.id)
        .map_or(0, |tab| tab.time_data.total_time_spent);
    let title = truncate(&node.title, MAX_TITLE_LEN);
    let indent = "  ".repeat(depth);

    if node.domain.is_empty() {
        writeln!(writer, "{indent}- {title} ({})", format_time_spent(spent))?;
    } else {
        writeln!(
            writer,
            "{indent}- {title} ({}, {})",
            node.domain,
            format_time_spent(spent)
        )?;
    }

    for child in &node.children {
        write_node(writer, session, child, depth + 1)?;
    }
    Ok(())
}
