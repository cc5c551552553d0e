//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Tab lineage tracker.
///
/// Records which browser tab opened which, how long each tab was active, and
/// keeps the history in sessions.
#[derive(Debug, Parser)]
#[command(name = "tabdna", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply a JSONL log of host tab events.
    Replay {
        /// Event log to read; stdin when omitted.
        file: Option<PathBuf>,
    },

    /// Show the current session and storage location.
    Status,

    /// List recorded sessions, oldest first.
    Sessions {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Archive the current session and start a new one.
    NewSession,

    /// Print the opener tree of a session.
    Tree {
        /// Session to render; the current one when omitted.
        #[arg(long)]
        session: Option<String>,

        /// Only render the tree containing this tab.
        #[arg(long)]
        tab: Option<i64>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print every persisted session as JSON.
    Export,

    /// Drop archived sessions older than the configured retention.
    Prune,

    /// Delete all recorded sessions.
    Clear {
        /// Confirm the deletion.
        #[arg(long)]
        yes: bool,
    },
}
