//! Tab lineage CLI library.
//!
//! Subcommand implementations live in [`commands`]; each one writes to a
//! caller-supplied writer so it can be tested without a terminal.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
