//! CLI subcommand implementations.

pub mod clear;
pub mod export;
pub mod prune;
pub mod replay;
pub mod sessions;
pub mod status;
pub mod tree;
pub mod util;
