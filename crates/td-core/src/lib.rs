//! Core domain logic for tab lineage tracking.
//!
//! This crate contains the fundamental types and logic for:
//! - Tab records: which tab opened which, kept as an opener tree
//! - Time tracking: active time per tab with a single active tab
//! - Sessions: snapshots of tab activity persisted through a [`StateStore`]
//! - Graph queries: hierarchies, roots, descendants and depth over snapshots

pub mod command;
pub mod event;
pub mod format;
pub mod graph;
mod record;
mod session;
mod tabs;
mod time;
mod tracker;
pub mod transition;
pub mod types;

pub use command::{AllTabData, Command, Response, TabData};
pub use event::{HostEvent, TimedEvent};
pub use graph::{
    HierarchyNode, TabLookup, build_hierarchy, depth, find_descendants, find_root, forest, roots,
};
pub use record::{DEFAULT_TAB_TITLE, NewTab, TabRecord, TabSnapshot, TimeEntry};
pub use session::{
    BackendError, MemoryStore, PersistedState, Session, SessionStore, StateStore, StoreError,
};
pub use tabs::{Navigation, TabChange, TabStore};
pub use time::TimeTracker;
pub use tracker::Tracker;
pub use transition::TransitionType;
pub use types::{SessionId, TabId, Timestamp, ValidationError};
