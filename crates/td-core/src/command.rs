//! Queries and commands accepted from the UI layer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::{TabRecord, TimeEntry};
use crate::session::Session;
use crate::types::TabId;

/// A request from the UI layer, one variant per operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Command {
    GetTabData { tab_id: TabId },
    GetAllTabData,
    SetReferrer { tab_id: TabId, referrer: String },
    StartNewSession,
    ListSessions,
    GetSession { id: String },
    ClearData,
}

/// The answer to a [`Command`]. Results are copies; the UI never sees the
/// live stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Response {
    TabData(Option<TabData>),
    AllTabData(AllTabData),
    Ack,
    Sessions(Vec<Session>),
    Session(Option<Session>),
}

/// What is known about one live tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabData {
    pub record: Option<TabRecord>,
    pub time_entry: Option<TimeEntry>,
}

/// Copy of both live stores.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllTabData {
    pub records: BTreeMap<TabId, TabRecord>,
    pub time_entries: BTreeMap<TabId, TimeEntry>,
}
