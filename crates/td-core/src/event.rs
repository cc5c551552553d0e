//! Tab lifecycle notifications delivered by the browser host.

use serde::{Deserialize, Serialize};

use crate::tabs::Navigation;
use crate::types::{TabId, Timestamp};

/// A lifecycle notification from the host, or a referrer observed in page
/// context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    TabCreated {
        tab_id: TabId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        opener_id: Option<TabId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pending_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    TabUpdated {
        tab_id: TabId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
    },
    TabActivated {
        tab_id: TabId,
    },
    TabRemoved {
        tab_id: TabId,
    },
    NavigationCommitted(Navigation),
    ReferrerObserved {
        tab_id: TabId,
        referrer: String,
    },
}

impl HostEvent {
    /// The tab the notification is about.
    pub const fn tab_id(&self) -> TabId {
        match self {
            Self::TabCreated { tab_id, .. }
            | Self::TabUpdated { tab_id, .. }
            | Self::TabActivated { tab_id }
            | Self::TabRemoved { tab_id }
            | Self::ReferrerObserved { tab_id, .. } => *tab_id,
            Self::NavigationCommitted(navigation) => navigation.tab_id,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TabCreated { .. } => "tab_created",
            Self::TabUpdated { .. } => "tab_updated",
            Self::TabActivated { .. } => "tab_activated",
            Self::TabRemoved { .. } => "tab_removed",
            Self::NavigationCommitted(_) => "navigation_committed",
            Self::ReferrerObserved { .. } => "referrer_observed",
        }
    }
}

/// A [`HostEvent`] with the time it was observed, one per line of an event
/// log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    /// Milliseconds since the epoch; the replaying clock is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
    #[serde(flatten)]
    pub event: HostEvent,
}
