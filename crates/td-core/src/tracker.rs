//! The tracker owns the live tab and time stores and the session store.
//!
//! It is constructed once when the background context starts and lives for
//! the rest of the process. Host events and UI commands are applied one at a
//! time through `&mut self`; every change to a tracked tab is written to the
//! current session before the call returns, so writes for the same tab can
//! never complete out of order.

use crate::command::{AllTabData, Command, Response, TabData};
use crate::event::HostEvent;
use crate::record::{NewTab, TabSnapshot};
use crate::session::{PersistedState, Session, SessionStore, StateStore, StoreError};
use crate::tabs::{Navigation, TabChange, TabStore};
use crate::time::TimeTracker;
use crate::types::{TabId, Timestamp};

#[derive(Debug)]
pub struct Tracker<S> {
    tabs: TabStore,
    time: TimeTracker,
    sessions: SessionStore<S>,
}

impl<S: StateStore> Tracker<S> {
    /// Loads persisted sessions from `backend` and starts with empty live
    /// stores.
    pub fn start(backend: S, now: Timestamp) -> Result<Self, StoreError> {
        Ok(Self {
            tabs: TabStore::new(),
            time: TimeTracker::new(),
            sessions: SessionStore::open(backend, now)?,
        })
    }

    pub const fn tabs(&self) -> &TabStore {
        &self.tabs
    }

    pub const fn time(&self) -> &TimeTracker {
        &self.time
    }

    pub const fn sessions(&self) -> &SessionStore<S> {
        &self.sessions
    }

    pub fn sessions_mut(&mut self) -> &mut SessionStore<S> {
        &mut self.sessions
    }

    pub const fn persisted_state(&self) -> &PersistedState {
        self.sessions.state()
    }

    /// Applies one host notification.
    pub fn handle(&mut self, event: HostEvent, now: Timestamp) -> Result<(), StoreError> {
        tracing::debug!(kind = event.kind(), tab_id = %event.tab_id(), now, "host event");
        match event {
            HostEvent::TabCreated {
                tab_id,
                opener_id,
                url,
                pending_url,
                title,
            } => {
                let tab = NewTab {
                    id: tab_id,
                    url,
                    pending_url,
                    title,
                };
                self.on_tab_created(&tab, opener_id, now)
            }
            HostEvent::TabUpdated { tab_id, url, title } => {
                self.on_tab_updated(tab_id, &TabChange { url, title })
            }
            HostEvent::TabActivated { tab_id } => self.on_tab_activated(tab_id, now),
            HostEvent::TabRemoved { tab_id } => self.on_tab_removed(tab_id, now).map(|_| ()),
            HostEvent::NavigationCommitted(navigation) => {
                self.on_navigation_committed(&navigation)
            }
            HostEvent::ReferrerObserved { tab_id, referrer } => self.set_referrer(tab_id, referrer),
        }
    }

    /// Answers one UI request.
    pub fn execute(&mut self, command: Command, now: Timestamp) -> Result<Response, StoreError> {
        let response = match command {
            Command::GetTabData { tab_id } => Response::TabData(self.tab_data(tab_id)),
            Command::GetAllTabData => Response::AllTabData(self.all_tab_data()),
            Command::SetReferrer { tab_id, referrer } => {
                self.set_referrer(tab_id, referrer)?;
                Response::Ack
            }
            Command::StartNewSession => {
                self.start_new_session(now)?;
                Response::Ack
            }
            Command::ListSessions => {
                Response::Sessions(self.sessions.list_sessions().cloned().collect())
            }
            Command::GetSession { id } => Response::Session(self.sessions.get_session(&id).cloned()),
            Command::ClearData => {
                self.clear_data(now)?;
                Response::Ack
            }
        };
        Ok(response)
    }

    pub fn on_tab_created(
        &mut self,
        tab: &NewTab,
        opener_id: Option<TabId>,
        now: Timestamp,
    ) -> Result<(), StoreError> {
        let parent_id = self.tabs.on_tab_created(tab, opener_id, now).parent_id;
        self.time.on_tab_created(tab.id, now);

        let mut touched = vec![tab.id];
        touched.extend(parent_id);
        self.persist(&touched)
    }

    pub fn on_tab_updated(&mut self, id: TabId, change: &TabChange) -> Result<(), StoreError> {
        if change.is_empty() || !self.tabs.on_tab_updated(id, change) {
            return Ok(());
        }
        self.persist(&[id])
    }

    pub fn on_navigation_committed(&mut self, navigation: &Navigation) -> Result<(), StoreError> {
        if !self.tabs.on_navigation_committed(navigation) {
            return Ok(());
        }
        self.persist(&[navigation.tab_id])
    }

    pub fn set_referrer(&mut self, id: TabId, referrer: impl Into<String>) -> Result<(), StoreError> {
        if !self.tabs.set_referrer(id, referrer) {
            tracing::debug!(tab_id = %id, "referrer for untracked tab ignored");
            return Ok(());
        }
        self.persist(&[id])
    }

    /// Makes `id` the active tab and persists every tab whose time changed.
    pub fn on_tab_activated(&mut self, id: TabId, now: Timestamp) -> Result<(), StoreError> {
        let touched = self.time.on_tab_activated(id, now);
        self.persist(&touched)
    }

    /// Finalizes and forgets a closed tab. Returns its last snapshot, which
    /// remains in the current session.
    ///
    /// The parent's stored snapshot keeps listing the removed tab so the
    /// session still shows the full tree that was browsed.
    pub fn on_tab_removed(
        &mut self,
        id: TabId,
        now: Timestamp,
    ) -> Result<Option<TabSnapshot>, StoreError> {
        let entry = self.time.finalize(id, now);
        let Some(record) = self.tabs.remove(id) else {
            return Ok(None);
        };
        let snapshot = TabSnapshot::merge(&record, entry.as_ref());
        self.sessions.record_snapshot(snapshot.clone())?;
        Ok(Some(snapshot))
    }

    pub fn tab_data(&self, id: TabId) -> Option<TabData> {
        let record = self.tabs.get(id).cloned();
        let time_entry = self.time.get(id).copied();
        if record.is_none() && time_entry.is_none() {
            return None;
        }
        Some(TabData { record, time_entry })
    }

    pub fn all_tab_data(&self) -> AllTabData {
        AllTabData {
            records: self.tabs.records().clone(),
            time_entries: self.time.entries().clone(),
        }
    }

    pub fn start_new_session(&mut self, now: Timestamp) -> Result<&Session, StoreError> {
        self.sessions.start_new_session(now)
    }

    /// Drops archived sessions that started before `cutoff`.
    pub fn prune_sessions(&mut self, cutoff: Timestamp) -> Result<usize, StoreError> {
        self.sessions.prune_archived(cutoff)
    }

    /// Forgets every recorded session. Live tabs keep being tracked and will
    /// appear in the new session on their next change.
    pub fn clear_data(&mut self, now: Timestamp) -> Result<(), StoreError> {
        self.sessions.clear(now)
    }

    fn persist(&mut self, ids: &[TabId]) -> Result<(), StoreError> {
        let snapshots: Vec<TabSnapshot> = ids
            .iter()
            .filter_map(|id| {
                self.tabs
                    .get(*id)
                    .map(|record| TabSnapshot::merge(record, self.time.get(*id)))
            })
            .collect();
        self.sessions.record_snapshots(snapshots)
    }
}
