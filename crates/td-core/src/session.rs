//! Recording sessions and their persistence.
//!
//! Exactly one session is current at any time. Archived sessions are kept in
//! start order and are never modified after archival. The whole
//! [`PersistedState`] is written through a [`StateStore`] after every change;
//! a failed write restores the in-memory state to what it was before.

use std::collections::BTreeMap;
use std::error::Error as StdError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::TabSnapshot;
use crate::types::{SessionId, TabId, Timestamp};

/// Boxed error from a persistence backend.
pub type BackendError = Box<dyn StdError + Send + Sync + 'static>;

/// Durable storage failed. The in-memory state was left unchanged.
#[derive(Debug, Error)]
#[error("failed to {operation} session state: {source}")]
pub struct StoreError {
    pub operation: &'static str,
    #[source]
    pub source: BackendError,
}

impl StoreError {
    pub fn load(source: impl Into<BackendError>) -> Self {
        Self {
            operation: "load",
            source: source.into(),
        }
    }

    pub fn save(source: impl Into<BackendError>) -> Self {
        Self {
            operation: "save",
            source: source.into(),
        }
    }
}

/// A bounded recording interval and the last snapshot of each tab seen in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub start_time: Timestamp,
    #[serde(default)]
    pub tabs: BTreeMap<TabId, TabSnapshot>,
}

impl Session {
    /// Creates an empty session with a fresh id.
    pub fn start(now: Timestamp) -> Self {
        Self {
            id: SessionId::generate(),
            start_time: now,
            tabs: BTreeMap::new(),
        }
    }

    /// Total active time recorded across all tabs of the session.
    pub fn total_time_spent(&self) -> i64 {
        self.tabs
            .values()
            .map(|tab| tab.time_data.total_time_spent)
            .sum()
    }
}

/// Everything that survives a restart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Archived sessions, oldest first.
    #[serde(default)]
    pub sessions: Vec<Session>,
    pub current_session: Session,
}

impl PersistedState {
    pub fn fresh(now: Timestamp) -> Self {
        Self {
            sessions: Vec::new(),
            current_session: Session::start(now),
        }
    }
}

/// Durable storage for [`PersistedState`].
///
/// Writes replace the whole state; implementations must leave the previous
/// state readable when `save` fails.
pub trait StateStore {
    /// Returns `None` when nothing has been persisted yet.
    fn load(&mut self) -> Result<Option<PersistedState>, StoreError>;

    fn save(&mut self, state: &PersistedState) -> Result<(), StoreError>;
}

/// Volatile [`StateStore`] kept in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Option<PersistedState>,
    fail_writes: bool,
    writes: usize,
}

#[derive(Debug, Error)]
#[error("memory store is rejecting writes")]
struct WritesRejected;

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Some(state),
            ..Self::default()
        }
    }

    /// Makes subsequent writes fail, simulating a broken backend.
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub const fn state(&self) -> Option<&PersistedState> {
        self.state.as_ref()
    }

    /// Number of successful writes.
    pub const fn writes(&self) -> usize {
        self.writes
    }
}

impl StateStore for MemoryStore {
    fn load(&mut self) -> Result<Option<PersistedState>, StoreError> {
        Ok(self.state.clone())
    }

    fn save(&mut self, state: &PersistedState) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(StoreError::save(WritesRejected));
        }
        self.state = Some(state.clone());
        self.writes += 1;
        Ok(())
    }
}

/// The current session, the archive, and the backend they are written to.
#[derive(Debug)]
pub struct SessionStore<S> {
    state: PersistedState,
    backend: S,
}

impl<S: StateStore> SessionStore<S> {
    /// Loads persisted state, creating and saving a fresh current session on
    /// first start.
    pub fn open(mut backend: S, now: Timestamp) -> Result<Self, StoreError> {
        let state = if let Some(state) = backend.load()? {
            tracing::debug!(
                current = %state.current_session.id,
                archived = state.sessions.len(),
                "loaded session state"
            );
            state
        } else {
            let state = PersistedState::fresh(now);
            backend.save(&state)?;
            tracing::debug!(current = %state.current_session.id, "initialized session state");
            state
        };
        Ok(Self { state, backend })
    }

    pub const fn current(&self) -> &Session {
        &self.state.current_session
    }

    pub const fn state(&self) -> &PersistedState {
        &self.state
    }

    pub const fn backend(&self) -> &S {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut S {
        &mut self.backend
    }

    /// Stores `snapshot` as the latest state of its tab in the current
    /// session, replacing any earlier snapshot of the same tab.
    pub fn record_snapshot(&mut self, snapshot: TabSnapshot) -> Result<(), StoreError> {
        self.record_snapshots([snapshot])
    }

    /// Stores several snapshots with a single write. On failure none of them
    /// is kept.
    pub fn record_snapshots(
        &mut self,
        snapshots: impl IntoIterator<Item = TabSnapshot>,
    ) -> Result<(), StoreError> {
        let tabs = &mut self.state.current_session.tabs;
        let previous: Vec<(TabId, Option<TabSnapshot>)> = snapshots
            .into_iter()
            .map(|snapshot| {
                let id = snapshot.record.id;
                (id, tabs.insert(id, snapshot))
            })
            .collect();
        if previous.is_empty() {
            return Ok(());
        }

        if let Err(err) = self.backend.save(&self.state) {
            let tabs = &mut self.state.current_session.tabs;
            for (id, prior) in previous.into_iter().rev() {
                match prior {
                    Some(prior) => tabs.insert(id, prior),
                    None => tabs.remove(&id),
                };
            }
            return Err(err);
        }
        tracing::debug!(
            tabs = ?previous.iter().map(|(id, _)| id.get()).collect::<Vec<_>>(),
            session = %self.state.current_session.id,
            "recorded snapshots"
        );
        Ok(())
    }

    /// Archives the current session and starts an empty one.
    pub fn start_new_session(&mut self, now: Timestamp) -> Result<&Session, StoreError> {
        let archived = std::mem::replace(&mut self.state.current_session, Session::start(now));
        self.state.sessions.push(archived);
        if let Err(err) = self.backend.save(&self.state) {
            if let Some(archived) = self.state.sessions.pop() {
                self.state.current_session = archived;
            }
            return Err(err);
        }
        tracing::debug!(
            current = %self.state.current_session.id,
            archived = self.state.sessions.len(),
            "started new session"
        );
        Ok(&self.state.current_session)
    }

    /// Archived sessions oldest first, then the current session.
    pub fn list_sessions(&self) -> impl Iterator<Item = &Session> {
        self.state
            .sessions
            .iter()
            .chain(std::iter::once(&self.state.current_session))
    }

    pub fn get_session(&self, id: &str) -> Option<&Session> {
        if self.state.current_session.id.as_str() == id {
            return Some(&self.state.current_session);
        }
        self.state.sessions.iter().find(|s| s.id.as_str() == id)
    }

    /// Drops archived sessions that started before `cutoff`. The current
    /// session is always kept. Returns how many were dropped.
    pub fn prune_archived(&mut self, cutoff: Timestamp) -> Result<usize, StoreError> {
        let keep = self
            .state
            .sessions
            .iter()
            .filter(|s| s.start_time >= cutoff)
            .count();
        let pruned = self.state.sessions.len() - keep;
        if pruned == 0 {
            return Ok(0);
        }

        let previous = self.state.sessions.clone();
        self.state.sessions.retain(|s| s.start_time >= cutoff);
        if let Err(err) = self.backend.save(&self.state) {
            self.state.sessions = previous;
            return Err(err);
        }
        tracing::debug!(pruned, cutoff, "pruned archived sessions");
        Ok(pruned)
    }

    /// Forgets every session and starts a fresh current one.
    pub fn clear(&mut self, now: Timestamp) -> Result<(), StoreError> {
        let previous = std::mem::replace(&mut self.state, PersistedState::fresh(now));
        if let Err(err) = self.backend.save(&self.state) {
            self.state = previous;
            return Err(err);
        }
        tracing::debug!(current = %self.state.current_session.id, "cleared session state");
        Ok(())
    }
}
