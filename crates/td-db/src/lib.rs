//! Storage layer for tab lineage sessions.
//!
//! Provides durable persistence for [`PersistedState`] using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved into the tracker that owns it but cannot be
//! shared across threads without external synchronization.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as INTEGER milliseconds since the Unix epoch, the same
//! unit the tracker uses in memory.
//!
//! ## Snapshot Storage
//!
//! Each row of `session_tabs` stores one JSON-serialized `TabSnapshot` in its
//! `data` column, keyed by session and tab id. When evolving the snapshot shape:
//! - Adding fields: give them a serde default so old rows still parse
//! - Removing or renaming fields: requires a migration
//!
//! ## Writes
//!
//! [`Database::save_state`] replaces every row inside one transaction, so a
//! failed write leaves the previously committed state intact.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use rusqlite::{Connection, params};
use thiserror::Error;

use td_core::{PersistedState, Session, SessionId, StateStore, StoreError, TabId, TabSnapshot};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored snapshot could not be encoded or decoded.
    #[error("invalid snapshot for tab {tab_id} in session {session_id}: {source}")]
    Snapshot {
        session_id: String,
        tab_id: i64,
        #[source]
        source: serde_json::Error,
    },
    /// Stored rows do not form a valid state.
    #[error("corrupt session state: {message}")]
    CorruptState { message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.conn.path())
            .finish()
    }
}

/// A session row as stored, before its tabs are attached.
struct SessionRow {
    id: String,
    start_time: i64,
    is_current: bool,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            -- Sessions: archived ones ordered by position, exactly one current
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                start_time INTEGER NOT NULL,
                position INTEGER NOT NULL,
                is_current INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_position ON sessions(position);

            -- Last snapshot of each tab within a session
            -- data: JSON-serialized TabSnapshot
            CREATE TABLE IF NOT EXISTS session_tabs (
                session_id TEXT NOT NULL,
                tab_id INTEGER NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (session_id, tab_id),
                FOREIGN KEY (session_id) REFERENCES sessions(id) ON DELETE CASCADE
            );
            ",
        )?;
        Ok(())
    }

    /// Loads the persisted state, or `None` if nothing has been saved yet.
    pub fn load_state(&self) -> Result<Option<PersistedState>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, start_time, is_current
            FROM sessions
            ORDER BY position ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(SessionRow {
                id: row.get(0)?,
                start_time: row.get(1)?,
                is_current: row.get(2)?,
            })
        })?;
        let mut session_rows = Vec::new();
        for row in rows {
            session_rows.push(row?);
        }
        if session_rows.is_empty() {
            return Ok(None);
        }

        let mut tabs = self.load_snapshots()?;
        let mut archived = Vec::new();
        let mut current = None;
        for row in session_rows {
            let id = SessionId::new(row.id.clone()).map_err(|err| DbError::CorruptState {
                message: err.to_string(),
            })?;
            let session = Session {
                id,
                start_time: row.start_time,
                tabs: tabs.remove(&row.id).unwrap_or_default(),
            };
            if !row.is_current {
                archived.push(session);
            } else if current.replace(session).is_some() {
                return Err(DbError::CorruptState {
                    message: "more than one current session".to_string(),
                });
            }
        }

        if let Some(orphan) = tabs.keys().next() {
            return Err(DbError::CorruptState {
                message: format!("snapshots reference unknown session {orphan}"),
            });
        }
        let current_session = current.ok_or_else(|| DbError::CorruptState {
            message: "no current session".to_string(),
        })?;

        Ok(Some(PersistedState {
            sessions: archived,
            current_session,
        }))
    }

    fn load_snapshots(&self) -> Result<HashMap<String, BTreeMap<TabId, TabSnapshot>>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT session_id, tab_id, data
            FROM session_tabs
            ORDER BY session_id ASC, tab_id ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            let session_id: String = row.get(0)?;
            let tab_id: i64 = row.get(1)?;
            let data: String = row.get(2)?;
            Ok((session_id, tab_id, data))
        })?;

        let mut tabs: HashMap<String, BTreeMap<TabId, TabSnapshot>> = HashMap::new();
        for row in rows {
            let (session_id, tab_id, data) = row?;
            let snapshot: TabSnapshot =
                serde_json::from_str(&data).map_err(|source| DbError::Snapshot {
                    session_id: session_id.clone(),
                    tab_id,
                    source,
                })?;
            if snapshot.record.id.get() != tab_id {
                return Err(DbError::CorruptState {
                    message: format!(
                        "row for tab {tab_id} in session {session_id} holds tab {}",
                        snapshot.record.id
                    ),
                });
            }
            tabs.entry(session_id)
                .or_default()
                .insert(TabId::new(tab_id), snapshot);
        }
        Ok(tabs)
    }

    /// Replaces the stored state with `state` in a single transaction.
    pub fn save_state(&mut self, state: &PersistedState) -> Result<(), DbError> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(
            "
            DELETE FROM session_tabs;
            DELETE FROM sessions;
            ",
        )?;
        {
            let mut session_stmt = tx.prepare(
                "
                INSERT INTO sessions (id, start_time, position, is_current)
                VALUES (?, ?, ?, ?)
                ",
            )?;
            let mut tab_stmt = tx.prepare(
                "
                INSERT INTO session_tabs (session_id, tab_id, data)
                VALUES (?, ?, ?)
                ",
            )?;

            let archived = state.sessions.iter().map(|s| (s, false));
            let current = std::iter::once((&state.current_session, true));
            for (position, (session, is_current)) in archived.chain(current).enumerate() {
                let position = i64::try_from(position).map_err(|_| DbError::CorruptState {
                    message: "too many sessions".to_string(),
                })?;
                session_stmt.execute(params![
                    session.id.as_str(),
                    session.start_time,
                    position,
                    is_current,
                ])?;
                for (tab_id, snapshot) in &session.tabs {
                    let data =
                        serde_json::to_string(snapshot).map_err(|source| DbError::Snapshot {
                            session_id: session.id.to_string(),
                            tab_id: tab_id.get(),
                            source,
                        })?;
                    tab_stmt.execute(params![session.id.as_str(), tab_id.get(), data])?;
                }
            }
        }
        tx.commit()?;
        tracing::debug!(
            archived = state.sessions.len(),
            current_tabs = state.current_session.tabs.len(),
            "saved session state"
        );
        Ok(())
    }

    /// Number of stored sessions, current included.
    pub fn session_count(&self) -> Result<usize, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

impl StateStore for Database {
    fn load(&mut self) -> Result<Option<PersistedState>, StoreError> {
        self.load_state().map_err(StoreError::load)
    }

    fn save(&mut self, state: &PersistedState) -> Result<(), StoreError> {
        self.save_state(state).map_err(StoreError::save)
    }
}
