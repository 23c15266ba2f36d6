//! Local persistence for tickets, their state history, and details.
//!
//! Each ticket lives in its own `SQLite` file under the storage root:
//!
//! ```text
//! <root>/<uuid>.sqlite
//!   ticket          # Ticket metadata (one row)
//!   state           # Traversed states by position
//!   detail          # JSON-encoded detail by position
//!   detail_change   # Append-only history of committed edits
//! ```

mod detail;
mod ticket;

use std::{fs, io, path::PathBuf};

use rusqlite::Connection;
use uuid::Uuid;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("ticket not found: {0}")]
    TicketNotFound(Uuid),

    #[error("ticket already exists: {0}")]
    TicketAlreadyExists(Uuid),

    #[error("ticket is finalized: {0}")]
    TicketFinalized(Uuid),

    #[error("no state at index {index} (ticket has {len})")]
    StateOutOfRange { index: usize, len: usize },

    #[error("corrupt ticket data: {0}")]
    Corrupt(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

const SCHEMA: &str = "
    CREATE TABLE ticket (
        id           TEXT PRIMARY KEY,
        title        TEXT NOT NULL,
        created_at   TEXT NOT NULL,
        finalized_at TEXT
    );
    CREATE TABLE state (
        position INTEGER PRIMARY KEY,
        code     INTEGER NOT NULL
    );
    CREATE TABLE detail (
        position INTEGER PRIMARY KEY,
        body     TEXT NOT NULL
    );
    CREATE TABLE detail_change (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        position   INTEGER NOT NULL,
        previous   TEXT,
        body       TEXT NOT NULL,
        operator   TEXT NOT NULL,
        changed_at TEXT NOT NULL
    );
";

/// Local file-based storage for tickets.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a new storage instance rooted at the given directory.
    ///
    /// The directory is created if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Returns the default storage root: `~/.repair-timeline/tickets/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir()
            .map(|h| h.join(".repair-timeline").join("tickets"))
    }

    fn ticket_path(&self, id: Uuid) -> PathBuf {
        self.root.join(format!("{id}.sqlite"))
    }

    /// Creates a fresh database for a new ticket.
    fn create_db(&self, id: Uuid) -> Result<Connection> {
        let path = self.ticket_path(id);
        if path.exists() {
            return Err(StorageError::TicketAlreadyExists(id));
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(conn)
    }

    /// Opens an existing ticket database.
    fn open_db(&self, id: Uuid) -> Result<Connection> {
        let path = self.ticket_path(id);
        if !path.exists() {
            return Err(StorageError::TicketNotFound(id));
        }
        Ok(Connection::open(path)?)
    }
}

/// Converts a stored position back to an index.
fn to_index(position: i64) -> Result<usize> {
    usize::try_from(position)
        .map_err(|_| StorageError::Corrupt(format!("invalid position: {position}")))
}

/// Converts an index to a stored position.
fn to_position(index: usize) -> Result<i64> {
    i64::try_from(index)
        .map_err(|_| StorageError::Corrupt(format!("index too large: {index}")))
}

fn parse_timestamp(raw: &str, field: &str) -> Result<jiff::Timestamp> {
    raw.parse::<jiff::Timestamp>()
        .map_err(|e| StorageError::Corrupt(format!("invalid {field}: {e}")))
}
