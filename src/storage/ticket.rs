//! Ticket storage: create, load, list, advance, and finalize tickets.

use std::{fs, io};

use jiff::Timestamp;
use rusqlite::Connection;
use tracing::info;
use uuid::Uuid;

use crate::model::{Detail, StatusCode, Ticket};

use super::{Result, Storage, StorageError, parse_timestamp, to_index, to_position};

impl Storage {
    /// Creates a new ticket with its initial states and details.
    pub fn create_ticket(&self, ticket: &Ticket) -> Result<()> {
        let mut conn = self.create_db(ticket.id)?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO ticket (id, title, created_at, finalized_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![
                ticket.id.to_string(),
                &ticket.title,
                ticket.created_at.to_string(),
                ticket.finalized_at.map(|t| t.to_string()),
            ],
        )?;
        for (index, code) in ticket.states.iter().enumerate() {
            tx.execute(
                "INSERT INTO state (position, code) VALUES (?1, ?2)",
                rusqlite::params![to_position(index)?, code.0],
            )?;
        }
        for (index, detail) in ticket.details.iter().enumerate() {
            if let Some(detail) = detail {
                tx.execute(
                    "INSERT INTO detail (position, body) VALUES (?1, ?2)",
                    rusqlite::params![to_position(index)?, serde_json::to_string(detail)?],
                )?;
            }
        }
        tx.commit()?;
        info!(ticket = %ticket.id, states = ticket.states.len(), "ticket created");
        Ok(())
    }

    /// Loads a ticket with its states and details.
    pub fn load_ticket(&self, id: Uuid) -> Result<Ticket> {
        let conn = self.open_db(id)?;
        load_ticket_rows(&conn)
    }

    /// Lists all tickets by reading each `.sqlite` file in the storage root.
    ///
    /// Unreadable or malformed files are silently skipped.
    pub fn list_tickets(&self) -> Result<Vec<Ticket>> {
        let mut tickets = Vec::new();
        let entries = match fs::read_dir(&self.root) {
            Ok(e) => e,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(tickets),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("sqlite") {
                continue;
            }
            let Ok(conn) = Connection::open(&path) else {
                continue;
            };
            if let Ok(t) = load_ticket_rows(&conn) {
                tickets.push(t);
            }
        }
        tickets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(tickets)
    }

    /// Appends a state to the ticket's history, optionally with a detail.
    ///
    /// Returns the index of the new state.
    pub fn append_state(
        &self,
        id: Uuid,
        code: StatusCode,
        detail: Option<&Detail>,
    ) -> Result<usize> {
        let mut conn = self.open_db(id)?;
        ensure_open(&conn, id)?;

        let tx = conn.transaction()?;
        let count: i64 = tx.query_row("SELECT COUNT(*) FROM state", [], |row| row.get(0))?;
        tx.execute(
            "INSERT INTO state (position, code) VALUES (?1, ?2)",
            rusqlite::params![count, code.0],
        )?;
        if let Some(detail) = detail {
            tx.execute(
                "INSERT OR REPLACE INTO detail (position, body) VALUES (?1, ?2)",
                rusqlite::params![count, serde_json::to_string(detail)?],
            )?;
        }
        tx.commit()?;

        info!(ticket = %id, %code, position = count, "state appended");
        to_index(count)
    }

    /// Closes the ticket to further edits and state changes.
    pub fn finalize_ticket(&self, id: Uuid, at: Timestamp) -> Result<()> {
        let conn = self.open_db(id)?;
        ensure_open(&conn, id)?;
        conn.execute(
            "UPDATE ticket SET finalized_at = ?1",
            rusqlite::params![at.to_string()],
        )?;
        info!(ticket = %id, "ticket finalized");
        Ok(())
    }
}

/// Fails with [`StorageError::TicketFinalized`] if the ticket is closed.
pub(super) fn ensure_open(conn: &Connection, id: Uuid) -> Result<()> {
    let finalized: Option<String> = conn.query_row(
        "SELECT finalized_at FROM ticket LIMIT 1",
        [],
        |row| row.get(0),
    )?;
    if finalized.is_some() {
        return Err(StorageError::TicketFinalized(id));
    }
    Ok(())
}

/// Reads the ticket row plus its states and details.
pub(super) fn load_ticket_rows(conn: &Connection) -> Result<Ticket> {
    let (id_str, title, created_at_str, finalized_at_opt) = conn.query_row(
        "SELECT id, title, created_at, finalized_at FROM ticket LIMIT 1",
        [],
        |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
            ))
        },
    )?;

    let id = id_str
        .parse::<Uuid>()
        .map_err(|e| StorageError::Corrupt(format!("invalid ticket id: {e}")))?;
    let created_at = parse_timestamp(&created_at_str, "created_at")?;
    let finalized_at = finalized_at_opt
        .as_deref()
        .map(|raw| parse_timestamp(raw, "finalized_at"))
        .transpose()?;

    let mut stmt = conn.prepare("SELECT code FROM state ORDER BY position")?;
    let states = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .map(|code| code.map(StatusCode))
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = conn.prepare("SELECT position, body FROM detail ORDER BY position")?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut details: Vec<Option<Detail>> = Vec::new();
    for (position, body) in rows {
        let index = to_index(position)?;
        if details.len() <= index {
            details.resize(index + 1, None);
        }
        details[index] = Some(serde_json::from_str(&body)?);
    }

    Ok(Ticket {
        id,
        title,
        created_at,
        states,
        details,
        finalized_at,
    })
}
