//! Detail storage: persist committed edits and their history.

use jiff::Timestamp;
use rusqlite::OptionalExtension;
use tracing::info;
use uuid::Uuid;

use crate::model::{Detail, DetailChange, DetailUpdate};

use super::ticket::ensure_open;
use super::{Result, Storage, StorageError, parse_timestamp, to_index, to_position};

impl Storage {
    /// Writes a committed detail and records the change.
    ///
    /// The update replaces whatever was at its index, structured or not.
    pub fn save_detail(
        &self,
        id: Uuid,
        update: &DetailUpdate,
        operator: &str,
        at: Timestamp,
    ) -> Result<DetailChange> {
        let mut conn = self.open_db(id)?;
        ensure_open(&conn, id)?;

        let tx = conn.transaction()?;
        let len: i64 = tx.query_row("SELECT COUNT(*) FROM state", [], |row| row.get(0))?;
        let position = to_position(update.index)?;
        if position >= len {
            return Err(StorageError::StateOutOfRange {
                index: update.index,
                len: to_index(len)?,
            });
        }

        let previous_body: Option<String> = tx
            .query_row(
                "SELECT body FROM detail WHERE position = ?1",
                [position],
                |row| row.get(0),
            )
            .optional()?;
        let previous: Option<Detail> = previous_body
            .as_deref()
            .map(serde_json::from_str)
            .transpose()?;

        let detail = Detail::Text(update.text.clone());
        let body = serde_json::to_string(&detail)?;
        tx.execute(
            "INSERT OR REPLACE INTO detail (position, body) VALUES (?1, ?2)",
            rusqlite::params![position, &body],
        )?;
        tx.execute(
            "INSERT INTO detail_change (position, previous, body, operator, changed_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![position, previous_body, &body, operator, at.to_string()],
        )?;
        tx.commit()?;

        info!(ticket = %id, index = update.index, operator, "detail saved");
        Ok(DetailChange {
            index: update.index,
            previous,
            text: update.text.clone(),
            operator: operator.to_string(),
            changed_at: at,
        })
    }

    /// Loads the detail change history, oldest first.
    pub fn load_history(&self, id: Uuid) -> Result<Vec<DetailChange>> {
        let conn = self.open_db(id)?;
        let mut stmt = conn.prepare(
            "SELECT position, previous, body, operator, changed_at
             FROM detail_change ORDER BY id",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(position, previous, body, operator, changed_at)| -> Result<DetailChange> {
                let text = match serde_json::from_str::<Detail>(&body)? {
                    Detail::Text(s) => s,
                    Detail::Structured(_) => {
                        return Err(StorageError::Corrupt(format!(
                            "non-text detail change at position {position}"
                        )));
                    }
                };
                Ok(DetailChange {
                    index: to_index(position)?,
                    previous: previous
                        .as_deref()
                        .map(serde_json::from_str)
                        .transpose()?,
                    text,
                    operator,
                    changed_at: parse_timestamp(&changed_at, "changed_at")?,
                })
            })
            .collect()
    }
}
