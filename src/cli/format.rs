//! Output formatting for CLI display.

use std::fmt::Write;

use uuid::Uuid;

use crate::model::{Detail, DetailChange, StatusCatalog, Ticket};
use crate::timeline::{Timeline, TimelineRow};

/// First eight characters of a ticket ID.
pub(crate) fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// One line per ticket for `ticket list`.
pub(super) fn format_ticket_line(ticket: &Ticket, catalog: &StatusCatalog) -> String {
    let state = if ticket.is_editable() {
        "open"
    } else {
        "final"
    };
    let current = ticket
        .current()
        .map_or("(no states)", |code| catalog.label_for(code));
    format!(
        "{}  [{state}] [{current}]  {}",
        short_id(ticket.id),
        ticket.title
    )
}

/// The timeline as an aligned text table, header first.
pub(super) fn format_timeline(ticket: &Ticket, timeline: &Timeline) -> String {
    let state = if ticket.is_editable() {
        "open"
    } else {
        "finalized"
    };
    let mut out = format!("{}  [{}] {state}", ticket.title, short_id(ticket.id));

    if timeline.is_empty() {
        out.push_str("\n  (no states)");
        return out;
    }

    let width = timeline
        .rows
        .iter()
        .map(|r| row_label(r).chars().count())
        .max()
        .unwrap_or(0);
    // Continuation lines align under the first line of the detail.
    let indent = " ".repeat(width + 10);

    for row in &timeline.rows {
        let marker = if row.detail.is_missing() { '!' } else { ' ' };
        let mut lines = row.detail.display().lines();
        let first = lines.next().unwrap_or("");
        let _ = write!(
            out,
            "\n  {:>2}  {:<width$}  {marker} {first}",
            row.index,
            row_label(row)
        );
        for line in lines {
            let _ = write!(out, "\n{indent}{line}");
        }
    }

    let missing = timeline.missing_count();
    if missing > 0 {
        let _ = write!(out, "\n\n{missing} row(s) need a detail");
    }
    out
}

fn row_label(row: &TimelineRow) -> String {
    if row.known {
        row.label.to_string()
    } else {
        format!("{} (code {})", row.label, row.code)
    }
}

/// The detail change history, one entry per line.
pub(super) fn format_history(history: &[DetailChange]) -> String {
    history
        .iter()
        .map(|c| {
            let previous = match c.previous.as_ref().map(Detail::as_text) {
                None => "(none)".to_string(),
                Some(None) => "(structured)".to_string(),
                Some(Some(s)) => format!("{s:?}"),
            };
            format!(
                "{} UTC  row {}  {}: {previous} → {:?}",
                c.changed_at.strftime("%Y-%m-%d %H:%M:%S"),
                c.index,
                c.operator,
                c.text
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
