//! Ticket types: the committed state the timeline is rendered from.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Detail, StatusCode};

/// A repair ticket and the states it has passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Uuid,
    pub title: String,
    pub created_at: Timestamp,

    /// Traversed states, oldest first. Order is rendering order.
    pub states: Vec<StatusCode>,

    /// Details aligned with `states` by index. May be shorter.
    pub details: Vec<Option<Detail>>,

    /// Set once the ticket is closed to further annotation.
    pub finalized_at: Option<Timestamp>,
}

impl Ticket {
    /// Whether details may still be edited.
    pub fn is_editable(&self) -> bool {
        self.finalized_at.is_none()
    }

    /// The most recent state, if any.
    pub fn current(&self) -> Option<StatusCode> {
        self.states.last().copied()
    }

    /// The detail at `index`, treating missing positions as absent.
    pub fn detail(&self, index: usize) -> Option<&Detail> {
        self.details.get(index).and_then(Option::as_ref)
    }

    /// Merges a committed detail into the sequence by index.
    ///
    /// Pads with absent entries when `index` is past the end.
    pub fn apply_update(&mut self, update: &DetailUpdate) {
        if self.details.len() <= update.index {
            self.details.resize(update.index + 1, None);
        }
        self.details[update.index] = Some(Detail::Text(update.text.clone()));
    }
}

/// The single event an edit session emits: row `index` now reads `text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailUpdate {
    pub index: usize,
    pub text: String,
}

/// An audit record of one committed detail edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailChange {
    pub index: usize,
    pub previous: Option<Detail>,
    pub text: String,
    pub operator: String,
    pub changed_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn sample_ticket() -> Ticket {
        Ticket {
            id: Uuid::new_v4(),
            title: "Cracked housing".into(),
            created_at: Timestamp::now(),
            states: vec![StatusCode(0), StatusCode(1), StatusCode(3)],
            details: vec![Some("ok".into())],
            finalized_at: None,
        }
    }

    #[test]
    fn missing_positions_read_as_absent() {
        let ticket = sample_ticket();
        assert_eq!(ticket.detail(0), Some(&Detail::from("ok")));
        assert_eq!(ticket.detail(2), None);
        assert_eq!(ticket.detail(50), None);
    }

    #[test]
    fn apply_update_pads_with_absent() {
        let mut ticket = sample_ticket();
        ticket.apply_update(&DetailUpdate {
            index: 2,
            text: "waiting".into(),
        });
        assert_eq!(
            ticket.details,
            vec![Some("ok".into()), None, Some("waiting".into())]
        );
    }

    #[test]
    fn apply_update_collapses_structured_to_text() {
        let mut ticket = sample_ticket();
        ticket.details[0] = Some(Detail::Structured(json!({"bay": 3})));
        ticket.apply_update(&DetailUpdate {
            index: 0,
            text: "moved".into(),
        });
        assert_eq!(ticket.detail(0), Some(&Detail::from("moved")));
    }

    #[test]
    fn finalized_tickets_are_not_editable() {
        let mut ticket = sample_ticket();
        assert!(ticket.is_editable());
        ticket.finalized_at = Some(Timestamp::now());
        assert!(!ticket.is_editable());
    }
}
