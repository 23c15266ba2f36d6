//! Timeline rendering: one row per traversed state.
//!
//! A timeline is a pure projection of committed state. It owns no edit
//! state; activating a row hands off to [`crate::editor::DetailEditor`].

use serde::Serialize;

use crate::model::{Detail, StatusCatalog, StatusCode};

/// Shown in place of a detail that has not been written yet.
pub const MISSING_DETAIL: &str = "No detail available";

/// What a row's detail cell shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "camelCase")]
pub enum DetailCell {
    /// A detail is present. Structured details arrive pretty-printed.
    Text(String),

    /// No detail at this index. Rendered distinctly to draw attention.
    Missing,
}

impl DetailCell {
    fn from_detail(detail: Option<&Detail>) -> Self {
        match detail {
            Some(d) => Self::Text(d.rendered()),
            None => Self::Missing,
        }
    }

    /// The text to display, with the placeholder for missing details.
    pub fn display(&self) -> &str {
        match self {
            Self::Text(s) => s,
            Self::Missing => MISSING_DETAIL,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// One rendered timeline row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineRow {
    pub index: usize,
    pub code: StatusCode,
    pub label: &'static str,

    /// Whether the catalog recognized `code`.
    pub known: bool,

    pub detail: DetailCell,

    /// Whether activating this row may open the detail editor.
    pub activatable: bool,
}

/// A rendered timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeline {
    pub rows: Vec<TimelineRow>,
}

impl Timeline {
    /// Renders `states` in order, pairing each with `details` by index.
    ///
    /// `details` may be shorter than `states` or contain gaps; those rows
    /// show [`DetailCell::Missing`]. Editability applies to every row alike.
    pub fn render(
        states: &[StatusCode],
        details: &[Option<Detail>],
        is_editable: bool,
        catalog: &StatusCatalog,
    ) -> Self {
        let rows = states
            .iter()
            .enumerate()
            .map(|(index, &code)| TimelineRow {
                index,
                code,
                label: catalog.label_for(code),
                known: code.is_known(),
                detail: DetailCell::from_detail(details.get(index).and_then(Option::as_ref)),
                activatable: is_editable,
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row at `index` if it exists and accepts activation.
    pub fn activate(&self, index: usize) -> Option<&TimelineRow> {
        self.rows.get(index).filter(|row| row.activatable)
    }

    /// Number of rows still waiting for a detail.
    pub fn missing_count(&self) -> usize {
        self.rows.iter().filter(|r| r.detail.is_missing()).count()
    }
}
