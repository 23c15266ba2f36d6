//! Detail editor: a modal edit session over one timeline row.
//!
//! The session is transient and owned here alone. Committed details flow
//! in as input; the only thing that flows back out is a [`DetailUpdate`].
//!
//! Two ways to commit:
//!
//! - [`DetailEditor::commit`] closes immediately and hands the update to a
//!   callback. Whatever the callback does with it is invisible here.
//! - [`DetailEditor::begin_commit`] / [`DetailEditor::resolve`] hold the
//!   session until the owner reports whether the write landed, reopening
//!   with the draft intact on failure.

use tracing::{debug, warn};

use crate::model::{Detail, DetailUpdate};

/// How to seed the draft when the current detail is structured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedPolicy {
    /// Only text details seed the draft; structured ones open empty.
    #[default]
    TextOnly,

    /// Structured details seed the draft with their pretty-printed form.
    Rendered,
}

/// The in-progress edit of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub index: usize,
    original: Option<Detail>,
    pub text: String,
}

impl Draft {
    /// Whether committing this draft would change the detail.
    ///
    /// Text compares exactly. A structured or absent original always
    /// counts as changed, so saving an empty draft over a missing detail
    /// still writes `""`.
    pub fn is_changed(&self) -> bool {
        self.original
            .as_ref()
            .is_none_or(|detail| !detail.matches_draft(&self.text))
    }

    pub fn original(&self) -> Option<&Detail> {
        self.original.as_ref()
    }

    fn into_update(self) -> DetailUpdate {
        DetailUpdate {
            index: self.index,
            text: self.text,
        }
    }
}

/// Edit session state.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EditSession {
    /// No modal visible.
    #[default]
    Closed,

    /// Modal visible; the draft accepts input.
    Open(Draft),

    /// Modal visible; a submitted draft awaits [`DetailEditor::resolve`].
    Committing(Draft),
}

/// Result of [`DetailEditor::commit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The callback fired with the new text.
    Updated,

    /// The draft matched the original; nothing fired.
    Unchanged,

    /// No session was open.
    NotOpen,
}

/// Result of [`DetailEditor::begin_commit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingCommit {
    /// The owner should persist this, then call [`DetailEditor::resolve`].
    Submitted(DetailUpdate),

    /// The draft matched the original; the session closed.
    Unchanged,

    /// No open session to commit.
    NotOpen,
}

/// How the owner's write of a submitted update turned out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Succeeded,
    Failed(String),
}

/// A modal detail editor for one timeline.
#[derive(Debug, Clone)]
pub struct DetailEditor {
    editable: bool,
    seed: SeedPolicy,
    session: EditSession,
    last_error: Option<String>,
}

impl DetailEditor {
    pub fn new(editable: bool, seed: SeedPolicy) -> Self {
        Self {
            editable,
            seed,
            session: EditSession::Closed,
            last_error: None,
        }
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    /// Whether the modal is visible.
    pub fn is_open(&self) -> bool {
        !matches!(self.session, EditSession::Closed)
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn editing_index(&self) -> Option<usize> {
        self.current().map(|d| d.index)
    }

    pub fn draft_text(&self) -> Option<&str> {
        self.current().map(|d| d.text.as_str())
    }

    /// The reason the last submitted draft failed to persist, if it did.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Opens the editor on row `index`, seeded from `details[index]`.
    ///
    /// Ignored when not editable or a session is already open.
    /// Returns whether a session was opened.
    pub fn request_edit(&mut self, index: usize, details: &[Option<Detail>]) -> bool {
        if !self.editable {
            debug!(index, "edit request ignored: not editable");
            return false;
        }
        if self.is_open() {
            debug!(index, "edit request ignored: session already open");
            return false;
        }

        let original = details.get(index).cloned().flatten();
        let text = match (&original, self.seed) {
            (Some(detail), _) if detail.as_text().is_some() => detail.rendered(),
            (Some(detail), SeedPolicy::Rendered) => detail.rendered(),
            _ => String::new(),
        };

        debug!(index, "edit session opened");
        self.last_error = None;
        self.session = EditSession::Open(Draft {
            index,
            original,
            text,
        });
        true
    }

    /// Replaces the draft text. Any string is accepted.
    pub fn edit_draft(&mut self, text: impl Into<String>) {
        if let EditSession::Open(draft) = &mut self.session {
            draft.text = text.into();
        }
    }

    pub fn push_char(&mut self, c: char) {
        if let EditSession::Open(draft) = &mut self.session {
            draft.text.push(c);
        }
    }

    pub fn pop_char(&mut self) {
        if let EditSession::Open(draft) = &mut self.session {
            draft.text.pop();
        }
    }

    /// Closes the session, passing a changed draft to `on_update_detail`.
    ///
    /// The callback fires at most once. The session closes whether or not
    /// it fires, and does not wait on what the callback does.
    pub fn commit<F>(&mut self, on_update_detail: F) -> CommitOutcome
    where
        F: FnOnce(usize, String),
    {
        let draft = match std::mem::take(&mut self.session) {
            EditSession::Open(draft) => draft,
            // Committing sessions are settled through `resolve`.
            other => {
                self.session = other;
                return CommitOutcome::NotOpen;
            }
        };

        if !draft.is_changed() {
            debug!(index = draft.index, "edit committed unchanged");
            return CommitOutcome::Unchanged;
        }

        debug!(index = draft.index, "edit committed");
        let update = draft.into_update();
        on_update_detail(update.index, update.text);
        CommitOutcome::Updated
    }

    /// Closes the session without emitting anything.
    ///
    /// Always succeeds, including while a commit is pending; a later
    /// `resolve` is then ignored.
    pub fn cancel(&mut self) {
        if let Some(index) = self.editing_index() {
            debug!(index, "edit session cancelled");
        }
        self.session = EditSession::Closed;
        self.last_error = None;
    }

    /// Submits the draft and holds the session until [`Self::resolve`].
    pub fn begin_commit(&mut self) -> PendingCommit {
        let draft = match std::mem::take(&mut self.session) {
            EditSession::Open(draft) => draft,
            other => {
                self.session = other;
                return PendingCommit::NotOpen;
            }
        };

        self.last_error = None;
        if !draft.is_changed() {
            debug!(index = draft.index, "edit committed unchanged");
            return PendingCommit::Unchanged;
        }

        debug!(index = draft.index, "edit submitted");
        let update = DetailUpdate {
            index: draft.index,
            text: draft.text.clone(),
        };
        self.session = EditSession::Committing(draft);
        PendingCommit::Submitted(update)
    }

    /// Settles a pending commit.
    ///
    /// Success closes the session. Failure reopens it with the draft
    /// preserved and records the reason. Returns false if nothing was
    /// pending.
    pub fn resolve(&mut self, settlement: Settlement) -> bool {
        let draft = match std::mem::take(&mut self.session) {
            EditSession::Committing(draft) => draft,
            other => {
                self.session = other;
                return false;
            }
        };

        match settlement {
            Settlement::Succeeded => {
                debug!(index = draft.index, "edit settled");
            }
            Settlement::Failed(reason) => {
                warn!(index = draft.index, %reason, "edit failed to persist, reopening");
                self.last_error = Some(reason);
                self.session = EditSession::Open(draft);
            }
        }
        true
    }

    fn current(&self) -> Option<&Draft> {
        match &self.session {
            EditSession::Open(d) | EditSession::Committing(d) => Some(d),
            EditSession::Closed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::json;

    fn scenario_details() -> Vec<Option<Detail>> {
        vec![Some("ok".into()), None, Some("waiting".into())]
    }

    fn editor() -> DetailEditor {
        DetailEditor::new(true, SeedPolicy::TextOnly)
    }

    #[test]
    fn request_seeds_from_text_detail() {
        let mut ed = editor();
        assert!(ed.request_edit(2, &scenario_details()));
        assert!(ed.is_open());
        assert_eq!(ed.editing_index(), Some(2));
        assert_eq!(ed.draft_text(), Some("waiting"));
    }

    #[test]
    fn absent_detail_seeds_empty_draft() {
        let mut ed = editor();
        ed.request_edit(1, &scenario_details());
        assert_eq!(ed.draft_text(), Some(""));

        // Past the end of details is absent too.
        ed.cancel();
        ed.request_edit(7, &scenario_details());
        assert_eq!(ed.draft_text(), Some(""));
    }

    #[test]
    fn cancel_fires_nothing_and_closes() {
        let mut ed = editor();
        let details = scenario_details();
        let mut calls = Vec::new();

        ed.request_edit(0, &details);
        ed.edit_draft("changed");
        ed.cancel();

        assert_eq!(ed.session(), &EditSession::Closed);
        assert_eq!(
            ed.commit(|i, t| calls.push((i, t))),
            CommitOutcome::NotOpen
        );
        assert!(calls.is_empty());
        assert_eq!(details, scenario_details());
    }

    #[test]
    fn commit_fires_once_when_changed() {
        let mut ed = editor();
        let mut calls = Vec::new();

        ed.request_edit(1, &scenario_details());
        ed.edit_draft("part ordered");
        let outcome = ed.commit(|i, t| calls.push((i, t)));

        assert_eq!(outcome, CommitOutcome::Updated);
        assert_eq!(calls, vec![(1, "part ordered".to_string())]);
        assert_eq!(ed.session(), &EditSession::Closed);
    }

    #[test]
    fn commit_is_silent_when_unchanged() {
        let mut ed = editor();
        let mut calls = Vec::new();

        ed.request_edit(0, &scenario_details());
        ed.edit_draft("ok");
        let outcome = ed.commit(|i, t| calls.push((i, t)));

        assert_eq!(outcome, CommitOutcome::Unchanged);
        assert!(calls.is_empty());
        assert!(!ed.is_open());
    }

    #[test]
    fn empty_draft_over_absent_detail_still_fires() {
        let mut ed = editor();
        let mut calls = Vec::new();

        ed.request_edit(1, &[Some("ok".into()), None]);
        let outcome = ed.commit(|i, t| calls.push((i, t)));

        assert_eq!(outcome, CommitOutcome::Updated);
        assert_eq!(calls, vec![(1, String::new())]);
        assert!(!ed.is_open());
    }

    #[test]
    fn empty_draft_over_absent_detail_submits_two_phase() {
        let mut ed = editor();
        ed.request_edit(1, &scenario_details());
        assert_eq!(
            ed.begin_commit(),
            PendingCommit::Submitted(DetailUpdate {
                index: 1,
                text: String::new(),
            })
        );
    }

    #[test]
    fn clearing_a_text_detail_is_a_change() {
        let mut ed = editor();
        let mut calls = Vec::new();

        ed.request_edit(0, &scenario_details());
        ed.edit_draft("");
        ed.commit(|i, t| calls.push((i, t)));

        assert_eq!(calls, vec![(0, String::new())]);
    }

    #[test]
    fn structured_detail_opens_empty_under_text_only() {
        let details = vec![Some(Detail::Structured(json!({"bay": 3})))];
        let mut ed = editor();
        let mut calls = Vec::new();

        ed.request_edit(0, &details);
        assert_eq!(ed.draft_text(), Some(""));

        // Committing the untouched empty draft still collapses the value.
        ed.commit(|i, t| calls.push((i, t)));
        assert_eq!(calls, vec![(0, String::new())]);
    }

    #[test]
    fn structured_detail_seeds_rendered_when_configured() {
        let details = vec![Some(Detail::Structured(json!({"bay": 3})))];
        let mut ed = DetailEditor::new(true, SeedPolicy::Rendered);
        let mut calls = Vec::new();

        ed.request_edit(0, &details);
        assert_eq!(ed.draft_text(), Some("{\n  \"bay\": 3\n}"));

        // Same text, but a structured original always counts as changed.
        ed.commit(|i, t| calls.push((i, t)));
        assert_eq!(calls.len(), 1);
    }

    #[test]
    fn not_editable_never_opens() {
        let mut ed = DetailEditor::new(false, SeedPolicy::TextOnly);
        let details = scenario_details();

        for index in 0..5 {
            assert!(!ed.request_edit(index, &details));
            ed.push_char('x');
            ed.edit_draft("y");
            assert_eq!(ed.session(), &EditSession::Closed);
        }
        assert_eq!(ed.begin_commit(), PendingCommit::NotOpen);
    }

    #[test]
    fn second_request_while_open_is_ignored() {
        let mut ed = editor();
        let details = scenario_details();

        ed.request_edit(0, &details);
        ed.edit_draft("draft");
        assert!(!ed.request_edit(2, &details));
        assert_eq!(ed.editing_index(), Some(0));
        assert_eq!(ed.draft_text(), Some("draft"));
    }

    #[test]
    fn keystrokes_edit_the_draft() {
        let mut ed = editor();
        ed.request_edit(0, &scenario_details());
        ed.pop_char();
        ed.push_char('!');
        assert_eq!(ed.draft_text(), Some("o!"));
    }

    #[test]
    fn two_phase_success_closes() {
        let mut ed = editor();
        ed.request_edit(1, &scenario_details());
        ed.edit_draft("part ordered");

        let pending = ed.begin_commit();
        assert_eq!(
            pending,
            PendingCommit::Submitted(DetailUpdate {
                index: 1,
                text: "part ordered".into(),
            })
        );
        assert!(matches!(ed.session(), EditSession::Committing(_)));

        // Input is frozen while committing.
        ed.push_char('x');
        assert_eq!(ed.draft_text(), Some("part ordered"));

        assert!(ed.resolve(Settlement::Succeeded));
        assert_eq!(ed.session(), &EditSession::Closed);
        assert!(ed.last_error().is_none());
    }

    #[test]
    fn two_phase_failure_reopens_with_draft() {
        let mut ed = editor();
        ed.request_edit(1, &scenario_details());
        ed.edit_draft("part ordered");
        ed.begin_commit();

        assert!(ed.resolve(Settlement::Failed("disk full".into())));
        assert!(matches!(ed.session(), EditSession::Open(_)));
        assert_eq!(ed.draft_text(), Some("part ordered"));
        assert_eq!(ed.last_error(), Some("disk full"));

        // Retry goes through.
        assert!(matches!(ed.begin_commit(), PendingCommit::Submitted(_)));
        assert!(ed.last_error().is_none());
    }

    #[test]
    fn two_phase_unchanged_closes_without_pending() {
        let mut ed = editor();
        ed.request_edit(0, &scenario_details());
        assert_eq!(ed.begin_commit(), PendingCommit::Unchanged);
        assert!(!ed.is_open());
        assert!(!ed.resolve(Settlement::Succeeded));
    }

    #[test]
    fn cancel_while_committing_drops_the_settlement() {
        let mut ed = editor();
        ed.request_edit(1, &scenario_details());
        ed.edit_draft("x");
        ed.begin_commit();
        ed.cancel();

        assert!(!ed.resolve(Settlement::Failed("late".into())));
        assert_eq!(ed.session(), &EditSession::Closed);
    }

    #[test]
    fn plain_commit_leaves_pending_session_alone() {
        let mut ed = editor();
        ed.request_edit(1, &scenario_details());
        ed.edit_draft("x");
        ed.begin_commit();

        assert_eq!(ed.commit(|_, _| {}), CommitOutcome::NotOpen);
        assert!(matches!(ed.session(), EditSession::Committing(_)));
    }
}
