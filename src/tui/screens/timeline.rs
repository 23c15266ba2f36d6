//! Timeline screen: the ticket's states with a modal detail editor.
//!
//! The screen holds the committed ticket and the rendered timeline; the
//! editor holds the draft. Saving hands a [`DetailUpdate`] to the app loop,
//! which persists it and reports back through [`TimelineScreen::settle`]
//! and [`TimelineScreen::reload`].

use std::cell::Cell;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Padding, Paragraph, Wrap};

use crate::config::Config;
use crate::editor::{DetailEditor, EditSession, PendingCommit, Settlement};
use crate::model::{DetailUpdate, StatusCatalog, Ticket};
use crate::timeline::{DetailCell, Timeline};

pub struct TimelineScreen {
    ticket: Ticket,
    timeline: Timeline,
    editor: DetailEditor,
    catalog: StatusCatalog,
    selected: usize,
    notice: Option<String>,

    // Layout from the last draw, for mouse hit-testing.
    rows_area: Cell<Rect>,
    modal_area: Cell<Rect>,
    offset: Cell<usize>,
}

impl TimelineScreen {
    pub fn new(ticket: Ticket, config: &Config) -> Self {
        let catalog = config.catalog();
        let timeline = Timeline::render(
            &ticket.states,
            &ticket.details,
            ticket.is_editable(),
            &catalog,
        );
        let editor = DetailEditor::new(ticket.is_editable(), config.seed_policy());
        Self {
            ticket,
            timeline,
            editor,
            catalog,
            selected: 0,
            notice: None,
            rows_area: Cell::new(Rect::default()),
            modal_area: Cell::new(Rect::default()),
            offset: Cell::new(0),
        }
    }

    pub fn ticket(&self) -> &Ticket {
        &self.ticket
    }

    /// Whether the edit modal is showing and should receive keystrokes.
    pub fn is_editing(&self) -> bool {
        self.editor.is_open()
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.timeline.len() {
            self.selected += 1;
        }
    }

    /// Opens the editor on the selected row, if rows are editable.
    pub fn activate(&mut self) {
        if self.timeline.activate(self.selected).is_none() {
            return;
        }
        self.notice = None;
        self.editor.request_edit(self.selected, &self.ticket.details);
    }

    pub fn on_char(&mut self, c: char) {
        self.editor.push_char(c);
    }

    pub fn on_backspace(&mut self) {
        self.editor.pop_char();
    }

    pub fn cancel(&mut self) {
        self.editor.cancel();
    }

    /// Submits the draft. Returns the update the caller must persist.
    pub fn submit(&mut self) -> Option<DetailUpdate> {
        match self.editor.begin_commit() {
            PendingCommit::Submitted(update) => Some(update),
            PendingCommit::Unchanged => {
                self.notice = Some("No change".to_string());
                None
            }
            PendingCommit::NotOpen => None,
        }
    }

    /// Reports whether the submitted `update` was written.
    ///
    /// On success the update is merged into the committed ticket and the
    /// timeline re-rendered; the caller may follow up with
    /// [`TimelineScreen::reload`]. On failure the editor reopens with the
    /// draft.
    pub fn settle(&mut self, update: &DetailUpdate, written: Result<(), String>) {
        match written {
            Ok(()) => {
                self.editor.resolve(Settlement::Succeeded);
                let mut ticket = self.ticket.clone();
                ticket.apply_update(update);
                self.replace_ticket(ticket);
                self.notice = Some(format!("Saved row {}", update.index));
            }
            Err(reason) => {
                self.editor.resolve(Settlement::Failed(reason));
            }
        }
    }

    /// Replaces the committed ticket with the stored one.
    ///
    /// A failed reload keeps the locally merged ticket. The write already
    /// landed, so the editor is not reopened.
    pub fn reload(&mut self, stored: Result<Ticket, String>) {
        match stored {
            Ok(ticket) => self.replace_ticket(ticket),
            Err(reason) => self.notice = Some(format!("Saved, but reload failed: {reason}")),
        }
    }

    fn replace_ticket(&mut self, ticket: Ticket) {
        self.timeline = Timeline::render(
            &ticket.states,
            &ticket.details,
            ticket.is_editable(),
            &self.catalog,
        );
        self.ticket = ticket;
        self.selected = self.selected.min(self.timeline.len().saturating_sub(1));
    }

    /// Handles a left click at terminal cell (`column`, `row`).
    ///
    /// While editing, a click outside the modal cancels. Otherwise a click
    /// on a row selects it and opens the editor.
    pub fn on_click(&mut self, column: u16, row: u16) {
        let pos = Position::new(column, row);

        if self.editor.is_open() {
            if !self.modal_area.get().contains(pos) {
                self.editor.cancel();
            }
            return;
        }

        let area = self.rows_area.get();
        if !area.contains(pos) {
            return;
        }
        let index = self.offset.get() + usize::from(row - area.y);
        if index < self.timeline.len() {
            self.selected = index;
            self.activate();
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::vertical([
            Constraint::Length(3), // header
            Constraint::Min(3),    // rows
            Constraint::Length(8), // selected detail
            Constraint::Length(1), // help
        ])
        .split(area);

        let muted = Style::default().fg(Color::DarkGray);
        let normal = Style::default().fg(Color::Gray);
        let highlight = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        let missing = Style::default()
            .fg(Color::Yellow)
            .bg(Color::Black)
            .add_modifier(Modifier::ITALIC);

        // Header: title, state, rows needing attention.
        let state = if self.ticket.is_editable() {
            "open"
        } else {
            "finalized"
        };
        let mut header_spans = vec![
            Span::styled(self.ticket.title.clone(), highlight),
            Span::styled(format!("  [{state}]"), muted),
        ];
        let need = self.timeline.missing_count();
        if need > 0 {
            header_spans.push(Span::styled(format!("  {need} without detail"), missing));
        }
        let header = Paragraph::new(Line::from(header_spans))
            .block(Block::default().padding(Padding::new(2, 0, 1, 0)));
        frame.render_widget(header, chunks[0]);

        // Rows, one line each; the full detail shows below.
        let rows_area = chunks[1].inner(ratatui::layout::Margin::new(2, 0));
        let visible = usize::from(rows_area.height).max(1);
        let offset = (self.selected + 1).saturating_sub(visible);
        self.rows_area.set(rows_area);
        self.offset.set(offset);

        let label_width = self
            .timeline
            .rows
            .iter()
            .map(|r| r.label.chars().count())
            .max()
            .unwrap_or(0);

        let items: Vec<ListItem> = self
            .timeline
            .rows
            .iter()
            .skip(offset)
            .map(|r| {
                let style = if r.index == self.selected {
                    highlight
                } else {
                    normal
                };
                let pointer = if r.index == self.selected { "› " } else { "  " };
                let label_style = if r.known {
                    style
                } else {
                    style.fg(Color::Magenta)
                };
                let cell = match &r.detail {
                    DetailCell::Text(text) => {
                        Span::styled(first_line(text), if r.known { normal } else { muted })
                    }
                    DetailCell::Missing => Span::styled(r.detail.display().to_string(), missing),
                };
                ListItem::new(Line::from(vec![
                    Span::styled(pointer, style),
                    Span::styled(format!("{:>2}  ", r.index), muted),
                    Span::styled(format!("{:<label_width$}  ", r.label), label_style),
                    cell,
                ]))
            })
            .collect();
        frame.render_widget(List::new(items), rows_area);

        // Full detail of the selected row.
        if let Some(row) = self.timeline.rows.get(self.selected) {
            let border = if row.detail.is_missing() {
                missing
            } else {
                muted
            };
            let body = match &row.detail {
                DetailCell::Text(text) => Paragraph::new(text.clone()).style(normal),
                DetailCell::Missing => Paragraph::new(row.detail.display()).style(missing),
            };
            let pane = body.wrap(Wrap { trim: false }).block(
                Block::default()
                    .borders(Borders::TOP)
                    .border_style(border)
                    .title(format!(" {} ", row.label))
                    .padding(Padding::new(2, 2, 0, 0)),
            );
            frame.render_widget(pane, chunks[2]);
        }

        let help = if self.editor.is_open() {
            " type to edit  ⏎ save  esc cancel  click outside to dismiss"
        } else if self.ticket.is_editable() {
            " ↑↓ navigate  ⏎ or click edit detail  esc back  q quit"
        } else {
            " ↑↓ navigate  esc back  q quit  (finalized: read-only)"
        };
        // Notice first so narrow terminals clip the key help, not the notice.
        let mut help_spans = Vec::new();
        if let Some(notice) = &self.notice {
            help_spans.push(Span::styled(format!(" {notice}  "), normal));
        }
        help_spans.push(Span::styled(help, muted));
        frame.render_widget(Paragraph::new(Line::from(help_spans)), chunks[3]);

        if self.editor.is_open() {
            self.render_modal(frame, area);
        }
    }

    fn render_modal(&self, frame: &mut Frame, area: Rect) {
        let (draft, committing) = match self.editor.session() {
            EditSession::Open(d) => (d, false),
            EditSession::Committing(d) => (d, true),
            EditSession::Closed => return,
        };

        let popup = centered_rect(70, 40, area);
        self.modal_area.set(popup);
        frame.render_widget(Clear, popup);

        let label = self
            .timeline
            .rows
            .get(draft.index)
            .map_or(self.catalog.fallback(), |r| r.label);

        let mut lines = vec![Line::from(vec![
            Span::styled(draft.text.clone(), Style::default().fg(Color::White)),
            Span::styled(
                if committing { "" } else { "▏" },
                Style::default().fg(Color::Gray),
            ),
        ])];
        lines.push(Line::default());

        if draft.original().is_some_and(|d| d.as_text().is_none()) {
            lines.push(Line::from(Span::styled(
                "This detail is structured; saving replaces it with plain text.",
                Style::default().fg(Color::Yellow),
            )));
        }
        if committing {
            lines.push(Line::from(Span::styled(
                "Saving…",
                Style::default().fg(Color::DarkGray),
            )));
        }
        if let Some(err) = self.editor.last_error() {
            lines.push(Line::from(Span::styled(
                format!("Save failed: {err}"),
                Style::default().fg(Color::Red),
            )));
        }

        let modal = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .padding(Padding::horizontal(1))
                .title(format!(" Edit detail: {label} (row {}) ", draft.index)),
        );
        frame.render_widget(modal, popup);
    }
}

fn first_line(text: &str) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or("");
    if lines.next().is_some() {
        format!("{first} …")
    } else {
        first.to_string()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
