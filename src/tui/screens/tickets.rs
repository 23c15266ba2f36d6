//! Ticket list screen: pick a ticket to open.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, List, ListItem, Padding, Paragraph};
use uuid::Uuid;

use crate::model::{StatusCatalog, Ticket};

pub struct TicketsScreen {
    tickets: Vec<Ticket>,
    selected: usize,
    catalog: StatusCatalog,
}

impl TicketsScreen {
    pub fn new(tickets: Vec<Ticket>, catalog: StatusCatalog) -> Self {
        Self {
            tickets,
            selected: 0,
            catalog,
        }
    }

    pub fn move_up(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        if self.selected + 1 < self.tickets.len() {
            self.selected += 1;
        }
    }

    /// The ticket under the cursor, if any.
    pub fn select(&self) -> Option<Uuid> {
        self.tickets.get(self.selected).map(|t| t.id)
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::vertical([
            Constraint::Length(3), // header
            Constraint::Min(0),    // list
            Constraint::Length(1), // help
        ])
        .split(area);

        let muted = Style::default().fg(Color::DarkGray);
        let normal = Style::default().fg(Color::Gray);
        let highlight = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);

        let header = Paragraph::new(Line::from(vec![Span::styled("Repair Tickets", highlight)]))
            .block(Block::default().padding(Padding::new(2, 0, 1, 0)));
        frame.render_widget(header, chunks[0]);

        if self.tickets.is_empty() {
            let empty = Paragraph::new(Line::from(vec![Span::styled(
                "No tickets yet. Create one with `repair-timeline ticket new`.",
                muted,
            )]))
            .block(Block::default().padding(Padding::new(2, 2, 0, 0)));
            frame.render_widget(empty, chunks[1]);
        } else {
            let items: Vec<ListItem> = self
                .tickets
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    let style = if i == self.selected { highlight } else { normal };
                    let pointer = if i == self.selected { "› " } else { "  " };
                    let current = t
                        .current()
                        .map_or("(no states)", |code| self.catalog.label_for(code));
                    let state = if t.is_editable() { "" } else { "  [final]" };
                    ListItem::new(Line::from(vec![
                        Span::styled(pointer, style),
                        Span::styled(t.title.clone(), style),
                        Span::styled(format!("  {current}{state}"), muted),
                    ]))
                })
                .collect();

            let list = List::new(items).block(Block::default().padding(Padding::new(2, 2, 0, 0)));
            frame.render_widget(list, chunks[1]);
        }

        let help = Paragraph::new(Line::from(vec![Span::styled(
            " ↑↓ navigate  ⏎ open  q quit",
            muted,
        )]));
        frame.render_widget(help, chunks[2]);
    }
}
