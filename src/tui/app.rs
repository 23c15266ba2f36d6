//! Application loop and screen routing.
//!
//! The loop is the owner of committed ticket state: edits leave the
//! timeline screen as updates, get persisted here, and the stored ticket
//! is fed back in.

use std::io;

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEventKind,
};
use crossterm::execute;
use jiff::Timestamp;
use ratatui::DefaultTerminal;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::model::{DetailUpdate, Ticket};
use crate::storage::Storage;

use super::screens::{TicketsScreen, TimelineScreen};

/// Which screen is currently displayed.
enum Screen {
    Tickets(TicketsScreen),
    Timeline(TimelineScreen),
}

/// Runs the TUI event loop until the user quits.
///
/// Opens on `ticket` when given, otherwise on the ticket list.
pub fn run(
    config: &Config,
    storage: &Storage,
    operator: &str,
    ticket: Option<Uuid>,
) -> io::Result<()> {
    let mut terminal = ratatui::init();
    execute!(io::stdout(), EnableMouseCapture)?;
    info!(operator, "tui started");

    let result = event_loop(&mut terminal, config, storage, operator, ticket);

    let _ = execute!(io::stdout(), DisableMouseCapture);
    ratatui::restore();
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    config: &Config,
    storage: &Storage,
    operator: &str,
    ticket: Option<Uuid>,
) -> io::Result<()> {
    let mut screen = match ticket {
        Some(id) => Screen::Timeline(load_timeline_screen(config, storage, id)?),
        None => Screen::Tickets(load_tickets_screen(config, storage)?),
    };

    loop {
        terminal.draw(|frame| match &screen {
            Screen::Tickets(s) => s.render(frame),
            Screen::Timeline(s) => s.render(frame),
        })?;

        match event::read()? {
            Event::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }

                match &mut screen {
                    Screen::Tickets(list) => match key.code {
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Up | KeyCode::Char('k') => list.move_up(),
                        KeyCode::Down | KeyCode::Char('j') => list.move_down(),
                        KeyCode::Enter => {
                            if let Some(id) = list.select() {
                                screen =
                                    Screen::Timeline(load_timeline_screen(config, storage, id)?);
                            }
                        }
                        _ => {}
                    },
                    // The modal takes every key while it is open.
                    Screen::Timeline(t) if t.is_editing() => match key.code {
                        KeyCode::Esc => t.cancel(),
                        KeyCode::Enter => {
                            if let Some(update) = t.submit() {
                                let id = t.ticket().id;
                                let written = persist(storage, id, &update, operator);
                                let landed = written.is_ok();
                                t.settle(&update, written);
                                if landed {
                                    t.reload(reload(storage, id));
                                }
                            }
                        }
                        KeyCode::Backspace => t.on_backspace(),
                        KeyCode::Char(c) => t.on_char(c),
                        _ => {}
                    },
                    Screen::Timeline(t) => match key.code {
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Esc => {
                            screen = Screen::Tickets(load_tickets_screen(config, storage)?);
                        }
                        KeyCode::Up | KeyCode::Char('k') => t.move_up(),
                        KeyCode::Down | KeyCode::Char('j') => t.move_down(),
                        KeyCode::Enter => t.activate(),
                        _ => {}
                    },
                }
            }
            Event::Mouse(mouse) => {
                if let (Screen::Timeline(t), MouseEventKind::Down(MouseButton::Left)) =
                    (&mut screen, mouse.kind)
                {
                    t.on_click(mouse.column, mouse.row);
                }
            }
            _ => {}
        }
    }
}

/// Writes a committed update.
fn persist(
    storage: &Storage,
    id: Uuid,
    update: &DetailUpdate,
    operator: &str,
) -> Result<(), String> {
    match storage.save_detail(id, update, operator, Timestamp::now()) {
        Ok(_) => {
            info!(ticket = %id, index = update.index, operator, "detail edited from tui");
            Ok(())
        }
        Err(e) => {
            warn!(ticket = %id, index = update.index, error = %e, "detail save failed");
            Err(e.to_string())
        }
    }
}

/// Reads the ticket back after a write has landed.
fn reload(storage: &Storage, id: Uuid) -> Result<Ticket, String> {
    storage.load_ticket(id).map_err(|e| {
        warn!(ticket = %id, error = %e, "reload after save failed");
        e.to_string()
    })
}

fn load_tickets_screen(config: &Config, storage: &Storage) -> io::Result<TicketsScreen> {
    let tickets = storage.list_tickets().map_err(io::Error::other)?;
    Ok(TicketsScreen::new(tickets, config.catalog()))
}

fn load_timeline_screen(
    config: &Config,
    storage: &Storage,
    id: Uuid,
) -> io::Result<TimelineScreen> {
    let ticket = storage.load_ticket(id).map_err(io::Error::other)?;
    Ok(TimelineScreen::new(ticket, config))
}
