//! CLI interface for repair timelines.
//!
//! Each subcommand is non-interactive: arguments in, text or JSON out,
//! except `browse`, which opens the terminal UI.
//!
//! Commands split into two groups:
//!
//! - `repair-timeline ticket new|list` and `statuses`: no ticket context needed.
//! - `repair-timeline --ticket <id> <command>`: everything else.
//!
//! The `--ticket` flag takes a full UUID or unambiguous prefix.

mod format;

use clap::{Parser, Subcommand};
use jiff::Timestamp;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::editor::{CommitOutcome, DetailEditor};
use crate::identity::resolve_operator;
use crate::model::{Detail, DetailUpdate, Status, StatusCode, Ticket};
use crate::storage::Storage;
use crate::timeline::Timeline;
use crate::tui;

use format::{format_history, format_ticket_line, format_timeline, short_id};

/// Repair timeline: follow a repair ticket through its states.
#[derive(Debug, Parser)]
#[command(name = "repair-timeline", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Ticket ID: full UUID or unambiguous prefix (e.g. `a3b`).
    #[arg(long, global = true)]
    ticket: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: following a repair
  1. repair-timeline ticket new "Cracked housing, unit 4411"
     → prints a ticket ID (e.g. a3b0fc12)
  2. repair-timeline --ticket a3b advance 1 --detail "Fan noise on boot"
  3. repair-timeline --ticket a3b advance 3
  4. repair-timeline --ticket a3b edit 2 --as ana "Fan assembly on order"
  5. repair-timeline --ticket a3b show
  6. repair-timeline --ticket a3b finalize"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage tickets: create new ones, list existing.
    Ticket {
        #[command(subcommand)]
        command: TicketCommand,
    },

    /// List the known status codes and their labels.
    Statuses,

    /// Render the ticket's timeline.
    /// Requires `--ticket`.
    Show {
        /// Print the rendered timeline as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Record that the ticket reached a new state.
    ///
    /// Codes outside the catalog are accepted and rendered with the
    /// fallback label. Requires `--ticket`.
    Advance {
        /// Status code to append.
        #[arg(allow_negative_numbers = true)]
        code: i64,

        /// Initial detail for the new state.
        #[arg(long, conflicts_with = "detail_json")]
        detail: Option<String>,

        /// Initial detail as a JSON value, kept structured.
        #[arg(long)]
        detail_json: Option<String>,
    },

    /// Rewrite the detail of one timeline row.
    ///
    /// Nothing is written when the text matches the current detail.
    /// Refused once the ticket is finalized. Requires `--ticket`.
    Edit {
        /// Row index, starting at 0.
        index: usize,

        /// New detail text. May be empty.
        text: String,

        /// Operator making the edit.
        /// Falls back to `REPAIR_OPERATOR`, then the config.
        #[arg(long = "as")]
        operator: Option<String>,
    },

    /// Close the ticket to further edits and states.
    /// Requires `--ticket`.
    Finalize,

    /// Show the history of detail edits.
    /// Requires `--ticket`.
    History,

    /// Browse tickets and edit details interactively.
    ///
    /// Opens on `--ticket` when given, otherwise on the ticket list.
    Browse {
        /// Operator recorded on edits made in this session.
        #[arg(long = "as")]
        operator: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum TicketCommand {
    /// Create a new ticket at "Start". Prints the ticket ID.
    New {
        /// What the repair is about.
        title: String,
    },

    /// List tickets.
    List,
}

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config, storage: &Storage) -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Command::Ticket { command } => match command {
            TicketCommand::New { title } => cmd_new(storage, &title),
            TicketCommand::List => cmd_list(config, storage),
        },
        Command::Statuses => {
            cmd_statuses();
            Ok(())
        }
        Command::Show { json } => {
            let ticket = require_ticket(storage, cli.ticket.as_deref())?;
            cmd_show(config, &ticket, json)
        }
        Command::Advance {
            code,
            detail,
            detail_json,
        } => {
            let ticket = require_ticket(storage, cli.ticket.as_deref())?;
            let detail = parse_initial_detail(detail, detail_json.as_deref())?;
            cmd_advance(config, storage, &ticket, StatusCode(code), detail.as_ref())
        }
        Command::Edit {
            index,
            text,
            operator,
        } => {
            let ticket = require_ticket(storage, cli.ticket.as_deref())?;
            let operator = resolve_operator(operator.as_deref(), config)?;
            cmd_edit(config, storage, &ticket, index, text, &operator)
        }
        Command::Finalize => {
            let ticket = require_ticket(storage, cli.ticket.as_deref())?;
            cmd_finalize(storage, &ticket)
        }
        Command::History => {
            let ticket = require_ticket(storage, cli.ticket.as_deref())?;
            cmd_history(storage, &ticket)
        }
        Command::Browse { operator } => {
            let operator = resolve_operator(operator.as_deref(), config)?;
            let ticket = match cli.ticket.as_deref() {
                Some(reference) => Some(resolve_ticket(storage, reference)?),
                None => None,
            };
            tui::run(config, storage, &operator, ticket.map(|t| t.id))
                .map_err(|e| format!("terminal error: {e}"))
        }
    }
}

/// Require that `--ticket` was provided and resolve it.
fn require_ticket(storage: &Storage, ticket_ref: Option<&str>) -> Result<Ticket, String> {
    let ticket_ref = ticket_ref.ok_or("this command requires --ticket <id>")?;
    resolve_ticket(storage, ticket_ref)
}

fn parse_initial_detail(
    text: Option<String>,
    json: Option<&str>,
) -> Result<Option<Detail>, String> {
    if let Some(raw) = json {
        let value = serde_json::from_str(raw).map_err(|e| format!("invalid --detail-json: {e}"))?;
        return Ok(Some(Detail::from_json(value)));
    }
    Ok(text.map(Detail::Text))
}

fn cmd_new(storage: &Storage, title: &str) -> Result<(), String> {
    let ticket = Ticket {
        id: Uuid::new_v4(),
        title: title.to_string(),
        created_at: Timestamp::now(),
        states: vec![Status::Start.code()],
        details: Vec::new(),
        finalized_at: None,
    };

    storage
        .create_ticket(&ticket)
        .map_err(|e| format!("failed to create ticket: {e}"))?;

    println!("{}", ticket.id);
    Ok(())
}

fn cmd_list(config: &Config, storage: &Storage) -> Result<(), String> {
    let tickets = storage
        .list_tickets()
        .map_err(|e| format!("failed to list tickets: {e}"))?;

    if tickets.is_empty() {
        println!("No tickets");
        return Ok(());
    }

    let catalog = config.catalog();
    for t in &tickets {
        println!("{}", format_ticket_line(t, &catalog));
    }

    Ok(())
}

fn cmd_statuses() {
    for status in Status::ALL {
        println!("{}  {}", status.code(), status.label());
    }
}

fn cmd_show(config: &Config, ticket: &Ticket, json: bool) -> Result<(), String> {
    let timeline = Timeline::render(
        &ticket.states,
        &ticket.details,
        ticket.is_editable(),
        &config.catalog(),
    );

    if json {
        let out = serde_json::to_string_pretty(&timeline)
            .map_err(|e| format!("failed to serialize timeline: {e}"))?;
        println!("{out}");
    } else {
        println!("{}", format_timeline(ticket, &timeline));
    }
    Ok(())
}

fn cmd_advance(
    config: &Config,
    storage: &Storage,
    ticket: &Ticket,
    code: StatusCode,
    detail: Option<&Detail>,
) -> Result<(), String> {
    let index = storage
        .append_state(ticket.id, code, detail)
        .map_err(|e| format!("failed to advance ticket: {e}"))?;

    let label = config.catalog().label_for(code);
    eprintln!("Ticket {} → {label} (row {index})", short_id(ticket.id));
    if !code.is_known() {
        eprintln!("Warning: status code {code} is not in the catalog");
    }
    Ok(())
}

/// Runs one edit session on the command line: open, replace, commit.
fn cmd_edit(
    config: &Config,
    storage: &Storage,
    ticket: &Ticket,
    index: usize,
    text: String,
    operator: &str,
) -> Result<(), String> {
    let short = short_id(ticket.id);
    if index >= ticket.states.len() {
        return Err(format!(
            "ticket {short} has no row {index} (rows 0..{})",
            ticket.states.len()
        ));
    }

    let mut editor = DetailEditor::new(ticket.is_editable(), config.seed_policy());
    if !editor.request_edit(index, &ticket.details) {
        warn!(ticket = %ticket.id, index, "edit refused: ticket finalized");
        return Err(format!("ticket {short} is finalized; details can no longer be edited"));
    }
    editor.edit_draft(text);

    let mut saved: Result<(), String> = Ok(());
    let outcome = editor.commit(|index, text| {
        let update = DetailUpdate { index, text };
        saved = storage
            .save_detail(ticket.id, &update, operator, Timestamp::now())
            .map(|_| ())
            .map_err(|e| format!("failed to save detail: {e}"));
    });

    match outcome {
        CommitOutcome::Updated => {
            saved?;
            info!(ticket = %ticket.id, index, operator, "detail edited from CLI");
            eprintln!("Ticket {short} row {index} updated");
        }
        CommitOutcome::Unchanged => eprintln!("Ticket {short} row {index} unchanged"),
        CommitOutcome::NotOpen => return Err("edit session closed before commit".to_string()),
    }
    Ok(())
}

fn cmd_finalize(storage: &Storage, ticket: &Ticket) -> Result<(), String> {
    let short = short_id(ticket.id);
    if !ticket.is_editable() {
        return Err(format!("ticket {short} is already finalized"));
    }

    storage
        .finalize_ticket(ticket.id, Timestamp::now())
        .map_err(|e| format!("failed to finalize ticket: {e}"))?;

    eprintln!("Ticket {short} finalized");
    Ok(())
}

fn cmd_history(storage: &Storage, ticket: &Ticket) -> Result<(), String> {
    let history = storage
        .load_history(ticket.id)
        .map_err(|e| format!("failed to load history: {e}"))?;

    if history.is_empty() {
        println!("No detail edits");
        return Ok(());
    }

    println!("{}", format_history(&history));
    Ok(())
}

/// Resolve a ticket reference (full UUID or unambiguous prefix) to a ticket.
pub(crate) fn resolve_ticket(storage: &Storage, reference: &str) -> Result<Ticket, String> {
    // Try full UUID first.
    if let Ok(id) = reference.parse::<Uuid>() {
        return storage
            .load_ticket(id)
            .map_err(|e| format!("ticket not found: {e}"));
    }

    // Try as a prefix match against all tickets.
    let tickets = storage
        .list_tickets()
        .map_err(|e| format!("failed to list tickets: {e}"))?;

    let mut matches: Vec<Ticket> = tickets
        .into_iter()
        .filter(|t| t.id.to_string().starts_with(reference))
        .collect();

    match matches.len() {
        0 => Err(format!("no ticket matching '{reference}'")),
        1 => Ok(matches.remove(0)),
        n => {
            let ids: Vec<String> = matches.iter().map(|t| short_id(t.id)).collect();
            Err(format!(
                "'{reference}' is ambiguous: matches {n} tickets: {}",
                ids.join(", ")
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;
    use tempfile::TempDir;

    fn test_storage() -> (TempDir, Storage) {
        let dir = TempDir::new().unwrap();
        let storage = Storage::new(dir.path().join("tickets")).unwrap();
        (dir, storage)
    }

    fn ticket_with_id(id: &str) -> Ticket {
        Ticket {
            id: id.parse().unwrap(),
            title: "Bench test".into(),
            created_at: Timestamp::now(),
            states: vec![StatusCode(0), StatusCode(1)],
            details: vec![Some("ok".into())],
            finalized_at: None,
        }
    }

    fn edit(storage: &Storage, ticket: &Ticket, index: usize, text: &str) -> Result<(), String> {
        cmd_edit(
            &Config::default(),
            storage,
            ticket,
            index,
            text.to_string(),
            "ana",
        )
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn advance_accepts_negative_codes() {
        let args = ["repair-timeline", "--ticket", "a3b", "advance", "-1"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(cli.command, Command::Advance { code: -1, .. }));
    }

    #[test]
    fn detail_json_keeps_structure() {
        let detail = parse_initial_detail(None, Some("{\"bay\": 3}")).unwrap();
        assert!(matches!(detail, Some(Detail::Structured(_))));

        let detail = parse_initial_detail(None, Some("\"plain\"")).unwrap();
        assert_eq!(detail, Some(Detail::from("plain")));

        assert!(parse_initial_detail(None, Some("{nope")).is_err());
        assert_eq!(parse_initial_detail(None, None).unwrap(), None);
    }

    #[test]
    fn resolves_unique_prefix() {
        let (_dir, storage) = test_storage();
        let ticket = ticket_with_id("a3b0fc12-0000-4000-8000-000000000001");
        storage.create_ticket(&ticket).unwrap();

        let found = resolve_ticket(&storage, "a3b").unwrap();
        assert_eq!(found.id, ticket.id);
    }

    #[test]
    fn ambiguous_prefix_is_an_error() {
        let (_dir, storage) = test_storage();
        storage
            .create_ticket(&ticket_with_id("a3b0fc12-0000-4000-8000-000000000001"))
            .unwrap();
        storage
            .create_ticket(&ticket_with_id("a3b9aa00-0000-4000-8000-000000000002"))
            .unwrap();

        let err = resolve_ticket(&storage, "a3b").unwrap_err();
        assert!(err.contains("ambiguous"));
        let err = resolve_ticket(&storage, "ffff").unwrap_err();
        assert!(err.contains("no ticket"));
    }

    #[test]
    fn edit_persists_changed_detail() {
        let (_dir, storage) = test_storage();
        let ticket = ticket_with_id("a3b0fc12-0000-4000-8000-000000000001");
        storage.create_ticket(&ticket).unwrap();

        edit(&storage, &ticket, 1, "part ordered").unwrap();

        let loaded = storage.load_ticket(ticket.id).unwrap();
        assert_eq!(loaded.detail(1), Some(&Detail::from("part ordered")));
        assert_eq!(storage.load_history(ticket.id).unwrap().len(), 1);
    }

    #[test]
    fn edit_with_same_text_writes_nothing() {
        let (_dir, storage) = test_storage();
        let ticket = ticket_with_id("a3b0fc12-0000-4000-8000-000000000001");
        storage.create_ticket(&ticket).unwrap();

        edit(&storage, &ticket, 0, "ok").unwrap();

        assert!(storage.load_history(ticket.id).unwrap().is_empty());
    }

    #[test]
    fn empty_edit_over_missing_detail_is_written() {
        let (_dir, storage) = test_storage();
        let ticket = ticket_with_id("a3b0fc12-0000-4000-8000-000000000001");
        storage.create_ticket(&ticket).unwrap();

        edit(&storage, &ticket, 1, "").unwrap();

        let loaded = storage.load_ticket(ticket.id).unwrap();
        assert_eq!(loaded.detail(1), Some(&Detail::from("")));
        assert_eq!(storage.load_history(ticket.id).unwrap().len(), 1);
    }

    #[test]
    fn edit_on_finalized_ticket_is_refused() {
        let (_dir, storage) = test_storage();
        let mut ticket = ticket_with_id("a3b0fc12-0000-4000-8000-000000000001");
        ticket.finalized_at = Some(Timestamp::now());
        storage.create_ticket(&ticket).unwrap();

        let err = edit(&storage, &ticket, 0, "late").unwrap_err();
        assert!(err.contains("finalized"));
    }

    #[test]
    fn edit_past_last_row_is_refused() {
        let (_dir, storage) = test_storage();
        let ticket = ticket_with_id("a3b0fc12-0000-4000-8000-000000000001");
        storage.create_ticket(&ticket).unwrap();

        let err = edit(&storage, &ticket, 2, "x").unwrap_err();
        assert!(err.contains("no row 2"));
    }
}
