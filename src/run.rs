use anyhow::Result;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::fetch::PageFetcher;
use crate::logs::{FilterSet, LogRecord, parse_instant};
use crate::paging::{InvalidCursorUsage, LoadOutcome, PaginationController, Rejection, View};
use crate::render::{OutputFormat, format_bounds, format_records, format_status, format_view};
use crate::settings::SettingsClient;

const SESSION_HELP: &str = "\
Commands:
  more (or empty line)   load the next page
  retry                  retry the failed fetch
  refresh                reload the current filters from the first page
  query [TEXT]           set or clear the draft search text
  from [INSTANT|-]       set or clear the draft start time
  to [INSTANT|-]         set or clear the draft end time
  apply                  apply the draft filters
  clear                  clear all filters
  show                   print the current view
  help                   show this help
  quit                   exit";

/// A line typed into the interactive session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    More,
    Retry,
    Refresh,
    Query(Option<String>),
    From(Option<DateTime<Utc>>),
    To(Option<DateTime<Utc>>),
    Apply,
    Clear,
    Show,
    Help,
    Quit,
}

impl SessionCommand {
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim_start();
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line.trim_end(), ""),
        };

        match word {
            "" | "more" | "m" => Ok(Self::More),
            "retry" | "r" => Ok(Self::Retry),
            "refresh" => Ok(Self::Refresh),
            "query" | "q" => Ok(Self::Query(Some(rest.to_string()).filter(|q| !q.is_empty()))),
            "from" => parse_bound(rest).map(Self::From),
            "to" => parse_bound(rest).map(Self::To),
            "apply" | "a" => Ok(Self::Apply),
            "clear" => Ok(Self::Clear),
            "show" | "s" => Ok(Self::Show),
            "help" | "h" | "?" => Ok(Self::Help),
            "quit" | "exit" => Ok(Self::Quit),
            other => Err(format!("Unknown command '{other}' (type 'help')")),
        }
    }
}

fn parse_bound(input: &str) -> Result<Option<DateTime<Utc>>, String> {
    if input.is_empty() || input == "-" {
        return Ok(None);
    }
    parse_instant(input)
        .map(Some)
        .map_err(|e| format!("Invalid instant '{input}': {e}"))
}

#[derive(Debug, Clone, Copy)]
enum LoadKind {
    More,
    Retry,
}

/// Run a page load in the background so the prompt stays responsive
fn spawn_load<F: PageFetcher>(
    controller: &PaginationController<F>,
    outcomes: &mpsc::UnboundedSender<Result<LoadOutcome, InvalidCursorUsage>>,
    kind: LoadKind,
) {
    let controller = controller.clone();
    let outcomes = outcomes.clone();
    tokio::spawn(async move {
        let outcome = match kind {
            LoadKind::More => controller.load_more().await,
            LoadKind::Retry => controller.retry().await,
        };
        let _ = outcomes.send(outcome);
    });
}

/// Interactive log table session on stdin/stdout
pub async fn run_session<F: PageFetcher>(
    controller: PaginationController<F>,
    initial_filters: FilterSet,
    format: OutputFormat,
) -> Result<()> {
    let (outcome_tx, mut outcome_rx) = mpsc::unbounded_channel();
    let mut draft = initial_filters.clone();

    controller.apply_filters(initial_filters).await;
    spawn_load(&controller, &outcome_tx, LoadKind::More);
    println!("Loading logs... (type 'help' for commands)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    tracing::info!("stdin closed, ending session");
                    break;
                };

                let command = match SessionCommand::parse(&line) {
                    Ok(command) => command,
                    Err(message) => {
                        println!("{message}");
                        continue;
                    }
                };

                match command {
                    SessionCommand::More => spawn_load(&controller, &outcome_tx, LoadKind::More),
                    SessionCommand::Retry => spawn_load(&controller, &outcome_tx, LoadKind::Retry),
                    SessionCommand::Refresh => {
                        controller.refresh().await;
                        spawn_load(&controller, &outcome_tx, LoadKind::More);
                    }
                    SessionCommand::Query(query) => {
                        draft = draft.with_query(query);
                        print_draft(&draft);
                    }
                    SessionCommand::From(start) => {
                        draft = draft.with_start(start);
                        print_draft(&draft);
                    }
                    SessionCommand::To(end) => {
                        draft = draft.with_end(end);
                        print_draft(&draft);
                    }
                    SessionCommand::Apply => {
                        apply(&controller, &outcome_tx, draft.clone()).await;
                    }
                    SessionCommand::Clear => {
                        draft = FilterSet::new();
                        apply(&controller, &outcome_tx, draft.clone()).await;
                    }
                    SessionCommand::Show => {
                        print!("{}", format_view(&controller.current_view().await, format));
                    }
                    SessionCommand::Help => println!("{SESSION_HELP}"),
                    SessionCommand::Quit => break,
                }
            }

            Some(outcome) = outcome_rx.recv() => {
                report(&controller, outcome?, format).await;
            }
        }
    }

    Ok(())
}

async fn apply<F: PageFetcher>(
    controller: &PaginationController<F>,
    outcomes: &mpsc::UnboundedSender<Result<LoadOutcome, InvalidCursorUsage>>,
    filters: FilterSet,
) {
    if controller.apply_filters(filters).await {
        spawn_load(controller, outcomes, LoadKind::More);
    } else {
        println!("Filters unchanged");
    }
}

fn print_draft(draft: &FilterSet) {
    println!(
        "Draft: query={:?} time={} ('apply' to search)",
        draft.query().unwrap_or(""),
        format_bounds(draft.start(), draft.end())
    );
}

async fn report<F: PageFetcher>(
    controller: &PaginationController<F>,
    outcome: LoadOutcome,
    format: OutputFormat,
) {
    let view = controller.current_view().await;
    match outcome {
        LoadOutcome::Loaded {
            filters, records, ..
        } => {
            if let Some(output) = loaded_output(&view, &filters, &records, format) {
                print!("{output}");
            }
        }
        LoadOutcome::Failed(_) => println!("{}", format_status(&view)),
        LoadOutcome::Discarded => {}
        LoadOutcome::Rejected(Rejection::Exhausted) => println!("No more log entries"),
        LoadOutcome::Rejected(Rejection::AlreadyLoading) => println!("Still loading..."),
        LoadOutcome::Rejected(rejection) => println!("{rejection}"),
    }
}

/// Rows of a freshly loaded page plus the status line, or `None` when the
/// page was loaded under filters that are no longer active
fn loaded_output(
    view: &View,
    filters: &FilterSet,
    records: &[LogRecord],
    format: OutputFormat,
) -> Option<String> {
    if view.filters != *filters {
        tracing::debug!("Not printing page loaded for {filters}; active filters are {}", view.filters);
        return None;
    }
    Some(format!(
        "{}{}\n",
        format_records(records, format),
        format_status(view)
    ))
}

/// Print or update the gateway's monitored log path
pub async fn run_settings(client: &SettingsClient, new_path: Option<&str>) -> Result<()> {
    match new_path {
        Some(path) => {
            client.set_log_path(path).await?;
            println!("Monitoring log path set to {path}");
        }
        None => {
            let path = client.log_path().await?;
            if path.is_empty() {
                println!("No log path configured");
            } else {
                println!("Monitoring log path: {path}");
            }
        }
    }
    Ok(())
}
