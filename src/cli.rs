use thiserror::Error;

use crate::logs::{FilterSet, parse_instant};
use crate::render::OutputFormat;
use crate::types::PageSize;

pub const USAGE: &str = "\
Usage:
  logdash [--json] [--query TEXT] [--from INSTANT] [--to INSTANT] [--page-size N]
  logdash settings
  logdash settings set <path>

INSTANT is RFC 3339 (2024-01-15T12:00:00Z) or a date (2024-01-15).";

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Missing value for {0}")]
    MissingValue(String),

    #[error("Invalid instant for {flag}: {value}")]
    InvalidInstant { flag: String, value: String },

    #[error("Invalid page size: {0} (expected a positive integer)")]
    InvalidPageSize(String),

    #[error("Unknown argument: {0}")]
    UnknownArgument(String),
}

/// What the binary was asked to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    /// Open an interactive log session
    Browse,
    ShowSettings,
    SetLogPath(String),
    Help,
}

/// Options parsed from command line arguments
#[derive(Debug, Clone)]
pub struct CliOptions {
    pub command: CliCommand,
    /// Filters applied when the session opens
    pub filters: FilterSet,
    pub page_size: Option<PageSize>,
    pub format: OutputFormat,
}

impl CliOptions {
    /// Parse command line arguments
    pub fn from_args() -> Result<Self, CliError> {
        let args: Vec<String> = std::env::args().collect();
        Self::parse(&args)
    }

    /// Parse from a given argument list (including the program name)
    pub fn parse(args: &[String]) -> Result<Self, CliError> {
        let mut options = Self {
            command: CliCommand::Browse,
            filters: FilterSet::new(),
            page_size: None,
            format: OutputFormat::Text,
        };

        let mut rest = args.iter().skip(1);

        if args.get(1).map(String::as_str) == Some("settings") {
            rest.next();
            options.command = match (rest.next().map(String::as_str), rest.next()) {
                (None, _) => CliCommand::ShowSettings,
                (Some("set"), Some(path)) => CliCommand::SetLogPath(path.clone()),
                (Some("set"), None) => return Err(CliError::MissingValue("settings set".to_string())),
                (Some(other), _) => return Err(CliError::UnknownArgument(other.to_string())),
            };
            if let Some(extra) = rest.next() {
                return Err(CliError::UnknownArgument(extra.clone()));
            }
            return Ok(options);
        }

        while let Some(arg) = rest.next() {
            match arg.as_str() {
                "-h" | "--help" => options.command = CliCommand::Help,
                "--json" => options.format = OutputFormat::Json,
                "-q" | "--query" => {
                    let query = value_for(arg, rest.next())?;
                    options.filters = options.filters.with_query(Some(query));
                }
                "--from" => {
                    let start = instant_for(arg, rest.next())?;
                    options.filters = options.filters.with_start(Some(start));
                }
                "--to" => {
                    let end = instant_for(arg, rest.next())?;
                    options.filters = options.filters.with_end(Some(end));
                }
                "-n" | "--page-size" => {
                    let value = value_for(arg, rest.next())?;
                    let page_size = value
                        .parse()
                        .ok()
                        .and_then(PageSize::new)
                        .ok_or_else(|| CliError::InvalidPageSize(value.clone()))?;
                    options.page_size = Some(page_size);
                }
                other => return Err(CliError::UnknownArgument(other.to_string())),
            }
        }

        tracing::info!(
            "Parsed CLI options: filters={}, page_size={:?}, format={:?}",
            options.filters,
            options.page_size.map(|s| s.get()),
            options.format
        );

        Ok(options)
    }
}

fn value_for(flag: &str, value: Option<&String>) -> Result<String, CliError> {
    value
        .cloned()
        .ok_or_else(|| CliError::MissingValue(flag.to_string()))
}

fn instant_for(flag: &str, value: Option<&String>) -> Result<chrono::DateTime<chrono::Utc>, CliError> {
    let value = value_for(flag, value)?;
    parse_instant(&value).map_err(|_| CliError::InvalidInstant {
        flag: flag.to_string(),
        value,
    })
}
