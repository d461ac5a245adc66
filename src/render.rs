use chrono::{DateTime, Utc};

use crate::logs::{LogRecord, format_instant};
use crate::paging::View;

/// How records are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Render records as table rows or JSON lines
pub fn format_records(records: &[LogRecord], format: OutputFormat) -> String {
    let mut output = String::new();
    for record in records {
        match format {
            OutputFormat::Text => output.push_str(&format_text_row(record)),
            OutputFormat::Json => {
                output.push_str(&serde_json::to_string(record).unwrap_or_default());
            }
        }
        output.push('\n');
    }
    output
}

fn format_text_row(record: &LogRecord) -> String {
    format!(
        "{} | {} | {} | {}",
        record.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        if record.is_valid { "valid   " } else { "TAMPERED" },
        record.source,
        record.content,
    )
}

/// One-line summary of the view below the table
pub fn format_status(view: &View) -> String {
    let mut status = format!("{} | {} records", view.filters, view.records.len());

    if view.is_loading {
        status.push_str(" | loading...");
    } else if view.is_exhausted {
        status.push_str(" | end of log");
    } else if !view.records.is_empty() {
        status.push_str(" | 'more' for the next page");
    }

    if let Some(error) = &view.error {
        status.push_str(&format!(" | error: {}", error.message));
        if error.retryable {
            status.push_str(" ('retry' to try again)");
        }
    }

    status
}

/// Render the whole view: every loaded record followed by the status line
pub fn format_view(view: &View, format: OutputFormat) -> String {
    let mut output = String::new();
    if view.records.is_empty() && format == OutputFormat::Text {
        output.push_str("No log entries found.\n");
    } else {
        output.push_str(&format_records(&view.records, format));
    }
    output.push_str(&format_status(view));
    output.push('\n');
    output
}

/// Describe the active time bounds for the draft filter prompt
pub fn format_bounds(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> String {
    let bound = |t: Option<DateTime<Utc>>| t.map(format_instant).unwrap_or_else(|| "-".to_string());
    format!("{} .. {}", bound(start), bound(end))
}
