use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;

use crate::config::ApiConfig;
use crate::fetch::{FetchFailed, PageFetcher, PageRequest};
use crate::logs::{LogRecord, Page, format_instant};
use crate::types::Cursor;

pub const LOG_PATH: &str = "/log";

/// Build the HTTP agent shared by the log and settings clients
pub fn build_agent(config: &ApiConfig) -> ureq::Agent {
    ureq::AgentBuilder::new()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
}

/// Fetches log pages from the gateway's `GET /log` endpoint
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    endpoint: String,
    source: String,
}

impl HttpFetcher {
    pub fn new(config: &ApiConfig) -> Self {
        Self::with_agent(build_agent(config), config)
    }

    pub fn with_agent(agent: ureq::Agent, config: &ApiConfig) -> Self {
        let endpoint = format!("{}{LOG_PATH}", config.base_url.trim_end_matches('/'));
        tracing::info!("Log endpoint: {endpoint} (source={})", config.source);
        Self {
            agent,
            endpoint,
            source: config.source.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch_page(
        &self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Page, FetchFailed>> + Send {
        let agent = self.agent.clone();
        let endpoint = self.endpoint.clone();
        let params = query_params(&request, &self.source);

        async move {
            tracing::debug!("GET {endpoint} {params:?}");
            // ureq blocks, so the request runs on the blocking pool
            tokio::task::spawn_blocking(move || fetch_blocking(&agent, &endpoint, &params))
                .await
                .map_err(|e| FetchFailed::transport(format!("Fetch task failed: {e}")))?
        }
    }
}

/// Query parameters for one page request, in the gateway's naming
pub fn query_params(request: &PageRequest, source: &str) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("source", source.to_string()),
        ("pageSize", request.page_size.to_string()),
    ];

    if let Some(cursor) = &request.cursor {
        params.push(("bookmark", cursor.as_str().to_string()));
    }

    let filters = request.identity.filters();
    if let Some(query) = filters.query() {
        params.push(("query", query.to_string()));
    }
    if let Some(start) = filters.start() {
        params.push(("startDate", format_instant(start)));
    }
    if let Some(end) = filters.end() {
        params.push(("endDate", format_instant(end)));
    }

    params
}

fn fetch_blocking(
    agent: &ureq::Agent,
    endpoint: &str,
    params: &[(&'static str, String)],
) -> Result<Page, FetchFailed> {
    let mut http_request = agent.get(endpoint);
    for (name, value) in params {
        http_request = http_request.query(name, value);
    }

    let body = match http_request.call() {
        Ok(response) => response
            .into_string()
            .map_err(|e| FetchFailed::transport(format!("Failed to read response body: {e}")))?,
        Err(ureq::Error::Status(status, response)) => {
            let message = error_message(status, response);
            return Err(FetchFailed::status(status, message));
        }
        Err(ureq::Error::Transport(transport)) => {
            return Err(FetchFailed::transport(format!(
                "Could not reach {endpoint}: {transport}"
            )));
        }
    };

    parse_page(&body)
}

/// Prefer the gateway's `{ "error": ... }` body over the bare status line
fn error_message(status: u16, response: ureq::Response) -> String {
    let status_text = response.status_text().to_string();
    let detail = response
        .into_string()
        .ok()
        .and_then(|body| serde_json::from_str::<ErrorBody>(&body).ok())
        .map(|body| body.error);

    match detail {
        Some(detail) => format!("Log request failed with status {status}: {detail}"),
        None => format!("Log request failed with status {status} {status_text}"),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Deserialize)]
struct WirePage {
    logs: Option<Vec<WireRecord>>,
    bookmark: Option<String>,
    #[serde(rename = "hasNextPage")]
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct WireRecord {
    #[serde(rename = "ID", default)]
    id: Option<u64>,
    timestamp: DateTime<Utc>,
    content: String,
    is_valid: bool,
    source: String,
}

impl From<WireRecord> for LogRecord {
    fn from(wire: WireRecord) -> Self {
        LogRecord {
            id: wire.id,
            timestamp: wire.timestamp,
            content: wire.content,
            is_valid: wire.is_valid,
            source: wire.source,
        }
    }
}

fn parse_page(body: &str) -> Result<Page, FetchFailed> {
    let wire: WirePage = serde_json::from_str(body)
        .map_err(|e| FetchFailed::malformed(format!("Malformed log response: {e}")))?;

    let next_cursor = Cursor::from_bookmark(wire.bookmark);
    if wire.has_next_page && next_cursor.is_none() {
        tracing::warn!("Gateway reported more pages without a bookmark; treating as last page");
    }

    Ok(Page::new(
        wire.logs
            .unwrap_or_default()
            .into_iter()
            .map(LogRecord::from)
            .collect(),
        next_cursor,
        wire.has_next_page,
    ))
}
