use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single log line as verified and returned by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub timestamp: DateTime<Utc>,
    pub content: String,
    /// Whether the stored line still matches the hash anchored on the ledger
    pub is_valid: bool,
    pub source: String,
}

impl LogRecord {
    pub fn new(
        timestamp: DateTime<Utc>,
        content: impl Into<String>,
        is_valid: bool,
        source: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            timestamp,
            content: content.into(),
            is_valid,
            source: source.into(),
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }
}
