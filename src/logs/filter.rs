use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Search criteria applied to the log table.
///
/// Fields are normalized on the way in: an empty query is the same as no
/// query, and time bounds are stored as UTC instants. Derived equality is
/// therefore semantic equality.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    query: Option<String>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the free-text query. The text is kept exactly as given.
    pub fn with_query(mut self, query: Option<impl Into<String>>) -> Self {
        self.query = query.map(Into::into).filter(|q| !q.is_empty());
        self
    }

    /// Set the lower time bound. Any timezone is accepted.
    pub fn with_start<Tz: chrono::TimeZone>(mut self, start: Option<DateTime<Tz>>) -> Self {
        self.start = start.map(|t| t.with_timezone(&Utc));
        self
    }

    /// Set the upper time bound. Any timezone is accepted.
    pub fn with_end<Tz: chrono::TimeZone>(mut self, end: Option<DateTime<Tz>>) -> Self {
        self.end = end.map(|t| t.with_timezone(&Utc));
        self
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// Check if no constraint is set
    pub fn is_empty(&self) -> bool {
        self.query.is_none() && self.start.is_none() && self.end.is_none()
    }

    /// Compute the cache identity of this filter set
    pub fn identity(&self) -> FilterIdentity {
        derive_identity(self)
    }
}

impl fmt::Display for FilterSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(no filters)");
        }
        let mut parts = Vec::new();
        if let Some(query) = &self.query {
            parts.push(format!("query={query:?}"));
        }
        if let Some(start) = self.start {
            parts.push(format!("from={}", format_instant(start)));
        }
        if let Some(end) = self.end {
            parts.push(format!("to={}", format_instant(end)));
        }
        write!(f, "{}", parts.join(" "))
    }
}

/// Stable cache key for a normalized filter set.
///
/// Equality and hashing only look at the canonical key; the filter values
/// travel along so the fetch boundary can build the request from the
/// identity alone.
#[derive(Debug, Clone)]
pub struct FilterIdentity {
    key: String,
    filters: FilterSet,
}

impl FilterIdentity {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }
}

impl PartialEq for FilterIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for FilterIdentity {}

impl Hash for FilterIdentity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for FilterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// Derive the cache identity of a filter set.
///
/// The key lists the fields in a fixed order with every value rendered as
/// an escaped string literal, so it is injective over normalized filter
/// sets: any difference in the query text or in the instants produces a
/// different key.
pub fn derive_identity(filters: &FilterSet) -> FilterIdentity {
    let key = format!(
        "query={:?};start={:?};end={:?}",
        filters.query.as_deref(),
        filters.start.map(canonical_instant),
        filters.end.map(canonical_instant),
    );

    FilterIdentity {
        key,
        filters: filters.clone(),
    }
}

fn canonical_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Format an instant the way the gateway expects it (`2024-01-15T12:00:00.000Z`)
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a user-supplied instant: RFC 3339 with an offset, or a bare
/// `YYYY-MM-DD` date meaning midnight UTC.
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let input = input.trim();
    match DateTime::parse_from_rfc3339(input) {
        Ok(instant) => Ok(instant.with_timezone(&Utc)),
        Err(rfc_err) => match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
            Ok(date) => Ok(date.and_time(chrono::NaiveTime::MIN).and_utc()),
            Err(_) => Err(rfc_err),
        },
    }
}
