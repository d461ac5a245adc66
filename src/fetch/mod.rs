mod http;

pub use http::{HttpFetcher, LOG_PATH, build_agent, query_params};
pub(crate) use http::ErrorBody;

use std::fmt;
use std::future::Future;
use thiserror::Error;

use crate::logs::{FilterIdentity, Page};
use crate::types::{Cursor, PageSize};

/// Everything needed to fetch one page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub identity: FilterIdentity,
    pub cursor: Option<Cursor>,
    pub page_size: PageSize,
}

impl PageRequest {
    pub fn new(identity: FilterIdentity, cursor: Option<Cursor>, page_size: PageSize) -> Self {
        Self {
            identity,
            cursor,
            page_size,
        }
    }

    pub fn is_first_page(&self) -> bool {
        self.cursor.is_none()
    }
}

impl fmt::Display for PageRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (bookmark={}, pageSize={})",
            self.identity.filters(),
            self.cursor.as_ref().map(Cursor::as_str).unwrap_or("-"),
            self.page_size
        )
    }
}

/// Where a fetch went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchFailureKind {
    /// Connection, timeout or I/O failure
    Transport,
    /// The endpoint answered with a non-success status
    Status(u16),
    /// The response body did not have the expected shape
    Malformed,
}

/// The single failure type surfaced by a fetch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FetchFailed {
    pub kind: FetchFailureKind,
    pub message: String,
}

impl FetchFailed {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: FetchFailureKind::Transport,
            message: message.into(),
        }
    }

    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self {
            kind: FetchFailureKind::Status(status),
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self {
            kind: FetchFailureKind::Malformed,
            message: message.into(),
        }
    }
}

/// Performs one page request against the log query endpoint.
///
/// Implementations keep no state between calls. Everything the paging engine
/// learns from the network comes back as a [`Page`] or a [`FetchFailed`].
pub trait PageFetcher: Send + Sync + 'static {
    fn fetch_page(
        &self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Page, FetchFailed>> + Send;
}
