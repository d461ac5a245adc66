mod cache;
mod controller;
mod paginator;

pub use cache::PageCache;
pub use controller::{ErrorInfo, LoadOutcome, PaginationController, View};
pub use paginator::{CursorPaginator, PaginatorState, Rejection};

use thiserror::Error;

use crate::logs::FilterIdentity;

/// A page was delivered with a cursor its sequence does not expect.
///
/// This is a bug in the caller, never a transient condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid cursor usage for {identity}: {detail}")]
pub struct InvalidCursorUsage {
    pub identity: String,
    pub detail: String,
}

impl InvalidCursorUsage {
    pub(crate) fn new(identity: &FilterIdentity, detail: impl Into<String>) -> Self {
        let error = Self {
            identity: identity.key().to_string(),
            detail: detail.into(),
        };
        tracing::error!("{error}");
        error
    }
}
