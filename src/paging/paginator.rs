use thiserror::Error;

use crate::fetch::{FetchFailed, PageRequest};
use crate::logs::{FilterIdentity, PagedSequence};
use crate::paging::InvalidCursorUsage;
use crate::types::{Cursor, PageSize};

/// Where a paginator is in its fetch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaginatorState {
    /// Created, first page not requested yet
    Fresh,
    Idle,
    Loading,
    Errored,
}

/// Why a paging operation was refused. Refusals are no-ops, not failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("a page is already loading")]
    AlreadyLoading,
    #[error("all pages have been loaded")]
    Exhausted,
    #[error("the first page has not been requested yet")]
    NotStarted,
    #[error("already started")]
    AlreadyStarted,
    #[error("the last fetch failed; retry it first")]
    FetchPending,
    #[error("there is no failed fetch to retry")]
    NothingToRetry,
}

/// Sequential page fetching for one filter identity.
///
/// The paginator only hands out [`PageRequest`]s and records their
/// outcome; the caller performs the fetch. At most one request is
/// outstanding at a time.
#[derive(Debug, Clone)]
pub struct CursorPaginator {
    identity: FilterIdentity,
    page_size: PageSize,
    state: PaginatorState,
    next_cursor: Option<Cursor>,
    exhausted: bool,
    /// Request currently loading, or the one that failed while errored
    pending: Option<PageRequest>,
    error: Option<FetchFailed>,
}

impl CursorPaginator {
    pub fn new(identity: FilterIdentity, page_size: PageSize) -> Self {
        Self {
            identity,
            page_size,
            state: PaginatorState::Fresh,
            next_cursor: None,
            exhausted: false,
            pending: None,
            error: None,
        }
    }

    /// Pick up where an already fetched sequence left off
    pub fn resume(identity: FilterIdentity, page_size: PageSize, sequence: &PagedSequence) -> Self {
        if !sequence.is_started() {
            return Self::new(identity, page_size);
        }
        Self {
            identity,
            page_size,
            state: PaginatorState::Idle,
            next_cursor: sequence.next_cursor().cloned(),
            exhausted: !sequence.has_more(),
            pending: None,
            error: None,
        }
    }

    pub fn identity(&self) -> &FilterIdentity {
        &self.identity
    }

    pub fn state(&self) -> PaginatorState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == PaginatorState::Loading
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn error(&self) -> Option<&FetchFailed> {
        self.error.as_ref()
    }

    pub fn next_cursor(&self) -> Option<&Cursor> {
        self.next_cursor.as_ref()
    }

    /// Request the first page
    pub fn start(&mut self) -> Result<PageRequest, Rejection> {
        match self.state {
            PaginatorState::Fresh => Ok(self.issue(None)),
            PaginatorState::Loading => Err(Rejection::AlreadyLoading),
            _ => Err(Rejection::AlreadyStarted),
        }
    }

    /// Request the page after the last loaded one
    pub fn load_more(&mut self) -> Result<PageRequest, Rejection> {
        match self.state {
            PaginatorState::Fresh => Err(Rejection::NotStarted),
            PaginatorState::Loading => Err(Rejection::AlreadyLoading),
            PaginatorState::Errored => Err(Rejection::FetchPending),
            PaginatorState::Idle if self.exhausted => Err(Rejection::Exhausted),
            PaginatorState::Idle => Ok(self.issue(self.next_cursor.clone())),
        }
    }

    /// Re-issue the request that failed, with the same cursor
    pub fn retry(&mut self) -> Result<PageRequest, Rejection> {
        match (self.state, self.pending.clone()) {
            (PaginatorState::Errored, Some(request)) => {
                self.state = PaginatorState::Loading;
                self.pending = Some(request.clone());
                Ok(request)
            }
            (PaginatorState::Loading, _) => Err(Rejection::AlreadyLoading),
            _ => Err(Rejection::NothingToRetry),
        }
    }

    /// Record a successful fetch of `request`
    pub fn complete(
        &mut self,
        request: &PageRequest,
        next_cursor: Option<Cursor>,
        has_more: bool,
    ) -> Result<(), InvalidCursorUsage> {
        self.check_pending(request)?;
        self.exhausted = !has_more || next_cursor.is_none();
        self.next_cursor = next_cursor.filter(|_| !self.exhausted);
        self.state = PaginatorState::Idle;
        self.pending = None;
        self.error = None;
        Ok(())
    }

    /// Record a failed fetch of `request`. Earlier pages and the cursor are
    /// kept so [`retry`](Self::retry) resumes from the same point.
    pub fn fail(
        &mut self,
        request: &PageRequest,
        error: FetchFailed,
    ) -> Result<(), InvalidCursorUsage> {
        self.check_pending(request)?;
        self.state = PaginatorState::Errored;
        self.error = Some(error);
        Ok(())
    }

    fn issue(&mut self, cursor: Option<Cursor>) -> PageRequest {
        let request = PageRequest::new(self.identity.clone(), cursor, self.page_size);
        self.state = PaginatorState::Loading;
        self.pending = Some(request.clone());
        request
    }

    fn check_pending(&self, request: &PageRequest) -> Result<(), InvalidCursorUsage> {
        if self.state == PaginatorState::Loading && self.pending.as_ref() == Some(request) {
            return Ok(());
        }
        Err(InvalidCursorUsage::new(
            &self.identity,
            format!(
                "completed {request} but the outstanding request is {}",
                self.pending
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "none".to_string())
            ),
        ))
    }
}
