use std::sync::Arc;
use tokio::sync::{RwLock, watch};

use crate::config::PagingConfig;
use crate::fetch::{FetchFailed, PageFetcher, PageRequest};
use crate::logs::{FilterIdentity, FilterSet, LogRecord, Page};
use crate::paging::{CursorPaginator, InvalidCursorUsage, PageCache, PaginatorState, Rejection};
use crate::types::PageSize;

/// What the log table renders: state of the active filter identity only
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub filters: FilterSet,
    pub records: Vec<LogRecord>,
    pub is_loading: bool,
    pub is_exhausted: bool,
    pub error: Option<ErrorInfo>,
}

/// A failed fetch as shown to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
    pub retryable: bool,
}

impl From<&FetchFailed> for ErrorInfo {
    fn from(error: &FetchFailed) -> Self {
        Self {
            message: error.message.clone(),
            retryable: true,
        }
    }
}

/// Result of a `load_more` or `retry` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page was appended to the sequence of `filters`; `records` holds
    /// only the rows of that page
    Loaded {
        filters: FilterSet,
        records: Vec<LogRecord>,
        exhausted: bool,
    },
    /// The fetch failed; the error is now part of the view
    Failed(FetchFailed),
    /// The filters changed while the fetch was in flight; its result was
    /// dropped
    Discarded,
    /// The call was refused and nothing was fetched
    Rejected(Rejection),
}

/// A fetch handed out under one generation of the controller
#[derive(Debug)]
struct PendingFetch {
    generation: u64,
    request: PageRequest,
}

#[derive(Debug)]
struct ControllerState {
    /// Bumped whenever the active sequence is replaced
    generation: u64,
    paginator: CursorPaginator,
    cache: PageCache,
    page_size: PageSize,
}

impl ControllerState {
    fn begin_load(&mut self) -> Result<PendingFetch, Rejection> {
        let request = match self.paginator.state() {
            PaginatorState::Fresh => self.paginator.start()?,
            _ => self.paginator.load_more()?,
        };
        Ok(self.pending(request))
    }

    fn begin_retry(&mut self) -> Result<PendingFetch, Rejection> {
        let request = self.paginator.retry()?;
        Ok(self.pending(request))
    }

    fn pending(&self, request: PageRequest) -> PendingFetch {
        tracing::debug!("Fetching {request}");
        PendingFetch {
            generation: self.generation,
            request,
        }
    }

    fn finish(
        &mut self,
        fetch: PendingFetch,
        result: Result<Page, FetchFailed>,
    ) -> Result<LoadOutcome, InvalidCursorUsage> {
        if fetch.generation != self.generation {
            tracing::debug!("Discarding stale result for {}", fetch.request);
            return Ok(LoadOutcome::Discarded);
        }

        let request = &fetch.request;
        match result {
            Ok(page) => {
                let records = page.records.clone();
                let next_cursor = page.next_cursor.clone();
                let has_more = page.has_more;

                self.cache
                    .append_page(&request.identity, request.cursor.as_ref(), page)?;
                self.paginator.complete(request, next_cursor, has_more)?;

                let exhausted = self.paginator.is_exhausted();
                tracing::info!(
                    "Loaded {} records for {} (exhausted={exhausted})",
                    records.len(),
                    request.identity.filters()
                );
                Ok(LoadOutcome::Loaded {
                    filters: request.identity.filters().clone(),
                    records,
                    exhausted,
                })
            }
            Err(error) => {
                tracing::warn!("Fetching {request} failed: {error}");
                self.paginator.fail(request, error.clone())?;
                Ok(LoadOutcome::Failed(error))
            }
        }
    }

    /// Replace the active paginator, resuming from the cache when the
    /// identity is still retained there
    fn replace(&mut self, identity: FilterIdentity) {
        self.generation += 1;
        self.cache.activate(&identity);
        self.paginator = match self.cache.get(&identity) {
            Some(sequence) => CursorPaginator::resume(identity, self.page_size, sequence),
            None => CursorPaginator::new(identity, self.page_size),
        };
    }

    fn view(&self) -> View {
        let identity = self.paginator.identity();
        View {
            filters: identity.filters().clone(),
            records: self
                .cache
                .get(identity)
                .map(|sequence| sequence.records().to_vec())
                .unwrap_or_default(),
            is_loading: self.paginator.is_loading(),
            is_exhausted: self.paginator.is_exhausted(),
            error: self.paginator.error().map(ErrorInfo::from),
        }
    }
}

/// Drives filter-scoped pagination for the log table.
///
/// This is the only type the UI talks to. It owns one [`CursorPaginator`]
/// for the active filter identity and a [`PageCache`] holding what has been
/// fetched so far.
///
/// Cloning yields another handle to the same state, so a fetch can be
/// awaited on one task while another applies new filters. A fetch that
/// resolves after its filters were replaced never reaches the view.
pub struct PaginationController<F> {
    fetcher: Arc<F>,
    state: Arc<RwLock<ControllerState>>,
    generation_tx: Arc<watch::Sender<u64>>,
}

impl<F> Clone for PaginationController<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
            state: Arc::clone(&self.state),
            generation_tx: Arc::clone(&self.generation_tx),
        }
    }
}

impl<F: PageFetcher> PaginationController<F> {
    /// Create a controller with no filters applied and nothing fetched
    pub fn new(fetcher: F, page_size: PageSize, cache: PageCache) -> Self {
        let identity = FilterSet::new().identity();
        let mut cache = cache;
        cache.activate(&identity);
        let paginator = match cache.get(&identity) {
            Some(sequence) => CursorPaginator::resume(identity, page_size, sequence),
            None => CursorPaginator::new(identity, page_size),
        };

        let (generation_tx, _) = watch::channel(0);
        Self {
            fetcher: Arc::new(fetcher),
            state: Arc::new(RwLock::new(ControllerState {
                generation: 0,
                paginator,
                cache,
                page_size,
            })),
            generation_tx: Arc::new(generation_tx),
        }
    }

    pub fn from_config(fetcher: F, config: &PagingConfig) -> Self {
        Self::new(
            fetcher,
            config.page_size,
            PageCache::with_capacity(config.cache_identities),
        )
    }

    /// Make `filters` the active filter set.
    ///
    /// Returns `false` and changes nothing when the filters are semantically
    /// equal to the active ones. Otherwise any in-flight fetch is abandoned
    /// and the new sequence starts empty, unless the cache still holds it.
    pub async fn apply_filters(&self, filters: FilterSet) -> bool {
        let identity = filters.identity();
        let mut state = self.state.write().await;
        if state.paginator.identity() == &identity {
            tracing::debug!("Filters unchanged: {filters}");
            return false;
        }

        tracing::info!("Applying filters: {filters}");
        state.replace(identity);
        self.generation_tx.send_replace(state.generation);
        true
    }

    /// Drop everything fetched for the active filters and start over
    pub async fn refresh(&self) {
        let mut state = self.state.write().await;
        let identity = state.paginator.identity().clone();
        tracing::info!("Refreshing {}", identity.filters());

        state.cache.reset(&identity);
        state.replace(identity);
        self.generation_tx.send_replace(state.generation);
    }

    /// Fetch the next page of the active sequence, or its first page when
    /// nothing has been requested yet
    pub async fn load_more(&self) -> Result<LoadOutcome, InvalidCursorUsage> {
        let fetch = match self.state.write().await.begin_load() {
            Ok(fetch) => fetch,
            Err(rejection) => {
                tracing::debug!("Load more rejected: {rejection}");
                return Ok(LoadOutcome::Rejected(rejection));
            }
        };
        self.run(fetch).await
    }

    /// Re-issue the fetch that failed last
    pub async fn retry(&self) -> Result<LoadOutcome, InvalidCursorUsage> {
        let fetch = match self.state.write().await.begin_retry() {
            Ok(fetch) => fetch,
            Err(rejection) => {
                tracing::debug!("Retry rejected: {rejection}");
                return Ok(LoadOutcome::Rejected(rejection));
            }
        };
        self.run(fetch).await
    }

    pub async fn current_view(&self) -> View {
        self.state.read().await.view()
    }

    pub async fn active_filters(&self) -> FilterSet {
        self.state.read().await.paginator.identity().filters().clone()
    }

    async fn run(&self, fetch: PendingFetch) -> Result<LoadOutcome, InvalidCursorUsage> {
        let mut generation_rx = self.generation_tx.subscribe();
        let generation = fetch.generation;

        // Stop waiting as soon as the sequence is replaced. The request
        // future is dropped, which abandons it where the transport allows.
        let result = tokio::select! {
            result = self.fetcher.fetch_page(fetch.request.clone()) => Some(result),
            _ = generation_rx.wait_for(|current| *current != generation) => None,
        };

        let mut state = self.state.write().await;
        match result {
            Some(result) => state.finish(fetch, result),
            None => {
                tracing::debug!("Abandoned superseded fetch {}", fetch.request);
                Ok(LoadOutcome::Discarded)
            }
        }
    }
}
