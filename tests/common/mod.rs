#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use logdash::fetch::{FetchFailed, PageFetcher, PageRequest};
use logdash::logs::{LogRecord, Page};
use logdash::paging::{PageCache, PaginationController};
use logdash::types::{Cursor, PageSize};
use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, watch};

/// One scripted answer, optionally held back until the test releases it
struct Reply {
    result: Result<Page, FetchFailed>,
    gate: Option<oneshot::Receiver<()>>,
}

/// Page fetcher that answers from a script and records every request
#[derive(Clone)]
pub struct ScriptedFetcher {
    script: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<PageRequest>>>,
    issued: Arc<watch::Sender<usize>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        let (issued, _) = watch::channel(0);
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            issued: Arc::new(issued),
        }
    }

    pub fn reply(&self, result: Result<Page, FetchFailed>) {
        self.script
            .lock()
            .unwrap()
            .push_back(Reply { result, gate: None });
    }

    /// Queue a reply that is only delivered after the returned sender fires
    pub fn reply_gated(&self, result: Result<Page, FetchFailed>) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        self.script.lock().unwrap().push_back(Reply {
            result,
            gate: Some(gate),
        });
        release
    }

    pub fn requests(&self) -> Vec<PageRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Wait until at least `count` requests have been issued
    pub async fn wait_for_requests(&self, count: usize) {
        let mut rx = self.issued.subscribe();
        rx.wait_for(|issued| *issued >= count).await.unwrap();
    }
}

impl PageFetcher for ScriptedFetcher {
    fn fetch_page(
        &self,
        request: PageRequest,
    ) -> impl Future<Output = Result<Page, FetchFailed>> + Send {
        self.requests.lock().unwrap().push(request);
        self.issued.send_modify(|issued| *issued += 1);
        let reply = self.script.lock().unwrap().pop_front();

        async move {
            let Some(reply) = reply else {
                return Err(FetchFailed::transport("script exhausted"));
            };
            if let Some(gate) = reply.gate {
                let _ = gate.await;
            }
            reply.result
        }
    }
}

pub fn record(content: &str) -> LogRecord {
    LogRecord::new(
        Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap(),
        content,
        true,
        "gateway-client",
    )
}

pub fn page(contents: &[&str], next: Option<&str>, has_more: bool) -> Page {
    Page::new(
        contents.iter().map(|c| record(c)).collect(),
        next.map(Cursor::from),
        has_more,
    )
}

pub fn contents(records: &[LogRecord]) -> Vec<String> {
    records.iter().map(|r| r.content.clone()).collect()
}

pub fn controller(fetcher: &ScriptedFetcher) -> PaginationController<ScriptedFetcher> {
    PaginationController::new(fetcher.clone(), PageSize::DEFAULT, PageCache::new())
}
