mod common;

use common::{ScriptedFetcher, contents, controller, page};
use logdash::fetch::FetchFailed;
use logdash::logs::FilterSet;
use logdash::paging::{LoadOutcome, PageCache, PaginationController, Rejection};
use logdash::types::{Cursor, PageSize};

fn query(text: &str) -> FilterSet {
    FilterSet::new().with_query(Some(text))
}

#[tokio::test]
async fn test_pages_concatenate_in_server_order() {
    let fetcher = ScriptedFetcher::new();
    fetcher.reply(Ok(page(&["a", "b"], Some("b1"), true)));
    fetcher.reply(Ok(page(&["c", "d"], Some("b2"), true)));
    let controller = controller(&fetcher);

    controller.load_more().await.unwrap();
    controller.load_more().await.unwrap();

    let view = controller.current_view().await;
    assert_eq!(contents(&view.records), vec!["a", "b", "c", "d"]);
    assert!(!view.is_exhausted);
    assert!(!view.is_loading);
}

#[tokio::test]
async fn test_end_to_end_query_pagination() {
    let fetcher = ScriptedFetcher::new();
    fetcher.reply(Ok(page(&["e1", "e2"], Some("b1"), true)));
    fetcher.reply(Ok(page(&["e3"], None, false)));
    let controller = controller(&fetcher);

    assert!(controller.apply_filters(query("error")).await);

    match controller.load_more().await.unwrap() {
        LoadOutcome::Loaded {
            filters,
            records,
            exhausted,
        } => {
            assert_eq!(filters, query("error"));
            assert_eq!(contents(&records), vec!["e1", "e2"]);
            assert!(!exhausted);
        }
        other => panic!("expected a loaded page, got {other:?}"),
    }
    match controller.load_more().await.unwrap() {
        LoadOutcome::Loaded {
            records, exhausted, ..
        } => {
            // Only the rows of the page just appended
            assert_eq!(contents(&records), vec!["e3"]);
            assert!(exhausted);
        }
        other => panic!("expected a loaded page, got {other:?}"),
    }

    let requests = fetcher.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].cursor, None);
    assert_eq!(requests[1].cursor, Some(Cursor::from("b1")));
    for request in &requests {
        assert_eq!(request.identity.filters().query(), Some("error"));
    }

    let view = controller.current_view().await;
    assert_eq!(view.records.len(), 3);
    assert!(view.is_exhausted);
    assert_eq!(view.filters, query("error"));
}

#[tokio::test]
async fn test_exhausted_rejects_further_loads() {
    let fetcher = ScriptedFetcher::new();
    fetcher.reply(Ok(page(&["only"], None, false)));
    let controller = controller(&fetcher);

    controller.load_more().await.unwrap();
    for _ in 0..3 {
        assert_eq!(
            controller.load_more().await.unwrap(),
            LoadOutcome::Rejected(Rejection::Exhausted)
        );
    }

    assert_eq!(fetcher.requests().len(), 1);
    assert_eq!(contents(&controller.current_view().await.records), vec!["only"]);
}

#[tokio::test]
async fn test_load_more_while_loading_is_rejected() {
    let fetcher = ScriptedFetcher::new();
    let release = fetcher.reply_gated(Ok(page(&["a"], Some("b1"), true)));
    let controller = controller(&fetcher);

    let background = controller.clone();
    let first = tokio::spawn(async move { background.load_more().await });
    fetcher.wait_for_requests(1).await;

    assert!(controller.current_view().await.is_loading);
    for _ in 0..3 {
        assert_eq!(
            controller.load_more().await.unwrap(),
            LoadOutcome::Rejected(Rejection::AlreadyLoading)
        );
    }
    assert_eq!(fetcher.requests().len(), 1);

    release.send(()).unwrap();
    assert!(matches!(
        first.await.unwrap().unwrap(),
        LoadOutcome::Loaded { ref records, .. } if records.len() == 1
    ));
    assert!(!controller.current_view().await.is_loading);
}

#[tokio::test]
async fn test_new_filters_start_with_empty_view() {
    let fetcher = ScriptedFetcher::new();
    fetcher.reply(Ok(page(&["a", "b"], Some("b1"), true)));
    fetcher.reply(Ok(page(&["c", "d"], Some("b2"), true)));
    let controller = controller(&fetcher);

    controller.load_more().await.unwrap();
    controller.load_more().await.unwrap();
    assert_eq!(controller.current_view().await.records.len(), 4);

    assert!(controller.apply_filters(query("timeout")).await);

    let view = controller.current_view().await;
    assert!(view.records.is_empty());
    assert!(!view.is_exhausted);
    assert!(view.error.is_none());
    assert_eq!(view.filters, query("timeout"));
}

#[tokio::test]
async fn test_first_page_of_new_filters_never_reuses_old_cursor() {
    let fetcher = ScriptedFetcher::new();
    fetcher.reply(Ok(page(&["a"], Some("b1"), true)));
    fetcher.reply(Ok(page(&["x"], Some("x1"), true)));
    let controller = controller(&fetcher);

    controller.load_more().await.unwrap();
    controller.apply_filters(query("timeout")).await;
    controller.load_more().await.unwrap();

    let requests = fetcher.requests();
    assert_eq!(requests[1].cursor, None);
    assert_eq!(requests[1].identity, query("timeout").identity());
    assert_eq!(contents(&controller.current_view().await.records), vec!["x"]);
}

#[tokio::test]
async fn test_same_filters_are_a_no_op() {
    let fetcher = ScriptedFetcher::new();
    fetcher.reply(Ok(page(&["a"], Some("b1"), true)));
    let controller = controller(&fetcher);

    // An empty query is the same as no filters at all
    assert!(!controller.apply_filters(query("")).await);

    controller.apply_filters(query("error")).await;
    controller.load_more().await.unwrap();

    assert!(!controller.apply_filters(query("error")).await);
    let view = controller.current_view().await;
    assert_eq!(contents(&view.records), vec!["a"]);
    assert_eq!(fetcher.requests().len(), 1);
}

#[tokio::test]
async fn test_late_result_after_filter_change_is_discarded() {
    let fetcher = ScriptedFetcher::new();
    let release = fetcher.reply_gated(Ok(page(&["stale-1", "stale-2"], Some("s1"), true)));
    let controller = controller(&fetcher);
    controller.apply_filters(query("error")).await;

    let background = controller.clone();
    let in_flight = tokio::spawn(async move { background.load_more().await });
    fetcher.wait_for_requests(1).await;

    controller.apply_filters(query("timeout")).await;
    // The old request resolves only after the switch
    let _ = release.send(());

    assert_eq!(in_flight.await.unwrap().unwrap(), LoadOutcome::Discarded);

    let view = controller.current_view().await;
    assert_eq!(view.filters, query("timeout"));
    assert!(view.records.is_empty());
    assert!(!view.is_loading);
    assert!(view.error.is_none());
}

#[tokio::test]
async fn test_late_failure_after_filter_change_is_discarded() {
    let fetcher = ScriptedFetcher::new();
    let release = fetcher.reply_gated(Err(FetchFailed::status(500, "boom")));
    fetcher.reply(Ok(page(&["fresh"], None, false)));
    let controller = controller(&fetcher);

    let background = controller.clone();
    let in_flight = tokio::spawn(async move { background.load_more().await });
    fetcher.wait_for_requests(1).await;

    controller.apply_filters(query("timeout")).await;
    let _ = release.send(());
    assert_eq!(in_flight.await.unwrap().unwrap(), LoadOutcome::Discarded);

    controller.load_more().await.unwrap();
    let view = controller.current_view().await;
    assert_eq!(contents(&view.records), vec!["fresh"]);
    assert!(view.error.is_none());
}

#[tokio::test]
async fn test_failure_keeps_records_and_retry_reissues_request() {
    let fetcher = ScriptedFetcher::new();
    fetcher.reply(Ok(page(&["a", "b"], Some("b1"), true)));
    fetcher.reply(Err(FetchFailed::transport("connection refused")));
    fetcher.reply(Ok(page(&["c"], None, false)));
    let controller = controller(&fetcher);
    controller.apply_filters(query("error")).await;

    controller.load_more().await.unwrap();
    let failed = controller.load_more().await.unwrap();
    assert!(matches!(failed, LoadOutcome::Failed(_)));

    let view = controller.current_view().await;
    assert_eq!(contents(&view.records), vec!["a", "b"]);
    let error = view.error.unwrap();
    assert_eq!(error.message, "connection refused");
    assert!(error.retryable);

    // Load more is refused until the failed fetch is retried
    assert_eq!(
        controller.load_more().await.unwrap(),
        LoadOutcome::Rejected(Rejection::FetchPending)
    );

    assert!(matches!(
        controller.retry().await.unwrap(),
        LoadOutcome::Loaded { ref records, exhausted: true, .. } if contents(records) == vec!["c"]
    ));

    let requests = fetcher.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[2], requests[1]);
    assert_eq!(requests[2].cursor, Some(Cursor::from("b1")));

    let view = controller.current_view().await;
    assert!(view.error.is_none());
    assert_eq!(contents(&view.records), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn test_retry_without_failure_is_rejected() {
    let fetcher = ScriptedFetcher::new();
    let controller = controller(&fetcher);
    assert_eq!(
        controller.retry().await.unwrap(),
        LoadOutcome::Rejected(Rejection::NothingToRetry)
    );
    assert!(fetcher.requests().is_empty());
}

#[tokio::test]
async fn test_refresh_reloads_from_first_page() {
    let fetcher = ScriptedFetcher::new();
    fetcher.reply(Ok(page(&["a"], Some("b1"), true)));
    fetcher.reply(Ok(page(&["a2"], Some("c1"), true)));
    let controller = controller(&fetcher);

    controller.load_more().await.unwrap();
    controller.refresh().await;
    assert!(controller.current_view().await.records.is_empty());

    controller.load_more().await.unwrap();
    assert_eq!(fetcher.requests()[1].cursor, None);
    assert_eq!(contents(&controller.current_view().await.records), vec!["a2"]);
}

#[tokio::test]
async fn test_retained_identity_resumes_without_refetching() {
    let fetcher = ScriptedFetcher::new();
    fetcher.reply(Ok(page(&["e1"], Some("e-next"), true)));
    fetcher.reply(Ok(page(&["t1"], None, false)));
    fetcher.reply(Ok(page(&["e2"], None, false)));
    let controller =
        PaginationController::new(fetcher.clone(), PageSize::DEFAULT, PageCache::with_capacity(2));

    controller.apply_filters(query("error")).await;
    controller.load_more().await.unwrap();
    controller.apply_filters(query("timeout")).await;
    controller.load_more().await.unwrap();

    controller.apply_filters(query("error")).await;
    let view = controller.current_view().await;
    assert_eq!(contents(&view.records), vec!["e1"]);
    assert_eq!(fetcher.requests().len(), 2);

    controller.load_more().await.unwrap();
    let requests = fetcher.requests();
    assert_eq!(requests[2].cursor, Some(Cursor::from("e-next")));
    assert_eq!(contents(&controller.current_view().await.records), vec!["e1", "e2"]);
}

#[tokio::test]
async fn test_independent_controllers_share_nothing() {
    let first_fetcher = ScriptedFetcher::new();
    first_fetcher.reply(Ok(page(&["a"], None, false)));
    let second_fetcher = ScriptedFetcher::new();

    let first = controller(&first_fetcher);
    let second = controller(&second_fetcher);

    first.load_more().await.unwrap();
    assert_eq!(first.current_view().await.records.len(), 1);
    assert!(second.current_view().await.records.is_empty());
    assert!(second_fetcher.requests().is_empty());
}
