//! Sync engine integration tests
//!
//! Runs sales pushes and catalog pulls against the in-process mock remote
//! and an in-memory store.

mod common;

use assert_matches::assert_matches;
use common::{catalog, catalog_item, memory_store, sale_of, MockRemote};
use pos_offline::client::error::SyncError;
use pos_offline::client::sync::{SyncEngine, SyncIssue};
use pretty_assertions::assert_eq;
use std::sync::{Arc, Mutex};

fn engine(store: &Arc<pos_offline::client::LocalDatabase>, remote: &Arc<MockRemote>, page_size: u32) -> SyncEngine {
    SyncEngine::new(Arc::clone(store), remote.clone(), page_size)
}

#[tokio::test]
async fn test_all_pending_sales_synchronized() {
    let store = memory_store().await;
    let remote = Arc::new(MockRemote::new());
    for product in 1..=3 {
        store.enqueue_pending_sale(&sale_of(product)).await.unwrap();
    }

    let report = engine(&store, &remote, 100).sync_pending_sales().await.unwrap();

    assert_eq!(report.pending_before, 3);
    assert_eq!(report.synchronized_count, 3);
    assert!(report.success() && report.fully_synced());
    assert_eq!(store.count_pending_sales().await.unwrap(), 0);
    assert_eq!(remote.submitted_products(), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_failed_sale_stays_pending_without_blocking_others() {
    let store = memory_store().await;
    let remote = Arc::new(MockRemote::new());
    let mut ids = Vec::new();
    for product in 1..=4 {
        ids.push(store.enqueue_pending_sale(&sale_of(product)).await.unwrap());
    }
    remote.reject_product(2);

    let report = engine(&store, &remote, 100).sync_pending_sales().await.unwrap();

    assert_eq!(report.synchronized_count, 3);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].sale_id, ids[1]);
    assert!(report.success());
    assert!(!report.fully_synced());

    assert_eq!(remote.submitted_products(), vec![1, 3, 4]);
    let still_pending = store.list_pending_sales().await.unwrap();
    assert_eq!(still_pending.iter().map(|s| s.id).collect::<Vec<_>>(), vec![ids[1]]);

    // Retried on the next pass
    remote.accept_all();
    let retry = engine(&store, &remote, 100).sync_pending_sales().await.unwrap();
    assert_eq!(retry.synchronized_count, 1);
    assert_eq!(store.count_pending_sales().await.unwrap(), 0);
}

#[tokio::test]
async fn test_no_sale_accepted_is_not_success() {
    let store = memory_store().await;
    let remote = Arc::new(MockRemote::new());
    store.enqueue_pending_sale(&sale_of(9)).await.unwrap();
    remote.reject_product(9);

    let report = engine(&store, &remote, 100).sync_pending_sales().await.unwrap();
    assert!(!report.success());
    assert_eq!(store.count_pending_sales().await.unwrap(), 1);
}

#[tokio::test]
async fn test_submission_carries_audit_note() {
    let store = memory_store().await;
    let remote = Arc::new(MockRemote::new());
    let id = store.enqueue_pending_sale(&sale_of(5)).await.unwrap();

    engine(&store, &remote, 100).sync_pending_sales().await.unwrap();

    let submitted = remote.submitted();
    let note = submitted[0].notes.as_deref().unwrap();
    assert!(note.contains(&format!("#{}", id)), "note was {:?}", note);
}

#[tokio::test]
async fn test_catalog_paginates_with_progress() {
    let store = memory_store().await;
    let remote = Arc::new(MockRemote::with_catalog(catalog(250)));
    let seen = Mutex::new(Vec::new());
    let record = |so_far: usize, total: u64| seen.lock().unwrap().push((so_far, total));

    let report = engine(&store, &remote, 100).sync_catalog(Some(&record)).await.unwrap();

    assert_eq!(report.downloaded, 250);
    assert_eq!(report.pages, 3);
    assert!(report.replaced);
    assert_eq!(*seen.lock().unwrap(), vec![(100, 250), (200, 250), (250, 250)]);
    assert_eq!(remote.page_requests(), vec![(0, 100), (100, 100), (200, 100)]);
    assert_eq!(store.count_catalog_items().await.unwrap(), 250);
}

#[tokio::test]
async fn test_catalog_error_keeps_previous_cache() {
    let store = memory_store().await;
    store.replace_catalog(&catalog(50)).await.unwrap();

    let remote = Arc::new(MockRemote::with_catalog(catalog(250)));
    remote.fail_catalog_from(100);

    let result = engine(&store, &remote, 100).sync_catalog(None).await;

    assert_matches!(result, Err(SyncError::Remote(_)));
    assert_eq!(store.get_all_catalog_items().await.unwrap(), catalog(50));
}

#[tokio::test]
async fn test_empty_download_keeps_cache() {
    let store = memory_store().await;
    store.replace_catalog(&catalog(3)).await.unwrap();
    let remote = Arc::new(MockRemote::new());

    let report = engine(&store, &remote, 100).sync_catalog(None).await.unwrap();

    assert!(!report.replaced);
    assert_eq!(report.pages, 1);
    assert_eq!(store.count_catalog_items().await.unwrap(), 3);
}

#[tokio::test]
async fn test_has_more_is_authoritative_over_total() {
    let store = memory_store().await;
    let remote = Arc::new(MockRemote::with_catalog(catalog(120)));
    remote.set_reported_total(Some(500));

    let report = engine(&store, &remote, 100).sync_catalog(None).await.unwrap();

    assert_eq!(report.downloaded, 120);
    assert_eq!(report.reported_total, Some(500));
    assert_eq!(report.pages, 2);
    assert_eq!(store.count_catalog_items().await.unwrap(), 120);
}

#[tokio::test]
async fn test_no_progress_without_total() {
    let store = memory_store().await;
    let remote = Arc::new(MockRemote::with_catalog(catalog(30)));
    remote.set_reported_total(None);
    let calls = Mutex::new(0usize);
    let record = |_: usize, _: u64| *calls.lock().unwrap() += 1;

    let report = engine(&store, &remote, 10).sync_catalog(Some(&record)).await.unwrap();

    assert_eq!(report.downloaded, 30);
    assert_eq!(*calls.lock().unwrap(), 0);
}

#[tokio::test]
async fn test_full_sync_collects_issues() {
    let store = memory_store().await;
    let remote = Arc::new(MockRemote::with_catalog(vec![catalog_item(1), catalog_item(2)]));
    store.enqueue_pending_sale(&sale_of(1)).await.unwrap();
    store.enqueue_pending_sale(&sale_of(2)).await.unwrap();
    remote.reject_product(2);
    remote.fail_catalog_from(0);

    let report = engine(&store, &remote, 100).full_sync().await;

    assert_eq!(report.synced_count(), 1);
    assert_eq!(report.issues.len(), 2);
    assert_matches!(report.issues[0], SyncIssue::Sale(_));
    assert_matches!(report.issues[1], SyncIssue::Catalog(_));
    assert!(report.success());
    assert!(!report.fully_synced());
}
