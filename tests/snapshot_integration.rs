//! Integration tests for the snapshot service
//!
//! End-to-end over the in-memory store: recorded visits flow into the
//! snapshot, and degraded storage states (absent, corrupt) render as the
//! placeholder snapshot rather than an error.

use std::sync::Arc;

use warp_analytics::analytics::{
    FixedGeoResolver, SnapshotService, VisitRecorder, STORAGE_KEY,
};
use warp_analytics::store::{KeyValueStore, MemoryStore};

fn recorder_with(store: Arc<dyn KeyValueStore>, country: &str, city: &str) -> VisitRecorder {
    VisitRecorder::new(
        store,
        Arc::new(FixedGeoResolver::new(country, city)),
        Arc::new(FixedGeoResolver::new(country, city)),
    )
}

#[tokio::test]
async fn empty_store_yields_placeholder_snapshot() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let snap = SnapshotService::new(store).snapshot().await;

    assert_eq!(snap.today.visits, 0);
    assert_eq!(snap.week.visits, 0);
    assert_eq!(snap.month.visits, 0);
    assert_eq!(snap.today.unique_visitors, 0);

    assert_eq!(snap.top_pages.len(), 1);
    assert_eq!(snap.top_pages[0].page, "/");
    assert_eq!(snap.top_pages[0].views, 0);

    assert_eq!(snap.top_countries.len(), 1);
    assert_eq!(snap.top_countries[0].country, "FR");
    assert_eq!(snap.top_countries[0].visits, 0);
    assert_eq!(snap.top_countries[0].percent, 0.0);

    assert!(snap.recent_users.is_empty());
}

#[tokio::test]
async fn corrupt_store_yields_placeholder_snapshot() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    store.put(STORAGE_KEY, "not a log").await.unwrap();

    let snap = SnapshotService::new(store).snapshot().await;
    assert_eq!(snap.month.visits, 0);
    assert_eq!(snap.top_pages[0].page, "/");
}

#[tokio::test]
async fn recorded_visits_flow_into_the_snapshot() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());

    let fr = recorder_with(Arc::clone(&store), "FR", "Paris");
    for _ in 0..3 {
        fr.record_visit("/tools/bmi").await;
    }
    let us = recorder_with(Arc::clone(&store), "US", "Chicago");
    us.record_visit("/").await;

    let snap = SnapshotService::new(Arc::clone(&store)).snapshot().await;

    // All four visits land in every window (they just happened)
    assert_eq!(snap.today.visits, 4);
    assert_eq!(snap.week.visits, 4);
    assert_eq!(snap.month.visits, 4);
    assert_eq!(snap.month.page_views, 4);

    // Two distinct (country, city) pairs in the same half-hour bucket
    assert_eq!(snap.month.unique_visitors, 2);

    assert_eq!(snap.top_pages[0].page, "/tools/bmi");
    assert_eq!(snap.top_pages[0].views, 3);
    assert_eq!(snap.top_pages[1].page, "/");
    assert_eq!(snap.top_pages[1].views, 1);

    assert_eq!(snap.top_countries[0].country, "FR");
    assert_eq!(snap.top_countries[0].visits, 3);
    assert_eq!(snap.top_countries[0].percent, 75.0);
    assert_eq!(snap.top_countries[1].country, "US");
    assert_eq!(snap.top_countries[1].percent, 25.0);

    // Most recent first, ids from 1
    assert_eq!(snap.recent_users.len(), 4);
    assert_eq!(snap.recent_users[0].id, 1);
    assert_eq!(snap.recent_users[0].country, "US");
    assert_eq!(snap.recent_users[3].country, "FR");
}

#[tokio::test]
async fn snapshot_does_not_mutate_the_stored_log() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    recorder_with(Arc::clone(&store), "FR", "Paris")
        .record_visit("/")
        .await;

    let before = store.get(STORAGE_KEY).await.unwrap();
    let _ = SnapshotService::new(Arc::clone(&store)).snapshot().await;
    let after = store.get(STORAGE_KEY).await.unwrap();

    assert_eq!(before, after);
}

#[tokio::test]
async fn repeated_snapshots_are_identical() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    recorder_with(Arc::clone(&store), "DE", "Berlin")
        .record_visit("/tools/hash")
        .await;

    let service = SnapshotService::new(store);
    let first = service.snapshot().await;
    let second = service.snapshot().await;
    assert_eq!(first, second);
}
