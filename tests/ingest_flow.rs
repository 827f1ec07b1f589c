//! End-to-end ingestion tests against the capturing store.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use pricefeed::{
    FieldValue, IngestWorker, MemoryStore, PointBuilder, ProductObservation, SystemMetricsEmitter,
    SystemStatusSnapshot,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

fn builder() -> PointBuilder {
    PointBuilder::new("products", "system", "pricefeed")
}

fn observation(price: i64, prev: i64) -> ProductObservation {
    ProductObservation::new("8421", "Test Product", price)
        .with_store("Test Store")
        .with_location("Test Location")
        .with_department("Test Department")
        .with_previous_price(prev)
        .with_weight(1000)
        .with_timestamp(Utc.with_ymd_and_hms(2026, 7, 1, 9, 30, 0).unwrap())
}

#[tokio::test]
async fn price_sequence_flows_through_worker_in_order() {
    let store = Arc::new(MemoryStore::new());
    let worker = IngestWorker::new(builder(), Arc::clone(&store));
    let (tx, rx) = mpsc::channel(16);

    // First sighting, then a 1c rise, then a 2c drop.
    for (price, prev) in [(100, 0), (101, 100), (99, 101)] {
        tx.send(observation(price, prev)).await.unwrap();
    }
    drop(tx);

    worker.run(rx, CancellationToken::new()).await.unwrap();

    let points = store.submitted();
    assert_eq!(points.len(), 3);

    for point in &points {
        assert_eq!(point.measurement, "products");
        assert_eq!(point.tags["id"], "8421");
        assert_eq!(point.tags["store"], "Test Store");
        assert_eq!(point.fields["grams"], FieldValue::Integer(1000));
    }

    assert_eq!(points[0].fields["cents"], FieldValue::Integer(100));
    assert!(!points[0].fields.contains_key("cents_change"));

    assert_eq!(points[1].fields["cents"], FieldValue::Integer(101));
    assert_eq!(points[1].fields["cents_change"], FieldValue::Integer(1));

    assert_eq!(points[2].fields["cents"], FieldValue::Integer(99));
    assert_eq!(points[2].fields["cents_change"], FieldValue::Integer(-2));
}

#[tokio::test]
async fn nothing_left_unflushed_after_stream_close() {
    let store = Arc::new(MemoryStore::new());
    let worker = IngestWorker::new(builder(), Arc::clone(&store));
    let (tx, rx) = mpsc::channel(16);

    for i in 0..25 {
        tx.send(observation(100 + i, 0)).await.unwrap();
    }
    drop(tx);

    worker.run(rx, CancellationToken::new()).await.unwrap();

    assert_eq!(store.submitted().len(), 25);
    assert_eq!(store.unflushed(), 0);
}

#[tokio::test]
async fn worker_and_emitter_share_one_store() {
    let store = Arc::new(MemoryStore::new());
    let worker = IngestWorker::new(builder(), Arc::clone(&store));
    let emitter = SystemMetricsEmitter::new(builder(), Arc::clone(&store));
    let (tx, rx) = mpsc::channel(16);

    let worker_task = tokio::spawn(worker.run(rx, CancellationToken::new()));

    // Product stream and direct telemetry are independent channels; both
    // must land without external locking.
    for (price, prev) in [(100, 0), (101, 100)] {
        tx.send(observation(price, prev)).await.unwrap();
    }
    let snapshot = SystemStatusSnapshot {
        ram_utilisation_percent: 50.0,
        products_per_second: 2.0,
        hdd_bytes_free: 1 << 30,
        total_product_count: 1,
    };
    emitter.emit_status(&snapshot).await.unwrap();
    emitter.emit_metric("scrape_errors", 0i64).await.unwrap();

    drop(tx);
    worker_task.await.unwrap().unwrap();

    let points = store.submitted();
    assert_eq!(points.len(), 4);

    // Stream ordering holds among product points regardless of interleaved
    // telemetry.
    let product_cents: Vec<_> = points
        .iter()
        .filter(|p| p.measurement == "products")
        .map(|p| p.fields["cents"].clone())
        .collect();
    assert_eq!(
        product_cents,
        vec![FieldValue::Integer(100), FieldValue::Integer(101)]
    );

    let system_points: Vec<_> = points
        .iter()
        .filter(|p| p.measurement == "system")
        .collect();
    assert_eq!(system_points.len(), 2);
    assert!(system_points
        .iter()
        .any(|p| p.tags.get("service").map(String::as_str) == Some("pricefeed")));
}

#[tokio::test]
async fn cancellation_flushes_before_returning() {
    let store = Arc::new(MemoryStore::new());
    let worker = IngestWorker::new(builder(), Arc::clone(&store));
    let (tx, rx) = mpsc::channel(16);
    let cancel = CancellationToken::new();

    tx.send(observation(100, 0)).await.unwrap();
    let worker_task = tokio::spawn(worker.run(rx, cancel.clone()));

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    cancel.cancel();
    worker_task.await.unwrap().unwrap();

    assert_eq!(store.submitted().len(), 1);
    assert_eq!(store.unflushed(), 0);

    // The worker stopped reading even though the producer side is alive.
    drop(tx);
}
