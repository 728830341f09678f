//! Tests for worker acquisition and dispatch

use std::sync::Arc;
use std::time::Duration;

use docroot::fs::{Resolver, ServingRoot};
use docroot::server::{WorkerPool, WorkerStatus};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

fn pool(size: usize) -> (tempfile::TempDir, WorkerPool) {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), b"home").unwrap();

    let root = ServingRoot::new(dir.path().to_str().unwrap());
    let resolver = Arc::new(Resolver::new(root, "index.html"));
    (dir, WorkerPool::new(size, resolver))
}

async fn wait_until_idle(pool: &WorkerPool) {
    timeout(Duration::from_secs(5), async {
        while pool.working_count() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("workers did not become ready");
}

#[test]
fn test_pool_creation() {
    let (_dir, pool) = pool(4);

    assert_eq!(pool.size(), 4);
    assert_eq!(pool.working_count(), 0);
    for i in 0..4 {
        let worker = pool.try_acquire().unwrap();
        assert_eq!(worker.id(), i);
        assert_eq!(worker.status(), WorkerStatus::Working);
    }
    assert_eq!(pool.working_count(), 4);
}

#[test]
#[should_panic]
fn test_pool_rejects_zero_workers() {
    let _ = pool(0);
}

#[test]
fn test_acquire_marks_working() {
    let (_dir, pool) = pool(2);

    let worker = pool.try_acquire().unwrap();
    assert_eq!(worker.status(), WorkerStatus::Working);
    assert_eq!(pool.working_count(), 1);

    worker.release();
    assert!(worker.is_ready());
    assert_eq!(pool.working_count(), 0);
}

#[test]
fn test_acquire_round_robin() {
    let (_dir, pool) = pool(3);

    let mut order = Vec::new();
    for _ in 0..4 {
        let worker = pool.try_acquire().unwrap();
        order.push(worker.id());
        worker.release();
    }

    // Wraps around even though worker 0 was free every time
    assert_eq!(order, vec![0, 1, 2, 0]);
}

#[test]
fn test_acquire_skips_busy_workers() {
    let (_dir, pool) = pool(3);

    let w0 = pool.try_acquire().unwrap();
    let w1 = pool.try_acquire().unwrap();
    w0.release();

    let w2 = pool.try_acquire().unwrap();
    assert_eq!(w2.id(), 2);

    // Worker 1 is still busy, so the scan wraps to 0
    let next = pool.try_acquire().unwrap();
    assert_eq!(next.id(), 0);
    assert_eq!(w1.status(), WorkerStatus::Working);
}

#[test]
fn test_saturated_pool_has_no_ready_worker() {
    let (_dir, pool) = pool(2);

    let _a = pool.try_acquire().unwrap();
    let _b = pool.try_acquire().unwrap();

    assert!(pool.try_acquire().is_none());
    assert_eq!(pool.working_count(), 2);
}

#[tokio::test]
async fn test_acquire_ready_waits_for_release() {
    let (_dir, pool) = pool(1);
    let pool = Arc::new(pool);

    let busy = pool.acquire_ready().await;

    let waiter = {
        let pool = Arc::clone(&pool);
        tokio::spawn(async move { pool.acquire_ready().await.id() })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!waiter.is_finished());

    busy.release();
    let id = timeout(Duration::from_secs(5), waiter).await.unwrap().unwrap();
    assert_eq!(id, 0);
}

#[tokio::test]
async fn test_acquire_ready_times_out_when_saturated() {
    let (_dir, pool) = pool(2);

    let _a = pool.acquire_ready().await;
    let _b = pool.acquire_ready().await;

    let third = timeout(Duration::from_millis(50), pool.acquire_ready()).await;
    assert!(third.is_err());
}

#[tokio::test]
async fn test_dispatch_serves_and_releases() {
    let (_dir, pool) = pool(2);
    let (mut client, server) = tokio::io::duplex(4096);

    let worker = pool.acquire_ready().await;
    pool.dispatch(Arc::clone(&worker), server);

    client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
    let mut response = Vec::new();
    client.read_to_end(&mut response).await.unwrap();

    assert!(response.starts_with(b"HTTP/1.1 200 OK\r\n"));
    assert!(response.ends_with(b"\r\n\r\nhome"));

    wait_until_idle(&pool).await;
    assert!(worker.is_ready());
    pool.destroy().await;
}

#[tokio::test]
async fn test_destroy_waits_for_in_flight_connection() {
    let (_dir, pool) = pool(1);
    let (mut client, server) = tokio::io::duplex(4096);

    let worker = pool.acquire_ready().await;
    pool.dispatch(worker, server);

    let finish = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        client.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
        let mut response = Vec::new();
        client.read_to_end(&mut response).await.unwrap();
        response
    });

    timeout(Duration::from_secs(5), pool.destroy()).await.unwrap();
    let response = finish.await.unwrap();
    assert!(response.starts_with(b"HTTP/1.1 200 OK\r\n"));
}
