//! Fixed-size worker pool
//!
//! The pool bounds concurrency: at most `size` connections are handled at
//! once. When every worker is busy the dispatcher waits for one to free up
//! instead of queueing connections.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Notify;

use crate::fs::Resolver;
use crate::server::worker::{ReleaseOnDrop, Worker};

#[derive(Debug)]
pub struct WorkerPool {
    workers: Vec<Arc<Worker>>,

    /// Index the next scan starts from
    cursor: AtomicUsize,

    freed: Arc<Notify>,

    resolver: Arc<Resolver>,
}

impl WorkerPool {
    /// Creates `size` ready workers.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn new(size: usize, resolver: Arc<Resolver>) -> Self {
        assert!(size > 0, "worker pool needs at least one worker");

        let freed = Arc::new(Notify::new());
        let workers = (0..size)
            .map(|id| Arc::new(Worker::new(id, Arc::clone(&freed))))
            .collect();

        Self {
            workers,
            cursor: AtomicUsize::new(0),
            freed,
            resolver,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Number of workers currently handling a connection.
    pub fn working_count(&self) -> usize {
        self.workers.iter().filter(|w| !w.is_ready()).count()
    }

    /// Claims the first ready worker, scanning round-robin from the slot after
    /// the last one handed out. Returns `None` if every worker is busy.
    pub fn try_acquire(&self) -> Option<Arc<Worker>> {
        let n = self.workers.len();
        let start = self.cursor.load(Ordering::Relaxed);

        for step in 0..n {
            let index = (start + step) % n;
            let worker = &self.workers[index];
            if worker.try_claim() {
                self.cursor.store((index + 1) % n, Ordering::Relaxed);
                return Some(Arc::clone(worker));
            }
        }

        None
    }

    /// Claims a ready worker, waiting for one to be released if the pool is
    /// saturated.
    pub async fn acquire_ready(&self) -> Arc<Worker> {
        loop {
            if let Some(worker) = self.try_acquire() {
                return worker;
            }

            // A release between the scan and this await leaves a permit
            // behind, so the wake-up is not lost.
            self.freed.notified().await;
        }
    }

    /// Runs `stream` on an already claimed `worker` in its own task. The
    /// worker is released when the task ends.
    pub fn dispatch<S>(&self, worker: Arc<Worker>, stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let resolver = Arc::clone(&self.resolver);
        let guard = ReleaseOnDrop(Arc::clone(&worker));

        let handle = tokio::spawn(async move {
            guard.0.handle(stream, &resolver).await;
            drop(guard);
        });

        worker.attach(handle);
    }

    /// Waits for every worker's task to finish, then drops the pool.
    pub async fn destroy(self) {
        for worker in &self.workers {
            if let Some(handle) = worker.take_task() {
                if let Err(e) = handle.await {
                    tracing::error!(worker = worker.id(), error = %e, "Worker task failed");
                }
            }
        }

        tracing::debug!(workers = self.workers.len(), "Worker pool stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::ServingRoot;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn worker_keeps_grown_line_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let root = ServingRoot::new(dir.path().to_str().unwrap());
        let pool = WorkerPool::new(1, Arc::new(Resolver::new(root, "index.html")));
        let request = format!("GET /{} HTTP/1.1\r\n\r\n", "x".repeat(200));

        for _ in 0..2 {
            let (mut client, server) = tokio::io::duplex(4096);
            let worker = pool.acquire_ready().await;
            pool.dispatch(worker, server);

            client.write_all(request.as_bytes()).await.unwrap();
            let mut response = Vec::new();
            client.read_to_end(&mut response).await.unwrap();
            assert!(response.starts_with(b"HTTP/1.1 404 Not Found\r\n"));

            while pool.working_count() > 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        }

        assert_eq!(pool.workers[0].line_capacity().await, 256);
        pool.destroy().await;
    }
}
