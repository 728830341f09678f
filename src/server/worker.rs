//! A single worker slot
//!
//! A worker handles one connection at a time. Its line buffer is allocated
//! once and reused for every connection the slot serves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::fs::Resolver;
use crate::http::connection::{Connection, Outcome};
use crate::http::line::LineBuffer;

/// Current state of a worker slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    /// Free to take a connection
    Ready,
    /// Handling a connection
    Working,
}

#[derive(Debug)]
pub struct Worker {
    id: usize,

    /// `true` while the slot owns a connection. Claimed by the dispatcher,
    /// released by the worker's own task.
    working: AtomicBool,

    line: tokio::sync::Mutex<LineBuffer>,

    /// Task serving the current (or most recent) connection
    task: Mutex<Option<JoinHandle<()>>>,

    /// Signalled whenever a slot becomes ready again
    freed: Arc<Notify>,
}

impl Worker {
    pub(crate) fn new(id: usize, freed: Arc<Notify>) -> Self {
        Self {
            id,
            working: AtomicBool::new(false),
            line: tokio::sync::Mutex::new(LineBuffer::new()),
            task: Mutex::new(None),
            freed,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn status(&self) -> WorkerStatus {
        if self.working.load(Ordering::Acquire) {
            WorkerStatus::Working
        } else {
            WorkerStatus::Ready
        }
    }

    pub fn is_ready(&self) -> bool {
        self.status() == WorkerStatus::Ready
    }

    /// Moves the slot from ready to working. Returns `false` if it was
    /// already working.
    pub(crate) fn try_claim(&self) -> bool {
        self.working
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Marks the slot ready and wakes a dispatcher waiting for one.
    pub fn release(&self) {
        self.working.store(false, Ordering::Release);
        self.freed.notify_one();
    }

    /// Serves one connection and logs its outcome.
    ///
    /// Does not release the slot; the caller does that once the connection
    /// has been dropped.
    pub async fn handle<S>(&self, stream: S, resolver: &Resolver) -> Outcome
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let started = Instant::now();

        let outcome = {
            let mut line = self.line.lock().await;
            Connection::new(stream, &mut line, resolver).run().await
        };

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        self.log_outcome(&outcome, elapsed_ms);

        outcome
    }

    fn log_outcome(&self, outcome: &Outcome, elapsed_ms: f64) {
        match outcome {
            Outcome::Idle => {
                tracing::debug!(worker = self.id, elapsed_ms, "Peer closed before sending a request");
            }
            Outcome::Responded { status, path, body_bytes } if status.is_success() => {
                tracing::info!(
                    worker = self.id,
                    ok = true,
                    status = status.as_u16(),
                    elapsed_ms,
                    bytes = body_bytes,
                    path = %path,
                    "Request served"
                );
            }
            Outcome::Responded { status, path, .. } => {
                tracing::warn!(
                    worker = self.id,
                    ok = false,
                    status = status.as_u16(),
                    elapsed_ms,
                    path = %path,
                    "Request failed"
                );
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn line_capacity(&self) -> usize {
        self.line.lock().await.capacity()
    }

    pub(crate) fn attach(&self, handle: JoinHandle<()>) {
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
    }

    pub(crate) fn take_task(&self) -> Option<JoinHandle<()>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// Releases the worker when dropped, so a panicking task still frees its slot.
pub(crate) struct ReleaseOnDrop(pub(crate) Arc<Worker>);

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.0.release();
    }
}
