//! Connection acceptance and the worker pool.

pub mod listener;
pub mod pool;
pub mod worker;

pub use listener::Server;
pub use pool::WorkerPool;
pub use worker::{Worker, WorkerStatus};
