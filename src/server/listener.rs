use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::{TcpListener, TcpSocket};
use tracing::info;

use crate::config::Config;
use crate::fs::Resolver;
use crate::server::pool::WorkerPool;

/// Pending connections the kernel queues before `accept`.
const BACKLOG: u32 = 100;

/// Binds `addr` with `SO_REUSEADDR` set.
pub fn bind_listener(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .context("Failed to create listening socket")?;

    socket.set_reuseaddr(true)?;
    socket
        .bind(addr)
        .with_context(|| format!("Failed to bind {}", addr))?;

    Ok(socket.listen(BACKLOG)?)
}

/// Accepts connections and hands each one to a worker from the pool.
pub struct Server {
    listener: TcpListener,
    pool: WorkerPool,
    local_addr: SocketAddr,
}

impl Server {
    pub async fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let addr: SocketAddr = cfg
            .server
            .listen_addr
            .parse()
            .with_context(|| format!("Invalid listen address {:?}", cfg.server.listen_addr))?;

        let listener = bind_listener(addr)?;
        let local_addr = listener.local_addr()?;

        let resolver = Resolver::new(cfg.serving_root(), cfg.static_files.index_file.clone());
        let pool = WorkerPool::new(cfg.server.workers, Arc::new(resolver));

        Ok(Self {
            listener,
            pool,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Runs the accept loop until `shutdown` completes, then closes the
    /// listener and waits for in-flight connections to finish.
    pub async fn run_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let Server { listener, pool, local_addr } = self;
        info!("Listening on {} with {} workers", local_addr, pool.size());

        tokio::pin!(shutdown);

        loop {
            let (socket, peer) = tokio::select! {
                _ = &mut shutdown => break,
                accepted = listener.accept() => match accepted {
                    Ok(conn) => conn,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to accept connection");
                        continue;
                    }
                },
            };
            tracing::debug!(%peer, "Accepted connection");

            let worker = tokio::select! {
                _ = &mut shutdown => break,
                worker = pool.acquire_ready() => worker,
            };
            tracing::trace!(%peer, worker = worker.id(), "Assigned connection");

            pool.dispatch(worker, socket);
        }

        info!("Shutdown signal received");
        drop(listener);
        pool.destroy().await;
        info!("Server stopped");

        Ok(())
    }
}

/// Binds according to `cfg` and serves until `shutdown` completes.
pub async fn run<F>(cfg: &Config, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()>,
{
    Server::bind(cfg).await?.run_until(shutdown).await
}
