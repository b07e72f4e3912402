//! HTTP server, connection model and graceful shutdown.
//!
//! # Connection model
//!
//! The server runs on the caller's tokio runtime (multi-threaded in every
//! binary). Each accepted TCP connection gets its own task; the connection
//! speaks HTTP/1.1 or HTTP/2, whichever the client negotiates, and requests
//! on it are handled one after another.
//!
//! By default the number of live connections is unbounded. With
//! [`Server::max_connections`] a semaphore caps it: once the cap is reached
//! the accept loop waits for a connection to close before accepting the next
//! one, and pending clients queue in the kernel backlog.
//!
//! Handlers that block (file I/O) must move that work to tokio's blocking
//! pool themselves; the server never runs handler code off the async workers.
//!
//! # Graceful shutdown
//!
//! On SIGTERM or Ctrl-C (or when the future passed to
//! [`Server::serve_with_shutdown`] resolves) the server:
//! 1. stops accepting new connections;
//! 2. lets every in-flight connection task run to completion;
//! 3. returns.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::middleware::trace::trace;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    listener: Option<TcpListener>,
    max_connections: Option<usize>,
}

impl Server {
    /// Configures the server to bind to `addr` when it starts serving.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr, listener: None, max_connections: None }
    }

    /// Serves on an already bound listener, e.g. one bound to port 0.
    pub fn from_listener(listener: TcpListener) -> Result<Self, Error> {
        let addr = listener.local_addr()?;
        Ok(Self { addr, listener: Some(listener), max_connections: None })
    }

    /// Caps the number of concurrently open connections. `None` is unbounded.
    ///
    /// A limit of zero is treated as one.
    pub fn max_connections(mut self, limit: Option<usize>) -> Self {
        self.max_connections = limit.map(|n| n.max(1));
        self
    }

    /// Serves until SIGTERM or Ctrl-C, then drains in-flight connections.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Serves until `signal` resolves, then drains in-flight connections.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = match self.listener {
            Some(listener) => listener,
            None => TcpListener::bind(self.addr).await?,
        };
        let addr = listener.local_addr()?;

        let router = Arc::new(router);
        let limiter = self.max_connections.map(|n| Arc::new(Semaphore::new(n)));

        info!(%addr, max_connections = ?self.max_connections, "listening");

        let mut tasks = JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Shutdown is checked first so a signal stops accepting even
                // while connections are still queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                // Reaping comes before accepting so finished tasks are
                // dropped even while new connections keep arriving.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}

                res = next_connection(&listener, limiter.clone()) => {
                    let (stream, peer, permit) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(router, req, peer).await }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            warn!(%peer, "connection error: {e}");
                        }

                        // Held for the connection's lifetime.
                        drop(permit);
                    });

                    reap_finished(&mut tasks);
                }
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("server stopped");
        Ok(())
    }
}

/// Drops every connection task that has already finished, without waiting.
fn reap_finished(tasks: &mut JoinSet<()>) -> usize {
    let mut reaped = 0;
    while tasks.try_join_next().is_some() {
        reaped += 1;
    }
    reaped
}

/// Waits for a connection slot (if limited), then for a connection.
async fn next_connection(
    listener: &TcpListener,
    limiter: Option<Arc<Semaphore>>,
) -> io::Result<(TcpStream, SocketAddr, Option<OwnedSemaphorePermit>)> {
    let permit = match limiter {
        Some(sem) => Some(sem.acquire_owned().await.map_err(io::Error::other)?),
        None => None,
    };
    let (stream, peer) = listener.accept().await?;
    Ok((stream, peer, permit))
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Buffers the body, then routes one request and produces one response.
///
/// The error type is [`Infallible`](std::convert::Infallible): every failure
/// becomes a status code here, so hyper never sees an error.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<hyper::body::Incoming>,
    peer: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, std::convert::Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = trace(&method, &path, peer, async move {
        let (parts, body) = req.into_parts();
        match body.collect().await {
            Ok(collected) => router.call(http::Request::from_parts(parts, collected.to_bytes())).await,
            Err(e) => {
                warn!("failed to read request body: {e}");
                Response::status(Status::BadRequest)
            }
        }
    })
    .await;

    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both SIGTERM and SIGINT (Ctrl-C); elsewhere only
/// Ctrl-C is available. A handler that cannot be installed is logged and
/// treated as a signal that never arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => { sig.recv().await; }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Method, Request};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::oneshot;

    async fn raw_get(addr: SocketAddr, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let req = format!("GET {path} HTTP/1.1\r\nhost: test\r\nconnection: close\r\n\r\n");
        stream.write_all(req.as_bytes()).await.unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).await.unwrap();
        out
    }

    #[tokio::test]
    async fn finished_connection_tasks_are_reaped_without_waiting() {
        let mut tasks = JoinSet::new();
        for _ in 0..3 {
            tasks.spawn(async {});
        }
        let (release, hold) = oneshot::channel::<()>();
        tasks.spawn(async move { hold.await.ok(); });

        let mut reaped = 0;
        for _ in 0..1000 {
            reaped += reap_finished(&mut tasks);
            if reaped == 3 {
                break;
            }
            tokio::task::yield_now().await;
        }

        assert_eq!(reaped, 3);
        assert_eq!(tasks.len(), 1);

        release.send(()).unwrap();
        while tasks.join_next().await.is_some() {}
    }

    #[tokio::test]
    async fn serves_until_shutdown_future_resolves() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel::<()>();

        let app = Router::new().on(Method::Get, "/", |_req: Request| async { "hi\n" });
        let server = tokio::spawn(
            Server::from_listener(listener)
                .unwrap()
                .max_connections(Some(2))
                .serve_with_shutdown(app, async move { rx.await.ok(); }),
        );

        let reply = raw_get(addr, "/").await;
        assert!(reply.starts_with("HTTP/1.1 200 OK"), "{reply}");
        assert!(reply.ends_with("hi\n"), "{reply}");

        let missing = raw_get(addr, "/nope").await;
        assert!(missing.starts_with("HTTP/1.1 404"), "{missing}");

        tx.send(()).unwrap();
        server.await.unwrap().unwrap();
    }
}
