//! HTTP listener with drain and forced close.
//!
//! # Responsibilities
//! - Bind to the configured address (fail fast, never retry)
//! - Accept TCP connections and serve each over HTTP/1.1
//! - Stop accepting on request and let connections finish in-flight work
//! - Drop every connection on forced close

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use futures_util::future::BoxFuture;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::Request;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, watch};
use tokio::time::Instant;
use tower::ServiceExt;

use crate::config::{ListenerConfig, TimeoutConfig};
use crate::http::HandlerSet;
use crate::net::connection::{ConnectionGuard, ConnectionTracker};
use crate::net::Listener;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenError {
    /// Failed to bind to address.
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Failed to accept connection.
    #[error("failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    /// In-flight requests outlived the drain deadline.
    #[error("graceful drain exceeded its deadline{}", active_suffix(.active))]
    DrainTimeout { active: Option<u64> },

    /// Connections were still registered after a forced close.
    #[error("forced close did not release every connection{}", active_suffix(.active))]
    ForceClose { active: Option<u64> },

    /// The accept loop ended without reporting an error.
    #[error("listener stopped unexpectedly")]
    Closed,
}

fn active_suffix(active: &Option<u64>) -> String {
    match active {
        Some(n) => format!(" ({n} connection(s) still active)"),
        None => String::new(),
    }
}

/// Accept errors caused by a single peer rather than the listening socket.
fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
    )
}

/// Resolves `true` once the flag is set, `false` if its sender is gone.
async fn raised(flag: &mut watch::Receiver<bool>) -> bool {
    flag.wait_for(|set| *set).await.is_ok()
}

/// HTTP/1.1 listener serving a [`HandlerSet`].
///
/// Stop and force requests are broadcast to the accept loop and every
/// connection task through watch channels.
pub struct HttpListener {
    bind_address: String,
    router: Router,
    read_timeout: Duration,
    force_close_timeout: Duration,
    tracker: ConnectionTracker,
    stop: watch::Sender<bool>,
    force: watch::Sender<bool>,
}

impl HttpListener {
    /// Create a listener for `config.bind_address`. Nothing is bound until
    /// [`Listener::serve`] runs.
    pub fn new(config: &ListenerConfig, handlers: HandlerSet, timeouts: &TimeoutConfig) -> Self {
        let (stop, _) = watch::channel(false);
        let (force, _) = watch::channel(false);
        Self {
            bind_address: config.bind_address.clone(),
            router: handlers.into_router(timeouts.write_timeout()),
            read_timeout: timeouts.read_timeout(),
            force_close_timeout: timeouts.force_close_timeout(),
            tracker: ConnectionTracker::new(),
            stop,
            force,
        }
    }

    /// Number of connections currently open.
    pub fn active_connections(&self) -> u64 {
        self.tracker.active_count()
    }

    async fn accept_loop(self: Arc<Self>, listener: TcpListener) -> Result<(), ListenError> {
        let mut stop = self.stop.subscribe();

        loop {
            tokio::select! {
                biased;
                true = raised(&mut stop) => break,
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(conn) => conn,
                        Err(e) if is_transient(&e) => {
                            tracing::warn!(error = %e, "Dropped connection during accept");
                            continue;
                        }
                        Err(e) => return Err(ListenError::Accept(e)),
                    };

                    let guard = self.tracker.track();
                    tracing::debug!(
                        connection_id = %guard.id(),
                        peer_addr = %peer,
                        active_connections = self.tracker.active_count(),
                        "Connection accepted"
                    );

                    tokio::spawn(serve_connection(
                        stream,
                        peer,
                        self.router.clone(),
                        self.read_timeout,
                        self.stop.subscribe(),
                        self.force.subscribe(),
                        guard,
                    ));
                }
            }
        }

        tracing::info!(
            active_connections = self.tracker.active_count(),
            "Listener stopped accepting connections"
        );
        Ok(())
    }
}

impl Listener for HttpListener {
    fn serve(
        self: Arc<Self>,
        ready: oneshot::Sender<SocketAddr>,
    ) -> BoxFuture<'static, Result<(), ListenError>> {
        Box::pin(async move {
            let bind_error = |source: io::Error| ListenError::Bind {
                address: self.bind_address.clone(),
                source,
            };

            let listener = TcpListener::bind(&self.bind_address)
                .await
                .map_err(bind_error)?;
            let local_addr = listener.local_addr().map_err(bind_error)?;

            tracing::info!(address = %local_addr, "API listening");
            // The coordinator may have stopped waiting for readiness.
            let _ = ready.send(local_addr);

            self.accept_loop(listener).await
        })
    }

    fn request_stop(&self, deadline: Instant) -> BoxFuture<'_, Result<(), ListenError>> {
        Box::pin(async move {
            self.stop.send_replace(true);
            tracing::info!(
                active_connections = self.tracker.active_count(),
                "Stop requested, draining connections"
            );

            tokio::time::timeout_at(deadline, self.tracker.drained())
                .await
                .map_err(|_| ListenError::DrainTimeout {
                    active: Some(self.tracker.active_count()),
                })
        })
    }

    fn force_close(&self) -> BoxFuture<'_, Result<(), ListenError>> {
        Box::pin(async move {
            self.stop.send_replace(true);
            self.force.send_replace(true);
            tracing::warn!(
                active_connections = self.tracker.active_count(),
                "Force closing connections"
            );

            tokio::time::timeout(self.force_close_timeout, self.tracker.drained())
                .await
                .map_err(|_| ListenError::ForceClose {
                    active: Some(self.tracker.active_count()),
                })
        })
    }
}

/// Serve one connection until it ends, drains, or is force closed.
async fn serve_connection(
    stream: TcpStream,
    peer: SocketAddr,
    router: Router,
    read_timeout: Duration,
    mut stop: watch::Receiver<bool>,
    mut force: watch::Receiver<bool>,
    guard: ConnectionGuard,
) {
    let service = service_fn(move |request: Request<Incoming>| router.clone().oneshot(request));

    let conn = http1::Builder::new()
        .timer(TokioTimer::new())
        .header_read_timeout(read_timeout)
        .serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let mut draining = false;
    loop {
        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    tracing::debug!(
                        connection_id = %guard.id(),
                        peer_addr = %peer,
                        error = %e,
                        "Connection ended with error"
                    );
                }
                break;
            }
            true = raised(&mut stop), if !draining => {
                draining = true;
                conn.as_mut().graceful_shutdown();
            }
            true = raised(&mut force) => {
                tracing::debug!(
                    connection_id = %guard.id(),
                    peer_addr = %peer,
                    "Connection force closed"
                );
                break;
            }
        }
    }
}
