//! HTTP server and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. stops accepting new connections,
//! 2. closes idle keep-alive connections and lets requests already being
//!    handled run to completion,
//! 3. returns from [`Server::serve`].
//!
//! Timed handlers therefore still report the requests that were running when
//! the signal arrived.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tracing::{debug, error, info, trace};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// Request bodies larger than this are answered with `413 Payload Too Large`
/// unless [`Server::max_body_size`] says otherwise.
pub const DEFAULT_MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

/// The HTTP server.
pub struct Server {
    bind: Bind,
    max_body_size: usize,
}

enum Bind {
    Addr(String),
    Listener(TcpListener),
}

impl Server {
    /// Configures the server to bind to `addr` (`host:port`) when
    /// [`serve`](Server::serve) is called.
    ///
    /// ```rust,no_run
    /// use stint::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: impl Into<String>) -> Self {
        Self { bind: Bind::Addr(addr.into()), max_body_size: DEFAULT_MAX_BODY_SIZE }
    }

    /// Serves on a listener that is already bound, e.g. to an ephemeral port.
    pub fn from_listener(listener: TcpListener) -> Self {
        Self { bind: Bind::Listener(listener), max_body_size: DEFAULT_MAX_BODY_SIZE }
    }

    /// Caps the number of body bytes read per request.
    pub fn max_body_size(mut self, bytes: usize) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns after SIGTERM or Ctrl-C, once every connection has drained.
    /// Fails early with [`Error::Addr`] or [`Error::Io`] if the listener
    /// cannot be set up.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        self.serve_with_shutdown(router, shutdown_signal()).await
    }

    /// Like [`serve`](Server::serve), but shuts down when `signal` resolves.
    ///
    /// On shutdown the listener is closed, idle keep-alive connections are
    /// closed, and requests already being handled run to completion.
    pub async fn serve_with_shutdown(
        self,
        router: Router,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error> {
        let listener = match self.bind {
            Bind::Addr(addr) => TcpListener::bind(addr.parse::<SocketAddr>()?).await?,
            Bind::Listener(listener) => listener,
        };
        let addr = listener.local_addr()?;
        let max_body_size = self.max_body_size;
        let router = Arc::new(router);

        info!(%addr, max_body_size, "stint listening");

        let conn_builder = ConnBuilder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting right away,
                // even with connections queued.
                biased;

                () = &mut signal => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    // Called once per request on the connection.
                    let svc = service_fn(move |req| {
                        let router = Arc::clone(&router);
                        async move { dispatch(&router, req, peer, max_body_size).await }
                    });

                    let conn = conn_builder.serve_connection(TokioIo::new(stream), svc).into_owned();
                    let conn = graceful.watch(conn);

                    tasks.spawn(async move {
                        if let Err(e) = conn.await {
                            error!(%peer, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        drop(listener);
        graceful.shutdown().await;
        while tasks.join_next().await.is_some() {}

        info!("stint stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Reads the body, then hands the request to the router.
///
/// Unrouted requests are answered before their body is read. Every failure
/// becomes a response, so hyper never sees an error.
async fn dispatch(
    router: &Router,
    req: hyper::Request<Incoming>,
    peer: SocketAddr,
    max_body_size: usize,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    if !router.has_route(&parts.method, parts.uri.path()) {
        trace!(%peer, method = %parts.method, path = parts.uri.path(), "no route");
        return Ok(Response::status(StatusCode::NOT_FOUND).into_inner());
    }

    let body = match read_body(body, max_body_size).await {
        Ok(body) => body,
        Err(status) => {
            debug!(%peer, %status, "request body rejected");
            return Ok(Response::status(status).into_inner());
        }
    };

    let response = router.dispatch(Request::new(parts, body)).await;
    Ok(response.into_inner())
}

/// Collects at most `limit` bytes of `body`.
///
/// Fails with `413` past the limit and `400` when the body cannot be read.
async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, StatusCode>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.is::<LengthLimitError>() => Err(StatusCode::PAYLOAD_TOO_LARGE),
        Err(e) => {
            error!("failed to read request body: {e}");
            Err(StatusCode::BAD_REQUEST)
        }
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT. Windows only has Ctrl-C.
///
/// A signal that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
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
