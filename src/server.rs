//! HTTP server and bounded graceful shutdown.
//!
//! # Shutdown
//!
//! [`Server::serve`] runs until its [`CancellationToken`] is cancelled, then:
//! 1. Stops `listener.accept()` and closes the listener.
//! 2. Asks every open connection to finish its in-flight request and close.
//! 3. Waits up to the grace period for them. Whatever is still open after
//!    that is aborted and `serve` returns [`Error::Shutdown`].
//!
//! A zero grace period skips step 3: connections are aborted at once and
//! `serve` returns `Ok`.
//!
//! The token is usually cancelled by [`shutdown_signal`] (SIGTERM or
//! Ctrl-C), but tests and embedders can cancel it directly.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::Error;
use crate::listen::{Io, ListenAddr, Listener};
use crate::request;
use crate::routes::RouteTable;

/// Grace period used when none is configured.
pub const DEFAULT_GRACE: Duration = Duration::from_secs(5);

/// The HTTP server.
pub struct Server {
    addr: ListenAddr,
    listener: Listener,
    grace: Duration,
}

impl Server {
    /// Binds `addr` right away so address errors surface before serving.
    ///
    /// ```rust,no_run
    /// # async fn run() -> Result<(), go_import_redirector::Error> {
    /// use go_import_redirector::Server;
    /// let server = Server::bind(&":9001".parse().unwrap()).await?;
    /// # Ok(()) }
    /// ```
    pub async fn bind(addr: &ListenAddr) -> Result<Self, Error> {
        let listener = Listener::bind(addr).await?;
        Ok(Self { addr: addr.clone(), listener, grace: DEFAULT_GRACE })
    }

    /// How long shutdown waits for in-flight requests. Zero closes immediately.
    pub fn grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// The bound TCP address; `None` for a Unix socket.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections and answers them from `routes` until `shutdown`
    /// is cancelled.
    pub async fn serve(self, routes: RouteTable, shutdown: CancellationToken) -> Result<(), Error> {
        let Self { addr, listener, grace } = self;

        // Shared read-only across every connection task.
        let routes = Arc::new(routes);

        info!(%addr, rules = routes.len(), "go-import-redirector listening");

        let mut tasks = JoinSet::new();

        loop {
            tokio::select! {
                // Check shutdown first so a signal stops accepting even while
                // more connections are queued.
                biased;

                () = shutdown.cancelled() => {
                    info!(in_flight = tasks.len(), "shutdown requested, closing listener");
                    break;
                }

                res = listener.accept() => {
                    let (io, peer) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };
                    tasks.spawn(serve_connection(io, peer, Arc::clone(&routes), shutdown.clone()));
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        listener.close();

        if grace.is_zero() {
            info!(open = tasks.len(), "closing connections without grace period");
            tasks.shutdown().await;
            return Ok(());
        }

        let drained = tokio::time::timeout(grace, drain(&mut tasks)).await;
        match drained {
            Ok(()) => {
                info!("go-import-redirector stopped");
                Ok(())
            }
            Err(_) => {
                warn!(open = tasks.len(), ?grace, "grace period elapsed, closing remaining connections");
                tasks.shutdown().await;
                Err(Error::Shutdown(grace))
            }
        }
    }
}

async fn drain(tasks: &mut JoinSet<()>) {
    while let Some(res) = tasks.join_next().await {
        if let Err(e) = res {
            error!("connection task failed: {e}");
        }
    }
}

/// Serves one connection until the client closes it or shutdown asks it to
/// finish its current request.
async fn serve_connection(
    io: Box<dyn Io>,
    peer: String,
    routes: Arc<RouteTable>,
    shutdown: CancellationToken,
) {
    // `service_fn` is called once per request on the connection.
    let svc = service_fn(move |req| {
        let routes = Arc::clone(&routes);
        async move { Ok::<_, Infallible>(dispatch(&routes, &req)) }
    });

    // `auto::Builder` handles HTTP/1.1 and HTTP/2, whichever the client speaks.
    let builder = ConnBuilder::new(TokioExecutor::new());
    let conn = builder.serve_connection(TokioIo::new(io), svc);
    tokio::pin!(conn);

    let res = tokio::select! {
        res = conn.as_mut() => res,
        () = shutdown.cancelled() => {
            conn.as_mut().graceful_shutdown();
            conn.as_mut().await
        }
    };
    if let Err(e) = res {
        debug!(%peer, "connection error: {e}");
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request and produces one response. The method is not checked.
fn dispatch(routes: &RouteTable, req: &hyper::Request<Incoming>) -> http::Response<Full<Bytes>> {
    let path = request::import_path(req);
    let response = routes.respond(&path);

    debug!(
        method = %req.method(),
        %path,
        status = response.status_code().as_u16(),
        "request"
    );

    response.into_inner()
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** and **SIGINT** (Ctrl-C).
/// On Windows only Ctrl-C is available.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    // `pending()` never resolves, so on non-Unix platforms the SIGTERM arm
    // is effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => info!("received SIGINT"),
        () = sigterm  => info!("received SIGTERM"),
    }
}
