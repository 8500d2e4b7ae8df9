//! HTTP listener lifecycle.
//!
//! ```text
//!  serve ──────────────── running ───────────────┐
//!                                                 │ shutdown future resolves
//!                                                 ▼
//!                                    stop accepting, drain in-flight
//!                                                 │
//!                         ┌───────────────────────┴────────────────┐
//!                         ▼                                        ▼
//!                 drained within grace                    grace expired
//!                 ShutdownOutcome::Graceful               cancel in-flight handlers (503)
//!                                                         ShutdownOutcome::Forced
//! ```
//!
//! axum runs every connection in its own task, so aborting the accept loop
//! alone would leave running handlers (and their pooled database
//! connections) behind. A layer added here races each request against a
//! force flag that flips when the grace period expires.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinError;
use tracing::{error, info, warn};

use crate::error::{ApiError, MSG_SHUTTING_DOWN};

/// How long in-flight requests get to finish once shutdown starts.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every connection drained before the grace period ran out.
    Graceful,
    /// The grace period expired; the accept loop was aborted and every
    /// request still running was cancelled.
    Forced,
}

/// Serves `app` until `shutdown` resolves, then drains for at most `grace`.
///
/// Handlers see the peer address through `ConnectInfo<SocketAddr>`.
pub async fn run<F>(
    listener: TcpListener,
    app: Router,
    shutdown: F,
    grace: Duration,
) -> io::Result<ShutdownOutcome>
where
    F: Future<Output = ()> + Send,
{
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let (force_tx, force_rx) = watch::channel(false);

    let app = app.layer(middleware::from_fn_with_state(force_rx, cancel_on_force));

    let serve = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = stop_rx.await;
    });
    let mut server = tokio::spawn(async move { serve.await });

    tokio::select! {
        result = &mut server => {
            // The listener stopped before any shutdown was requested.
            flatten(result)?;
            return Ok(ShutdownOutcome::Graceful);
        }
        () = shutdown => {}
    }

    info!("Shutting down server...");
    let _ = stop_tx.send(());

    match tokio::time::timeout(grace, &mut server).await {
        Ok(result) => {
            flatten(result)?;
            info!("Server gracefully stopped");
            Ok(ShutdownOutcome::Graceful)
        }
        Err(_) => {
            server.abort();
            let _ = force_tx.send(true);
            warn!(grace_secs = grace.as_secs_f64(), "Server forced to shutdown");
            Ok(ShutdownOutcome::Forced)
        }
    }
}

/// Runs the request unless a forced shutdown fires first, in which case the
/// handler future is dropped and the client gets a 503.
async fn cancel_on_force(
    State(mut forced): State<watch::Receiver<bool>>,
    request: Request,
    next: Next,
) -> Response {
    let cancelled = async move {
        let fired = forced.wait_for(|forced| *forced).await.is_ok();
        if !fired {
            // sender gone without forcing: never cancel
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        response = next.run(request) => response,
        () = cancelled => {
            warn!("Request cancelled by forced shutdown");
            ApiError::new(StatusCode::SERVICE_UNAVAILABLE, MSG_SHUTTING_DOWN).into_response()
        }
    }
}

fn flatten(result: Result<io::Result<()>, JoinError>) -> io::Result<()> {
    match result {
        Ok(inner) => inner,
        Err(e) => Err(io::Error::other(e)),
    }
}

/// Resolves on Ctrl+C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::get;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    async fn local_listener() -> (TcpListener, SocketAddr) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        (listener, addr)
    }

    fn test_app() -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    "late"
                }),
            )
    }

    async fn raw_get(addr: SocketAddr, path: &str) -> TcpStream {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        let request = format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await.unwrap();
        stream
    }

    #[tokio::test]
    async fn test_serves_then_stops_gracefully() {
        let (listener, addr) = local_listener().await;
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let server = tokio::spawn(run(
            listener,
            test_app(),
            async move {
                let _ = stop_rx.await;
            },
            Duration::from_secs(5),
        ));

        let mut stream = raw_get(addr, "/ping").await;
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.ends_with("pong"));

        stop_tx.send(()).unwrap();
        let outcome = server.await.unwrap().unwrap();
        assert_eq!(outcome, ShutdownOutcome::Graceful);
    }

    #[tokio::test]
    async fn test_grace_period_expiry_forces_shutdown() {
        let (listener, addr) = local_listener().await;
        let (stop_tx, stop_rx) = oneshot::channel::<()>();

        let server = tokio::spawn(run(
            listener,
            test_app(),
            async move {
                let _ = stop_rx.await;
            },
            Duration::from_millis(100),
        ));

        let mut stream = raw_get(addr, "/slow").await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        stop_tx.send(()).unwrap();
        let outcome = server.await.unwrap().unwrap();
        assert_eq!(outcome, ShutdownOutcome::Forced);

        // The slow handler must not keep running after the forced stop: its
        // connection has to close well before the handler's 30s sleep ends.
        let mut response = String::new();
        tokio::time::timeout(Duration::from_secs(2), stream.read_to_string(&mut response))
            .await
            .expect("connection still open after forced shutdown")
            .unwrap();
        assert!(!response.contains("200 OK"));
        assert!(!response.contains("late"));
        assert!(response.starts_with("HTTP/1.1 503"));
        assert!(response.contains(MSG_SHUTTING_DOWN));
    }
}
