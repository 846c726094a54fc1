use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderName;
use axum::routing::get;
use axum::Router;
use prometheus::{Encoder, TextEncoder};
use std::net::SocketAddr;
use tokio::sync::watch;
use tower_http::trace::TraceLayer;

async fn metrics_handler() -> ([(HeaderName, String); 1], Bytes) {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buf = Vec::with_capacity(16 * 1024);
    if let Err(e) = encoder.encode(&metric_families, &mut buf) {
        tracing::error!(error = %e, "failed to encode prometheus metrics");
    }
    (
        [(CONTENT_TYPE, encoder.format_type().to_string())],
        buf.into(),
    )
}

async fn healthz_handler() -> &'static str {
    "OK"
}

/// Serves `/metrics` and `/healthz` until `shutdown` flips.
pub async fn run_server(addr: SocketAddr, mut shutdown: watch::Receiver<bool>) {
    let app = Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .layer(TraceLayer::new_for_http());

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(target: "telemetry", error = %e, "failed to bind metrics server");
            return;
        }
    };
    tracing::info!(target: "telemetry", addr = %addr, "metrics server listening");

    let served = axum::serve(listener, app.into_make_service()).with_graceful_shutdown(async move {
        while shutdown.changed().await.is_ok() {
            if *shutdown.borrow() {
                break;
            }
        }
    });
    if let Err(e) = served.await {
        tracing::error!(target: "telemetry", error = %e, "metrics server failed");
    }
}
