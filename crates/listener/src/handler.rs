//! Thin HTTP admin adapter over the registry and selector. No business
//! logic here beyond body parsing and error-to-status mapping.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use chainlens_types::models::Network;
use chainlens_types::profile::NetworkSpec;
use tower_http::trace::TraceLayer;

use crate::registry::Registry;

pub enum AppError {
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, msg, code) = match self {
            AppError::BadRequest(s) => (StatusCode::BAD_REQUEST, s, "INVALID_REQUEST"),
            AppError::Internal(s) => {
                tracing::error!(error = %s, "admin request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, s, "INTERNAL_ERROR")
            }
        };
        (
            status,
            Json(serde_json::json!({ "error": { "code": code, "message": msg } })),
        )
            .into_response()
    }
}

pub fn router(registry: Arc<Registry>) -> Router {
    Router::new()
        .route("/networks", get(list))
        // Register and start listening on a blockchain network.
        .route("/network/register", post(register))
        // Stop listening and flip the stored status to Deregistered.
        .route("/network/deregister/:nid", post(deregister))
        // Remove the network along with all its data.
        .route("/network/:nid", delete(remove))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

async fn list(State(registry): State<Arc<Registry>>) -> Result<Json<Vec<Network>>, AppError> {
    let selector = registry
        .selector()
        .ok_or_else(|| AppError::Internal("no selector configured".into()))?;
    let networks = selector
        .networks(&["id", "type", "platform", "status"])
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(Json(networks))
}

async fn register(
    State(registry): State<Arc<Registry>>,
    body: Result<Json<NetworkSpec>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(spec) =
        body.map_err(|e| AppError::BadRequest(format!("invalid network: {e}")))?;
    registry
        .register(&spec)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(StatusCode::OK)
}

async fn deregister(
    State(registry): State<Arc<Registry>>,
    Path(nid): Path<String>,
) -> Result<StatusCode, AppError> {
    registry
        .deregister(&nid)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(StatusCode::OK)
}

async fn remove(
    State(registry): State<Arc<Registry>>,
    Path(nid): Path<String>,
) -> Result<StatusCode, AppError> {
    registry
        .delete(&nid)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    Ok(StatusCode::OK)
}
