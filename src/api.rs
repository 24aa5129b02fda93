use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::monitor::{Monitor, MonitorStatus};

#[derive(Clone)]
pub struct AppState {
    monitor: Arc<Monitor>,
}

/// Status + manual trigger surface for an embedded monitor.
pub fn router(monitor: Arc<Monitor>) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/status", get(status))
        .route("/check", post(check))
        .layer(CorsLayer::very_permissive())
        .with_state(AppState { monitor })
}

async fn status(State(state): State<AppState>) -> Json<MonitorStatus> {
    Json(state.monitor.get_status().await)
}

#[derive(Serialize)]
struct CheckResp {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

async fn check(State(state): State<AppState>) -> Response {
    match state.monitor.check_for_updates().await {
        Ok(report) => {
            tracing::info!(new = report.entries.len(), "manual check finished");
            Json(CheckResp {
                success: true,
                message: Some("Check completed".into()),
                error: None,
            })
            .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "manual check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(CheckResp {
                    success: false,
                    message: None,
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}
