use crate::infra::{persist_changes, AppService, AppState, DataFile, Persistence};
use axum::http::{header, StatusCode};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Extension;
use axum::Json;
use job_tracker::tracker::tracker_router;
use serde_json::json;
use std::sync::Arc;

/// Tracker API plus the operational probes. With a data file configured, every
/// successful mutating API call rewrites the snapshot.
pub(crate) fn with_application_routes(
    service: Arc<AppService>,
    data_file: Option<DataFile>,
) -> axum::Router {
    let api = tracker_router(service.clone());
    let api = match data_file {
        Some(data_file) => api.layer(middleware::from_fn_with_state(
            Persistence { service, data_file },
            persist_changes,
        )),
        None => api,
    };

    api.route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
