use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use pmo::access::{guard_routes, EmailDomainPolicy};
use pmo::accreditation::{
    accreditation_router, AccreditationService, ObjectStore, SubmissionStore,
};
use serde_json::json;
use std::sync::Arc;

/// Accreditation routes behind the domain guard, plus open probes and metrics.
pub(crate) fn with_accreditation_routes<S, O>(
    service: Arc<AccreditationService<S, O>>,
    policy: Arc<EmailDomainPolicy>,
) -> axum::Router
where
    S: SubmissionStore + 'static,
    O: ObjectStore + 'static,
{
    guard_routes(accreditation_router(service), policy)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
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
