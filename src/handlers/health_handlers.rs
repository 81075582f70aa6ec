//! Health handler.
//!
//! - GET /healthz  -> simple liveness ("ok")

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// `GET /healthz`
///
/// Very small liveness probe, always returns 200 OK with a plain JSON body.
/// It never touches the object store.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}
