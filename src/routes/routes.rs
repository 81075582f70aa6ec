//! Defines the HTTP surface of the uploader.
//!
//! - `POST /upload`  — multipart upload of a single `file` part
//! - `GET  /healthz` — liveness probe
//!
//! Request bodies on `/upload` are capped at the configured size.

use crate::{
    handlers::{health_handlers::healthz, upload_handlers::upload},
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

/// Build the route table. State is supplied by [`app`].
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route(
            "/upload",
            post(upload).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
}

/// Routes with state and request tracing attached, ready to serve.
pub fn app(state: AppState, max_upload_bytes: usize) -> Router {
    routes(max_upload_bytes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::bucket::BucketRef,
        services::storage_service::{DEFAULT_UPLOAD_DEADLINE, StorageService},
        test_support::{FakeBehavior, FakeClient},
    };
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{Value, json};
    use std::sync::Arc;

    fn server() -> TestServer {
        let client = Arc::new(FakeClient::new(FakeBehavior::Succeed));
        let state = AppState::new(
            BucketRef::new("my-bucket").unwrap(),
            StorageService::new(client, DEFAULT_UPLOAD_DEADLINE),
        );
        TestServer::new(app(state, 1024)).unwrap()
    }

    #[tokio::test]
    async fn healthz_is_ok() {
        let response = server().get("/healthz").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>(), json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn upload_only_accepts_post() {
        server()
            .get("/upload")
            .await
            .assert_status(StatusCode::METHOD_NOT_ALLOWED);
    }
}
