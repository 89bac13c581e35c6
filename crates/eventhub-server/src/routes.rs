// ABOUTME: Route definitions for the eventhub HTTP API.
// ABOUTME: Assembles health and event routes into a single traced Axum Router with shared state.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::SharedState;

/// Build the complete Axum router with all routes and shared state.
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/events", get(api::events::list_events))
        .route("/api/events/{id}", get(api::events::get_event))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler. Returns 200 OK with a simple JSON body.
async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_state::AppState;
    use axum::body::Body;
    use eventhub_core::Event;
    use eventhub_store::JsonRepository;
    use http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_returns_ok() {
        let dir = tempfile::TempDir::new().unwrap();
        let repo: JsonRepository<Event> = JsonRepository::new(dir.path());
        let app = create_router(Arc::new(AppState::new(Box::new(repo))));

        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), 200);

        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
    }
}
