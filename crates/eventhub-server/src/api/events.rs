// ABOUTME: Event API handlers: list as flat field maps, fetch one fully materialized.
// ABOUTME: Store failures map to 500 with a JSON error body; unknown ids to 404.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use eventhub_core::EntityId;
use eventhub_store::{Persist, StoreError};

use crate::app_state::SharedState;

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

fn store_failure(err: StoreError) -> Response {
    tracing::error!("store error: {}", err);
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// GET /api/events - Every stored event as a flat field map, references as IDs.
pub async fn list_events(State(state): State<SharedState>) -> Response {
    let repo = state.events.lock().await;
    match repo.get_all() {
        Ok(events) => {
            let maps: Vec<serde_json::Value> =
                events.iter().map(|e| e.to_record().to_json()).collect();
            Json(maps).into_response()
        }
        Err(e) => store_failure(e),
    }
}

/// GET /api/events/{id} - One event with its references resolved.
pub async fn get_event(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let event_id = match id.parse::<EntityId>() {
        Ok(id) => id,
        Err(_) => return error_response(StatusCode::BAD_REQUEST, "invalid event id"),
    };

    let repo = state.events.lock().await;
    match repo.get_by_id(event_id) {
        Ok(Some(event)) => Json(event).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "event not found"),
        Err(e) => store_failure(e),
    }
}
