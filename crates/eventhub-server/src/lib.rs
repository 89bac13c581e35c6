// ABOUTME: HTTP server for eventhub, exposing health and read-only event endpoints.
// ABOUTME: Uses Axum with a shared, mutex-guarded repository chosen at startup.

pub mod api;
pub mod app_state;
pub mod config;
pub mod routes;

pub use app_state::{AppState, SharedState};
pub use config::{ServerConfig, ServerConfigError};
pub use routes::create_router;
