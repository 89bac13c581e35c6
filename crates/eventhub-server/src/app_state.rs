// ABOUTME: Shared application state for the eventhub HTTP server.
// ABOUTME: Holds the event repository behind an async mutex, since repositories are not Sync.

use std::sync::Arc;

use eventhub_core::Event;
use eventhub_store::Repository;
use tokio::sync::Mutex;

/// Shared application state accessible by all Axum handlers.
pub struct AppState {
    pub events: Mutex<Box<dyn Repository<Event>>>,
}

/// Type alias for the Arc-wrapped state used with Axum's State extractor.
pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(events: Box<dyn Repository<Event>>) -> Self {
        Self {
            events: Mutex::new(events),
        }
    }
}
