// ABOUTME: API module containing the HTTP handler functions for the eventhub REST API.
// ABOUTME: Event listing and lookup live in the events sub-module.

pub mod events;
