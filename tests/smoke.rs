// ABOUTME: End-to-end smoke test for eventhub: seed a store through the factory, then read it over HTTP.
// ABOUTME: Runs the router with oneshot requests against each backend, no port binding.

use std::sync::Arc;

use axum::body::Body;
use eventhub_core::{Category, Comment, Event, EventDraft, Group, User, create_category, create_group, create_user};
use eventhub_server::{AppState, create_router};
use eventhub_store::{EventService, Repository, RepositoryFactory, StorageKind, StoreConfig};
use http::Request;
use tower::ServiceExt;

/// Helper to extract JSON body from a response.
async fn json_body(resp: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn get(state: &Arc<AppState>, uri: &str) -> axum::response::Response {
    create_router(Arc::clone(state))
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

#[tokio::test]
async fn smoke_test_full_lifecycle() {
    for kind in StorageKind::ALL {
        // 1. Seed a store through the factory
        let dir = tempfile::TempDir::new().unwrap();
        let factory = RepositoryFactory::new(StoreConfig::new(kind, dir.path()));
        let groups = factory.create::<Group>().unwrap();
        let users = factory.create::<User>().unwrap();
        let categories = factory.create::<Category>().unwrap();

        groups.add(&create_group("members", false, false, false)).unwrap();
        users
            .add(&create_user("Ann", "ann@example.com", groups.get_by_id(1).unwrap().unwrap()))
            .unwrap();
        categories.add(&create_category("Music", "Concerts")).unwrap();
        let user = users.get_by_id(1).unwrap().unwrap();
        let category = categories.get_by_id(1).unwrap().unwrap();

        // 2. Publish an event and comment on it through the service layer
        let service = EventService::new(
            factory.create::<Event>().unwrap(),
            factory.create::<Comment>().unwrap(),
        );
        let mut draft = EventDraft::new("Conf", user.clone(), category);
        draft.place = "Main hall".into();
        let event_id = service.add_event(&Event::new(0, draft)).unwrap();
        service.post_comment(event_id, user, "First!").unwrap();

        // 3. Serve a fresh repository on the same data
        let events = factory.create::<Event>().unwrap();
        let state = Arc::new(AppState::new(Box::new(events)));

        let resp = get(&state, "/health").await;
        assert_eq!(resp.status(), 200, "{kind}: health");

        let resp = get(&state, "/api/events").await;
        assert_eq!(resp.status(), 200, "{kind}: list");
        let json = json_body(resp).await;
        let list = json.as_array().unwrap();
        assert_eq!(list.len(), 1, "{kind}");
        assert_eq!(list[0]["place"], "Main hall", "{kind}");
        assert_eq!(list[0]["feedback"], serde_json::json!([1]), "{kind}");

        let resp = get(&state, &format!("/api/events/{event_id}")).await;
        assert_eq!(resp.status(), 200, "{kind}: get");
        let json = json_body(resp).await;
        assert_eq!(json["feedback"][0]["text"], "First!", "{kind}");
        assert_eq!(json["feedback"][0]["author"]["email"], "ann@example.com", "{kind}");

        let resp = get(&state, "/api/events/999").await;
        assert_eq!(resp.status(), 404, "{kind}: missing");
    }
}
