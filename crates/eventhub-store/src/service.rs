// ABOUTME: Thin service layer over the repositories: event CRUD, comment posting, and the wishlist.
// ABOUTME: Wishlist::save is the one async entry point; it waits a fixed delay, then writes synchronously.

use std::time::Duration;

use chrono::Local;
use eventhub_core::{Comment, Entity, EntityId, EntityKind, Event, UNASSIGNED_ID, User};

use crate::error::{StoreError, StoreResult};
use crate::repository::Repository;

/// Format of the timestamp stamped on posted comments, e.g. `07.03.2026 18:30`.
pub const COMMENT_DATE_FORMAT: &str = "%d.%m.%Y %H:%M";

/// Event operations for callers that should not touch repositories directly.
pub struct EventService<E, C> {
    events: E,
    comments: C,
}

impl<E: Repository<Event>, C: Repository<Comment>> EventService<E, C> {
    pub fn new(events: E, comments: C) -> Self {
        Self { events, comments }
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn get_all_events(&self) -> StoreResult<Vec<Event>> {
        self.events.get_all()
    }

    pub fn get_event_by_id(&self, id: EntityId) -> StoreResult<Option<Event>> {
        self.events.get_by_id(id)
    }

    pub fn add_event(&self, event: &Event) -> StoreResult<EntityId> {
        self.events.add(event)
    }

    pub fn update_event(&self, event: &Event) -> StoreResult<()> {
        self.events.update(event)
    }

    pub fn delete_event(&self, id: EntityId) -> StoreResult<()> {
        self.events.delete(id)
    }

    /// Store a comment dated now and append it to the event's feedback.
    /// Returns the stored comment.
    ///
    /// The two writes are not one transaction. If attaching the comment to
    /// the event fails, the stored comment is deleted again before the error
    /// is returned.
    pub fn post_comment(&self, event_id: EntityId, author: User, text: &str) -> StoreResult<Comment> {
        let mut event = self
            .events
            .get_by_id(event_id)?
            .ok_or(StoreError::NotFound {
                kind: EntityKind::Event,
                id: event_id,
            })?;

        let date = Local::now().format(COMMENT_DATE_FORMAT).to_string();
        let draft = Comment::new(UNASSIGNED_ID, author, date, text.to_string());
        let comment_id = self.comments.add(&draft)?;
        let comment = draft.with_id(comment_id);

        event.add_feedback(comment.clone());
        if let Err(e) = self.events.update(&event) {
            tracing::warn!("attaching comment {} to event {} failed: {}", comment_id, event_id, e);
            if let Err(cleanup) = self.comments.delete(comment_id) {
                tracing::error!("comment {} left detached: {}", comment_id, cleanup);
            }
            return Err(e);
        }

        tracing::info!("posted comment {} on event {}", comment_id, event_id);
        Ok(comment)
    }
}

/// An in-memory, ordered list of events a user intends to attend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Wishlist {
    events: Vec<Event>,
}

impl Wishlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_event(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Remove the first entry equal to `event`. Returns whether one was removed.
    pub fn remove_event(&mut self, event: &Event) -> bool {
        match self.events.iter().position(|e| e == event) {
            Some(index) => {
                self.events.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// One display line per event: title, description and place.
    pub fn lines(&self) -> Vec<String> {
        self.events
            .iter()
            .map(|e| format!("{}: {} ({})", e.title(), e.description(), e.place()))
            .collect()
    }

    /// Wait `delay`, then add every event through `repo`, returning the
    /// stored IDs in list order.
    pub async fn save<R>(&self, repo: &R, delay: Duration) -> StoreResult<Vec<EntityId>>
    where
        R: Repository<Event> + ?Sized,
    {
        tracing::debug!("saving wishlist of {} events after {:?}", self.events.len(), delay);
        tokio::time::sleep(delay).await;
        let ids = self
            .events
            .iter()
            .map(|event| repo.add(event))
            .collect::<StoreResult<Vec<_>>>()?;
        tracing::info!("saved wishlist: {:?}", ids);
        Ok(ids)
    }
}
