// ABOUTME: Defines the Event entity, a frozen aggregate whose only mutable part is its feedback.
// ABOUTME: Events are built from an EventDraft; comments can only ever be appended afterwards.

use serde::{Deserialize, Serialize};

use crate::category::Category;
use crate::comment::Comment;
use crate::entity::{Entity, EntityId, EntityKind, UNASSIGNED_ID};
use crate::user::User;

/// Everything an event carries except its identity and feedback. Callers fill
/// a draft, then freeze it into an `Event`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub author: User,
    pub announcement: String,
    pub description: String,
    pub date: String,
    pub place: String,
    pub photo: Option<String>,
    pub category: Category,
}

impl EventDraft {
    /// Create a draft with the required references. Text fields default to
    /// empty and there is no photo.
    pub fn new(title: &str, author: User, category: Category) -> Self {
        Self {
            title: title.to_string(),
            author,
            announcement: String::new(),
            description: String::new(),
            date: String::new(),
            place: String::new(),
            photo: None,
            category,
        }
    }
}

/// A published event. Once constructed its fields are read-only; feedback
/// grows through `add_feedback` and is never reordered or shrunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    event_id: EntityId,
    title: String,
    author: User,
    announcement: String,
    description: String,
    date: String,
    place: String,
    photo: Option<String>,
    category: Category,
    feedback: Vec<Comment>,
}

impl Event {
    /// Freeze a draft into an event with empty feedback.
    pub fn new(event_id: EntityId, draft: EventDraft) -> Self {
        Self {
            event_id,
            title: draft.title,
            author: draft.author,
            announcement: draft.announcement,
            description: draft.description,
            date: draft.date,
            place: draft.place,
            photo: draft.photo,
            category: draft.category,
            feedback: Vec::new(),
        }
    }

    pub fn event_id(&self) -> EntityId {
        self.event_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &User {
        &self.author
    }

    pub fn announcement(&self) -> &str {
        &self.announcement
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn date(&self) -> &str {
        &self.date
    }

    pub fn place(&self) -> &str {
        &self.place
    }

    pub fn photo(&self) -> Option<&str> {
        self.photo.as_deref()
    }

    pub fn category(&self) -> &Category {
        &self.category
    }

    pub fn feedback(&self) -> &[Comment] {
        &self.feedback
    }

    /// Append a comment to the end of the feedback list.
    pub fn add_feedback(&mut self, comment: Comment) {
        self.feedback.push(comment);
    }

    /// Copy the frozen fields back into a draft, e.g. to build a corrected
    /// replacement for `update`.
    pub fn to_draft(&self) -> EventDraft {
        EventDraft {
            title: self.title.clone(),
            author: self.author.clone(),
            announcement: self.announcement.clone(),
            description: self.description.clone(),
            date: self.date.clone(),
            place: self.place.clone(),
            photo: self.photo.clone(),
            category: self.category.clone(),
        }
    }
}

impl Entity for Event {
    const KIND: EntityKind = EntityKind::Event;

    fn id(&self) -> EntityId {
        self.event_id
    }

    fn with_id(mut self, id: EntityId) -> Self {
        self.event_id = id;
        self
    }
}

/// Build an unstored event from its parts. The backend assigns its ID on `add`.
#[allow(clippy::too_many_arguments)]
pub fn create_event(
    title: &str,
    author: User,
    announcement: &str,
    description: &str,
    date: &str,
    place: &str,
    photo: Option<&str>,
    category: Category,
) -> Event {
    Event::new(
        UNASSIGNED_ID,
        EventDraft {
            title: title.to_string(),
            author,
            announcement: announcement.to_string(),
            description: description.to_string(),
            date: date.to_string(),
            place: place.to_string(),
            photo: photo.map(str::to_string),
            category,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::group::Group;

    fn make_event(event_id: EntityId) -> Event {
        let group = Group::new(100, "Test group".to_string(), true, true, false);
        let author = User::new(
            100,
            "Testing Subject".to_string(),
            "test@example.com".to_string(),
            group,
        );
        let category = Category::new(100, "Test category".to_string(), "Test".to_string());
        let mut draft = EventDraft::new("Test event", author, category);
        draft.date = "04.06.2022".to_string();
        draft.place = "Test place".to_string();
        draft.photo = Some("photo.png".to_string());
        Event::new(event_id, draft)
    }

    #[test]
    fn new_event_has_no_feedback() {
        let event = make_event(100);
        assert_eq!(event.event_id(), 100);
        assert_eq!(event.title(), "Test event");
        assert_eq!(event.photo(), Some("photo.png"));
        assert!(event.feedback().is_empty());
    }

    #[test]
    fn draft_round_trip_preserves_fields() {
        let event = make_event(3);
        let rebuilt = Event::new(3, event.to_draft());
        assert_eq!(event, rebuilt);
    }

    #[test]
    fn feedback_difference_breaks_equality() {
        let event = make_event(1);
        let mut commented = event.clone();
        let comment = Comment::new(
            1,
            event.author().clone(),
            "05.06.2022".to_string(),
            "Nice".to_string(),
        );
        commented.add_feedback(comment);
        assert_ne!(event, commented);
    }

    #[test]
    fn create_event_is_unassigned() {
        let template = make_event(1);
        let event = create_event(
            "Conf",
            template.author().clone(),
            "Annual",
            "Talks all day",
            "01.09.2024",
            "Main hall",
            None,
            template.category().clone(),
        );
        assert!(!event.is_assigned());
        assert_eq!(event.photo(), None);
    }

    #[test]
    fn event_serde_round_trip() {
        let event = make_event(9);
        let json = serde_json::to_string(&event).expect("serialize");
        let back: Event = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(event, back);
    }
}
