// ABOUTME: Defines the Comment entity, a dated piece of feedback written by a user.
// ABOUTME: Comments are attached to events through the event's append-only feedback list.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId, EntityKind, UNASSIGNED_ID};
use crate::event::Event;
use crate::user::User;

/// Feedback left by a user. `date` is a preformatted timestamp string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    comment_id: EntityId,
    pub author: User,
    pub date: String,
    pub text: String,
}

impl Comment {
    pub fn new(comment_id: EntityId, author: User, date: String, text: String) -> Self {
        Self {
            comment_id,
            author,
            date,
            text,
        }
    }

    pub fn comment_id(&self) -> EntityId {
        self.comment_id
    }
}

impl Entity for Comment {
    const KIND: EntityKind = EntityKind::Comment;

    fn id(&self) -> EntityId {
        self.comment_id
    }

    fn with_id(mut self, id: EntityId) -> Self {
        self.comment_id = id;
        self
    }
}

/// Build an unstored comment and append it to `event`'s feedback. The
/// returned copy is what should be handed to a comment repository.
pub fn create_comment(author: User, date: &str, text: &str, event: &mut Event) -> Comment {
    let comment = Comment::new(UNASSIGNED_ID, author, date.to_string(), text.to_string());
    event.add_feedback(comment.clone());
    comment
}
