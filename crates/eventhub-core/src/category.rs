// ABOUTME: Defines the Category entity, a titled bucket events are filed under.
// ABOUTME: Users keep a set of favourite categories; events reference exactly one.

use serde::{Deserialize, Serialize};

use crate::entity::{Entity, EntityId, EntityKind, UNASSIGNED_ID};

/// A category events are grouped by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    category_id: EntityId,
    pub title: String,
    pub description: String,
}

impl Category {
    pub fn new(category_id: EntityId, title: String, description: String) -> Self {
        Self {
            category_id,
            title,
            description,
        }
    }

    pub fn category_id(&self) -> EntityId {
        self.category_id
    }
}

impl Entity for Category {
    const KIND: EntityKind = EntityKind::Category;

    fn id(&self) -> EntityId {
        self.category_id
    }

    fn with_id(mut self, id: EntityId) -> Self {
        self.category_id = id;
        self
    }
}

/// Build a category that has not been stored yet. The backend assigns its ID on `add`.
pub fn create_category(title: &str, description: &str) -> Category {
    Category::new(UNASSIGNED_ID, title.to_string(), description.to_string())
}
