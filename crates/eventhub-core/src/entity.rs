// ABOUTME: Shared identity vocabulary for all domain entities: ID type, entity kinds, Entity trait.
// ABOUTME: ID 0 marks an entity that has not been persisted yet; backends allocate real IDs from 1.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Integer identity of an entity, unique within its entity kind.
pub type EntityId = i64;

/// Placeholder ID carried by an entity that no backend has stored yet.
pub const UNASSIGNED_ID: EntityId = 0;

/// The closed set of entity types the system persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Category,
    Group,
    User,
    Comment,
    Event,
}

impl EntityKind {
    /// Stable lowercase name used in logs and error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Group => "group",
            Self::User => "user",
            Self::Comment => "comment",
            Self::Event => "event",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A domain value with a unique, never reassigned integer identity.
///
/// Equality is structural over every field, nested references included.
pub trait Entity: Clone + PartialEq + fmt::Debug {
    const KIND: EntityKind;

    fn id(&self) -> EntityId;

    /// Returns the same value carrying `id`. Backends use this to stamp a
    /// freshly allocated ID on an entity added with `UNASSIGNED_ID`.
    fn with_id(self, id: EntityId) -> Self;

    fn is_assigned(&self) -> bool {
        self.id() != UNASSIGNED_ID
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_lowercase() {
        assert_eq!(EntityKind::Category.as_str(), "category");
        assert_eq!(EntityKind::Event.to_string(), "event");
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&EntityKind::Comment).expect("serialize");
        assert_eq!(json, "\"comment\"");
    }
}
