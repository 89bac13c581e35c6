// ABOUTME: Core library for eventhub, containing the domain entities and their identity rules.
// ABOUTME: Every storage backend persists these types; this crate has no knowledge of storage.

pub mod category;
pub mod comment;
pub mod entity;
pub mod event;
pub mod group;
pub mod user;

pub use category::{Category, create_category};
pub use comment::{Comment, create_comment};
pub use entity::{Entity, EntityId, EntityKind, UNASSIGNED_ID};
pub use event::{Event, EventDraft, create_event};
pub use group::{Group, create_group};
pub use user::{User, create_user};
