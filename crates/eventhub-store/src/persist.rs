// ABOUTME: Conversion between domain entities and flat Records, plus read-time reference resolution.
// ABOUTME: Resolver re-materializes referenced IDs from the same store and cuts cycles at repeat visits.

use std::cell::RefCell;

use eventhub_core::{
    Category, Comment, Entity, EntityId, EntityKind, Event, EventDraft, Group, UNASSIGNED_ID,
    User,
};

use crate::error::{StoreError, StoreResult};
use crate::record::{FieldValue, Record};
use crate::schema::{
    CATEGORY_SCHEMA, COMMENT_SCHEMA, EVENT_SCHEMA, GROUP_SCHEMA, Schema, USER_SCHEMA, schema_for,
};

/// Anything that can load a stored record of a given kind by ID. Each backend
/// implements this over one persistence scope (a connection or a data directory).
pub trait RecordSource {
    fn load_record(&self, schema: &'static Schema, id: EntityId) -> StoreResult<Option<Record>>;

    fn contains(&self, schema: &'static Schema, id: EntityId) -> StoreResult<bool> {
        Ok(self.load_record(schema, id)?.is_some())
    }
}

/// An entity kind the store knows how to flatten and rebuild.
pub trait Persist: Entity {
    const SCHEMA: &'static Schema;

    /// Flatten to a record; references become IDs.
    fn to_record(&self) -> Record;

    /// Rebuild from a record, resolving references through `resolver`.
    fn from_record(record: &Record, resolver: &Resolver<'_>) -> StoreResult<Self>;
}

struct Frame {
    kind: EntityKind,
    id: EntityId,
    shallow: bool,
}

/// Walks references while one entity is being read.
///
/// Every entity under construction sits on a stack. Reaching an entity that is
/// already on the stack builds it shallow: single references still resolve,
/// link collections come back empty. Single references never form a cycle, so
/// this bounds every read.
pub struct Resolver<'s> {
    source: &'s dyn RecordSource,
    stack: RefCell<Vec<Frame>>,
}

impl<'s> Resolver<'s> {
    pub fn new(source: &'s dyn RecordSource) -> Self {
        Self {
            source,
            stack: RefCell::new(Vec::new()),
        }
    }

    /// Build `T` from an already loaded record.
    pub fn materialize<T: Persist>(&self, record: &Record) -> StoreResult<T> {
        let shallow = self
            .stack
            .borrow()
            .iter()
            .any(|f| f.kind == record.kind && f.id == record.id);
        self.stack.borrow_mut().push(Frame {
            kind: record.kind,
            id: record.id,
            shallow,
        });
        let result = T::from_record(record, self);
        self.stack.borrow_mut().pop();
        result
    }

    /// Load and build the `T` that `owner` references by `id`.
    pub fn resolve<T: Persist>(&self, owner: &Record, id: EntityId) -> StoreResult<T> {
        let record = self
            .source
            .load_record(T::SCHEMA, id)?
            .ok_or(StoreError::DanglingReference {
                kind: owner.kind,
                target: T::KIND,
                id,
            })?;
        self.materialize(&record)
    }

    /// Build every member of `owner`'s link collection `name`, in stored order.
    pub fn resolve_links<T: Persist>(&self, owner: &Record, name: &str) -> StoreResult<Vec<T>> {
        if self.is_shallow() {
            return Ok(Vec::new());
        }
        owner
            .link_ids(name)
            .iter()
            .map(|id| self.resolve(owner, *id))
            .collect()
    }

    fn is_shallow(&self) -> bool {
        self.stack.borrow().last().is_some_and(|f| f.shallow)
    }
}

/// Read one entity by ID from `source`, fully materialized.
pub fn read_entity<T: Persist>(source: &dyn RecordSource, id: EntityId) -> StoreResult<Option<T>> {
    match source.load_record(T::SCHEMA, id)? {
        Some(record) => Resolver::new(source).materialize(&record).map(Some),
        None => Ok(None),
    }
}

/// Reject a write whose references point at entities `source` does not hold.
pub fn ensure_references(source: &dyn RecordSource, record: &Record) -> StoreResult<()> {
    let schema = schema_for(record.kind);
    for (target, id) in record.references(schema) {
        if id == UNASSIGNED_ID || !source.contains(schema_for(target), id)? {
            tracing::warn!("{} {} references missing {} {}", record.kind, record.id, target, id);
            return Err(StoreError::DanglingReference {
                kind: record.kind,
                target,
                id,
            });
        }
    }
    Ok(())
}

fn text(value: &str) -> FieldValue {
    FieldValue::Text(value.to_string())
}

fn ids<T: Entity>(items: &[T]) -> Vec<EntityId> {
    items.iter().map(Entity::id).collect()
}

impl Persist for Category {
    const SCHEMA: &'static Schema = &CATEGORY_SCHEMA;

    fn to_record(&self) -> Record {
        Record::new(Self::KIND, self.category_id())
            .with_field("title", text(&self.title))
            .with_field("description", text(&self.description))
    }

    fn from_record(record: &Record, _resolver: &Resolver<'_>) -> StoreResult<Self> {
        Ok(Category::new(
            record.id,
            record.text("title")?,
            record.text("description")?,
        ))
    }
}

impl Persist for Group {
    const SCHEMA: &'static Schema = &GROUP_SCHEMA;

    fn to_record(&self) -> Record {
        Record::new(Self::KIND, self.group_id())
            .with_field("title", text(&self.title))
            .with_field("create_rights", FieldValue::Bool(self.create_rights))
            .with_field("delete_rights", FieldValue::Bool(self.delete_rights))
            .with_field("admin_access", FieldValue::Bool(self.admin_access))
    }

    fn from_record(record: &Record, _resolver: &Resolver<'_>) -> StoreResult<Self> {
        Ok(Group::new(
            record.id,
            record.text("title")?,
            record.bool("create_rights")?,
            record.bool("delete_rights")?,
            record.bool("admin_access")?,
        ))
    }
}

impl Persist for User {
    const SCHEMA: &'static Schema = &USER_SCHEMA;

    fn to_record(&self) -> Record {
        Record::new(Self::KIND, self.user_id())
            .with_field("name", text(&self.name))
            .with_field("email", text(&self.email))
            .with_field("group", FieldValue::Id(self.group.id()))
            .with_link("wishlist", ids(self.wishlist()))
            .with_link("favourite_category", ids(self.favourite_categories()))
    }

    fn from_record(record: &Record, resolver: &Resolver<'_>) -> StoreResult<Self> {
        let group = resolver.resolve::<Group>(record, record.reference("group")?)?;
        let mut user = User::new(
            record.id,
            record.text("name")?,
            record.text("email")?,
            group,
        );
        for event in resolver.resolve_links::<Event>(record, "wishlist")? {
            user.add_to_wishlist(event);
        }
        for category in resolver.resolve_links::<Category>(record, "favourite_category")? {
            user.add_category(category);
        }
        Ok(user)
    }
}

impl Persist for Comment {
    const SCHEMA: &'static Schema = &COMMENT_SCHEMA;

    fn to_record(&self) -> Record {
        Record::new(Self::KIND, self.comment_id())
            .with_field("author", FieldValue::Id(self.author.id()))
            .with_field("date", text(&self.date))
            .with_field("text", text(&self.text))
    }

    fn from_record(record: &Record, resolver: &Resolver<'_>) -> StoreResult<Self> {
        let author = resolver.resolve::<User>(record, record.reference("author")?)?;
        Ok(Comment::new(
            record.id,
            author,
            record.text("date")?,
            record.text("text")?,
        ))
    }
}

impl Persist for Event {
    const SCHEMA: &'static Schema = &EVENT_SCHEMA;

    fn to_record(&self) -> Record {
        let photo = match self.photo() {
            Some(photo) => text(photo),
            None => FieldValue::Null,
        };
        Record::new(Self::KIND, self.event_id())
            .with_field("title", text(self.title()))
            .with_field("author", FieldValue::Id(self.author().id()))
            .with_field("announcement", text(self.announcement()))
            .with_field("description", text(self.description()))
            .with_field("date", text(self.date()))
            .with_field("place", text(self.place()))
            .with_field("photo", photo)
            .with_field("category", FieldValue::Id(self.category().id()))
            .with_link("feedback", ids(self.feedback()))
    }

    fn from_record(record: &Record, resolver: &Resolver<'_>) -> StoreResult<Self> {
        let draft = EventDraft {
            title: record.text("title")?,
            author: resolver.resolve::<User>(record, record.reference("author")?)?,
            announcement: record.text("announcement")?,
            description: record.text("description")?,
            date: record.text("date")?,
            place: record.text("place")?,
            photo: record.optional_text("photo")?,
            category: resolver.resolve::<Category>(record, record.reference("category")?)?,
        };
        let mut event = Event::new(record.id, draft);
        for comment in resolver.resolve_links::<Comment>(record, "feedback")? {
            event.add_feedback(comment);
        }
        Ok(event)
    }
}
