// ABOUTME: Flat, backend-neutral form of an entity: ID, scalar fields, and link ID lists.
// ABOUTME: References are plain IDs here; Record::to_json is the field-map projection served over HTTP.

use eventhub_core::{EntityId, EntityKind};
use serde_json::{Map, Value};

use crate::error::{StoreError, StoreResult};
use crate::schema::{ColumnKind, Schema};

/// A scalar field value as stored by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    Id(EntityId),
    Null,
}

/// One stored entity in flat form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub kind: EntityKind,
    pub id: EntityId,
    pub fields: Vec<(&'static str, FieldValue)>,
    pub links: Vec<(&'static str, Vec<EntityId>)>,
}

impl Record {
    pub fn new(kind: EntityKind, id: EntityId) -> Self {
        Self {
            kind,
            id,
            fields: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: &'static str, value: FieldValue) -> Self {
        self.fields.push((name, value));
        self
    }

    pub fn with_link(mut self, name: &'static str, ids: Vec<EntityId>) -> Self {
        self.links.push((name, ids));
        self
    }

    pub fn value(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    fn require(&self, name: &str) -> StoreResult<&FieldValue> {
        self.value(name).ok_or_else(|| {
            StoreError::serialization(format!("{} {} is missing field {name}", self.kind, self.id))
        })
    }

    fn mismatch(&self, name: &str, expected: &str) -> StoreError {
        StoreError::serialization(format!(
            "{} {} field {name} is not {expected}",
            self.kind, self.id
        ))
    }

    pub fn text(&self, name: &str) -> StoreResult<String> {
        match self.require(name)? {
            FieldValue::Text(value) => Ok(value.clone()),
            _ => Err(self.mismatch(name, "text")),
        }
    }

    /// Absent and null both read as `None`.
    pub fn optional_text(&self, name: &str) -> StoreResult<Option<String>> {
        match self.value(name) {
            None | Some(FieldValue::Null) => Ok(None),
            Some(FieldValue::Text(value)) => Ok(Some(value.clone())),
            Some(_) => Err(self.mismatch(name, "text")),
        }
    }

    pub fn bool(&self, name: &str) -> StoreResult<bool> {
        match self.require(name)? {
            FieldValue::Bool(value) => Ok(*value),
            _ => Err(self.mismatch(name, "a boolean")),
        }
    }

    pub fn reference(&self, name: &str) -> StoreResult<EntityId> {
        match self.require(name)? {
            FieldValue::Id(id) => Ok(*id),
            _ => Err(self.mismatch(name, "an id")),
        }
    }

    /// IDs of a link collection, in stored order. An absent link is empty.
    pub fn link_ids(&self, name: &str) -> &[EntityId] {
        self.links
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, ids)| ids.as_slice())
            .unwrap_or(&[])
    }

    /// Every (kind, id) pair this record points at, references and link members alike.
    pub fn references(&self, schema: &Schema) -> Vec<(EntityKind, EntityId)> {
        let mut out = Vec::new();
        for column in schema.columns {
            if let (ColumnKind::Reference(target), Some(FieldValue::Id(id))) =
                (column.kind, self.value(column.name))
            {
                out.push((target, *id));
            }
        }
        for link in schema.links {
            out.extend(self.link_ids(link.name).iter().map(|id| (link.target, *id)));
        }
        out
    }

    /// Field-map projection: `id`, every scalar field under its name, every
    /// link as an integer array.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::from(self.id));
        for (name, value) in &self.fields {
            let json = match value {
                FieldValue::Text(text) => Value::from(text.as_str()),
                FieldValue::Bool(flag) => Value::from(*flag),
                FieldValue::Id(id) => Value::from(*id),
                FieldValue::Null => Value::Null,
            };
            map.insert((*name).to_string(), json);
        }
        for (name, ids) in &self.links {
            map.insert((*name).to_string(), Value::from(ids.clone()));
        }
        Value::Object(map)
    }
}

/// Find the single record with `id`. More than one match is store corruption.
pub fn find_unique<'a>(
    records: &'a [Record],
    kind: EntityKind,
    id: EntityId,
) -> StoreResult<Option<&'a Record>> {
    let mut matches = records.iter().filter(|r| r.id == id);
    let first = matches.next();
    let extra = matches.count();
    if extra > 0 {
        return Err(StoreError::DuplicateId {
            kind,
            id,
            count: extra + 1,
        });
    }
    Ok(first)
}

/// Reject an explicit ID that could never have been allocated.
pub fn ensure_storable_id(kind: EntityKind, id: EntityId) -> StoreResult<()> {
    if id < 1 {
        return Err(StoreError::InvalidId { kind, id });
    }
    Ok(())
}

/// The next ID an unassigned add receives: one past the current maximum, 1 when empty.
///
/// This is a linear scan per insert; the document backends accept O(n) here.
pub fn next_id_after(
    kind: EntityKind,
    ids: impl IntoIterator<Item = EntityId>,
) -> StoreResult<EntityId> {
    match ids.into_iter().max() {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or(StoreError::IdsExhausted { kind }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EVENT_SCHEMA;
    use serde_json::json;

    fn make_record(id: EntityId) -> Record {
        Record::new(EntityKind::Event, id)
            .with_field("title", FieldValue::Text("Conf".to_string()))
            .with_field("author", FieldValue::Id(3))
            .with_field("category", FieldValue::Id(4))
            .with_field("photo", FieldValue::Null)
            .with_link("feedback", vec![8, 9])
    }

    #[test]
    fn typed_accessors_read_fields() {
        let record = make_record(1);
        assert_eq!(record.text("title").unwrap(), "Conf");
        assert_eq!(record.reference("author").unwrap(), 3);
        assert_eq!(record.optional_text("photo").unwrap(), None);
        assert_eq!(record.link_ids("feedback"), &[8, 9]);
        assert!(record.link_ids("wishlist").is_empty());
    }

    #[test]
    fn accessors_reject_missing_and_mistyped_fields() {
        let record = make_record(1);
        assert!(matches!(
            record.text("place"),
            Err(StoreError::Serialization(_))
        ));
        assert!(matches!(
            record.bool("title"),
            Err(StoreError::Serialization(_))
        ));
    }

    #[test]
    fn references_cover_columns_and_links() {
        let refs = make_record(1).references(&EVENT_SCHEMA);
        assert_eq!(
            refs,
            vec![
                (EntityKind::User, 3),
                (EntityKind::Category, 4),
                (EntityKind::Comment, 8),
                (EntityKind::Comment, 9),
            ]
        );
    }

    #[test]
    fn to_json_projects_field_map() {
        assert_eq!(
            make_record(5).to_json(),
            json!({
                "id": 5,
                "title": "Conf",
                "author": 3,
                "category": 4,
                "photo": null,
                "feedback": [8, 9],
            })
        );
    }

    #[test]
    fn find_unique_flags_duplicates() {
        let records = vec![make_record(1), make_record(2), make_record(2)];
        assert_eq!(find_unique(&records, EntityKind::Event, 1).unwrap().unwrap().id, 1);
        assert!(find_unique(&records, EntityKind::Event, 7).unwrap().is_none());
        assert!(matches!(
            find_unique(&records, EntityKind::Event, 2),
            Err(StoreError::DuplicateId { count: 2, .. })
        ));
    }

    #[test]
    fn next_id_is_max_plus_one() {
        assert_eq!(next_id_after(EntityKind::Event, Vec::new()).unwrap(), 1);
        assert_eq!(next_id_after(EntityKind::Event, [3, 9, 4]).unwrap(), 10);
    }

    #[test]
    fn next_id_reports_exhaustion_instead_of_wrapping() {
        let err = next_id_after(EntityKind::Category, [1, EntityId::MAX]).unwrap_err();
        assert!(matches!(err, StoreError::IdsExhausted { kind: EntityKind::Category }));
    }

    #[test]
    fn ids_below_one_are_not_storable() {
        ensure_storable_id(EntityKind::User, 1).unwrap();
        for id in [0, -1, EntityId::MIN] {
            let err = ensure_storable_id(EntityKind::User, id).unwrap_err();
            assert!(matches!(err, StoreError::InvalidId { id: bad, .. } if bad == id));
        }
    }
}
