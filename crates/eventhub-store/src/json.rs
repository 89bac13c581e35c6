// ABOUTME: JSON encoding of entity documents: a top-level array of field-map objects.
// ABOUTME: References are integer IDs, collections integer arrays, absent optionals null.

use eventhub_core::EntityId;
use serde_json::{Map, Value};

use crate::document::{DocumentFormat, DocumentRepository};
use crate::record::{FieldValue, Record};
use crate::schema::{ColumnKind, Schema};

/// JSON-file repository of `T`, stored at `<dir>/<table>.json`.
pub type JsonRepository<T> = DocumentRepository<T, JsonFormat>;

pub struct JsonFormat;

fn id_value(object: &Map<String, Value>, name: &str) -> Result<EntityId, String> {
    object
        .get(name)
        .and_then(Value::as_i64)
        .ok_or_else(|| format!("field {name} must be an integer id"))
}

fn parse_object(schema: &'static Schema, value: &Value) -> Result<Record, String> {
    let object = value
        .as_object()
        .ok_or_else(|| format!("{} entry is not an object", schema.element))?;

    let id = id_value(object, "id")?;
    if id < 1 {
        return Err(format!("{} id {id} is below 1", schema.element));
    }
    let mut record = Record::new(schema.kind, id);
    for column in schema.columns {
        let raw = object.get(column.name);
        let value = match (column.kind, raw) {
            (ColumnKind::Text, Some(Value::String(text))) => FieldValue::Text(text.clone()),
            (ColumnKind::OptionalText, None | Some(Value::Null)) => FieldValue::Null,
            (ColumnKind::OptionalText, Some(Value::String(text))) => {
                FieldValue::Text(text.clone())
            }
            (ColumnKind::Bool, Some(Value::Bool(flag))) => FieldValue::Bool(*flag),
            (ColumnKind::Reference(_), _) => FieldValue::Id(id_value(object, column.name)?),
            (_, None) => {
                return Err(format!(
                    "{} {} is missing field {}",
                    schema.element, record.id, column.name
                ));
            }
            (_, Some(other)) => {
                return Err(format!(
                    "{} {} field {} has unexpected value {other}",
                    schema.element, record.id, column.name
                ));
            }
        };
        record.fields.push((column.name, value));
    }

    for link in schema.links {
        let ids = match object.get(link.name) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| {
                    item.as_i64()
                        .ok_or_else(|| format!("{} entries must be integer ids", link.name))
                })
                .collect::<Result<Vec<_>, _>>()?,
            Some(other) => return Err(format!("{} must be an array, found {other}", link.name)),
        };
        record.links.push((link.name, ids));
    }

    Ok(record)
}

impl DocumentFormat for JsonFormat {
    const EXTENSION: &'static str = "json";

    fn decode(schema: &'static Schema, text: &str) -> Result<Vec<Record>, String> {
        let document: Value = serde_json::from_str(text).map_err(|e| e.to_string())?;
        let entries = document
            .as_array()
            .ok_or_else(|| format!("top level of {}.json must be an array", schema.table))?;
        entries.iter().map(|v| parse_object(schema, v)).collect()
    }

    fn encode(_schema: &'static Schema, records: &[Record]) -> Result<String, String> {
        let document = Value::Array(records.iter().map(Record::to_json).collect());
        serde_json::to_string_pretty(&document).map_err(|e| e.to_string())
    }
}
