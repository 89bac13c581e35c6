// ABOUTME: Attribute-tagged XML encoding of entity documents, e.g. <events><event id="1" .../></events>.
// ABOUTME: One attribute per field; link collections are space-separated ID lists; absent optionals are omitted.

use std::borrow::Cow;
use std::collections::HashMap;

use eventhub_core::EntityId;
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::name::QName;

use crate::document::{DocumentFormat, DocumentRepository};
use crate::record::{FieldValue, Record};
use crate::schema::{ColumnKind, Schema};

/// XML-file repository of `T`, stored at `<dir>/<table>.xml`.
pub type XmlRepository<T> = DocumentRepository<T, XmlFormat>;

pub struct XmlFormat;

fn parse_id(element: &str, name: &str, raw: &str) -> Result<EntityId, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("<{element}> attribute {name}={raw:?} is not an integer id"))
}

fn parse_bool(element: &str, name: &str, raw: &str) -> Result<bool, String> {
    if raw.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(format!("<{element}> attribute {name}={raw:?} is not a boolean"))
    }
}

fn parse_element(schema: &'static Schema, element: &BytesStart<'_>) -> Result<Record, String> {
    let mut attrs: HashMap<String, String> = HashMap::new();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| e.to_string())?.into_owned();
        attrs.insert(key, value);
    }

    let tag = schema.element;
    let required = |name: &str| {
        attrs
            .get(name)
            .ok_or_else(|| format!("<{tag}> is missing attribute {name}"))
    };

    let id = parse_id(tag, "id", required("id")?)?;
    if id < 1 {
        return Err(format!("<{tag}> id {id} is below 1"));
    }
    let mut record = Record::new(schema.kind, id);

    for column in schema.columns {
        let value = match column.kind {
            ColumnKind::Text => FieldValue::Text(required(column.name)?.clone()),
            ColumnKind::OptionalText => attrs
                .get(column.name)
                .map_or(FieldValue::Null, |v| FieldValue::Text(v.clone())),
            ColumnKind::Bool => FieldValue::Bool(parse_bool(tag, column.name, required(column.name)?)?),
            ColumnKind::Reference(_) => {
                FieldValue::Id(parse_id(tag, column.name, required(column.name)?)?)
            }
        };
        record.fields.push((column.name, value));
    }

    for link in schema.links {
        let ids = match attrs.get(link.name) {
            Some(raw) => raw
                .split_whitespace()
                .map(|part| parse_id(tag, link.name, part))
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        record.links.push((link.name, ids));
    }

    Ok(record)
}

/// Escape an attribute value so that any conforming parser reads it back
/// unchanged. Tab, newline and carriage return become character references,
/// since attribute normalization would otherwise turn them into spaces.
fn escape_attribute(name: &str, value: &str) -> Result<String, String> {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' => out.push_str("&#9;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            c if c < ' ' || c == '\u{FFFE}' || c == '\u{FFFF}' => {
                return Err(format!(
                    "attribute {name} contains {c:?}, which XML 1.0 cannot represent"
                ));
            }
            c => out.push(c),
        }
    }
    Ok(out)
}

fn element_for(schema: &'static Schema, record: &Record) -> Result<BytesStart<'static>, String> {
    let mut element = BytesStart::new(schema.element);
    element.push_attribute(("id", record.id.to_string().as_str()));

    for column in schema.columns {
        let text = match record.value(column.name) {
            Some(FieldValue::Text(text)) => text.clone(),
            Some(FieldValue::Bool(flag)) => flag.to_string(),
            Some(FieldValue::Id(id)) => id.to_string(),
            Some(FieldValue::Null) | None => continue,
        };
        let escaped = escape_attribute(column.name, &text)?;
        element.push_attribute(Attribute {
            key: QName(column.name.as_bytes()),
            value: Cow::Owned(escaped.into_bytes()),
        });
    }

    for link in schema.links {
        let joined = record
            .link_ids(link.name)
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        element.push_attribute((link.name, joined.as_str()));
    }

    Ok(element)
}

impl DocumentFormat for XmlFormat {
    const EXTENSION: &'static str = "xml";

    fn decode(schema: &'static Schema, text: &str) -> Result<Vec<Record>, String> {
        let mut reader = Reader::from_str(text);
        reader.config_mut().trim_text(true);

        let mut records = Vec::new();
        let mut root_seen = false;
        loop {
            match reader.read_event().map_err(|e| e.to_string())? {
                Event::Start(e) | Event::Empty(e) if !root_seen => {
                    if e.name().as_ref() != schema.table.as_bytes() {
                        return Err(format!(
                            "expected root element <{}>, found <{}>",
                            schema.table,
                            String::from_utf8_lossy(e.name().as_ref())
                        ));
                    }
                    root_seen = true;
                }
                Event::Start(e) | Event::Empty(e) => {
                    if e.name().as_ref() != schema.element.as_bytes() {
                        return Err(format!(
                            "unexpected element <{}> inside <{}>",
                            String::from_utf8_lossy(e.name().as_ref()),
                            schema.table
                        ));
                    }
                    records.push(parse_element(schema, &e)?);
                }
                Event::Text(t) if !root_seen => {
                    return Err(format!(
                        "text before root element: {:?}",
                        String::from_utf8_lossy(&t)
                    ));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !root_seen {
            return Err(format!("missing root element <{}>", schema.table));
        }
        Ok(records)
    }

    fn encode(schema: &'static Schema, records: &[Record]) -> Result<String, String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| e.to_string())?;
        writer
            .write_event(Event::Start(BytesStart::new(schema.table)))
            .map_err(|e| e.to_string())?;
        for record in records {
            writer
                .write_event(Event::Empty(element_for(schema, record)?))
                .map_err(|e| e.to_string())?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(schema.table)))
            .map_err(|e| e.to_string())?;

        String::from_utf8(writer.into_inner()).map_err(|e| e.to_string())
    }
}
