//! Turns stored documents into their external shape: bookkeeping removed, `id` exposed as a string.

use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const ID_FIELD: &str = "_id";
pub const VERSION_FIELD: &str = "__v";
pub const EXTERNAL_ID_FIELD: &str = "id";

/// A stored record: field name -> JSON value.
pub type Document = Map<String, Value>;

/// A resource with its external identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WithId<T> {
    pub id: String,
    #[serde(flatten)]
    pub data: T,
}

fn id_string(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Object(mut map) => match map.remove("$oid") {
            Some(Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => Value::Object(map).to_string(),
        },
        other => other.to_string(),
    }
}

/// Removes `__v`, and replaces `_id` with a string `id`. A document without `_id` keeps its `id`,
/// so formatting is idempotent.
pub fn format_document(mut doc: Document) -> Document {
    doc.remove(VERSION_FIELD);
    if let Some(raw) = doc.remove(ID_FIELD) {
        doc.insert(EXTERNAL_ID_FIELD.to_string(), Value::String(id_string(raw)));
    }
    doc
}

/// Formats and decodes a stored document into a typed resource.
pub fn format_entity<T: DeserializeOwned>(doc: Document) -> Result<WithId<T>, AppError> {
    let formatted = format_document(doc);
    Ok(serde_json::from_value(Value::Object(formatted))?)
}
