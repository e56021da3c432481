//! Value casting and validation against a persistence schema.

use crate::error::AppError;
use crate::format::Document;
use crate::schema::{FieldDefinition, PersistenceSchema, ScalarField, StorageType};
use serde_json::{Number, Value};

fn cast_failed(field: &str, value: &Value, storage: StorageType) -> AppError {
    AppError::Validation(format!("{} must be a {:?}, got {}", field, storage, value))
}

/// Cast one scalar to its storage type. `None` when the value cannot be represented.
pub fn cast_scalar(value: &Value, storage: StorageType) -> Option<Value> {
    match (storage, value) {
        (_, Value::Null) => Some(Value::Null),
        (StorageType::Object, v) => Some(v.clone()),
        (StorageType::Number, Value::Number(_)) => Some(value.clone()),
        (StorageType::Number, Value::String(s)) => parse_number(s.trim()).map(Value::Number),
        (StorageType::Number, Value::Bool(b)) => Some(Value::from(u8::from(*b))),
        (StorageType::Boolean, Value::Bool(_)) => Some(value.clone()),
        (StorageType::Boolean, Value::String(s)) => match s.as_str() {
            "true" | "1" => Some(Value::Bool(true)),
            "false" | "0" => Some(Value::Bool(false)),
            _ => None,
        },
        (StorageType::Boolean, Value::Number(n)) => match n.as_f64() {
            Some(x) if x == 1.0 => Some(Value::Bool(true)),
            Some(x) if x == 0.0 => Some(Value::Bool(false)),
            _ => None,
        },
        (StorageType::String, Value::String(_)) => Some(value.clone()),
        (StorageType::String, Value::Number(n)) => Some(Value::String(n.to_string())),
        (StorageType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
        _ => None,
    }
}

fn parse_number(s: &str) -> Option<Number> {
    if s.is_empty() {
        return None;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}

/// Element storage of a field, if it has one.
pub fn element_storage(def: &FieldDefinition) -> Option<StorageType> {
    match def {
        FieldDefinition::Scalar(ScalarField { storage, .. }) => Some(*storage),
        FieldDefinition::List(storage) => Some(*storage),
        FieldDefinition::ReferenceList { .. } => Some(StorageType::String),
        FieldDefinition::Untyped | FieldDefinition::MixedList => None,
    }
}

/// Cast a written value to the field's shape. Lists accept a scalar as a one-element list.
pub fn cast_field(field: &str, def: &FieldDefinition, value: Value) -> Result<Value, AppError> {
    match def {
        FieldDefinition::Untyped => Ok(value),
        FieldDefinition::Scalar(scalar) => {
            cast_scalar(&value, scalar.storage).ok_or_else(|| cast_failed(field, &value, scalar.storage))
        }
        FieldDefinition::MixedList => Ok(match value {
            Value::Null | Value::Array(_) => value,
            other => Value::Array(vec![other]),
        }),
        FieldDefinition::List(_) | FieldDefinition::ReferenceList { .. } => {
            let storage = element_storage(def).unwrap_or(StorageType::Object);
            let items = match value {
                Value::Null => return Ok(Value::Null),
                Value::Array(items) => items,
                other => vec![other],
            };
            items
                .into_iter()
                .map(|item| cast_scalar(&item, storage).ok_or_else(|| cast_failed(field, &item, storage)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array)
        }
    }
}

fn is_blank(v: Option<&Value>) -> bool {
    match v {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        _ => false,
    }
}

fn value_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(s), Value::String(t)) => s == t,
        (Value::Number(n), Value::Number(m)) => n.as_f64() == m.as_f64(),
        _ => a == b,
    }
}

fn check_enum(name: &str, scalar: &ScalarField, val: Option<&Value>) -> Result<(), AppError> {
    if let (Some(v), Some(allowed)) = (val, &scalar.enum_values) {
        if !v.is_null() && !allowed.iter().any(|a| value_eq(v, a)) {
            return Err(AppError::Validation(format!(
                "{} must be one of: {}",
                name,
                allowed.iter().map(Value::to_string).collect::<Vec<_>>().join(", ")
            )));
        }
    }
    Ok(())
}

/// Required and enum rules over a complete document.
pub fn validate_document(doc: &Document, schema: &PersistenceSchema) -> Result<(), AppError> {
    for (name, def) in &schema.fields {
        let FieldDefinition::Scalar(scalar) = def else { continue };
        let val = doc.get(name);
        if scalar.required && is_blank(val) {
            return Err(AppError::Validation(format!("{} is required", name)));
        }
        check_enum(name, scalar, val)?;
    }
    Ok(())
}

/// Enum rules over the fields present in a partial update. Missing fields are not required.
pub fn validate_partial(patch: &Document, schema: &PersistenceSchema) -> Result<(), AppError> {
    for (name, v) in patch {
        if let Some(FieldDefinition::Scalar(scalar)) = schema.field(name) {
            check_enum(name, scalar, Some(v))?;
        }
    }
    Ok(())
}
