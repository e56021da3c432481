//! Form schema -> persistence schema. Runs once per resource type at startup.

use crate::schema::resolved::{FieldDefinition, PersistenceSchema, ScalarField, StorageType};
use crate::schema::types::{Dependency, FormSchema, PropertyType, SchemaProperty};
use std::collections::BTreeMap;

/// Array property name that holds movie references instead of plain strings.
pub const REFERENCE_LIST_FIELD: &str = "items";
/// Collection the reference list points at.
pub const REFERENCE_TARGET: &str = "Movie";

/// Build the persistence schema for a form schema. Never fails: unknown shapes become untyped fields.
pub fn convert(schema: &FormSchema) -> PersistenceSchema {
    let mut fields: BTreeMap<String, FieldDefinition> = schema
        .properties
        .iter()
        .map(|(name, prop)| (name.clone(), convert_property(name, prop)))
        .collect();

    for (name, prop) in dependency_properties(&schema.dependencies) {
        if !fields.contains_key(&name) {
            let def = convert_property(&name, &prop);
            fields.insert(name, def);
        }
    }

    PersistenceSchema {
        fields,
        timestamps: true,
    }
}

fn storage_type(kind: PropertyType) -> Option<StorageType> {
    match kind {
        PropertyType::Boolean => Some(StorageType::Boolean),
        PropertyType::Number => Some(StorageType::Number),
        PropertyType::String => Some(StorageType::String),
        PropertyType::Object => Some(StorageType::Object),
        PropertyType::Array => None,
    }
}

fn convert_property(name: &str, prop: &SchemaProperty) -> FieldDefinition {
    let Some(kind) = prop.kind else {
        return FieldDefinition::Untyped;
    };
    if let Some(storage) = storage_type(kind) {
        return FieldDefinition::Scalar(ScalarField {
            storage,
            required: prop.required.iter().any(|r| r == name),
            enum_values: prop.enum_values.clone(),
            default: prop.default.clone(),
        });
    }

    let item_kind = prop.items.as_ref().and_then(|items| items.kind);
    match item_kind {
        Some(PropertyType::String) if name == REFERENCE_LIST_FIELD => FieldDefinition::ReferenceList {
            target: REFERENCE_TARGET.to_string(),
        },
        Some(k) => storage_type(k).map(FieldDefinition::List).unwrap_or(FieldDefinition::MixedList),
        None => FieldDefinition::MixedList,
    }
}

/// Properties declared inside `oneOf` alternatives; the first alternative declaring a name wins.
fn dependency_properties(dependencies: &BTreeMap<String, Dependency>) -> BTreeMap<String, SchemaProperty> {
    let mut out = BTreeMap::new();
    for dependency in dependencies.values() {
        for alternative in &dependency.one_of {
            for (name, prop) in &alternative.properties {
                out.entry(name.clone()).or_insert_with(|| prop.clone());
            }
        }
    }
    out
}
