//! Persistence schema: form schema converted and flattened for runtime use by a model.

use serde_json::Value;
use std::collections::BTreeMap;

/// Storage primitive a scalar or list element is kept as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageType {
    Boolean,
    Number,
    String,
    /// Untyped object; stored as given.
    Object,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScalarField {
    pub storage: StorageType,
    pub required: bool,
    pub enum_values: Option<Vec<Value>>,
    pub default: Option<Value>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldDefinition {
    /// Declared without a recognized type; any value is kept as is.
    Untyped,
    Scalar(ScalarField),
    List(StorageType),
    /// Foreign-key references into `target`.
    ReferenceList { target: String },
    /// List of arbitrary values.
    MixedList,
}

impl FieldDefinition {
    pub fn is_list(&self) -> bool {
        matches!(
            self,
            FieldDefinition::List(_) | FieldDefinition::ReferenceList { .. } | FieldDefinition::MixedList
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PersistenceSchema {
    pub fields: BTreeMap<String, FieldDefinition>,
    /// Maintain `createdAt` / `updatedAt` automatically.
    pub timestamps: bool,
}

impl PersistenceSchema {
    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.get(name)
    }
}
