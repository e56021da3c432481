//! Declarative form schema types (the JSON-Schema dialect the admin forms are written in).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Semantic type of a form property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Boolean,
    Number,
    String,
    Object,
    Array,
}

impl std::str::FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "boolean" => Ok(PropertyType::Boolean),
            "number" => Ok(PropertyType::Number),
            "string" => Ok(PropertyType::String),
            "object" => Ok(PropertyType::Object),
            "array" => Ok(PropertyType::Array),
            other => Err(format!("unsupported property type: {}", other)),
        }
    }
}

/// Unrecognized type names (e.g. "integer", "null") deserialize as `None` instead of failing.
fn lenient_type<'de, D>(deserializer: D) -> Result<Option<PropertyType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok()))
}

/// One field of a form schema.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaProperty {
    #[serde(rename = "type", default, deserialize_with = "lenient_type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<PropertyType>,
    /// Field names this property marks as required. A property is required when it lists its own name.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaProperty>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SchemaProperty {
    pub fn of(kind: PropertyType) -> Self {
        SchemaProperty {
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn string() -> Self {
        Self::of(PropertyType::String)
    }

    pub fn number() -> Self {
        Self::of(PropertyType::Number)
    }

    pub fn array_of(items: SchemaProperty) -> Self {
        SchemaProperty {
            kind: Some(PropertyType::Array),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// Property with no type, only an enum restriction (as used in dependency alternatives).
    pub fn enumeration<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        SchemaProperty {
            enum_values: Some(values.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: &str) -> Self {
        self.title = Some(title.to_string());
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_enum<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required_as(mut self, name: &str) -> Self {
        self.required.push(name.to_string());
        self
    }
}

/// One alternative of a `oneOf` dependency.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DependencyAlternative {
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaProperty>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

/// Conditional sub-schemas keyed by a discriminator field.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Dependency {
    #[serde(rename = "oneOf", default)]
    pub one_of: Vec<DependencyAlternative>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormSchema {
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaProperty>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, Dependency>,
}

impl FormSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(mut self, name: &str, property: SchemaProperty) -> Self {
        self.properties.insert(name.to_string(), property);
        self
    }

    pub fn required<I: IntoIterator<Item = &'static str>>(mut self, names: I) -> Self {
        self.required.extend(names.into_iter().map(String::from));
        self
    }

    pub fn dependency(mut self, discriminator: &str, dependency: Dependency) -> Self {
        self.dependencies.insert(discriminator.to_string(), dependency);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unknown_type_deserializes_as_untyped() {
        let prop: SchemaProperty = serde_json::from_value(json!({ "type": "integer", "title": "Count" })).unwrap();
        assert_eq!(prop.kind, None);
        assert_eq!(prop.title.as_deref(), Some("Count"));
    }

    #[test]
    fn form_schema_reads_one_of_dependencies() {
        let schema: FormSchema = serde_json::from_value(json!({
            "properties": { "type": { "type": "string" } },
            "dependencies": {
                "type": { "oneOf": [ { "properties": { "items": { "type": "array", "items": { "type": "string" } } } } ] }
            }
        }))
        .unwrap();
        let alt = &schema.dependencies["type"].one_of[0];
        assert_eq!(alt.properties["items"].kind, Some(PropertyType::Array));
    }
}
