//! Filter extraction from list query parameters.
//!
//! Naming convention: `field_like` is a case-insensitive contains, `field_in` is set membership,
//! any other `field` is an exact match. Keys starting with `_` are reserved for sorting and
//! pagination; `id` is carried by the id-list path instead.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A query parameter value: one occurrence or a repeated key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryValue {
    Single(String),
    Many(Vec<String>),
}

impl QueryValue {
    /// Empty single values count as absent.
    pub fn is_present(&self) -> bool {
        match self {
            QueryValue::Single(s) => !s.is_empty(),
            QueryValue::Many(_) => true,
        }
    }

    pub fn to_list(&self) -> Vec<String> {
        match self {
            QueryValue::Single(s) => vec![s.clone()],
            QueryValue::Many(v) => v.clone(),
        }
    }

    /// Scalar rendering; repeated values are joined with commas.
    pub fn to_scalar(&self) -> String {
        match self {
            QueryValue::Single(s) => s.clone(),
            QueryValue::Many(v) => v.join(","),
        }
    }
}

/// Query parameters in request order, repeated keys grouped under their first position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawQuery {
    entries: Vec<(String, QueryValue)>,
}

impl RawQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group decoded `key=value` pairs. A trailing `[]` on a key (`tags_in[]=x`) is dropped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut raw = RawQuery::new();
        for (k, v) in pairs {
            let key: String = k.into();
            let key = key.strip_suffix("[]").map(str::to_string).unwrap_or(key);
            raw.append(key, v.into());
        }
        raw
    }

    pub fn append(&mut self, key: String, value: String) {
        if let Some((_, existing)) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            let merged = match std::mem::replace(existing, QueryValue::Many(Vec::new())) {
                QueryValue::Single(first) => vec![first, value],
                QueryValue::Many(mut values) => {
                    values.push(value);
                    values
                }
            };
            *existing = QueryValue::Many(merged);
        } else {
            self.entries.push((key, QueryValue::Single(value)));
        }
    }

    pub fn insert(mut self, key: &str, value: QueryValue) -> Self {
        self.entries.retain(|(k, _)| k != key);
        self.entries.push((key.to_string(), value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Ids requested through the `id` parameter (single or repeated).
    pub fn ids(&self) -> Option<Vec<String>> {
        self.get(ID_PARAM)
            .filter(|v| v.is_present())
            .map(QueryValue::to_list)
    }
}

const ID_PARAM: &str = "id";
const LIKE_SUFFIX: &str = "_like";
const IN_SUFFIX: &str = "_in";

/// Operator and operand of a filter. `contains` and `eq` always hold one string, `in` a list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operator", content = "value", rename_all = "lowercase")]
pub enum FilterOperator {
    Eq(String),
    Contains(String),
    In(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    #[serde(flatten)]
    pub operator: FilterOperator,
}

impl Filter {
    pub fn eq(field: &str, value: &str) -> Self {
        Filter {
            field: field.to_string(),
            operator: FilterOperator::Eq(value.to_string()),
        }
    }

    pub fn contains(field: &str, value: &str) -> Self {
        Filter {
            field: field.to_string(),
            operator: FilterOperator::Contains(value.to_string()),
        }
    }

    pub fn one_of<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter {
            field: field.to_string(),
            operator: FilterOperator::In(values.into_iter().map(Into::into).collect()),
        }
    }
}

/// Query parameter name -> document field name.
pub type FieldMappings = HashMap<String, String>;

fn mapped(field: &str, mappings: &FieldMappings) -> String {
    mappings.get(field).cloned().unwrap_or_else(|| field.to_string())
}

/// Extract filters from raw query parameters, in parameter order.
pub fn get_filter_options(query: &RawQuery, field_mappings: &FieldMappings) -> Vec<Filter> {
    let mut filters = Vec::new();
    for (key, value) in query.iter() {
        if !value.is_present() || key.starts_with('_') {
            continue;
        }
        let filter = if let Some(field) = key.strip_suffix(LIKE_SUFFIX) {
            Filter {
                field: mapped(field, field_mappings),
                operator: FilterOperator::Contains(value.to_scalar()),
            }
        } else if let Some(field) = key.strip_suffix(IN_SUFFIX) {
            let values = value.to_list().into_iter().filter(|v| !v.is_empty()).collect();
            Filter {
                field: mapped(field, field_mappings),
                operator: FilterOperator::In(values),
            }
        } else if key == ID_PARAM {
            continue;
        } else {
            Filter {
                field: mapped(key, field_mappings),
                operator: FilterOperator::Eq(value.to_scalar()),
            }
        };
        filters.push(filter);
    }
    tracing::debug!(filters = ?filters, "parsed filters");
    filters
}
