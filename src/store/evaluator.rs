//! Criterion evaluation and ordering for in-memory documents.
//!
//! Matching follows document-database conventions: a criterion on a list field matches when any
//! element matches, numbers compare by value regardless of representation, and patterns only
//! match strings.

use crate::error::StoreError;
use crate::format::{Document, ID_FIELD};
use crate::query::{Criterion, Query, SortDirection, SortMap};
use regex::{Regex, RegexBuilder};
use serde_json::Value;
use std::cmp::Ordering;

enum Matcher {
    Eq(Value),
    Pattern(Regex),
    In(Vec<Value>),
    IdIn(Vec<String>),
}

/// A query with its patterns compiled.
pub(crate) struct CompiledQuery {
    matchers: Vec<(String, Matcher)>,
}

impl CompiledQuery {
    pub fn compile(query: &Query) -> Result<Self, StoreError> {
        let mut matchers = Vec::with_capacity(query.len());
        for (field, criterion) in query.iter() {
            let matcher = match criterion {
                Criterion::Eq(v) => Matcher::Eq(v.clone()),
                Criterion::Pattern(p) => Matcher::Pattern(compile_pattern(p)?),
                Criterion::In(values) => Matcher::In(values.clone()),
                Criterion::IdIn(ids) => Matcher::IdIn(ids.iter().map(|id| id.as_key()).collect()),
            };
            matchers.push((field.to_string(), matcher));
        }
        Ok(CompiledQuery { matchers })
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.matchers
            .iter()
            .all(|(field, matcher)| field_matches(doc.get(field), matcher))
    }
}

/// Case-insensitive, as substring search.
pub(crate) fn compile_pattern(pattern: &str) -> Result<Regex, StoreError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| StoreError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })
}

fn field_matches(value: Option<&Value>, matcher: &Matcher) -> bool {
    match matcher {
        Matcher::Eq(Value::Null) => matches!(value, None | Some(Value::Null)),
        Matcher::Eq(expected) => value.is_some_and(|v| any_element(v, |e| values_equal(e, expected))),
        Matcher::Pattern(re) => value.is_some_and(|v| {
            any_element(v, |e| e.as_str().is_some_and(|s| re.is_match(s)))
        }),
        Matcher::In(candidates) => value.is_some_and(|v| {
            any_element(v, |e| candidates.iter().any(|c| values_equal(e, c)))
        }),
        Matcher::IdIn(ids) => value.and_then(Value::as_str).is_some_and(|id| ids.iter().any(|k| k == id)),
    }
}

/// Tests the value itself, then each element when it is a list.
fn any_element(value: &Value, pred: impl Fn(&Value) -> bool) -> bool {
    if pred(value) {
        return true;
    }
    match value {
        Value::Array(items) => items.iter().any(pred),
        _ => false,
    }
}

pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        _ => a == b,
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Null) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Object(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Bool(_)) => 6,
    }
}

/// Total order over optional JSON values: by type rank, then by value within a type.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Array(xs)), Some(Value::Array(ys))) => xs
            .iter()
            .zip(ys)
            .map(|(x, y)| compare_values(Some(x), Some(y)))
            .find(|o| *o != Ordering::Equal)
            .unwrap_or_else(|| xs.len().cmp(&ys.len())),
        (Some(Value::Object(x)), Some(Value::Object(y))) => x.len().cmp(&y.len()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Stable: documents equal under every key keep their relative order.
pub(crate) fn sort_documents(docs: &mut [Document], sort: &SortMap) {
    if sort.is_empty() {
        return;
    }
    docs.sort_by(|a, b| {
        sort.iter()
            .map(|(field, direction)| {
                let ord = compare_values(a.get(field), b.get(field));
                match direction {
                    SortDirection::Ascending => ord,
                    SortDirection::Descending => ord.reverse(),
                }
            })
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    });
}

pub(crate) fn document_id(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::IdValue;
    use serde_json::json;

    fn doc(v: Value) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn equality_reaches_into_lists_and_normalizes_numbers() {
        let d = doc(json!({"tags": ["drama", "crime"], "views": 10}));
        let q = CompiledQuery::compile(&Query::new().with("tags", Criterion::Eq(json!("crime")))).unwrap();
        assert!(q.matches(&d));
        let q = CompiledQuery::compile(&Query::new().with("views", Criterion::Eq(json!(10.0)))).unwrap();
        assert!(q.matches(&d));
        let q = CompiledQuery::compile(&Query::new().with("views", Criterion::Eq(json!("10")))).unwrap();
        assert!(!q.matches(&d));
    }

    #[test]
    fn patterns_are_case_insensitive_and_string_only() {
        let d = doc(json!({"title": "Star Wars", "views": 5}));
        let q = CompiledQuery::compile(&Query::new().with("title", Criterion::Pattern("star".into()))).unwrap();
        assert!(q.matches(&d));
        let q = CompiledQuery::compile(&Query::new().with("views", Criterion::Pattern("5".into()))).unwrap();
        assert!(!q.matches(&d));
    }

    #[test]
    fn invalid_patterns_are_reported() {
        let err = CompiledQuery::compile(&Query::new().with("title", Criterion::Pattern("(".into())));
        assert!(matches!(err, Err(StoreError::InvalidPattern { .. })));
    }

    #[test]
    fn membership_and_id_lists() {
        let d = doc(json!({"_id": "abc", "genre": "drama"}));
        let q = Query::new()
            .with("genre", Criterion::In(vec![json!("comedy"), json!("drama")]))
            .with("_id", Criterion::IdIn(vec![IdValue::parse("abc")]));
        assert!(CompiledQuery::compile(&q).unwrap().matches(&d));
        let q = Query::new().with("_id", Criterion::IdIn(vec![IdValue::parse("zzz")]));
        assert!(!CompiledQuery::compile(&q).unwrap().matches(&d));
    }

    #[test]
    fn sorting_ranks_types_and_is_stable() {
        let mut docs = vec![
            doc(json!({"n": 1, "k": "b"})),
            doc(json!({"k": "missing"})),
            doc(json!({"n": "x", "k": "s"})),
            doc(json!({"n": 1, "k": "a"})),
        ];
        sort_documents(&mut docs, &SortMap::new().with("n", SortDirection::Ascending));
        let keys: Vec<&str> = docs.iter().map(|d| d["k"].as_str().unwrap()).collect();
        assert_eq!(keys, vec!["missing", "b", "a", "s"]);
    }
}
