//! Composes id lists, filters and server-side criteria into one store query plus a sort map.

use crate::format::ID_FIELD;
use crate::query::filter::{Filter, FilterOperator};
use crate::query::sort::{SortOption, SortOrder, DEFAULT_SORT_FIELD};
use serde_json::Value;

/// An identifier from a request. Well-formed ids are parsed; anything else is passed through.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IdValue {
    Native(uuid::Uuid),
    Raw(String),
}

impl IdValue {
    pub fn parse(s: &str) -> Self {
        match uuid::Uuid::parse_str(s) {
            Ok(u) => IdValue::Native(u),
            Err(_) => IdValue::Raw(s.to_string()),
        }
    }

    /// Canonical string form used as the stored key.
    pub fn as_key(&self) -> String {
        match self {
            IdValue::Native(u) => u.to_string(),
            IdValue::Raw(s) => s.clone(),
        }
    }
}

/// One constraint on a document field.
#[derive(Clone, Debug, PartialEq)]
pub enum Criterion {
    Eq(Value),
    /// Case-insensitive regular expression match.
    Pattern(String),
    In(Vec<Value>),
    IdIn(Vec<IdValue>),
}

/// Field -> criterion, in insertion order. Setting a field again replaces its criterion in place.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    criteria: Vec<(String, Criterion)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, criterion: Criterion) -> Self {
        self.set(field, criterion);
        self
    }

    pub fn set(&mut self, field: &str, criterion: Criterion) {
        match self.criteria.iter_mut().find(|(f, _)| f == field) {
            Some((_, existing)) => *existing = criterion,
            None => self.criteria.push((field.to_string(), criterion)),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Criterion> {
        self.criteria.iter().find(|(f, _)| f == field).map(|(_, c)| c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Criterion)> {
        self.criteria.iter().map(|(f, c)| (f.as_str(), c))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut Criterion)> {
        self.criteria.iter_mut().map(|(f, c)| (f.as_str(), c))
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn len(&self) -> usize {
        self.criteria.len()
    }

    /// Query matching any of the given ids.
    pub fn ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Query::new().with(
            ID_FIELD,
            Criterion::IdIn(ids.into_iter().map(|id| IdValue::parse(id.as_ref())).collect()),
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn signum(&self) -> i8 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

impl From<SortOrder> for SortDirection {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => SortDirection::Ascending,
            SortOrder::Desc => SortDirection::Descending,
        }
    }
}

/// Field -> direction in priority order. Repeating a field updates its direction, not its priority.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SortMap {
    keys: Vec<(String, SortDirection)>,
}

impl SortMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: &str, direction: SortDirection) -> Self {
        self.set(field, direction);
        self
    }

    pub fn set(&mut self, field: &str, direction: SortDirection) {
        match self.keys.iter_mut().find(|(f, _)| f == field) {
            Some((_, existing)) => *existing = direction,
            None => self.keys.push((field.to_string(), direction)),
        }
    }

    pub fn get(&self, field: &str) -> Option<SortDirection> {
        self.keys.iter().find(|(f, _)| f == field).map(|(_, d)| *d)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SortDirection)> {
        self.keys.iter().map(|(f, d)| (f.as_str(), *d))
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

/// Input to a "get many" operation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryOptions {
    pub ids: Option<Vec<String>>,
    pub filters: Option<Vec<Filter>>,
    pub sort: Option<Vec<SortOption>>,
    /// Server-side criteria; merged last and win over filters on the same field.
    pub additional_criteria: Option<Vec<(String, Criterion)>>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BuiltQuery {
    pub query: Query,
    pub sort: SortMap,
}

fn filter_criterion(operator: &FilterOperator) -> Criterion {
    match operator {
        FilterOperator::Eq(v) => Criterion::Eq(Value::String(v.clone())),
        FilterOperator::Contains(v) => Criterion::Pattern(v.clone()),
        FilterOperator::In(values) => Criterion::In(values.iter().cloned().map(Value::String).collect()),
    }
}

/// Pure: no I/O, inputs untouched. Later filters on the same field replace earlier ones.
pub fn build_query(options: &QueryOptions) -> BuiltQuery {
    let mut query = Query::new();

    if let Some(ids) = options.ids.as_ref().filter(|ids| !ids.is_empty()) {
        query.set(ID_FIELD, Criterion::IdIn(ids.iter().map(|id| IdValue::parse(id)).collect()));
    }

    for filter in options.filters.iter().flatten() {
        query.set(&filter.field, filter_criterion(&filter.operator));
    }

    for (field, criterion) in options.additional_criteria.iter().flatten() {
        query.set(field, criterion.clone());
    }

    let sort = match &options.sort {
        Some(directives) => directives.iter().fold(SortMap::new(), |map, directive| {
            map.with(&directive.field, directive.order.into())
        }),
        None => SortMap::new().with(DEFAULT_SORT_FIELD, SortDirection::Descending),
    };

    BuiltQuery { query, sort }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn additional_criteria_win_over_filters() {
        let options = QueryOptions {
            ids: Some(vec!["1".into()]),
            filters: Some(vec![Filter::eq("x", "a")]),
            additional_criteria: Some(vec![("x".into(), Criterion::Eq(json!("b")))]),
            sort: None,
        };
        let built = build_query(&options);
        assert_eq!(built.query.get("x"), Some(&Criterion::Eq(json!("b"))));
        assert_eq!(
            built.query.get("_id"),
            Some(&Criterion::IdIn(vec![IdValue::Raw("1".into())]))
        );
    }

    #[test]
    fn valid_ids_are_parsed_and_malformed_ones_pass_through() {
        let id = "6f1c2a8e-1d2b-4c3d-9e4f-5a6b7c8d9e0f";
        let built = build_query(&QueryOptions {
            ids: Some(vec![id.to_uppercase(), "legacy".into()]),
            ..Default::default()
        });
        match built.query.get("_id") {
            Some(Criterion::IdIn(values)) => {
                assert_eq!(values[0].as_key(), id);
                assert_eq!(values[1], IdValue::Raw("legacy".into()));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn filters_translate_per_operator_and_last_one_wins() {
        let built = build_query(&QueryOptions {
            filters: Some(vec![
                Filter::contains("title", "Star"),
                Filter::one_of("tags", ["x", "y"]),
                Filter::eq("genre", "drama"),
                Filter::eq("title", "Exact"),
            ]),
            ..Default::default()
        });
        assert_eq!(built.query.get("title"), Some(&Criterion::Eq(json!("Exact"))));
        assert_eq!(built.query.get("tags"), Some(&Criterion::In(vec![json!("x"), json!("y")])));
        assert_eq!(built.query.get("genre"), Some(&Criterion::Eq(json!("drama"))));
        assert_eq!(built.query.len(), 3);
        assert_eq!(built.query.get("_id"), None);
    }

    #[test]
    fn sort_defaults_to_created_at_descending() {
        let built = build_query(&QueryOptions::default());
        assert_eq!(built.sort, SortMap::new().with("createdAt", SortDirection::Descending));
        assert!(built.query.is_empty());
    }

    #[test]
    fn sort_folds_directives() {
        let built = build_query(&QueryOptions {
            sort: Some(vec![
                SortOption::new("title", SortOrder::Asc),
                SortOption::new("views", SortOrder::Desc),
            ]),
            ..Default::default()
        });
        let keys: Vec<(&str, i8)> = built.sort.iter().map(|(f, d)| (f, d.signum())).collect();
        assert_eq!(keys, vec![("title", 1), ("views", -1)]);
    }

    #[test]
    fn empty_sort_list_yields_empty_map() {
        let built = build_query(&QueryOptions {
            sort: Some(Vec::new()),
            ..Default::default()
        });
        assert!(built.sort.is_empty());
    }
}
