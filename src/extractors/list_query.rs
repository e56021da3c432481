//! List-endpoint query string: ids, filters and sort in one extractor.

use crate::error::AppError;
use crate::format::{EXTERNAL_ID_FIELD, ID_FIELD};
use crate::query::{get_filter_options, get_sort_options, FieldMappings, QueryOptions, RawQuery};
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};

/// Parsed `GET /` parameters. `id` may repeat; `field_like`, `field_in`, `_sort`, `_order` as usual.
#[derive(Clone, Debug, Default)]
pub struct ListQuery(pub QueryOptions);

impl ListQuery {
    pub fn from_raw(raw: &RawQuery) -> Self {
        let mappings: FieldMappings = [(EXTERNAL_ID_FIELD.to_string(), ID_FIELD.to_string())].into();
        ListQuery(QueryOptions {
            ids: raw.ids(),
            filters: Some(get_filter_options(raw, &mappings)),
            sort: Some(get_sort_options(raw)),
            additional_criteria: None,
        })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ListQuery
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|e| AppError::BadRequest(format!("invalid query string: {}", e)))?;
        Ok(ListQuery::from_raw(&RawQuery::from_pairs(pairs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Filter, SortOption, SortOrder};
    use axum::http::Request;

    async fn extract(uri: &str) -> QueryOptions {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        ListQuery::from_request_parts(&mut parts, &()).await.unwrap().0
    }

    #[tokio::test]
    async fn repeated_ids_filters_and_sort() {
        let options = extract("/api/movies?id=a&id=b&title_like=he&id_like=x&_sort=views&_order=desc").await;
        assert_eq!(options.ids, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(
            options.filters,
            Some(vec![Filter::contains("title", "he"), Filter::contains("_id", "x")])
        );
        assert_eq!(options.sort, Some(vec![SortOption::new("views", SortOrder::Desc)]));
    }

    #[tokio::test]
    async fn bare_request_sorts_newest_first() {
        let options = extract("/api/sections").await;
        assert_eq!(options.ids, None);
        assert_eq!(options.filters, Some(Vec::new()));
        assert_eq!(options.sort, Some(vec![SortOption::default_directive()]));
    }
}
