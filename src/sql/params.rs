//! Parameters bound to document queries.

use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

/// A value bound to a placeholder. Field names travel as `Text`, so nothing from a request is
/// spliced into SQL.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlParam {
    Text(String),
    TextArray(Vec<String>),
    Json(Value),
}

/// Bind every parameter in placeholder order.
pub fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Text(s) => query.bind(s.clone()),
            SqlParam::TextArray(values) => query.bind(values.clone()),
            SqlParam::Json(v) => query.bind(v.clone()),
        };
    }
    query
}
