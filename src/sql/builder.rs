//! Builds parameterized SQL over JSONB document tables.
//!
//! Each collection is a table `(id TEXT PRIMARY KEY, document JSONB, seq BIGSERIAL)`. Identifiers
//! (schema, collection) come from code; field names and values are always parameters.

use crate::error::StoreError;
use crate::format::Document;
use crate::query::{Criterion, Query, SortDirection, SortMap};
use crate::sql::params::SqlParam;
use crate::store::compile_pattern;
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from code).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
pub fn qualified_table(schema: &str, collection: &str) -> String {
    format!("{}.{}", quoted(schema), quoted(collection))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: SqlParam) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

pub fn create_schema(schema: &str) -> String {
    format!("CREATE SCHEMA IF NOT EXISTS {}", quoted(schema))
}

pub fn create_table(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY, document JSONB NOT NULL, seq BIGSERIAL NOT NULL)",
        table
    )
}

/// Elements of a field: the list itself, or a one-element list around a scalar.
fn elements(field: usize) -> String {
    format!(
        "jsonb_array_elements(CASE jsonb_typeof(document -> ${f}::text) WHEN 'array' THEN document -> ${f}::text ELSE jsonb_build_array(document -> ${f}::text) END)",
        f = field
    )
}

fn criterion_sql(q: &mut QueryBuf, field: &str, criterion: &Criterion) -> Result<String, StoreError> {
    let sql = match criterion {
        Criterion::IdIn(ids) => {
            let n = q.push_param(SqlParam::TextArray(ids.iter().map(|id| id.as_key()).collect()));
            format!("id = ANY(${}::text[])", n)
        }
        Criterion::Eq(Value::Null) => {
            let f = q.push_param(SqlParam::Text(field.to_string()));
            format!("(document -> ${f}::text IS NULL OR document -> ${f}::text = 'null'::jsonb)", f = f)
        }
        Criterion::Eq(value) => {
            let f = q.push_param(SqlParam::Text(field.to_string()));
            let n = q.push_param(SqlParam::Json(value.clone()));
            format!(
                "(document -> ${f}::text = ${n}::jsonb OR EXISTS (SELECT 1 FROM {els} AS e(v) WHERE e.v = ${n}::jsonb))",
                f = f,
                n = n,
                els = elements(f)
            )
        }
        Criterion::Pattern(pattern) => {
            compile_pattern(pattern)?;
            let f = q.push_param(SqlParam::Text(field.to_string()));
            let n = q.push_param(SqlParam::Text(pattern.clone()));
            format!(
                "EXISTS (SELECT 1 FROM {els} AS e(v) WHERE jsonb_typeof(e.v) = 'string' AND e.v #>> '{{}}' ~* ${n}::text)",
                n = n,
                els = elements(f)
            )
        }
        Criterion::In(values) if values.is_empty() => "FALSE".to_string(),
        Criterion::In(values) => {
            let f = q.push_param(SqlParam::Text(field.to_string()));
            let n = q.push_param(SqlParam::Json(Value::Array(values.clone())));
            format!(
                "EXISTS (SELECT 1 FROM {els} AS e(v) WHERE e.v IN (SELECT jsonb_array_elements(${n}::jsonb)))",
                n = n,
                els = elements(f)
            )
        }
    };
    Ok(sql)
}

fn where_clause(q: &mut QueryBuf, query: &Query) -> Result<String, StoreError> {
    let mut parts = Vec::with_capacity(query.len());
    for (field, criterion) in query.iter() {
        parts.push(criterion_sql(q, field, criterion)?);
    }
    Ok(if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    })
}

fn order_clause(q: &mut QueryBuf, sort: &SortMap) -> String {
    let mut keys: Vec<String> = sort
        .iter()
        .map(|(field, direction)| {
            let f = q.push_param(SqlParam::Text(field.to_string()));
            let dir = match direction {
                SortDirection::Ascending => "ASC",
                SortDirection::Descending => "DESC",
            };
            format!("document -> ${}::text {}", f, dir)
        })
        .collect();
    keys.push("seq ASC".to_string());
    format!(" ORDER BY {}", keys.join(", "))
}

/// SELECT documents matching `query`, ordered by `sort` then insertion order.
/// `lock` adds FOR UPDATE for read-modify-write inside a transaction.
pub fn select(
    table: &str,
    query: &Query,
    sort: &SortMap,
    limit: Option<u32>,
    lock: bool,
) -> Result<QueryBuf, StoreError> {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, query)?;
    let order_sql = order_clause(&mut q, sort);
    let limit_sql = limit.map(|n| format!(" LIMIT {}", n)).unwrap_or_default();
    let lock_sql = if lock { " FOR UPDATE" } else { "" };
    q.sql = format!(
        "SELECT id, document FROM {}{}{}{}{}",
        table, where_sql, order_sql, limit_sql, lock_sql
    );
    Ok(q)
}

pub fn select_by_id(table: &str, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(SqlParam::Text(id.to_string()));
    q.sql = format!("SELECT id, document FROM {} WHERE id = ${}", table, n);
    q
}

pub fn insert(table: &str, id: &str, document: &Document) -> QueryBuf {
    let mut q = QueryBuf::new();
    let i = q.push_param(SqlParam::Text(id.to_string()));
    let d = q.push_param(SqlParam::Json(Value::Object(document.clone())));
    q.sql = format!(
        "INSERT INTO {} (id, document) VALUES (${}, ${}::jsonb) RETURNING id, document",
        table, i, d
    );
    q
}

/// Shallow merge: top-level keys of `patch` replace the stored ones.
pub fn merge_by_id(table: &str, id: &str, patch: &Document) -> QueryBuf {
    let mut q = QueryBuf::new();
    let i = q.push_param(SqlParam::Text(id.to_string()));
    let p = q.push_param(SqlParam::Json(Value::Object(patch.clone())));
    q.sql = format!(
        "UPDATE {} SET document = document || ${}::jsonb WHERE id = ${} RETURNING id, document",
        table, p, i
    );
    q
}

pub fn delete_by_id(table: &str, id: &str) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(SqlParam::Text(id.to_string()));
    q.sql = format!("DELETE FROM {} WHERE id = ${} RETURNING id, document", table, n);
    q
}
