//! PostgreSQL-backed document store: one JSONB table per collection inside a dedicated schema.

use crate::error::StoreError;
use crate::format::{Document, ID_FIELD};
use crate::query::{Query, SortMap};
use crate::sql::{self, bind_params, QueryBuf};
use crate::store::DocumentStore;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{ConnectOptions, PgPool, Row};
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
    schema: String,
}

impl PostgresStore {
    /// Creates the database if missing, opens a pool and creates the schema.
    pub async fn connect(database_url: &str, max_connections: u32, schema: &str) -> Result<Self, StoreError> {
        ensure_database_exists(database_url).await?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let store = PostgresStore::from_pool(pool, schema);
        sqlx::query(&sql::create_schema(&store.schema))
            .execute(&store.pool)
            .await?;
        tracing::info!(schema = %store.schema, "connected to postgres document store");
        Ok(store)
    }

    pub fn from_pool(pool: PgPool, schema: &str) -> Self {
        PostgresStore {
            pool,
            schema: schema.to_string(),
        }
    }

    fn table(&self, collection: &str) -> String {
        sql::qualified_table(&self.schema, collection)
    }

    async fn fetch_all(&self, collection: &str, q: QueryBuf) -> Result<Vec<Document>, StoreError> {
        tracing::debug!(sql = %q.sql, params = q.params.len(), "query");
        let rows = bind_params(sqlx::query(&q.sql), &q.params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(|row| row_document(collection, row)).collect()
    }

    async fn fetch_optional(&self, collection: &str, q: QueryBuf) -> Result<Option<Document>, StoreError> {
        tracing::debug!(sql = %q.sql, params = q.params.len(), "query");
        let row = bind_params(sqlx::query(&q.sql), &q.params)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| row_document(collection, &row)).transpose()
    }
}

fn row_document(collection: &str, row: &PgRow) -> Result<Document, StoreError> {
    match row.try_get::<Value, _>("document")? {
        Value::Object(doc) => Ok(doc),
        other => Err(StoreError::Corrupt {
            collection: collection.to_string(),
            reason: format!("expected object, found {}", other),
        }),
    }
}

fn required_id(collection: &str, document: &Document) -> Result<String, StoreError> {
    document
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StoreError::Corrupt {
            collection: collection.to_string(),
            reason: "document has no string _id".into(),
        })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn prepare_collection(&self, collection: &str) -> Result<(), StoreError> {
        sqlx::query(&sql::create_table(&self.table(collection)))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find(&self, collection: &str, query: &Query, sort: &SortMap) -> Result<Vec<Document>, StoreError> {
        let q = sql::select(&self.table(collection), query, sort, None, false)?;
        self.fetch_all(collection, q).await
    }

    async fn find_one(&self, collection: &str, query: &Query) -> Result<Option<Document>, StoreError> {
        let q = sql::select(&self.table(collection), query, &SortMap::new(), Some(1), false)?;
        self.fetch_optional(collection, q).await
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.fetch_optional(collection, sql::select_by_id(&self.table(collection), id))
            .await
    }

    async fn insert(&self, collection: &str, document: Document) -> Result<Document, StoreError> {
        let id = required_id(collection, &document)?;
        let q = sql::insert(&self.table(collection), &id, &document);
        match self.fetch_optional(collection, q).await {
            Ok(Some(doc)) => Ok(doc),
            Ok(None) => Err(StoreError::Corrupt {
                collection: collection.to_string(),
                reason: "insert returned no row".into(),
            }),
            Err(StoreError::Db(e)) if is_unique_violation(&e) => Err(StoreError::Duplicate {
                collection: collection.to_string(),
                id,
            }),
            Err(e) => Err(e),
        }
    }

    async fn update_by_id(&self, collection: &str, id: &str, patch: Document) -> Result<Option<Document>, StoreError> {
        self.fetch_optional(collection, sql::merge_by_id(&self.table(collection), id, &patch))
            .await
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.fetch_optional(collection, sql::delete_by_id(&self.table(collection), id))
            .await
    }

    async fn upsert_one(
        &self,
        collection: &str,
        query: &Query,
        patch: Document,
        on_insert: Document,
    ) -> Result<Document, StoreError> {
        let table = self.table(collection);
        let mut tx = self.pool.begin().await?;

        let select = sql::select(&table, query, &SortMap::new(), Some(1), true)?;
        let existing = bind_params(sqlx::query(&select.sql), &select.params)
            .fetch_optional(&mut *tx)
            .await?;

        let write = match existing {
            Some(row) => {
                let id: String = row.try_get("id")?;
                sql::merge_by_id(&table, &id, &patch)
            }
            None => {
                let mut doc = on_insert;
                doc.extend(patch);
                let id = required_id(collection, &doc)?;
                sql::insert(&table, &id, &doc)
            }
        };
        tracing::debug!(sql = %write.sql, "upsert");
        let row = bind_params(sqlx::query(&write.sql), &write.params)
            .fetch_one(&mut *tx)
            .await?;
        let doc = row_document(collection, &row)?;
        tx.commit().await?;
        Ok(doc)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StoreError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", quote_ident(&db_name)))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), StoreError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| sqlx::Error::Configuration("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_url_targets_postgres_database() {
        let (admin, name) = parse_db_name_from_url("postgres://u:p@localhost:5432/homescreen?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres");
        assert_eq!(name, "homescreen");
    }

    #[test]
    fn url_without_path_is_rejected() {
        assert!(parse_db_name_from_url("localhost").is_err());
    }

    #[test]
    fn identifiers_are_quoted() {
        assert_eq!(quote_ident("home\"screen"), "\"home\"\"screen\"");
    }
}
