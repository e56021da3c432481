//! A converted schema bound to a collection in a document store.
//!
//! The model owns every bookkeeping field: `_id`, `__v`, `createdAt` and `updatedAt` are assigned
//! here and never taken from input. Inputs are strict: keys that are not schema fields are dropped.

pub mod validation;

use crate::error::AppError;
use crate::format::{Document, ID_FIELD, VERSION_FIELD};
use crate::query::{Criterion, IdValue, Query, SortMap};
use crate::schema::{convert, definitions, FieldDefinition, FormSchema, PersistenceSchema};
use crate::store::SharedStore;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use std::sync::Arc;
use validation::{cast_field, cast_scalar, element_storage, validate_document, validate_partial};

pub const CREATED_AT: &str = "createdAt";
pub const UPDATED_AT: &str = "updatedAt";

const MANAGED_FIELDS: [&str; 5] = [ID_FIELD, VERSION_FIELD, "id", CREATED_AT, UPDATED_AT];

fn now_timestamp() -> Value {
    Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Canonical stored form of a request id.
pub fn normalize_id(id: &str) -> String {
    IdValue::parse(id).as_key()
}

pub struct Model {
    name: String,
    collection: String,
    schema: Arc<PersistenceSchema>,
    store: SharedStore,
}

impl Model {
    pub fn new(name: &str, collection: &str, schema: PersistenceSchema, store: SharedStore) -> Self {
        Model {
            name: name.to_string(),
            collection: collection.to_string(),
            schema: Arc::new(schema),
            store,
        }
    }

    /// Convert `form` and bind it to `collection`, creating the collection if needed.
    pub async fn compile(
        name: &str,
        collection: &str,
        form: &FormSchema,
        store: SharedStore,
    ) -> Result<Self, AppError> {
        let model = Model::new(name, collection, convert(form), store);
        model.store.prepare_collection(collection).await?;
        tracing::debug!(model = name, collection, fields = model.schema.fields.len(), "model ready");
        Ok(model)
    }

    /// Schema fields only, cast to their storage shape.
    fn strict_cast(&self, data: Document) -> Result<Document, AppError> {
        let mut out = Document::new();
        for (key, value) in data {
            if MANAGED_FIELDS.contains(&key.as_str()) {
                continue;
            }
            let Some(def) = self.schema.field(&key) else {
                tracing::debug!(model = %self.name, field = %key, "dropping unknown field");
                continue;
            };
            let cast = cast_field(&key, def, value)?;
            out.insert(key, cast);
        }
        Ok(out)
    }

    fn apply_defaults(&self, doc: &mut Document) {
        for (name, def) in &self.schema.fields {
            if doc.contains_key(name) {
                continue;
            }
            match def {
                FieldDefinition::Scalar(scalar) => {
                    if let Some(default) = &scalar.default {
                        doc.insert(name.clone(), default.clone());
                    }
                }
                def if def.is_list() => {
                    doc.insert(name.clone(), Value::Array(Vec::new()));
                }
                _ => {}
            }
        }
    }

    /// Full insert pipeline without touching the store.
    pub fn prepare_insert(&self, data: Document) -> Result<Document, AppError> {
        let mut doc = self.strict_cast(data)?;
        self.apply_defaults(&mut doc);
        validate_document(&doc, &self.schema)?;
        doc.insert(ID_FIELD.to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
        doc.insert(VERSION_FIELD.to_string(), Value::from(0));
        if self.schema.timestamps {
            let now = now_timestamp();
            doc.insert(CREATED_AT.to_string(), now.clone());
            doc.insert(UPDATED_AT.to_string(), now);
        }
        Ok(doc)
    }

    fn prepare_update(&self, data: Document) -> Result<Document, AppError> {
        let mut patch = self.strict_cast(data)?;
        validate_partial(&patch, &self.schema)?;
        if self.schema.timestamps {
            patch.insert(UPDATED_AT.to_string(), now_timestamp());
        }
        Ok(patch)
    }

    /// Cast `Eq`/`In` operands on schema fields; operands that do not cast stay as given.
    /// String operands on `_id` are normalised like ids from the path.
    pub fn cast_query(&self, mut query: Query) -> Query {
        for (field, criterion) in query.iter_mut() {
            if field == ID_FIELD {
                let normalize = |v: &mut Value| {
                    if let Value::String(s) = v {
                        *s = normalize_id(s);
                    }
                };
                match criterion {
                    Criterion::Eq(v) => normalize(v),
                    Criterion::In(values) => values.iter_mut().for_each(normalize),
                    Criterion::Pattern(_) | Criterion::IdIn(_) => {}
                }
                continue;
            }
            let Some(storage) = self.schema.field(field).and_then(element_storage) else {
                continue;
            };
            let cast = |v: &Value| cast_scalar(v, storage).unwrap_or_else(|| v.clone());
            match criterion {
                Criterion::Eq(v) => *v = cast(v),
                Criterion::In(values) => {
                    for v in values.iter_mut() {
                        *v = cast(v);
                    }
                }
                Criterion::Pattern(_) | Criterion::IdIn(_) => {}
            }
        }
        query
    }

    pub async fn find(&self, query: Query, sort: &SortMap) -> Result<Vec<Document>, AppError> {
        let query = self.cast_query(query);
        Ok(self.store.find(&self.collection, &query, sort).await?)
    }

    pub async fn find_one(&self, query: Query) -> Result<Option<Document>, AppError> {
        let query = self.cast_query(query);
        Ok(self.store.find_one(&self.collection, &query).await?)
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<Document>, AppError> {
        Ok(self.store.find_by_id(&self.collection, &normalize_id(id)).await?)
    }

    pub async fn create(&self, data: Document) -> Result<Document, AppError> {
        let doc = self.prepare_insert(data)?;
        Ok(self.store.insert(&self.collection, doc).await?)
    }

    /// Partial update: supplied fields are cast and enum-checked; required fields are not re-checked.
    pub async fn find_by_id_and_update(&self, id: &str, data: Document) -> Result<Option<Document>, AppError> {
        let patch = self.prepare_update(data)?;
        Ok(self
            .store
            .update_by_id(&self.collection, &normalize_id(id), patch)
            .await?)
    }

    pub async fn find_by_id_and_delete(&self, id: &str) -> Result<Option<Document>, AppError> {
        Ok(self.store.delete_by_id(&self.collection, &normalize_id(id)).await?)
    }

    /// Update the first match of `query`, or insert a new document built from `data`.
    pub async fn find_one_and_upsert(&self, query: Query, data: Document) -> Result<Document, AppError> {
        let query = self.cast_query(query);
        let patch = self.prepare_update(data)?;
        let mut on_insert = Document::new();
        self.apply_defaults(&mut on_insert);
        on_insert.insert(ID_FIELD.to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
        on_insert.insert(VERSION_FIELD.to_string(), Value::from(0));
        if self.schema.timestamps {
            on_insert.insert(CREATED_AT.to_string(), now_timestamp());
        }
        Ok(self
            .store
            .upsert_one(&self.collection, &query, patch, on_insert)
            .await?)
    }
}

pub const MOVIE: &str = "Movie";
pub const SECTION: &str = "Section";
pub const SCREEN_CONFIGURATION: &str = "ScreenConfiguration";
pub const ACTIVE_CONFIG: &str = "ActiveConfig";

/// Every model, compiled once at startup.
#[derive(Clone)]
pub struct Models {
    pub movie: Arc<Model>,
    pub section: Arc<Model>,
    pub screen_configuration: Arc<Model>,
    pub active_config: Arc<Model>,
}

impl Models {
    pub async fn init(store: SharedStore) -> Result<Self, AppError> {
        let models = Models {
            movie: Arc::new(Model::compile(MOVIE, "movies", &definitions::movie_schema(), store.clone()).await?),
            section: Arc::new(
                Model::compile(SECTION, "sections", &definitions::section_schema(), store.clone()).await?,
            ),
            screen_configuration: Arc::new(
                Model::compile(
                    SCREEN_CONFIGURATION,
                    "screen_configurations",
                    &definitions::screen_configuration_schema(),
                    store.clone(),
                )
                .await?,
            ),
            active_config: Arc::new(
                Model::compile(ACTIVE_CONFIG, "active_config", &definitions::active_config_schema(), store).await?,
            ),
        };
        tracing::info!("models initialised");
        Ok(models)
    }
}
