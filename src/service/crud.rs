//! Generic CRUD service: five operations per resource, each replaceable at construction time.
//!
//! "Not found" is `Ok(None)`; every other failure is logged and propagated.

use crate::error::AppError;
use crate::format::{format_entity, Document, WithId};
use crate::model::Model;
use crate::query::{build_query, QueryOptions};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;

/// A resource type a service can decode documents into.
pub trait Entity: DeserializeOwned + Serialize + Send + Sync + 'static {}

impl<T> Entity for T where T: DeserializeOwned + Serialize + Send + Sync + 'static {}

pub type CreateFn<T> = Arc<dyn Fn(Document) -> BoxFuture<'static, Result<WithId<T>, AppError>> + Send + Sync>;
pub type GetByIdFn<T> = Arc<dyn Fn(String) -> BoxFuture<'static, Result<Option<WithId<T>>, AppError>> + Send + Sync>;
pub type GetManyFn<T> = Arc<dyn Fn(QueryOptions) -> BoxFuture<'static, Result<Vec<WithId<T>>, AppError>> + Send + Sync>;
pub type UpdateFn<T> =
    Arc<dyn Fn(String, Document) -> BoxFuture<'static, Result<Option<WithId<T>>, AppError>> + Send + Sync>;
pub type DeleteFn<T> = Arc<dyn Fn(String) -> BoxFuture<'static, Result<Option<WithId<T>>, AppError>> + Send + Sync>;

pub fn create_fn<T, F, Fut>(f: F) -> CreateFn<T>
where
    F: Fn(Document) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<WithId<T>, AppError>> + Send + 'static,
{
    Arc::new(move |data| f(data).boxed())
}

pub fn get_by_id_fn<T, F, Fut>(f: F) -> GetByIdFn<T>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<WithId<T>>, AppError>> + Send + 'static,
{
    Arc::new(move |id| f(id).boxed())
}

pub fn get_many_fn<T, F, Fut>(f: F) -> GetManyFn<T>
where
    F: Fn(QueryOptions) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Vec<WithId<T>>, AppError>> + Send + 'static,
{
    Arc::new(move |options| f(options).boxed())
}

pub fn update_fn<T, F, Fut>(f: F) -> UpdateFn<T>
where
    F: Fn(String, Document) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<WithId<T>>, AppError>> + Send + 'static,
{
    Arc::new(move |id, data| f(id, data).boxed())
}

pub fn delete_fn<T, F, Fut>(f: F) -> DeleteFn<T>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<WithId<T>>, AppError>> + Send + 'static,
{
    Arc::new(move |id| f(id).boxed())
}

/// Log a failed operation. Client errors are expected traffic and stay at debug.
pub fn log_failure(entity: &str, operation: &str, err: &AppError) {
    if err.status().is_server_error() {
        tracing::error!(entity, operation, error = %err, "operation failed");
    } else {
        tracing::debug!(entity, operation, error = %err, "operation rejected");
    }
}

pub struct CrudServiceOptions<T> {
    pub model: Arc<Model>,
    pub entity_name: String,
    pub custom_create: Option<CreateFn<T>>,
    pub custom_get_by_id: Option<GetByIdFn<T>>,
    pub custom_get_many: Option<GetManyFn<T>>,
    pub custom_update: Option<UpdateFn<T>>,
    pub custom_delete: Option<DeleteFn<T>>,
}

impl<T: Entity> CrudServiceOptions<T> {
    pub fn new(model: Arc<Model>, entity_name: &str) -> Self {
        CrudServiceOptions {
            model,
            entity_name: entity_name.to_string(),
            custom_create: None,
            custom_get_by_id: None,
            custom_get_many: None,
            custom_update: None,
            custom_delete: None,
        }
    }

    pub fn with_create(mut self, f: CreateFn<T>) -> Self {
        self.custom_create = Some(f);
        self
    }

    pub fn with_get_by_id(mut self, f: GetByIdFn<T>) -> Self {
        self.custom_get_by_id = Some(f);
        self
    }

    pub fn with_get_many(mut self, f: GetManyFn<T>) -> Self {
        self.custom_get_many = Some(f);
        self
    }

    pub fn with_update(mut self, f: UpdateFn<T>) -> Self {
        self.custom_update = Some(f);
        self
    }

    pub fn with_delete(mut self, f: DeleteFn<T>) -> Self {
        self.custom_delete = Some(f);
        self
    }
}

pub struct CrudService<T> {
    entity_name: Arc<str>,
    model: Arc<Model>,
    create: CreateFn<T>,
    get_by_id: GetByIdFn<T>,
    get_many: GetManyFn<T>,
    update: UpdateFn<T>,
    delete: DeleteFn<T>,
}

impl<T> Clone for CrudService<T> {
    fn clone(&self) -> Self {
        CrudService {
            entity_name: self.entity_name.clone(),
            model: self.model.clone(),
            create: self.create.clone(),
            get_by_id: self.get_by_id.clone(),
            get_many: self.get_many.clone(),
            update: self.update.clone(),
            delete: self.delete.clone(),
        }
    }
}

fn default_create<T: Entity>(model: Arc<Model>, entity: Arc<str>) -> CreateFn<T> {
    create_fn(move |data| {
        let (model, entity) = (model.clone(), entity.clone());
        async move {
            let doc = model
                .create(data)
                .await
                .inspect_err(|e| log_failure(&entity, "create", e))?;
            format_entity(doc)
        }
    })
}

fn default_get_by_id<T: Entity>(model: Arc<Model>, entity: Arc<str>) -> GetByIdFn<T> {
    get_by_id_fn(move |id| {
        let (model, entity) = (model.clone(), entity.clone());
        async move {
            let doc = model
                .find_by_id(&id)
                .await
                .inspect_err(|e| log_failure(&entity, "getById", e))?;
            doc.map(format_entity).transpose()
        }
    })
}

fn default_get_many<T: Entity>(model: Arc<Model>, entity: Arc<str>) -> GetManyFn<T> {
    get_many_fn(move |options| {
        let (model, entity) = (model.clone(), entity.clone());
        async move {
            let built = build_query(&options);
            let docs = model
                .find(built.query, &built.sort)
                .await
                .inspect_err(|e| log_failure(&entity, "getMany", e))?;
            docs.into_iter().map(format_entity).collect()
        }
    })
}

fn default_update<T: Entity>(model: Arc<Model>, entity: Arc<str>) -> UpdateFn<T> {
    update_fn(move |id, data| {
        let (model, entity) = (model.clone(), entity.clone());
        async move {
            let doc = model
                .find_by_id_and_update(&id, data)
                .await
                .inspect_err(|e| log_failure(&entity, "update", e))?;
            doc.map(format_entity).transpose()
        }
    })
}

fn default_delete<T: Entity>(model: Arc<Model>, entity: Arc<str>) -> DeleteFn<T> {
    delete_fn(move |id| {
        let (model, entity) = (model.clone(), entity.clone());
        async move {
            let doc = model
                .find_by_id_and_delete(&id)
                .await
                .inspect_err(|e| log_failure(&entity, "delete", e))?;
            doc.map(format_entity).transpose()
        }
    })
}

impl<T: Entity> CrudService<T> {
    /// Resolve every operation now: the custom one if given, else the default.
    pub fn new(options: CrudServiceOptions<T>) -> Self {
        let entity: Arc<str> = Arc::from(options.entity_name.as_str());
        let model = options.model;
        CrudService {
            create: options
                .custom_create
                .unwrap_or_else(|| default_create(model.clone(), entity.clone())),
            get_by_id: options
                .custom_get_by_id
                .unwrap_or_else(|| default_get_by_id(model.clone(), entity.clone())),
            get_many: options
                .custom_get_many
                .unwrap_or_else(|| default_get_many(model.clone(), entity.clone())),
            update: options
                .custom_update
                .unwrap_or_else(|| default_update(model.clone(), entity.clone())),
            delete: options
                .custom_delete
                .unwrap_or_else(|| default_delete(model.clone(), entity.clone())),
            entity_name: entity,
            model,
        }
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub async fn create(&self, data: Document) -> Result<WithId<T>, AppError> {
        (self.create)(data).await
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<WithId<T>>, AppError> {
        (self.get_by_id)(id.to_string()).await
    }

    pub async fn get_many(&self, options: QueryOptions) -> Result<Vec<WithId<T>>, AppError> {
        (self.get_many)(options).await
    }

    pub async fn update(&self, id: &str, data: Document) -> Result<Option<WithId<T>>, AppError> {
        (self.update)(id.to_string(), data).await
    }

    pub async fn delete(&self, id: &str) -> Result<Option<WithId<T>>, AppError> {
        (self.delete)(id.to_string()).await
    }
}

pub fn create_crud_service<T: Entity>(options: CrudServiceOptions<T>) -> CrudService<T> {
    CrudService::new(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MOVIE;
    use crate::schema::{convert, definitions};
    use crate::store::MemoryStore;
    use crate::types::Movie;
    use serde_json::json;

    fn movie_model() -> Arc<Model> {
        Arc::new(Model::new(
            MOVIE,
            "movies",
            convert(&definitions::movie_schema()),
            Arc::new(MemoryStore::new()),
        ))
    }

    #[tokio::test]
    async fn custom_operations_replace_defaults() {
        let options = CrudServiceOptions::<Movie>::new(movie_model(), "Movie").with_get_by_id(get_by_id_fn(
            |id: String| async move {
                Ok(Some(WithId {
                    id,
                    data: Movie::default(),
                }))
            },
        ));
        let service = create_crud_service(options);
        let found = service.get_by_id("anything").await.unwrap().unwrap();
        assert_eq!(found.id, "anything");
        assert!(service.delete("anything").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn defaults_format_documents() {
        let service = CrudService::<Movie>::new(CrudServiceOptions::new(movie_model(), "Movie"));
        let data = json!({"title": "Heat", "description": "Crime", "poster": "p.jpg", "tags": ["crime"]});
        let created = service.create(data.as_object().cloned().unwrap()).await.unwrap();
        assert_eq!(created.data.title, "Heat");
        let value = serde_json::to_value(&created).unwrap();
        assert!(value.get("_id").is_none());
        assert!(value.get("__v").is_none());
        assert_eq!(value["id"], json!(created.id));
        assert_eq!(service.entity_name(), "Movie");
    }
}
