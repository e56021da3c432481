//! Screen configurations: deep population of sections and movies, and the active-screen pointer.

use crate::error::AppError;
use crate::format::{format_document, format_entity, Document, WithId, ID_FIELD};
use crate::model::{Model, Models, SCREEN_CONFIGURATION};
use crate::query::{Query, SortMap};
use crate::service::crud::{get_by_id_fn, log_failure, CrudService, CrudServiceOptions};
use crate::types::{ActiveConfig, ScreenConfiguration};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;

const SECTIONS_FIELD: &str = "sections";
const ITEMS_FIELD: &str = "items";
const SCREEN_CONFIG_ID: &str = "screenConfigId";

fn id_list(doc: &Document, field: &str) -> Vec<String> {
    doc.get(field)
        .and_then(Value::as_array)
        .map(|ids| ids.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}

/// Fetch `ids` from `model`, keyed by id.
async fn fetch_by_ids(model: &Model, ids: &[String]) -> Result<HashMap<String, Document>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let docs = model.find(Query::ids(ids), &SortMap::new()).await?;
    Ok(docs
        .into_iter()
        .filter_map(|doc| {
            let id = doc.get(ID_FIELD).and_then(Value::as_str)?.to_string();
            Some((id, doc))
        })
        .collect())
}

/// Formatted documents in the order of `ids`; ids with no document are dropped.
fn in_order(ids: &[String], found: &HashMap<String, Document>) -> Vec<Value> {
    ids.iter()
        .filter_map(|id| found.get(id).cloned())
        .map(|doc| Value::Object(format_document(doc)))
        .collect()
}

/// Configuration with each section and each section's movies replaced by their documents.
pub async fn populate_configuration(
    models: &Models,
    id: &str,
) -> Result<Option<WithId<ScreenConfiguration>>, AppError> {
    let Some(mut config) = models.screen_configuration.find_by_id(id).await? else {
        return Ok(None);
    };

    let section_ids = id_list(&config, SECTIONS_FIELD);
    let sections = fetch_by_ids(&models.section, &section_ids).await?;

    let mut movie_ids: Vec<String> = sections.values().flat_map(|s| id_list(s, ITEMS_FIELD)).collect();
    movie_ids.sort();
    movie_ids.dedup();
    let movies = fetch_by_ids(&models.movie, &movie_ids).await?;

    let populated: Vec<Value> = section_ids
        .iter()
        .filter_map(|sid| sections.get(sid))
        .map(|section| {
            let mut section = format_document(section.clone());
            let items = in_order(&id_list(&section, ITEMS_FIELD), &movies);
            section.insert(ITEMS_FIELD.to_string(), Value::Array(items));
            Value::Object(section)
        })
        .collect();
    config.insert(SECTIONS_FIELD.to_string(), Value::Array(populated));
    format_entity(config).map(Some)
}

pub fn screen_configuration_service(models: &Models) -> CrudService<ScreenConfiguration> {
    let lookup = models.clone();
    let get_by_id = get_by_id_fn(move |id: String| {
        let models = lookup.clone();
        async move {
            populate_configuration(&models, &id)
                .await
                .inspect_err(|e| log_failure(SCREEN_CONFIGURATION, "getById", e))
        }
    });
    CrudService::new(
        CrudServiceOptions::new(models.screen_configuration.clone(), SCREEN_CONFIGURATION).with_get_by_id(get_by_id),
    )
}

/// The singleton pointer to the configuration served as the home screen.
#[derive(Clone)]
pub struct ActiveScreenService {
    models: Models,
}

impl ActiveScreenService {
    pub fn new(models: Models) -> Self {
        ActiveScreenService { models }
    }

    fn active_config(&self) -> &Arc<Model> {
        &self.models.active_config
    }

    /// Point the singleton at `id`. `None` (and no write) when the configuration does not exist.
    /// Concurrent calls race; the last write wins.
    pub async fn set_active(&self, id: &str) -> Result<Option<WithId<ScreenConfiguration>>, AppError> {
        let Some(config) = self.models.screen_configuration.find_by_id(id).await? else {
            return Ok(None);
        };
        let config_id = config.get(ID_FIELD).cloned().unwrap_or_else(|| Value::String(id.to_string()));
        let mut pointer = Map::new();
        pointer.insert(SCREEN_CONFIG_ID.to_string(), config_id);
        self.active_config()
            .find_one_and_upsert(Query::new(), pointer)
            .await
            .inspect_err(|e| log_failure("ActiveConfig", "setActive", e))?;
        tracing::info!(screen_config_id = %id, "active screen configuration set");
        format_entity(config).map(Some)
    }

    /// The active configuration, fully populated. `None` without a pointer or when it dangles.
    pub async fn get_active(&self) -> Result<Option<WithId<ScreenConfiguration>>, AppError> {
        let Some(pointer) = self.active_config().find_one(Query::new()).await? else {
            return Ok(None);
        };
        let pointer: ActiveConfig = match serde_json::from_value(Value::Object(pointer)) {
            Ok(pointer) => pointer,
            Err(e) => {
                tracing::warn!(error = %e, "active screen pointer is unreadable");
                return Ok(None);
            }
        };
        populate_configuration(&self.models, &pointer.screen_config_id).await
    }
}
