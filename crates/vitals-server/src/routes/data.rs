//! Demo data API — the instrumented business surface.
//!
//! In-memory only; the point of these endpoints is to give the metrics
//! pipeline real traffic shapes (CRUD, bulk writes, 404s) to observe.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::app_state::AppState;

use super::timestamp;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("data item not found: {0}")]
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                Json(json!({
                    "error": "Not Found",
                    "message": format!("Data item {id} not found"),
                })),
            )
                .into_response(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DataItem {
    pub id: String,
    pub name: String,
    pub value: f64,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created_at: f64,
    pub updated_at: f64,
}

#[derive(Debug, Deserialize)]
pub struct NewDataItem {
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DataItemUpdate {
    pub name: Option<String>,
    pub value: Option<f64>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

/// In-memory item store with sequential ids.
#[derive(Debug, Default)]
pub struct DataStore {
    items: DashMap<String, DataItem>,
    next_id: AtomicU64,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, new: NewDataItem) -> DataItem {
        let id = format!("item-{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let now = timestamp();
        let item = DataItem {
            id: id.clone(),
            name: new.name,
            value: new.value,
            description: new.description,
            tags: new.tags,
            created_at: now,
            updated_at: now,
        };
        self.items.insert(id, item.clone());
        item
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

pub async fn create(
    State(state): State<AppState>,
    Json(new): Json<NewDataItem>,
) -> (StatusCode, Json<DataItem>) {
    (StatusCode::CREATED, Json(state.data().insert(new)))
}

pub async fn create_bulk(
    State(state): State<AppState>,
    Json(items): Json<Vec<NewDataItem>>,
) -> (StatusCode, Json<Vec<DataItem>>) {
    let created = items
        .into_iter()
        .map(|item| state.data().insert(item))
        .collect();
    (StatusCode::CREATED, Json(created))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
    pub tag: Option<String>,
}

fn default_limit() -> usize {
    10
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<Vec<DataItem>> {
    let mut items: Vec<DataItem> = state
        .data()
        .items
        .iter()
        .filter(|entry| match &query.tag {
            Some(tag) => entry.value().tags.iter().any(|t| t == tag),
            None => true,
        })
        .map(|entry| entry.value().clone())
        .collect();
    items.sort_by(|a, b| a.id.cmp(&b.id));

    Json(
        items
            .into_iter()
            .skip(query.offset)
            .take(query.limit)
            .collect(),
    )
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DataItem>, ApiError> {
    state
        .data()
        .items
        .get(&id)
        .map(|entry| Json(entry.value().clone()))
        .ok_or(ApiError::NotFound(id))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<DataItemUpdate>,
) -> Result<Json<DataItem>, ApiError> {
    let mut entry = state
        .data()
        .items
        .get_mut(&id)
        .ok_or_else(|| ApiError::NotFound(id.clone()))?;

    let item = entry.value_mut();
    if let Some(name) = update.name {
        item.name = name;
    }
    if let Some(value) = update.value {
        item.value = value;
    }
    if let Some(description) = update.description {
        item.description = Some(description);
    }
    if let Some(tags) = update.tags {
        item.tags = tags;
    }
    item.updated_at = timestamp();

    Ok(Json(item.clone()))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .data()
        .items
        .remove(&id)
        .map(|_| Json(json!({ "message": format!("Data item {id} deleted") })))
        .ok_or(ApiError::NotFound(id))
}

pub async fn stats(State(state): State<AppState>) -> Json<serde_json::Value> {
    let items: Vec<DataItem> = state
        .data()
        .items
        .iter()
        .map(|entry| entry.value().clone())
        .collect();

    if items.is_empty() {
        return Json(json!({
            "total_items": 0,
            "average_value": 0.0,
            "min_value": 0.0,
            "max_value": 0.0,
            "unique_tags": [],
        }));
    }

    let values: Vec<f64> = items.iter().map(|i| i.value).collect();
    let sum: f64 = values.iter().sum();
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let unique_tags: BTreeSet<&str> = items
        .iter()
        .flat_map(|i| i.tags.iter().map(String::as_str))
        .collect();

    Json(json!({
        "total_items": items.len(),
        "average_value": sum / values.len() as f64,
        "min_value": min,
        "max_value": max,
        "unique_tags": unique_tags,
    }))
}
