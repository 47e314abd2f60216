use super::{AppState, Result, WebError};
use crate::analysis::{GroupedRecord, group_by_period};
use crate::core::{Record, parse_new_record, parse_record_patch};
use crate::storage::RecordStore;
use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Deserialize)]
pub struct RecordQuery {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub message: &'static str,
    pub record: Record,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub records: usize,
}

/// Runs a store call on tokio's blocking pool. Mutations rewrite and fsync
/// the backing file while holding the store's write lock.
async fn with_store<T, F>(state: &AppState, op: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(&RecordStore) -> crate::core::Result<T> + Send + 'static,
{
    let store = state.store.clone();
    let outcome = tokio::task::spawn_blocking(move || op(store.as_ref()))
        .await
        .map_err(|err| WebError::Task(err.to_string()))?;
    Ok(outcome?)
}

pub async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>> {
    let records = with_store(&state, |store| store.len()).await?;
    Ok(Json(HealthResponse {
        status: "ok",
        records,
    }))
}

pub async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RecordQuery>,
) -> Result<Response> {
    match query.id {
        Some(raw) => {
            let id = parse_id(&raw)?;
            let record = with_store(&state, move |store| store.get(id)).await?;
            Ok(Json(record).into_response())
        }
        None => {
            let records = with_store(&state, |store| store.list()).await?;
            Ok(Json(records).into_response())
        }
    }
}

pub async fn create_record(
    State(state): State<AppState>,
    body: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordResponse>)> {
    let Json(body) = body.map_err(|rejection| WebError::Input(rejection.body_text()))?;
    let candidate = parse_new_record(&body)?;
    let record = with_store(&state, move |store| store.create(candidate)).await?;

    Ok((
        StatusCode::CREATED,
        Json(RecordResponse {
            message: "Record created successfully",
            record,
        }),
    ))
}

pub async fn update_record(
    State(state): State<AppState>,
    id: std::result::Result<Path<u64>, PathRejection>,
    body: std::result::Result<Json<JsonValue>, JsonRejection>,
) -> Result<Json<RecordResponse>> {
    let Path(id) = id.map_err(|rejection| WebError::Input(rejection.body_text()))?;
    let Json(body) = body.map_err(|rejection| WebError::Input(rejection.body_text()))?;
    let patch = parse_record_patch(&body)?;
    let record = with_store(&state, move |store| store.update(id, patch)).await?;

    Ok(Json(RecordResponse {
        message: "Record updated successfully",
        record,
    }))
}

pub async fn delete_record(
    State(state): State<AppState>,
    id: std::result::Result<Path<u64>, PathRejection>,
) -> Result<Json<MessageResponse>> {
    let Path(id) = id.map_err(|rejection| WebError::Input(rejection.body_text()))?;
    with_store(&state, move |store| store.delete(id)).await?;

    Ok(Json(MessageResponse {
        message: "Record deleted successfully",
    }))
}

pub async fn grouped_records(State(state): State<AppState>) -> Result<Json<Vec<GroupedRecord>>> {
    let grouped = with_store(&state, |store| group_by_period(&store.snapshot()?)).await?;
    Ok(Json(grouped))
}

fn parse_id(raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| WebError::Input(format!("id must be a positive integer, got '{}'", raw)))
}
