//! HTTP resource API over the record store.
//!
//! Routes:
//! - `GET    /records`          all records, or one with `?id=`
//! - `POST   /records`          create
//! - `PUT    /records/:id`      partial update
//! - `DELETE /records/:id`      delete
//! - `GET    /records/grouped`  fatalities summed per (year, month), calendar order
//! - `GET    /health`

pub mod handlers;

use crate::core::StoreError;
use crate::storage::RecordStore;
use axum::Json;
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RecordStore>,
}

impl AppState {
    pub fn new(store: Arc<RecordStore>) -> Self {
        Self { store }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/records",
            get(handlers::list_records).post(handlers::create_record),
        )
        .route("/records/grouped", get(handlers::grouped_records))
        .route(
            "/records/:id",
            put(handlers::update_record).delete(handlers::delete_record),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug)]
pub enum WebError {
    Store(StoreError),
    /// Request could not be decoded (bad JSON, bad path or query parameter).
    Input(String),
    /// The blocking store task panicked or was cancelled.
    Task(String),
}

impl From<StoreError> for WebError {
    fn from(err: StoreError) -> Self {
        WebError::Store(err)
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            WebError::Store(err @ StoreError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, err.to_string(), "not_found")
            }
            WebError::Store(StoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, msg, "validation_error")
            }
            WebError::Input(msg) => (StatusCode::BAD_REQUEST, msg, "input_error"),
            WebError::Task(msg) => {
                error!(error = %msg, "store task failed");
                (StatusCode::INTERNAL_SERVER_ERROR, msg, "internal_error")
            }
            WebError::Store(err) => {
                error!(error = %err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    err.to_string(),
                    "internal_error",
                )
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, WebError>;
