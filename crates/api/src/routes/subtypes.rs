//! Document subtype (NCF sequence) configuration routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use crate::routes::app_error_response;
use facturo_shared::AppError;

use facturo_db::repositories::{
    CreateSubtypeInput, SequenceRepository, SubtypeError, UpdateSubtypeInput,
};

/// Creates the subtype routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/document-subtypes",
            get(list_subtypes).post(create_subtype),
        )
        .route("/document-subtypes/{subtype_id}", patch(update_subtype))
}

/// Request body for creating a document subtype.
#[derive(Debug, Deserialize)]
pub struct CreateSubtypeRequest {
    /// Display name, e.g. "B01 - Factura de Crédito Fiscal".
    pub name: String,
    /// 3-character NCF prefix.
    pub prefix: String,
    /// First number of the range.
    pub start_number: i64,
    /// Last number of the range, if bounded.
    pub end_number: Option<i64>,
    /// Last valid issue date (YYYY-MM-DD).
    pub valid_until_date: Option<NaiveDate>,
    /// Make this the default subtype.
    #[serde(default)]
    pub is_default: bool,
}

/// Request body for updating a document subtype.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateSubtypeRequest {
    /// New display name.
    pub name: Option<String>,
    /// New upper bound.
    pub end_number: Option<i64>,
    /// New validity date.
    pub valid_until_date: Option<NaiveDate>,
    /// Change the default flag.
    pub is_default: Option<bool>,
}

/// GET `/document-subtypes` - List all subtypes.
async fn list_subtypes(State(state): State<AppState>) -> Response {
    let repo = SequenceRepository::new((*state.db).clone());
    match repo.list().await {
        Ok(subtypes) => (StatusCode::OK, Json(json!({ "data": subtypes }))).into_response(),
        Err(e) => subtype_error_response(&e),
    }
}

/// POST `/document-subtypes` - Create a subtype.
async fn create_subtype(
    State(state): State<AppState>,
    Json(payload): Json<CreateSubtypeRequest>,
) -> Response {
    let repo = SequenceRepository::new((*state.db).clone());
    let result = repo
        .create(CreateSubtypeInput {
            name: payload.name,
            prefix: payload.prefix,
            start_number: payload.start_number,
            end_number: payload.end_number,
            valid_until_date: payload.valid_until_date,
            is_default: payload.is_default,
        })
        .await;

    match result {
        Ok(subtype) => (StatusCode::CREATED, Json(json!({ "data": subtype }))).into_response(),
        Err(e) => subtype_error_response(&e),
    }
}

/// PATCH `/document-subtypes/{subtype_id}` - Update a subtype.
async fn update_subtype(
    State(state): State<AppState>,
    Path(subtype_id): Path<Uuid>,
    Json(payload): Json<UpdateSubtypeRequest>,
) -> Response {
    let repo = SequenceRepository::new((*state.db).clone());
    let result = repo
        .update(
            subtype_id,
            UpdateSubtypeInput {
                name: payload.name,
                end_number: payload.end_number,
                valid_until_date: payload.valid_until_date,
                is_default: payload.is_default,
            },
        )
        .await;

    match result {
        Ok(subtype) => (StatusCode::OK, Json(json!({ "data": subtype }))).into_response(),
        Err(e) => subtype_error_response(&e),
    }
}

/// Maps subtype repository errors to JSON responses with field-keyed
/// validation details.
fn subtype_error_response(err: &SubtypeError) -> Response {
    match err {
        SubtypeError::NotFound(_) => {
            app_error_response(&AppError::NotFound("Document subtype not found".to_string()))
        }
        SubtypeError::PrefixTaken(prefix) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": "prefix_taken",
                "message": err.to_string(),
                "fields": { "prefix": [format!("El prefijo {prefix} ya está en uso")] }
            })),
        )
            .into_response(),
        SubtypeError::InvalidPrefix(_) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_prefix",
                "message": err.to_string(),
                "fields": { "prefix": ["Must be exactly 3 alphanumeric characters"] }
            })),
        )
            .into_response(),
        SubtypeError::InvalidRange(message) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "invalid_range",
                "message": message,
                "fields": { "end_number": [message] }
            })),
        )
            .into_response(),
        SubtypeError::Sequence(e) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": e.error_code(),
                "message": e.to_string()
            })),
        )
            .into_response(),
        SubtypeError::Database(e) => {
            error!(error = %e, "Subtype operation failed");
            app_error_response(&AppError::Internal("An error occurred".to_string()))
        }
    }
}
