//! API route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use facturo_shared::AppError;

use crate::AppState;

pub mod documents;
pub mod health;
pub mod products;
pub mod stock;
pub mod subtypes;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(subtypes::routes())
        .merge(documents::routes())
        .merge(stock::routes())
        .merge(products::routes())
}

/// Renders an [`AppError`] as the standard JSON error envelope.
///
/// Validation errors carry their field-keyed messages in `fields` so a UI
/// can highlight the offending inputs.
pub(crate) fn app_error_response(err: &AppError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut body = json!({
        "error": err.error_code(),
        "message": err.to_string(),
    });
    if let AppError::Validation(fields) = err {
        body["fields"] = json!(fields);
    }
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_envelope_carries_fields() {
        let response = app_error_response(&AppError::field("ncf", "ya está en uso"));
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = app_error_response(&AppError::NotFound("document".into()));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_maps_to_500() {
        let response = app_error_response(&AppError::Internal("boom".into()));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
