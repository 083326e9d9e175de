//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for document subtypes, fiscal documents, stock, and
//!   products
//! - JSON error envelopes with field-keyed validation details
//!
//! Authentication and session handling live outside this service; workspace
//! and actor context arrive as explicit path and body parameters.

pub mod routes;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
