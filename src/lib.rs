//! Lagoon - a small social-networking backend
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      API Layer (Axum)                        │
//! │  - /users: registration, login, profiles, search, admin     │
//! │  - /posts: post CRUD, likes, shares, comments               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Service Layer                            │
//! │  - Authorization and visibility rules                       │
//! │  - Business logic                                           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Data Layer                              │
//! │  - SQLite (sqlx)                                            │
//! │  - Local media storage                                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - `api`: HTTP handlers
//! - `service`: Business logic layer
//! - `data`: Database layer
//! - `storage`: Local media storage
//! - `auth`: Bearer tokens, password hashing, request extractors
//! - `config`: Configuration management
//! - `error`: Error types

pub mod api;
pub mod auth;
pub mod config;
pub mod data;
pub mod error;
pub mod service;
pub mod storage;

use std::sync::Arc;

use storage::{MAX_POST_IMAGES, MAX_UPLOAD_BYTES};

/// Request body cap: ten image files plus form-field slack
const MAX_REQUEST_BODY_BYTES: usize = MAX_POST_IMAGES * MAX_UPLOAD_BYTES + 2 * 1024 * 1024;

/// Application state shared across all handlers
///
/// This struct is cloned for each request and contains
/// shared resources like the database pool and media storage.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<config::AppConfig>,

    /// Database connection pool
    pub db: Arc<data::Database>,

    /// Media storage (local disk)
    pub storage: Arc<storage::MediaStorage>,
}

impl AppState {
    /// Initialize application state
    ///
    /// # Steps
    /// 1. Connect to SQLite database and run migrations
    /// 2. Initialize the local upload directory
    ///
    /// # Errors
    /// Returns error if any initialization step fails. A failed database
    /// connection is fatal by design; the caller exits.
    pub async fn new(config: config::AppConfig) -> Result<Self, error::AppError> {
        tracing::info!("Initializing application state...");

        let db = data::Database::connect(&config.database.path).await?;

        let storage = storage::MediaStorage::new(&config.storage.media, &config.server)?;
        tracing::info!(root = %config.storage.media.root.display(), "Media storage initialized");

        Ok(Self {
            config: Arc::new(config),
            db: Arc::new(db),
            storage: Arc::new(storage),
        })
    }
}

/// Build the Axum router with all routes.
///
/// This is shared by the binary and integration tests to keep route
/// composition consistent across environments.
pub fn build_router(state: AppState) -> axum::Router {
    use axum::extract::DefaultBodyLimit;
    use axum::Router;
    use tower_http::{
        compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
    };

    let uploads_service = ServeDir::new(state.storage.root().clone());
    let public_path = state.config.storage.media.public_path.clone();

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .nest("/users", api::users_router())
        .nest("/posts", api::posts_router())
        .nest_service(&public_path, uploads_service)
        .fallback(route_not_found)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn route_not_found() -> impl axum::response::IntoResponse {
    (
        axum::http::StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({ "error": "Route not found" })),
    )
}
