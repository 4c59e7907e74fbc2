//! msub-export library - manuscript export and delivery service
//!
//! Assembles one MECA archive per submission (generated metadata artifacts
//! plus the author's stored files), delivers it to every configured
//! destination, and reconciles the downstream system's asynchronous import
//! verdict against the durable submission status.

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use msub_common::config::Config;

pub mod api;
pub mod db;
pub mod delivery;
pub mod error;
pub mod export;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use crate::delivery::PackageStore;
use crate::export::PackageAssembler;
use crate::services::MailSender;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Service configuration
    pub config: Arc<Config>,
    /// Package builder with its generator collaborators
    pub assembler: Arc<PackageAssembler>,
    /// Configured delivery destinations
    pub store: Arc<PackageStore>,
    /// Outbound mail
    pub mailer: Arc<dyn MailSender>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        config: Arc<Config>,
        assembler: Arc<PackageAssembler>,
        store: Arc<PackageStore>,
        mailer: Arc<dyn MailSender>,
    ) -> Self {
        Self {
            db,
            config,
            assembler,
            store,
            mailer,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::export_routes())
        .merge(api::callback_routes())
        .merge(api::health_routes())
        .with_state(state)
        // Enable CORS for local access
        .layer(CorsLayer::permissive())
}
