//! Database module - AppState and the Postgres-backed stores
//!
//! - `documents` - saved documents and template usage
//! - `profiles` - the `users` profile table

mod documents;
mod profiles;

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

pub use documents::PgDocumentStore;
pub use profiles::PgProfileStore;

use crate::auth::ProfileStore;
use crate::config::AppConfig;
use crate::documents::{DocumentService, DocumentStore};
use crate::pdf::{CommandRasterizer, ExportGuard, PdfExporter, Rasterizer};
use crate::templates::TemplateRegistry;

/// SQLSTATE for `undefined_table`.
const UNDEFINED_TABLE: &str = "42P01";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database setup required. Please run the setup scripts first.")]
    SetupRequired,
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if matches!(err, sqlx::Error::RowNotFound) {
            return StoreError::NotFound;
        }
        let undefined_table = err
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| code == UNDEFINED_TABLE);
        if undefined_table {
            StoreError::SetupRequired
        } else {
            StoreError::Database(err)
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub templates: Arc<TemplateRegistry>,
    pub documents: DocumentService,
    pub profiles: Arc<dyn ProfileStore>,
    pub exporter: PdfExporter,
    pub export_guard: ExportGuard,
}

impl AppState {
    pub async fn connect(config: AppConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let pool = connect_pool(&config.database_url).await?;
        let templates = TemplateRegistry::builtin()?;
        let rasterizer = Arc::new(CommandRasterizer::new(config.rasterizer_bin.clone()));

        log::info!(
            "Loaded {} templates, rasterizing with {}",
            templates.len(),
            config.rasterizer_bin
        );

        Ok(Self::from_parts(
            config,
            templates,
            Arc::new(PgDocumentStore::new(pool.clone())),
            Arc::new(PgProfileStore::new(pool)),
            rasterizer,
        ))
    }

    /// Assemble state from already-built parts; tests pass in-memory stores.
    pub fn from_parts(
        config: AppConfig,
        templates: TemplateRegistry,
        documents: Arc<dyn DocumentStore>,
        profiles: Arc<dyn ProfileStore>,
        rasterizer: Arc<dyn Rasterizer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            templates: Arc::new(templates),
            documents: DocumentService::new(documents),
            profiles,
            exporter: PdfExporter::new(rasterizer),
            export_guard: ExportGuard::new(),
        }
    }

    pub fn jwt_secret(&self) -> Option<&str> {
        self.config.jwt_secret.as_deref()
    }
}

pub async fn connect_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(100)
        .min_connections(10)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(900))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}
