//! Application state for Axum web framework.
//!
//! Contains shared services and settings that are accessible
//! across all request handlers.

use std::sync::Arc;

use crate::config::{Settings, StorageBackend};
use crate::db::{AsyncDbPool, establish_async_connection_pool};
use crate::error::AppResult;
use crate::repositories::Repositories;
use crate::services::Services;

/// Application state containing all shared services and resources.
///
/// This struct is designed to be used with Axum's State extractor.
/// Cloning is cheap since services and settings sit behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Effective configuration after CLI overrides
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Creates a new AppState over already-built repositories.
    pub fn new(repos: Repositories, settings: Settings) -> Self {
        let services = Services::new(repos, settings.pagination.max_page_size);
        Self {
            services,
            settings: Arc::new(settings),
        }
    }

    /// Builds the store selected by `database.backend`, opening the
    /// PostgreSQL pool when needed.
    pub async fn from_settings(settings: Settings) -> AppResult<Self> {
        let pool: Option<AsyncDbPool> = match settings.database.backend {
            StorageBackend::Postgres => {
                Some(establish_async_connection_pool(&settings.database).await?)
            }
            StorageBackend::Memory => None,
        };
        let repos = Repositories::for_backend(settings.database.backend, pool)?;
        Ok(Self::new(repos, settings))
    }

    /// State over a fresh in-memory store.
    pub fn in_memory(settings: Settings) -> Self {
        Self::new(Repositories::memory(), settings)
    }
}
