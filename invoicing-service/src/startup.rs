//! Wiring from configuration to a ready [`AppState`].

use secrecy::ExposeSecret;
use service_core::error::AppError;
use std::sync::Arc;

use crate::config::{InvoicingConfig, StorageBackend, StorageConfig};
use crate::services::{
    IdentityProvider, InvoiceStore, JwtService, LocalIdentityProvider, MemoryStore, PostgresStore,
};
use crate::AppState;

/// Open the configured store. Postgres migrations run before this returns.
pub async fn open_store(config: &StorageConfig) -> Result<Arc<dyn InvoiceStore>, AppError> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::open())),
        StorageBackend::Postgres => {
            let url = config.database_url.as_ref().ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "DATABASE_URL is required for the postgres backend"
                ))
            })?;

            let store = PostgresStore::connect(
                url.expose_secret(),
                config.max_connections,
                config.min_connections,
            )
            .await
            .map_err(|e| {
                tracing::error!("Failed to open PostgreSQL store: {}", e);
                AppError::from(e)
            })?;

            Ok(Arc::new(store))
        }
    }
}

pub fn identity_provider(config: &InvoicingConfig) -> Result<Arc<dyn IdentityProvider>, AppError> {
    let jwt = JwtService::new(&config.jwt).map_err(AppError::ConfigError)?;
    Ok(Arc::new(LocalIdentityProvider::new(jwt)))
}

pub async fn build_state(config: InvoicingConfig) -> Result<AppState, AppError> {
    let store = open_store(&config.storage).await?;
    let identity = identity_provider(&config)?;
    Ok(AppState::new(config, store, identity))
}
