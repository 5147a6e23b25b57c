//! Action functions: the only code that mutates the [`Store`].
//!
//! Every action follows the same shape: flag the slice as busy, call the
//! API, fold the outcome (success, error message, fallback data) into state,
//! clear the flag. Errors are returned for the caller's information only;
//! the state already reflects them.

mod auth;
mod game;

use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiClient, ApiError};
use crate::config::Config;
use crate::diagnostics::{ErrorBoundary, ErrorLog};
use crate::storage::{SharedStorage, StorageError};
use crate::store::Store;
use crate::tokens::TokenStore;

/// Explicit application context, created once at start-up and passed to
/// whatever needs it.
#[derive(Clone)]
pub struct AppContext {
    api: ApiClient,
    store: Store,
    storage: SharedStorage,
    errors: ErrorLog,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("api", &self.api)
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Builds a context talking to `base_url` and persisting into `storage`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        base_url: &str,
        storage: SharedStorage,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let tokens = TokenStore::new(Arc::clone(&storage));
        Ok(Self {
            api: ApiClient::new(base_url, tokens, timeout)?,
            store: Store::new(),
            errors: ErrorLog::new(Arc::clone(&storage)),
            storage,
        })
    }

    /// Builds a context from loaded configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the client cannot be
    /// constructed.
    pub fn from_config(config: &Config, storage: SharedStorage) -> anyhow::Result<Self> {
        let base_url = config.effective_base_url()?;
        Ok(Self::new(&base_url, storage, config.request_timeout())?)
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn tokens(&self) -> &TokenStore {
        self.api.tokens()
    }

    pub fn error_log(&self) -> &ErrorLog {
        &self.errors
    }

    /// Error boundary that records into this context's error log.
    pub fn boundary(&self) -> ErrorBoundary {
        ErrorBoundary::new(self.errors.clone())
    }

    /// Wipes device storage (tokens, onboarding flag, error log) and
    /// in-memory state. The "reset app data" choice of the error boundary.
    ///
    /// # Errors
    /// Returns an error if storage cannot be cleared.
    pub async fn reset_app_data(&self) -> Result<(), StorageError> {
        tracing::info!("resetting app data");
        self.api.end_session().await?;
        self.storage.clear().await?;
        self.store.reset();
        Ok(())
    }
}
