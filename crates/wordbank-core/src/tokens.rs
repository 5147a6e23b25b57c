//! Access/refresh token persistence.
//!
//! Tokens are stored verbatim in device storage. Expiry is not tracked here;
//! the server signals it with a 401. Tokens are never logged or displayed in
//! full.

use crate::storage::{SharedStorage, StorageError, keys};

/// Token store over a shared storage backend.
#[derive(Clone)]
pub struct TokenStore {
    storage: SharedStorage,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore").finish_non_exhaustive()
    }
}

impl TokenStore {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    /// # Errors
    /// Returns an error if storage cannot be read.
    pub async fn get_access_token(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(keys::ACCESS_TOKEN).await
    }

    /// # Errors
    /// Returns an error if storage cannot be written.
    pub async fn set_access_token(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set(keys::ACCESS_TOKEN, token).await
    }

    /// # Errors
    /// Returns an error if storage cannot be written.
    pub async fn clear_access_token(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::ACCESS_TOKEN).await
    }

    /// # Errors
    /// Returns an error if storage cannot be read.
    pub async fn get_refresh_token(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(keys::REFRESH_TOKEN).await
    }

    /// # Errors
    /// Returns an error if storage cannot be written.
    pub async fn set_refresh_token(&self, token: &str) -> Result<(), StorageError> {
        self.storage.set(keys::REFRESH_TOKEN, token).await
    }

    /// # Errors
    /// Returns an error if storage cannot be written.
    pub async fn clear_refresh_token(&self) -> Result<(), StorageError> {
        self.storage.remove(keys::REFRESH_TOKEN).await
    }

    /// Stores both tokens after a login or registration.
    ///
    /// # Errors
    /// Returns an error if storage cannot be written.
    pub async fn set_tokens(&self, access: &str, refresh: &str) -> Result<(), StorageError> {
        self.set_access_token(access).await?;
        self.set_refresh_token(refresh).await
    }

    /// Removes both tokens.
    ///
    /// # Errors
    /// Returns an error if storage cannot be written.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.clear_access_token().await?;
        self.clear_refresh_token().await
    }
}

/// Returns a masked version of a token for display (first 8 chars + ...).
pub fn mask_token(token: &str) -> String {
    match token.get(..8) {
        Some(prefix) if token.len() > 12 => format!("{prefix}..."),
        _ => "***".to_string(),
    }
}
