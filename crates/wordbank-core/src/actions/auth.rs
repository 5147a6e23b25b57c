//! Auth slice actions.

use chrono::Utc;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use wordbank_types::{AuthPayload, PreferencesPatch, StatsPatch, User, UserPreferences};

use super::AppContext;
use crate::api::{ApiError, ApiRequest, endpoints};
use crate::storage::{StorageError, keys};
use crate::store::{AuthStatus, SyncStatus};

impl AppContext {
    /// Loads the current user. Leaves the store `Authenticated` on success
    /// and `Unauthenticated` (with `auth_error`) on any failure; a cancelled
    /// call restores the previous status. A result arriving after a logout is
    /// dropped.
    ///
    /// # Errors
    /// Returns the underlying [`ApiError`]; the state already reflects it.
    pub async fn get_me(&self, cancel: &CancellationToken) -> Result<(), ApiError> {
        let epoch = self.api.session_epoch();
        let previous = self.store.update(|s| s.auth.begin_authenticating());

        let result = self
            .api
            .auth_fetch_json::<User>(&ApiRequest::get(endpoints::ME), cancel)
            .await;

        if self.api.session_epoch() != epoch {
            debug!("signed out while loading current user, dropping result");
            return Err(ApiError::SessionEnded);
        }
        match result {
            Ok(user) => {
                info!(user_id = %user.id, "loaded current user");
                self.store.update(|s| s.auth.set_user(user));
                Ok(())
            }
            Err(ApiError::Cancelled) => {
                self.store.update(|s| s.auth.status = previous);
                Err(ApiError::Cancelled)
            }
            Err(e) => {
                warn!("failed to load current user: {e}");
                self.store.update(|s| s.auth.fail(e.user_message()));
                Err(e)
            }
        }
    }

    /// Signs in with email and password.
    ///
    /// Invalid credentials surface as `auth_error`.
    ///
    /// # Errors
    /// Returns the underlying [`ApiError`]; the state already reflects it.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let req = ApiRequest::post(
            endpoints::LOGIN,
            json!({ "email": email, "password": password }),
        );
        self.sign_in(&req, cancel).await
    }

    /// Creates an account and signs in.
    ///
    /// # Errors
    /// Returns the underlying [`ApiError`]; the state already reflects it.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        let req = ApiRequest::post(
            endpoints::REGISTER,
            json!({ "email": email, "username": username, "password": password }),
        );
        self.sign_in(&req, cancel).await
    }

    async fn sign_in(&self, req: &ApiRequest, cancel: &CancellationToken) -> Result<(), ApiError> {
        let epoch = self.api.session_epoch();
        let previous = self.store.update(|s| s.auth.begin_authenticating());

        let result = match self.api.send_json::<AuthPayload>(req, cancel).await {
            Ok(payload) => self
                .api
                .store_tokens(epoch, &payload.token, &payload.refresh_token)
                .await
                .map(|()| payload.user),
            Err(e) => Err(e),
        };

        if self.api.session_epoch() != epoch {
            debug!(path = req.path(), "signed out during sign-in, dropping result");
            return Err(ApiError::SessionEnded);
        }
        match result {
            Ok(user) => {
                info!(user_id = %user.id, path = req.path(), "signed in");
                self.store.update(|s| s.auth.set_user(user));
                Ok(())
            }
            Err(ApiError::Cancelled) => {
                self.store.update(|s| s.auth.status = previous);
                Err(ApiError::Cancelled)
            }
            Err(e) => {
                warn!(path = req.path(), "sign-in failed: {e}");
                self.store.update(|s| s.auth.fail(e.user_message()));
                Err(e)
            }
        }
    }

    /// Clears tokens and all user state. Navigation is the caller's job.
    ///
    /// Requests still in flight for the old session can no longer store
    /// tokens or a user.
    ///
    /// # Errors
    /// Returns an error if the tokens cannot be removed from storage. The
    /// in-memory session is cleared regardless.
    pub async fn logout(&self) -> Result<(), StorageError> {
        let cleared = self.api.end_session().await;
        self.store.update(|s| {
            s.auth.clear_session();
            s.auth.auth_error = None;
        });
        info!("signed out");
        cleared
    }

    /// Merges `patch` into the cached preferences. Local only.
    ///
    /// Returns false when no user is loaded.
    pub fn update_preferences(&self, patch: &PreferencesPatch) -> bool {
        let now = Utc::now();
        self.store.update(|s| s.auth.apply_preferences(patch, now))
    }

    /// Merges `patch` into the cached stats. Local only.
    ///
    /// Returns false when no user is loaded.
    pub fn update_stats(&self, patch: &StatsPatch) -> bool {
        let now = Utc::now();
        self.store.update(|s| s.auth.apply_stats(patch, now))
    }

    /// Merges `patch` locally, then pushes the merged preferences.
    ///
    /// Overlapping syncs are last-write-wins: only the newest call's result
    /// updates `preferences_sync` or overwrites preferences with the server
    /// copy. Local changes are not rolled back on failure.
    ///
    /// # Errors
    /// Returns the push error, if any.
    pub async fn sync_preferences(
        &self,
        patch: &PreferencesPatch,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        if !self.update_preferences(patch) {
            debug!("no user loaded, skipping preference sync");
            return Ok(());
        }

        let (generation, merged) = self.store.update(|s| {
            s.auth.preferences_generation += 1;
            s.auth.preferences_sync = SyncStatus::Syncing;
            (s.auth.preferences_generation, s.auth.preferences().cloned())
        });
        let Some(merged) = merged else {
            return Ok(());
        };

        let body = serde_json::to_value(&merged).map_err(|e| ApiError::Decode(e.to_string()))?;
        let result = self
            .api
            .auth_fetch_json::<UserPreferences>(
                &ApiRequest::patch(endpoints::ME_PREFERENCES, body),
                cancel,
            )
            .await;

        self.store.update(|s| {
            if s.auth.preferences_generation != generation {
                debug!(generation, "dropping superseded preference sync result");
                return;
            }
            s.auth.preferences_sync = match &result {
                Ok(_) => SyncStatus::Synced,
                Err(ApiError::Cancelled) => SyncStatus::Idle,
                Err(e) => SyncStatus::Failed(e.user_message()),
            };
            if let (Ok(server), AuthStatus::Authenticated(user)) = (&result, &mut s.auth.status) {
                user.preferences = server.clone();
            }
        });

        result.map(|_| ())
    }

    /// Persists the onboarding flag and mirrors it into state.
    ///
    /// # Errors
    /// Returns an error if storage cannot be written.
    pub async fn set_has_onboarded(&self, value: bool) -> Result<(), StorageError> {
        self.storage
            .set(keys::HAS_ONBOARDED, if value { "true" } else { "false" })
            .await?;
        self.store.update(|s| s.auth.has_onboarded = value);
        Ok(())
    }

    /// Reads the persisted onboarding flag into state.
    ///
    /// # Errors
    /// Returns an error if storage cannot be read.
    pub async fn load_has_onboarded(&self) -> Result<bool, StorageError> {
        let value = self
            .storage
            .get(keys::HAS_ONBOARDED)
            .await?
            .is_some_and(|v| v == "true");
        self.store.update(|s| s.auth.has_onboarded = value);
        Ok(value)
    }

    /// Dismisses the auth error banner.
    pub fn clear_auth_error(&self) {
        self.store.update(|s| s.auth.auth_error = None);
    }
}
