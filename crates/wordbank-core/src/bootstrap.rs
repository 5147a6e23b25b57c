//! Start-up session reconciliation.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::actions::AppContext;
use crate::storage::StorageError;

/// Where the UI should land after start-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Onboarding,
    SignIn,
    Home,
}

impl AppContext {
    /// Reconciles the identity provider's sign-in state with the local
    /// session and picks the first screen.
    ///
    /// Network failures while loading the user are not errors here: they
    /// land on [`Route::SignIn`] with `auth_error` set.
    ///
    /// # Errors
    /// Returns an error only if device storage cannot be read or written.
    pub async fn bootstrap(
        &self,
        provider_signed_in: bool,
        cancel: &CancellationToken,
    ) -> Result<Route, StorageError> {
        if !self.load_has_onboarded().await? {
            debug!("first run, showing onboarding");
            return Ok(Route::Onboarding);
        }

        if !provider_signed_in {
            info!("identity provider signed out, dropping local session");
            self.logout().await?;
            return Ok(Route::SignIn);
        }

        if self.tokens().get_access_token().await?.is_none() {
            debug!("no stored session");
            return Ok(Route::SignIn);
        }

        match self.get_me(cancel).await {
            Ok(()) => Ok(Route::Home),
            Err(e) => {
                debug!("session restore failed: {e}");
                Ok(Route::SignIn)
            }
        }
    }
}
