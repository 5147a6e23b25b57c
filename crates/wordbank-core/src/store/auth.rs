//! Auth slice: who is signed in, and the state around it.

use chrono::{DateTime, Utc};
use wordbank_types::{PreferencesPatch, StatsPatch, User, UserPreferences, UserStats};

/// Authentication status.
///
/// `Authenticated` always carries the user, so "authenticated without a
/// user" cannot be represented.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum AuthStatus {
    #[default]
    Unauthenticated,
    /// A `get_me`, login or registration request is in flight.
    Authenticating,
    Authenticated(Box<User>),
}

/// Progress of pushing preferences to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SyncStatus {
    #[default]
    Idle,
    Syncing,
    Synced,
    Failed(String),
}

#[derive(Debug, Clone, Default)]
pub struct AuthSlice {
    pub status: AuthStatus,
    /// Mirrors the persisted `has_onboarded` flag.
    pub has_onboarded: bool,
    /// Banner message from the last failed auth action.
    pub auth_error: Option<String>,
    pub preferences_sync: SyncStatus,
    /// Newest preference sync started; older completions are ignored.
    pub(crate) preferences_generation: u64,
}

impl AuthSlice {
    pub fn is_authenticated(&self) -> bool {
        matches!(self.status, AuthStatus::Authenticated(_))
    }

    pub fn is_fetching_user(&self) -> bool {
        matches!(self.status, AuthStatus::Authenticating)
    }

    pub fn user(&self) -> Option<&User> {
        match &self.status {
            AuthStatus::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn preferences(&self) -> Option<&UserPreferences> {
        self.user().map(|user| &user.preferences)
    }

    pub fn stats(&self) -> Option<&UserStats> {
        self.user().map(|user| &user.stats)
    }

    /// Enters `Authenticating`, returning the status it replaced.
    pub(crate) fn begin_authenticating(&mut self) -> AuthStatus {
        self.auth_error = None;
        std::mem::replace(&mut self.status, AuthStatus::Authenticating)
    }

    pub(crate) fn set_user(&mut self, user: User) {
        self.status = AuthStatus::Authenticated(Box::new(user));
        self.auth_error = None;
    }

    /// Drops the session and records `message` for display.
    pub(crate) fn fail(&mut self, message: String) {
        self.clear_session();
        self.auth_error = Some(message);
    }

    /// Clears user, preferences and stats.
    pub(crate) fn clear_session(&mut self) {
        self.status = AuthStatus::Unauthenticated;
        self.preferences_sync = SyncStatus::Idle;
    }

    /// Merges `patch` into the cached preferences.
    ///
    /// Returns false (and changes nothing) when no user is loaded.
    pub(crate) fn apply_preferences(&mut self, patch: &PreferencesPatch, now: DateTime<Utc>) -> bool {
        match &mut self.status {
            AuthStatus::Authenticated(user) => {
                user.preferences.apply(patch, now);
                true
            }
            _ => false,
        }
    }

    /// Merges `patch` into the cached stats. Same rules as preferences.
    pub(crate) fn apply_stats(&mut self, patch: &StatsPatch, now: DateTime<Utc>) -> bool {
        match &mut self.status {
            AuthStatus::Authenticated(user) => {
                user.stats.apply(patch, now);
                true
            }
            _ => false,
        }
    }
}
