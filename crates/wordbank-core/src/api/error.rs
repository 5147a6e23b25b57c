use thiserror::Error;
use wordbank_types::EnvelopeFailure;

use crate::storage::StorageError;

/// Errors returned by [`ApiClient`](super::ApiClient) and the action
/// functions built on it.
///
/// Token values never appear in the formatted output.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    /// No access token is stored. The caller should send the user to sign-in.
    #[error("not signed in (no access token)")]
    NoToken,

    /// The request was still rejected with 401 after a token refresh.
    /// Both tokens have been cleared.
    #[error("session expired, sign in again")]
    Unauthorized,

    /// The refresh endpoint failed or returned an unusable body.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// The user signed out while the request was in flight. Its result was
    /// discarded.
    #[error("signed out while the request was in flight")]
    SessionEnded,

    /// Transport failure (connect, timeout, TLS, body read).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response whose body is not an envelope.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Body could not be decoded into the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The backend answered with `success: false`.
    #[error("{0}")]
    Api(EnvelopeFailure),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The caller's cancellation token fired before the request settled.
    #[error("request cancelled")]
    Cancelled,
}

impl ApiError {
    /// True for errors that mean the user must sign in again.
    pub fn requires_sign_in(&self) -> bool {
        matches!(
            self,
            ApiError::NoToken
                | ApiError::Unauthorized
                | ApiError::SessionEnded
                | ApiError::RefreshFailed(_)
                | ApiError::Status { status: 401, .. }
        )
    }

    /// Message suitable for an inline error banner.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Api(failure) => failure.message.clone(),
            ApiError::Network(_) => "Network error, check your connection".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_renders_message_and_code() {
        let e = ApiError::Api(EnvelopeFailure {
            code: Some("INVALID_CREDENTIALS".into()),
            message: "Wrong email or password".into(),
        });
        assert_eq!(e.to_string(), "Wrong email or password (INVALID_CREDENTIALS)");
        assert_eq!(e.user_message(), "Wrong email or password");
    }

    #[test]
    fn test_sign_in_errors() {
        assert!(ApiError::NoToken.requires_sign_in());
        assert!(ApiError::Unauthorized.requires_sign_in());
        assert!(ApiError::RefreshFailed("HTTP 400".into()).requires_sign_in());
        assert!(ApiError::SessionEnded.requires_sign_in());
        assert!(!ApiError::Cancelled.requires_sign_in());
    }

    #[test]
    fn test_status_error_renders() {
        let e = ApiError::Status {
            status: 502,
            body: "bad gateway".into(),
        };
        assert_eq!(e.to_string(), "HTTP 502: bad gateway");
    }
}
