//! The `{ success, message, payload }` wrapper returned by every API endpoint.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::user::User;

/// Response envelope used by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub payload: Option<T>,
}

impl<T> Envelope<T> {
    /// Builds a successful envelope around `payload`.
    pub fn ok(payload: T) -> Self {
        Self {
            success: true,
            error_code: None,
            message: None,
            payload: Some(payload),
        }
    }

    /// Builds a failed envelope carrying a message.
    pub fn failure(error_code: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_code: error_code.map(str::to_string),
            message: Some(message.into()),
            payload: None,
        }
    }

    /// Unwraps the payload of a successful envelope.
    ///
    /// A `success: true` envelope without a payload is treated as a failure,
    /// since every caller of this method needs the payload.
    ///
    /// # Errors
    /// Returns the envelope's error code and message when `success` is false
    /// or the payload is missing.
    pub fn into_payload(self) -> Result<T, EnvelopeFailure> {
        match (self.success, self.payload) {
            (true, Some(payload)) => Ok(payload),
            (true, None) => Err(EnvelopeFailure {
                code: self.error_code,
                message: self
                    .message
                    .unwrap_or_else(|| "response is missing its payload".to_string()),
            }),
            (false, _) => Err(EnvelopeFailure {
                code: self.error_code,
                message: self
                    .message
                    .unwrap_or_else(|| "request was not successful".to_string()),
            }),
        }
    }
}

/// A `success: false` envelope, reduced to what the UI displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeFailure {
    pub code: Option<String>,
    pub message: String,
}

impl fmt::Display for EnvelopeFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Pagination metadata returned with paginated collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub per_page: u32,
    pub total_items: u32,
    pub total_pages: u32,
}

/// Paginated collection payload: `{ items, pageInfo }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

/// Payload of `POST /users/login` and `POST /users/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthPayload {
    pub token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Body of `POST /users/refresh-token`. Not wrapped in an envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
}
