//! HTTP access to the Wordbank backend.

mod client;
pub mod endpoints;
mod error;

pub use client::{ApiClient, ApiRequest, USER_AGENT};
pub use error::ApiError;
