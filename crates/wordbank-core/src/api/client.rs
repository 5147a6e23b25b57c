//! Authenticated fetch with a single refresh-and-retry cycle.
//!
//! Every authenticated request carries `Authorization: Bearer <token>`. On a
//! 401 the client exchanges the refresh token for a new access token and
//! retries once; a 401 on the retry burns both tokens. Concurrent callers
//! that fail with the same stale token share one in-flight refresh.
//!
//! Each sign-in session has an epoch. [`ApiClient::end_session`] bumps it,
//! and tokens obtained under an older epoch are never persisted.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use wordbank_types::{Envelope, RefreshResponse};

use super::endpoints;
use super::error::ApiError;
use crate::storage::StorageError;
use crate::tokens::{TokenStore, mask_token};

/// Standard User-Agent header for Wordbank API requests.
pub const USER_AGENT: &str = concat!("wordbank/", env!("CARGO_PKG_VERSION"));

/// A request relative to the API base URL. Cloned for the retry attempt.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn patch(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, path).with_body(body)
    }

    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn with_query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    First,
    Retry,
}

#[derive(Debug, Clone)]
enum RefreshError {
    Failed(String),
    SessionEnded,
}

impl From<RefreshError> for ApiError {
    fn from(e: RefreshError) -> Self {
        match e {
            RefreshError::Failed(message) => ApiError::RefreshFailed(message),
            RefreshError::SessionEnded => ApiError::SessionEnded,
        }
    }
}

type RefreshFuture = Shared<BoxFuture<'static, Result<String, RefreshError>>>;

/// The refresh that replaced `stale_token`. Kept after completion so late
/// callers holding the same stale token reuse its result.
struct RefreshFlight {
    epoch: u64,
    stale_token: String,
    future: RefreshFuture,
}

/// Session epoch plus the lock that serializes token writes against it.
#[derive(Default)]
struct Session {
    epoch: AtomicU64,
    writes: tokio::sync::Mutex<()>,
}

impl Session {
    fn current(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }
}

struct Inner {
    http: reqwest::Client,
    base_url: String,
    tokens: TokenStore,
    session: Arc<Session>,
    refresh: Mutex<Option<RefreshFlight>>,
}

/// Wordbank API client. Cheap to clone; clones share the refresh slot.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client for `base_url` backed by `tokens`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        base_url: &str,
        tokens: TokenStore,
        timeout: Option<Duration>,
    ) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(Inner {
                http: builder.build()?,
                base_url: base_url.trim_end_matches('/').to_string(),
                tokens,
                session: Arc::default(),
                refresh: Mutex::new(None),
            }),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    /// Epoch of the current session. Results obtained under an older epoch
    /// belong to a session that has since ended.
    pub fn session_epoch(&self) -> u64 {
        self.inner.session.current()
    }

    /// Ends the current session: bumps the epoch, forgets any refresh in
    /// flight and clears both tokens.
    ///
    /// # Errors
    /// Returns an error if the tokens cannot be removed from storage.
    pub async fn end_session(&self) -> Result<(), StorageError> {
        let _writes = self.inner.session.writes.lock().await;
        let epoch = self.inner.session.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner
            .refresh
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        debug!(epoch, "session ended");
        self.inner.tokens.clear().await
    }

    /// Persists a token pair obtained during session `epoch`.
    ///
    /// # Errors
    /// - [`ApiError::SessionEnded`] if the session ended meanwhile; nothing is
    ///   written
    /// - [`ApiError::Storage`] if storage cannot be written
    pub async fn store_tokens(
        &self,
        epoch: u64,
        access: &str,
        refresh: &str,
    ) -> Result<(), ApiError> {
        let _writes = self.inner.session.writes.lock().await;
        if self.inner.session.current() != epoch {
            debug!(epoch, "session ended before sign-in completed, discarding tokens");
            return Err(ApiError::SessionEnded);
        }
        self.inner.tokens.set_tokens(access, refresh).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.inner.base_url, path)
    }

    fn build(&self, req: &ApiRequest, token: Option<&str>) -> reqwest::RequestBuilder {
        let mut builder = self
            .inner
            .http
            .request(req.method.clone(), self.url(&req.path))
            .header(CONTENT_TYPE, "application/json");
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &req.body {
            builder = builder.json(body);
        }
        builder
    }

    /// Sends a request without credentials (login, register).
    ///
    /// # Errors
    /// Returns [`ApiError::Network`] on transport failure.
    pub async fn send(&self, req: &ApiRequest) -> Result<Response, ApiError> {
        debug!(method = %req.method, path = %req.path, "request");
        Ok(self.build(req, None).send().await?)
    }

    /// Sends an authenticated request, refreshing the access token once on 401.
    ///
    /// Non-2xx responses other than the hard-fail cases are returned as-is;
    /// callers inspect the envelope.
    ///
    /// # Errors
    /// - [`ApiError::NoToken`] when no access token is stored
    /// - [`ApiError::RefreshFailed`] when the refresh endpoint fails
    /// - [`ApiError::SessionEnded`] when the session ended during the refresh
    /// - [`ApiError::Unauthorized`] when the retried request is rejected again
    /// - [`ApiError::Network`] on transport failure
    pub async fn auth_fetch(&self, req: &ApiRequest) -> Result<Response, ApiError> {
        let epoch = self.session_epoch();
        let token = self
            .inner
            .tokens
            .get_access_token()
            .await?
            .ok_or(ApiError::NoToken)?;

        let response = self.attempt(req, &token, Attempt::First).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(refresh_token) = self.inner.tokens.get_refresh_token().await? else {
            debug!(path = %req.path, "401 with no refresh token");
            return Ok(response);
        };

        let fresh = self
            .refresh_access_token(epoch, &token, refresh_token)
            .await?;
        self.attempt(req, &fresh, Attempt::Retry).await
    }

    async fn attempt(
        &self,
        req: &ApiRequest,
        token: &str,
        attempt: Attempt,
    ) -> Result<Response, ApiError> {
        debug!(
            method = %req.method,
            path = %req.path,
            ?attempt,
            token = %mask_token(token),
            "authenticated request"
        );
        let response = self.build(req, Some(token)).send().await?;

        if attempt == Attempt::Retry && response.status() == StatusCode::UNAUTHORIZED {
            warn!(path = %req.path, "rejected after token refresh, clearing tokens");
            self.inner.tokens.clear().await?;
            return Err(ApiError::Unauthorized);
        }
        Ok(response)
    }

    /// Returns a fresh access token to replace `stale_token`, joining the
    /// in-flight refresh if one already targets the same stale token.
    async fn refresh_access_token(
        &self,
        epoch: u64,
        stale_token: &str,
        refresh_token: String,
    ) -> Result<String, ApiError> {
        if self.session_epoch() != epoch {
            return Err(ApiError::SessionEnded);
        }
        if let Some(current) = self.inner.tokens.get_access_token().await?
            && current != stale_token
        {
            debug!("access token already replaced, retrying with current token");
            return Ok(current);
        }

        let future = {
            let mut slot = self
                .inner
                .refresh
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            // A failed refresh is not reused; the next caller tries again.
            let joinable = slot
                .as_ref()
                .filter(|flight| {
                    flight.epoch == epoch
                        && flight.stale_token == stale_token
                        && !matches!(flight.future.peek(), Some(Err(_)))
                })
                .map(|flight| flight.future.clone());

            if let Some(future) = joinable {
                debug!("joining in-flight token refresh");
                future
            } else {
                let future = refresh_request(
                    self.inner.http.clone(),
                    self.url(endpoints::REFRESH_TOKEN),
                    self.inner.tokens.clone(),
                    Arc::clone(&self.inner.session),
                    epoch,
                    refresh_token,
                )
                .boxed()
                .shared();
                *slot = Some(RefreshFlight {
                    epoch,
                    stale_token: stale_token.to_string(),
                    future: future.clone(),
                });
                future
            }
        };

        future.await.map_err(ApiError::from)
    }

    /// Authenticated request whose body is an envelope carrying `T`.
    ///
    /// # Errors
    /// Any [`ApiError`]; `success: false` envelopes become [`ApiError::Api`].
    pub async fn auth_fetch_json<T: DeserializeOwned>(
        &self,
        req: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError> {
        with_cancel(cancel, async {
            let response = self.auth_fetch(req).await?;
            decode_envelope(response).await
        })
        .await
    }

    /// Authenticated request whose envelope has no payload of interest.
    ///
    /// # Errors
    /// Any [`ApiError`]; `success: false` envelopes become [`ApiError::Api`].
    pub async fn auth_fetch_ack(
        &self,
        req: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<(), ApiError> {
        with_cancel(cancel, async {
            let response = self.auth_fetch(req).await?;
            decode_ack(response).await
        })
        .await
    }

    /// Unauthenticated request whose body is an envelope carrying `T`.
    ///
    /// # Errors
    /// Any [`ApiError`]; `success: false` envelopes become [`ApiError::Api`].
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        req: &ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<T, ApiError> {
        with_cancel(cancel, async {
            let response = self.send(req).await?;
            decode_envelope(response).await
        })
        .await
    }
}

/// Exchanges `refresh_token` for a new access token and persists it, unless
/// session `epoch` ended while the request was in flight.
///
/// Errors are flattened to strings so the outcome can be shared between
/// callers.
async fn refresh_request(
    http: reqwest::Client,
    url: String,
    tokens: TokenStore,
    session: Arc<Session>,
    epoch: u64,
    refresh_token: String,
) -> Result<String, RefreshError> {
    debug!("refreshing access token");
    let response = http
        .post(&url)
        .json(&serde_json::json!({ "refresh_token": refresh_token }))
        .send()
        .await
        .map_err(|e| RefreshError::Failed(format!("request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(%status, "token refresh rejected");
        return Err(RefreshError::Failed(format!("HTTP {status}: {body}")));
    }

    let RefreshResponse { token } = response
        .json()
        .await
        .map_err(|e| RefreshError::Failed(format!("invalid refresh response: {e}")))?;

    let _writes = session.writes.lock().await;
    if session.current() != epoch {
        debug!(epoch, "session ended during token refresh, discarding token");
        return Err(RefreshError::SessionEnded);
    }
    tokens
        .set_access_token(&token)
        .await
        .map_err(|e| RefreshError::Failed(e.to_string()))?;
    Ok(token)
}

async fn with_cancel<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ApiError::Cancelled),
        result = fut => result,
    }
}

async fn decode_envelope<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await?;
    match serde_json::from_str::<Envelope<T>>(&body) {
        Ok(envelope) => envelope.into_payload().map_err(ApiError::Api),
        Err(_) if !status.is_success() => Err(ApiError::Status {
            status: status.as_u16(),
            body,
        }),
        Err(e) => Err(ApiError::Decode(e.to_string())),
    }
}

async fn decode_ack(response: Response) -> Result<(), ApiError> {
    let status = response.status();
    let body = response.text().await?;
    match serde_json::from_str::<Envelope<Value>>(&body) {
        Ok(envelope) if envelope.success => Ok(()),
        Ok(envelope) => Err(ApiError::Api(wordbank_types::EnvelopeFailure {
            code: envelope.error_code,
            message: envelope
                .message
                .unwrap_or_else(|| "request was not successful".to_string()),
        })),
        Err(_) if !status.is_success() => Err(ApiError::Status {
            status: status.as_u16(),
            body,
        }),
        Err(e) => Err(ApiError::Decode(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder_collects_query() {
        let req = ApiRequest::get(endpoints::LISTS)
            .with_query("page", 2)
            .with_query("per_page", 20);
        assert_eq!(req.path(), "/lists");
        assert_eq!(
            req.query,
            vec![
                ("page".to_string(), "2".to_string()),
                ("per_page".to_string(), "20".to_string())
            ]
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let tokens = TokenStore::new(crate::storage::MemoryStore::shared());
        let client = ApiClient::new("http://localhost:1234/", tokens, None).unwrap();
        assert_eq!(client.url(endpoints::ME), "http://localhost:1234/users/me");
    }

    #[tokio::test]
    async fn test_no_token_fails_before_any_request() {
        let tokens = TokenStore::new(crate::storage::MemoryStore::shared());
        // Port 9 (discard) is never contacted: the missing token short-circuits.
        let client = ApiClient::new("http://127.0.0.1:9", tokens, None).unwrap();
        let err = client
            .auth_fetch(&ApiRequest::get(endpoints::ME))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NoToken));
    }
}
