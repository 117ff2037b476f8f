//! The shared request pipeline.
//!
//! Every call to the API goes through one [`ApiClient`]. It is the single
//! place that:
//!
//! - attaches `Authorization: Bearer <token>` (the default header set at
//!   sign-in, falling back to the stored access token)
//! - encodes request bodies and decodes response bodies
//! - turns non-2xx responses into [`ApiError::Status`]
//! - reacts to a 401 on an ordinary call by ending the session
//!
//! # Global expiry
//!
//! ```text
//! any call ──→ 401 ──→ clear tokens + default header
//!                          │
//!                          ▼
//!                 status = unauthenticated
//!                          │
//!                          ▼
//!          navigate to sign-in (once per signed-in period)
//! ```
//!
//! Only a 401 for the token still in use ends the session. A slow call
//! sent before a sign-out and fresh sign-in gets
//! [`ApiError::SessionExpired`] back but leaves the new session intact.
//!
//! The auth endpoints and the startup check answer 401 for ordinary
//! reasons (wrong password, stale token) and handle it themselves, so
//! they bypass this path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use humaniq_protocol::{Codec, ErrorBody, JsonCodec};
use humaniq_transport::{Method, Request, RequestId, Transport};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::watch;

use crate::{ApiError, Navigator, SessionState, SessionStatus, TokenStore};

/// What a 401 means for a given call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expiry {
    /// The session is over: tear it down and go to sign-in.
    Global,
    /// The caller deals with it.
    Local,
}

/// Shared, authenticated access to the HUMANIQ API.
///
/// Obtain one from [`SessionManager::api`](crate::SessionManager::api).
/// Other parts of an application use [`get`](Self::get),
/// [`post`](Self::post), [`put`](Self::put) and [`delete`](Self::delete)
/// for their own endpoints and get session expiry for free.
pub struct ApiClient<T, C = JsonCodec> {
    transport: T,
    codec: C,
    tokens: TokenStore,
    /// The default `Authorization` header.
    bearer: RwLock<Option<String>>,
    navigator: Arc<dyn Navigator>,
    sign_in: String,
    state: Arc<watch::Sender<SessionState>>,
    /// Set once the current expiry has navigated to sign-in.
    redirected: AtomicBool,
}

impl<T: Transport, C: Codec> ApiClient<T, C> {
    pub(crate) fn new(
        transport: T,
        codec: C,
        tokens: TokenStore,
        navigator: Arc<dyn Navigator>,
        sign_in: String,
        state: Arc<watch::Sender<SessionState>>,
    ) -> Self {
        Self {
            transport,
            codec,
            tokens,
            bearer: RwLock::new(None),
            navigator,
            sign_in,
            state,
            redirected: AtomicBool::new(false),
        }
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.tokens
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // -- Default header --

    /// Sets the bearer token sent with every request.
    pub fn set_bearer(&self, token: impl Into<String>) {
        *self.write_bearer() = Some(token.into());
    }

    pub fn clear_bearer(&self) {
        *self.write_bearer() = None;
    }

    /// The default bearer token, if one is set.
    pub fn bearer(&self) -> Option<String> {
        self.read_bearer().clone()
    }

    fn read_bearer(&self) -> RwLockReadGuard<'_, Option<String>> {
        self.bearer.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write_bearer(&self) -> RwLockWriteGuard<'_, Option<String>> {
        self.bearer.write().unwrap_or_else(|p| p.into_inner())
    }

    /// The token to send: default header first, stored token second.
    fn current_bearer(&self) -> Option<String> {
        self.bearer().or_else(|| self.tokens.access_token())
    }

    // -- Public calls (global expiry) --

    /// `GET path`, decoding the response as `R`.
    ///
    /// # Errors
    /// [`ApiError::SessionExpired`] on 401 (after the session has been
    /// ended), [`ApiError::Status`] on other non-2xx statuses.
    pub async fn get<R: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<R, ApiError> {
        let bearer = self.current_bearer();
        self.exchange(Method::Get, path, None::<&()>, bearer, Expiry::Global)
            .await
    }

    /// `POST path` with a JSON body.
    pub async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let bearer = self.current_bearer();
        self.exchange(Method::Post, path, Some(body), bearer, Expiry::Global)
            .await
    }

    /// `PUT path` with a JSON body.
    pub async fn put<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let bearer = self.current_bearer();
        self.exchange(Method::Put, path, Some(body), bearer, Expiry::Global)
            .await
    }

    /// `DELETE path`. An empty response body decodes as JSON `null`, so
    /// `R = ()` works for 204 answers.
    pub async fn delete<R: DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<R, ApiError> {
        let bearer = self.current_bearer();
        self.exchange(Method::Delete, path, None::<&()>, bearer, Expiry::Global)
            .await
    }

    // -- Exempt calls (local expiry), used by the session itself --

    /// Unauthenticated `POST` to an auth endpoint.
    pub(crate) async fn post_credentials<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        self.exchange(Method::Post, path, Some(body), None, Expiry::Local)
            .await
    }

    /// `GET` with an explicit token, for the startup check.
    pub(crate) async fn get_with_token<R: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
    ) -> Result<R, ApiError> {
        let bearer = Some(token.to_string());
        self.exchange(Method::Get, path, None::<&()>, bearer, Expiry::Local)
            .await
    }

    async fn exchange<B: Serialize, R: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        bearer: Option<String>,
        expiry: Expiry,
    ) -> Result<R, ApiError> {
        let mut request = Request::new(method, path);
        if let Some(body) = body {
            request = request.with_body(self.codec.encode(body)?);
        }
        if let Some(token) = &bearer {
            request = request.with_bearer(token.clone());
        }
        let id = request.id;

        let response = self.transport.send(request).await?;

        if response.is_success() {
            let body: &[u8] = if response.body.is_empty() {
                b"null"
            } else {
                &response.body
            };
            return Ok(self.codec.decode(body)?);
        }

        if response.is_unauthorized() && expiry == Expiry::Global {
            self.expire_session(id, bearer.as_deref());
            return Err(ApiError::SessionExpired);
        }

        let message = self
            .codec
            .decode::<ErrorBody>(&response.body)
            .ok()
            .and_then(|body| body.message);
        tracing::debug!(%id, %method, path, status = response.status, "request rejected");
        Err(ApiError::Status {
            status: response.status,
            message,
        })
    }

    // -- Expiry --

    /// Ends the session after a 401 on an ordinary call that was sent
    /// with `sent`. A 401 for a token that has since been replaced says
    /// nothing about the current session and is left alone.
    fn expire_session(&self, id: RequestId, sent: Option<&str>) {
        if self.current_bearer().as_deref() != sent {
            tracing::debug!(%id, "401 for a replaced token, session kept");
            return;
        }
        self.tokens.clear();
        self.clear_bearer();
        self.state.send_if_modified(|state| {
            let changed = state.status() != SessionStatus::Unauthenticated;
            state.sign_out();
            changed
        });

        if self.redirected.swap(true, Ordering::AcqRel) {
            tracing::debug!(%id, "session already expired, not redirecting again");
            return;
        }
        tracing::info!(%id, to = %self.sign_in, "session expired, redirecting to sign-in");
        self.navigator.navigate(&self.sign_in);
    }

    /// Allows the next expiry to navigate again. Called on sign-in.
    pub(crate) fn rearm_expiry(&self) {
        self.redirected.store(false, Ordering::Release);
    }
}

impl<T, C> std::fmt::Debug for ApiClient<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("sign_in", &self.sign_in)
            .field("redirected", &self.redirected.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}
