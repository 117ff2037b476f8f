//! Transport abstraction layer for the HUMANIQ client.
//!
//! Provides the [`Transport`] trait that abstracts over how a request
//! reaches the HUMANIQ REST API. The layers above only ever see
//! [`Request`] and [`Response`] values carrying raw bytes; JSON lives one
//! layer up, in `humaniq-protocol`.
//!
//! # Feature Flags
//!
//! - `http` (default) — HTTP transport via `reqwest`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "http")]
mod http;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::HttpTransport;

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique request IDs.
static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a single request.
///
/// Shows up in log lines so a request and its response can be matched
/// up when several calls are in flight at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(u64);

impl RequestId {
    /// Creates a new `RequestId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide request ID.
    pub fn next() -> Self {
        Self(NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req-{}", self.0)
    }
}

/// The HTTP methods the HUMANIQ API uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// The canonical upper-case method name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing request, already encoded.
///
/// `path` is relative to the API base URL (e.g. `/auth/login`). `body`,
/// when present, is a JSON document.
#[derive(Debug, Clone)]
pub struct Request {
    pub id: RequestId,
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub body: Option<Vec<u8>>,
}

impl Request {
    /// Creates a bodiless, unauthenticated request with a fresh ID.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: RequestId::next(),
            method,
            path: path.into(),
            bearer: None,
            body: None,
        }
    }

    /// Attaches a bearer token, sent as `Authorization: Bearer <token>`.
    pub fn with_bearer(mut self, token: impl Into<String>) -> Self {
        self.bearer = Some(token.into());
        self
    }

    /// Attaches a JSON body.
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// A response as received from the API.
///
/// Non-2xx statuses are NOT errors at this layer: a 401 or a 409 is a
/// perfectly valid response that the session layer needs to inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a response from a status code and raw body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns `true` for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns `true` if the server rejected the credentials (401).
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

/// Delivers requests to the API and returns its responses.
///
/// # Trait bounds
///
/// - `Send + Sync` → one transport is shared by every task that talks
///   to the API.
/// - `'static` → it lives as long as the client.
///
/// The returned future is `Send` so session operations can be driven
/// from `tokio::spawn`.
pub trait Transport: Send + Sync + 'static {
    /// Sends a request and waits for the full response.
    ///
    /// # Errors
    /// Returns a [`TransportError`] only when no HTTP response was
    /// obtained at all (DNS, connection refused, truncated body...).
    fn send(
        &self,
        request: Request,
    ) -> impl Future<Output = Result<Response, TransportError>> + Send;
}
