/// Errors that can occur in the transport layer.
///
/// Only covers failures to obtain a response. An HTTP error status is
/// still a [`Response`](crate::Response).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request URL could not be built from the base URL and path.
    #[error("invalid request url: {0}")]
    InvalidUrl(String),

    /// Sending the request failed (DNS, connect, TLS, reset).
    #[cfg(feature = "http")]
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),

    /// The response started but its body could not be read.
    #[cfg(feature = "http")]
    #[error("reading response body failed: {0}")]
    Body(#[source] reqwest::Error),

    /// The transport cannot deliver requests right now.
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}
