//! Unified error type for the HUMANIQ client.

use humaniq_protocol::ProtocolError;
use humaniq_session::{ApiError, SessionError, StorageError};
use humaniq_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `humaniq` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum HumaniqError {
    /// No response from the API (connection refused, DNS...).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A body could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A request through the shared pipeline failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Sign-in, registration or user refresh failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The token storage backend failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The environment held an unusable setting.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
