//! Error types for the session layer.

use humaniq_protocol::ProtocolError;
use humaniq_transport::TransportError;

use crate::ValidationError;

/// Errors returned by the request pipeline ([`ApiClient`](crate::ApiClient)).
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No response was obtained (network down, DNS, connection refused).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A body could not be encoded, or the response could not be decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The API answered with a non-2xx status.
    ///
    /// `message` is the `message` field of the error body, when the API
    /// sent one.
    #[error("request rejected with status {status}")]
    Status { status: u16, message: Option<String> },

    /// The API answered 401 to an ordinary call. The session has already
    /// been torn down and the user sent to sign-in by the time the caller
    /// sees this.
    #[error("session expired")]
    SessionExpired,
}

impl ApiError {
    /// The HTTP status behind this error, if there was a response at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::SessionExpired => Some(401),
            Self::Transport(_) | Self::Protocol(_) => None,
        }
    }

    /// The human-readable message the API attached, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Errors from login, registration and user refresh.
///
/// The `Display` text of the sign-in and registration variants is
/// written for the person at the keyboard: it is exactly what ends up
/// in [`SessionState::last_error`](crate::SessionState::last_error).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The input was rejected before any request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Login failed. `message` is the API's own explanation, or a
    /// generic one when the API gave none (or was unreachable).
    #[error("{message}")]
    SignInFailed {
        message: String,
        #[source]
        source: ApiError,
    },

    /// Registration answered 400.
    #[error("Please fill in all required fields.")]
    MissingFields,

    /// Registration answered 409.
    #[error("This email is already registered. Use another email.")]
    EmailTaken,

    /// Registration failed for any other reason.
    #[error("Could not create the account. Try again later.")]
    RegistrationFailed(#[source] ApiError),

    /// The operation needs a signed-in user and there is none.
    #[error("no user is signed in")]
    NotSignedIn,

    /// A pipeline failure outside of the login/registration forms.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Shown when a login fails without a usable server message.
pub(crate) const SIGN_IN_FALLBACK: &str = "Could not sign in. Try again.";

impl SessionError {
    /// Classifies a failed `POST /auth/login`.
    pub(crate) fn sign_in(source: ApiError) -> Self {
        let message = source
            .server_message()
            .unwrap_or(SIGN_IN_FALLBACK)
            .to_string();
        Self::SignInFailed { message, source }
    }

    /// Classifies a failed `POST /auth/register` by status.
    pub(crate) fn registration(source: ApiError) -> Self {
        match source.status() {
            Some(400) => Self::MissingFields,
            Some(409) => Self::EmailTaken,
            _ => Self::RegistrationFailed(source),
        }
    }
}

/// Errors from a durable [`Storage`](crate::Storage) backend.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file exists but isn't a JSON object of strings.
    #[error("storage file is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
}
