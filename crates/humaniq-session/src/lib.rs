//! Client-side session management for HUMANIQ.
//!
//! This crate owns the answer to "who is signed in?":
//!
//! 1. **Token persistence**: the access/refresh pair in durable
//!    key-value storage ([`Storage`], [`TokenStore`])
//! 2. **Request pipeline**: the one place that attaches the bearer
//!    header and handles an expired session ([`ApiClient`])
//! 3. **Session lifecycle**: startup check, login, registration, logout
//!    ([`SessionManager`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Route guards (above)  ← read session state to allow/redirect
//!     ↕
//! Session layer (this crate)  ← tokens, pipeline, current user
//!     ↕
//! Protocol layer (below)  ← User, AuthResponse, JsonCodec
//!     ↕
//! Transport layer (below)  ← bytes over HTTP
//! ```

mod config;
mod error;
mod jwt;
mod manager;
mod navigate;
mod pipeline;
mod state;
mod storage;
#[cfg(test)]
mod testing;
mod validate;

pub use config::{Endpoints, Routes, SessionConfig};
pub use error::{ApiError, SessionError, StorageError};
pub use jwt::{expires_at, is_expired};
pub use manager::SessionManager;
pub use navigate::{MemoryNavigator, Navigator, NoopNavigator};
pub use pipeline::ApiClient;
pub use state::{AuthState, SessionState, SessionStatus};
pub use storage::{
    ACCESS_TOKEN_KEY, FileStorage, MemoryStorage, REFRESH_TOKEN_KEY, Storage,
    TokenStore,
};
pub use validate::{
    MIN_NAME_LEN, MIN_SECRET_LEN, ValidationError, validate_login,
    validate_registration,
};
