//! Wire protocol for the HUMANIQ REST API.
//!
//! This crate defines the "language" the client and the API speak:
//!
//! - **Types** ([`User`], [`Role`], [`LoginRequest`], [`AuthResponse`], etc.) —
//!   the JSON documents that travel over HTTP.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those documents
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and session
//! (who is signed in). It doesn't know about tokens in storage or
//! navigation — it only knows how to serialize and deserialize payloads.
//!
//! ```text
//! Transport (bytes) → Protocol (User, AuthResponse) → Session (status, current user)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    AuthResponse, ClassRef, CurrentUserResponse, ErrorBody, LoginRequest,
    RegisterRequest, Role, User, UserId,
};
