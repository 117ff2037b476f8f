//! # HUMANIQ
//!
//! Client library for the HUMANIQ socio-emotional skills platform.
//!
//! It keeps track of who is signed in: a one-time startup check of the
//! stored token, sign-in and registration, sign-out, session expiry on
//! any 401, and route guards that turn the session into "render",
//! "wait" or "go elsewhere".
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use humaniq::prelude::*;
//!
//! # async fn run() -> Result<(), HumaniqError> {
//! let client = HumaniqClient::builder()
//!     .config(ClientConfig::from_env()?)
//!     .build();
//!
//! if client.start().await != SessionStatus::Authenticated {
//!     client.session().login("ana@escola.br", "segredo").await?;
//! }
//!
//! match client.guard(Guard::RoleRequired(Role::Teacher)) {
//!     GuardDecision::Render => println!("welcome, professor"),
//!     GuardDecision::Redirect(path) => println!("go to {path}"),
//!     GuardDecision::Loading => println!("still starting"),
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
pub mod telemetry;

pub use client::{ClientBuilder, HumaniqClient};
pub use config::{
    API_URL_VAR, ClientConfig, ConfigError, DEFAULT_API_URL, SIGN_IN_PATH_VAR,
    TOKEN_FILE_VAR,
};
pub use error::HumaniqError;

pub use humaniq_guard as guard;
pub use humaniq_protocol as protocol;
pub use humaniq_session as session;
pub use humaniq_transport as transport;

/// Common imports for applications using HUMANIQ.
///
/// ```rust
/// use humaniq::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ClientBuilder, ClientConfig, HumaniqClient, HumaniqError,
    };
    pub use humaniq_guard::{Guard, GuardDecision};
    pub use humaniq_protocol::{Role, User, UserId};
    pub use humaniq_session::{
        ApiError, FileStorage, MemoryNavigator, MemoryStorage, Navigator,
        NoopNavigator, Routes, SessionConfig, SessionError, SessionManager,
        SessionState, SessionStatus, Storage,
    };
    pub use humaniq_transport::{HttpTransport, Transport};
}
