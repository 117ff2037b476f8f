//! Session configuration: which endpoints to call and where to navigate.
//!
//! Every struct here implements `Default` with the paths the HUMANIQ API
//! and front-end actually use. Override just the fields you care about:
//!
//! ```rust
//! use humaniq_session::{Routes, SessionConfig};
//!
//! let config = SessionConfig {
//!     routes: Routes {
//!         sign_in: "/entrar".into(),
//!         ..Routes::default()
//!     },
//!     ..SessionConfig::default()
//! };
//! assert_eq!(config.endpoints.login, "/auth/login");
//! ```

use humaniq_protocol::Role;

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// API paths used by the session, relative to the API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    /// `POST`, credentials in, token pair + user out.
    pub login: String,
    /// `POST`, new account in, token pair + user out.
    pub register: String,
    /// `GET`, bearer-authenticated, current user out.
    pub current_user: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            login: "/auth/login".into(),
            register: "/auth/register".into(),
            current_user: "/users/me".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Routes
// ---------------------------------------------------------------------------

/// Views the session and the route guards send users to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Routes {
    /// Where signed-out users (and expired sessions) go.
    pub sign_in: String,
    /// Landing view for students.
    pub student_home: String,
    /// Landing view for teachers.
    pub teacher_home: String,
}

impl Routes {
    /// The home view for a given role.
    pub fn home_for(&self, role: Role) -> &str {
        match role {
            Role::Student => &self.student_home,
            Role::Teacher => &self.teacher_home,
        }
    }
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            sign_in: "/login".into(),
            student_home: "/dashboard".into(),
            teacher_home: "/professor/dashboard".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for a [`SessionManager`](crate::SessionManager).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub endpoints: Endpoints,
    pub routes: Routes,
}
