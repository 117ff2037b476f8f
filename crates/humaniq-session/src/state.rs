//! Session state: the data that answers "who is signed in right now?".
//!
//! One [`SessionState`] value exists per client. It lives inside a
//! `tokio::sync::watch` channel owned by the
//! [`SessionManager`](crate::SessionManager); everyone else gets clones
//! of it or subscribes to changes.

use humaniq_protocol::User;

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// The coarse lifecycle status, without the user attached.
///
/// ```text
///   Initializing ──(startup check)──→ Authenticated | Unauthenticated
///                                          ↑               │
///                                          └──(login)──────┘
///                                          │               ↑
///                                          └──(logout/401)─┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    /// The one-time startup check has not finished yet.
    Initializing,
    Authenticated,
    Unauthenticated,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initializing => write!(f, "initializing"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::Unauthenticated => write!(f, "unauthenticated"),
        }
    }
}

// ---------------------------------------------------------------------------
// AuthState
// ---------------------------------------------------------------------------

/// The status together with the user it implies.
///
/// The user lives *inside* the `Authenticated` variant, so "there is a
/// current user" and "the status is authenticated" cannot disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Initializing,
    Authenticated(User),
    Unauthenticated,
}

impl AuthState {
    pub fn status(&self) -> SessionStatus {
        match self {
            Self::Initializing => SessionStatus::Initializing,
            Self::Authenticated(_) => SessionStatus::Authenticated,
            Self::Unauthenticated => SessionStatus::Unauthenticated,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// A snapshot of the whole session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    auth: AuthState,
    last_error: Option<String>,
    /// Number of login/registration calls in flight.
    pending: usize,
}

impl SessionState {
    /// The state every client starts in.
    pub fn initializing() -> Self {
        Self::with_auth(AuthState::Initializing)
    }

    pub fn unauthenticated() -> Self {
        Self::with_auth(AuthState::Unauthenticated)
    }

    pub fn authenticated(user: User) -> Self {
        Self::with_auth(AuthState::Authenticated(user))
    }

    fn with_auth(auth: AuthState) -> Self {
        Self {
            auth,
            last_error: None,
            pending: 0,
        }
    }

    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    pub fn status(&self) -> SessionStatus {
        self.auth.status()
    }

    /// The signed-in user. `Some` exactly when the status is
    /// `Authenticated`.
    pub fn current_user(&self) -> Option<&User> {
        match &self.auth {
            AuthState::Authenticated(user) => Some(user),
            AuthState::Initializing | AuthState::Unauthenticated => None,
        }
    }

    /// Message from the most recent failed login/registration.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// `true` while a login or registration call is in flight.
    pub fn is_loading(&self) -> bool {
        self.pending > 0
    }

    /// `true` once the startup check (or a sign-in/out) has decided the
    /// status.
    pub fn is_settled(&self) -> bool {
        self.status() != SessionStatus::Initializing
    }

    // -- Mutations (crate-private: only the manager and pipeline write) --

    pub(crate) fn sign_in(&mut self, user: User) {
        self.auth = AuthState::Authenticated(user);
    }

    pub(crate) fn sign_out(&mut self) {
        self.auth = AuthState::Unauthenticated;
    }

    /// Swaps the current user. Returns `false` (and changes nothing) when
    /// nobody is signed in.
    pub(crate) fn replace_user(&mut self, user: User) -> bool {
        match &mut self.auth {
            AuthState::Authenticated(current) => {
                *current = user;
                true
            }
            AuthState::Initializing | AuthState::Unauthenticated => false,
        }
    }

    pub(crate) fn set_error(&mut self, message: String) {
        self.last_error = Some(message);
    }

    /// Returns `true` if there was an error to clear.
    pub(crate) fn clear_error(&mut self) -> bool {
        self.last_error.take().is_some()
    }

    pub(crate) fn begin_request(&mut self) {
        self.pending += 1;
    }

    pub(crate) fn end_request(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::initializing()
    }
}
