//! Guard kinds and their decision table.
//!
//! ```text
//!                   Initializing   Unauthenticated   Authenticated(user)
//! PublicOnly        Loading        Render            → home(user.role)
//! Authenticated     Loading        → sign-in         Render
//! RoleRequired(r)   Loading        → sign-in         Render if user.role == r
//!                                                    else → home(user.role)
//! ```

use humaniq_protocol::Role;
use humaniq_session::{AuthState, Routes, SessionState};
use tokio::sync::watch;

/// What a view should do right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// The session isn't settled yet: show a placeholder, don't redirect.
    Loading,
    /// Show the view.
    Render,
    /// Navigate to this path instead.
    Redirect(String),
}

impl GuardDecision {
    pub fn is_render(&self) -> bool {
        matches!(self, Self::Render)
    }

    /// The redirect target, if this decision is a redirect.
    pub fn redirect_target(&self) -> Option<&str> {
        match self {
            Self::Redirect(path) => Some(path),
            Self::Loading | Self::Render => None,
        }
    }
}

/// A guard attached to a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Only for signed-out users (sign-in and registration views).
    /// Signed-in users are sent to their home.
    PublicOnly,
    /// Any signed-in user.
    Authenticated,
    /// Signed-in users with this role. Others are sent to their own home.
    RoleRequired(Role),
}

impl Guard {
    /// Decides for a given session state. Pure: same input, same output.
    pub fn evaluate(&self, state: &SessionState, routes: &Routes) -> GuardDecision {
        let user = match state.auth() {
            AuthState::Initializing => return GuardDecision::Loading,
            AuthState::Unauthenticated => {
                return match self {
                    Self::PublicOnly => GuardDecision::Render,
                    Self::Authenticated | Self::RoleRequired(_) => {
                        GuardDecision::Redirect(routes.sign_in.clone())
                    }
                };
            }
            AuthState::Authenticated(user) => user,
        };

        let home = || GuardDecision::Redirect(routes.home_for(user.role).to_string());
        match self {
            Self::PublicOnly => home(),
            Self::Authenticated => GuardDecision::Render,
            Self::RoleRequired(role) if *role == user.role => GuardDecision::Render,
            Self::RoleRequired(role) => {
                tracing::debug!(required = %role, actual = %user.role, "role mismatch");
                home()
            }
        }
    }

    /// Waits until the session has settled, then decides.
    ///
    /// This never yields [`GuardDecision::Loading`]. Returns `None` if the
    /// session was dropped before it settled.
    pub async fn resolve(
        &self,
        session: &mut watch::Receiver<SessionState>,
        routes: &Routes,
    ) -> Option<GuardDecision> {
        let state = session.wait_for(SessionState::is_settled).await.ok()?;
        Some(self.evaluate(&state, routes))
    }

    /// Waits for the next session change and decides again.
    ///
    /// Returns `None` once the session is gone.
    pub async fn next_decision(
        &self,
        session: &mut watch::Receiver<SessionState>,
        routes: &Routes,
    ) -> Option<GuardDecision> {
        session.changed().await.ok()?;
        let state = session.borrow_and_update();
        Some(self.evaluate(&state, routes))
    }
}
