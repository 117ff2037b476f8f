//! Route guards for HUMANIQ views.
//!
//! A guard answers one question for a view: given the current session,
//! should it render, show a placeholder, or send the user elsewhere?
//! Guards only *read* session state; they never change it.
//!
//! # Key types
//!
//! - [`Guard`]: the three guard kinds (public-only, signed-in, role)
//! - [`GuardDecision`]: what the view should do
//!
//! # Example
//!
//! ```rust
//! use humaniq_guard::{Guard, GuardDecision};
//! use humaniq_protocol::{Role, User};
//! use humaniq_session::{Routes, SessionState};
//!
//! let routes = Routes::default();
//! let student = User::new(1, "Ana", "ana@escola.br", Role::Student);
//! let state = SessionState::authenticated(student);
//!
//! assert_eq!(
//!     Guard::RoleRequired(Role::Teacher).evaluate(&state, &routes),
//!     GuardDecision::Redirect("/dashboard".into()),
//! );
//! ```

mod guard;

pub use guard::{Guard, GuardDecision};
