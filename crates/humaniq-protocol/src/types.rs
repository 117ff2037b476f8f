//! Core wire types for the HUMANIQ REST API.
//!
//! Every type here is a JSON document that crosses the network: the user
//! record, the credential payloads sent to the auth endpoints, and the
//! bodies they answer with.
//!
//! The client speaks camelCase (`accessToken`, `user`). The deployed
//! backend still answers with its original Portuguese snake_case keys
//! (`access_token`, `usuario`, `tipo_usuario`...), so decoding accepts
//! both through `#[serde(alias = "...")]`.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The numeric identifier the API assigns to every account.
///
/// `#[serde(transparent)]` serializes this as the bare number, so
/// `UserId(42)` is just `42` in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U-{}", self.0)
    }
}

/// What kind of account a user has.
///
/// Encodes as `"student"` / `"teacher"`. The legacy values `"aluno"` and
/// `"professor"` decode to the same variants.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Takes the assessment and the weekly challenges. The default for
    /// new registrations.
    #[default]
    #[serde(alias = "aluno")]
    Student,

    /// Manages classes and follows their students.
    #[serde(alias = "professor")]
    Teacher,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Teacher => write!(f, "teacher"),
        }
    }
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// Summary of the class a student belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRef {
    pub id: u64,
    #[serde(alias = "nome")]
    pub name: String,
    /// The join code students type to enter the class.
    #[serde(alias = "codigo")]
    pub code: String,
}

/// The signed-in user's profile as returned by the API.
///
/// Only `id`, `name` and `email` are required on the wire; progress
/// fields fall back to a fresh account's values when absent or `null`.
///
/// Each field is read under one name only. A payload that carries both
/// spellings of a field (`name` and `nome`) is rejected as a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,

    #[serde(alias = "nome")]
    pub name: String,

    pub email: String,

    #[serde(default, alias = "tipo_usuario")]
    pub role: Role,

    /// The class this user joined, if any.
    #[serde(default, alias = "turma_id")]
    pub class_id: Option<u64>,

    #[serde(default, alias = "turma")]
    pub class: Option<ClassRef>,

    #[serde(
        default = "first_level",
        alias = "nivel",
        deserialize_with = "level_or_first"
    )]
    pub level: u32,

    #[serde(default, deserialize_with = "or_default")]
    pub xp: u64,

    /// XP required to reach the next level.
    #[serde(default, alias = "proximo_nivel_xp")]
    pub next_level_xp: Option<u64>,

    /// Whether the initial socio-emotional assessment is done.
    #[serde(
        default,
        alias = "teste_inicial_concluido",
        deserialize_with = "or_default"
    )]
    pub assessment_completed: bool,

    #[serde(
        default,
        alias = "desafios_concluidos",
        deserialize_with = "or_default"
    )]
    pub challenges_completed: u32,

    /// ISO-8601 registration timestamp, kept verbatim.
    #[serde(default, alias = "data_cadastro")]
    pub registered_at: Option<String>,
}

fn first_level() -> u32 {
    1
}

fn level_or_first<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    Ok(Option::<u32>::deserialize(d)?.unwrap_or_else(first_level))
}

// `null` reads as the field's default.
fn or_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

impl User {
    /// Creates a fresh level-1 user with no class and no progress.
    pub fn new(
        id: u64,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: UserId(id),
            name: name.into(),
            email: email.into(),
            role,
            class_id: None,
            class: None,
            level: first_level(),
            xp: 0,
            next_level_xp: None,
            assessment_completed: false,
            challenges_completed: 0,
            registered_at: None,
        }
    }

    /// Returns `true` if this account is a teacher account.
    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher
    }

    /// Returns a copy of this user enrolled in `class`.
    pub fn with_class(mut self, class: ClassRef) -> Self {
        self.class_id = Some(class.id);
        self.class = Some(class);
        self
    }
}

// ---------------------------------------------------------------------------
// Auth payloads
// ---------------------------------------------------------------------------

/// Body of `POST /auth/login`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub secret: String,
}

impl LoginRequest {
    pub fn new(email: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            secret: secret.into(),
        }
    }
}

// Manual Debug impls keep secrets and tokens out of logs.
impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /auth/register`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub secret: String,
    #[serde(default)]
    pub role: Role,
}

impl RegisterRequest {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        secret: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            secret: secret.into(),
            role,
        }
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("secret", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Successful answer of both auth endpoints.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    #[serde(alias = "access_token")]
    pub access_token: String,

    /// Stored alongside the access token. Never exchanged by this client.
    #[serde(default, alias = "refresh_token")]
    pub refresh_token: Option<String>,

    #[serde(alias = "usuario")]
    pub user: User,
}

impl fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthResponse")
            .field("access_token", &"<redacted>")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("user", &self.user)
            .finish()
    }
}

/// Answer of `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUserResponse {
    #[serde(alias = "usuario")]
    pub user: User,
}

/// Error body the API sends with 4xx/5xx statuses.
///
/// `message` is meant for humans and is shown to the user as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

// =========================================================================
// Tests
// =========================================================================
