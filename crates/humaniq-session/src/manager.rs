//! The session manager: the one object that knows who is signed in.
//!
//! It is constructed once at startup and shared by reference with
//! everything that needs the session. It's responsible for:
//! - The one-time startup check of a stored token
//! - Signing in and registering, and persisting the token pair
//! - Signing out
//! - Keeping the current user up to date
//!
//! # Lifecycle
//!
//! ```text
//! new() ──→ [Initializing] ──initialize()──→ [Authenticated]
//!                                 │                │  ↑
//!                                 ▼        logout()│  │login()/register()
//!                          [Unauthenticated] ←─────┘  │
//!                                 └───────────────────┘
//! ```
//!
//! # Concurrency note
//!
//! `SessionManager` is `Sync`: share it behind an `Arc` and call it from
//! any task. The startup check runs inside a `tokio::sync::OnceCell`, so
//! concurrent `initialize()` calls wait on the same check instead of
//! starting their own. State lives in a `tokio::sync::watch` channel;
//! [`subscribe`](SessionManager::subscribe) hands out receivers that see
//! every change.

use std::sync::Arc;
use std::time::SystemTime;

use humaniq_protocol::{
    AuthResponse, Codec, CurrentUserResponse, JsonCodec, LoginRequest,
    RegisterRequest, Role, User,
};
use humaniq_transport::Transport;
use tokio::sync::{OnceCell, watch};

use crate::{
    ApiClient, Navigator, SessionConfig, SessionError, SessionState,
    SessionStatus, Storage, TokenStore, jwt, validate_login,
    validate_registration,
};

/// Marks a login/registration call as in flight for as long as it lives.
///
/// The count is decremented in `Drop`, so an early return or a cancelled
/// future can't leave the session stuck in "loading".
struct LoadingGuard<'a> {
    state: &'a watch::Sender<SessionState>,
}

impl<'a> LoadingGuard<'a> {
    fn begin(state: &'a watch::Sender<SessionState>) -> Self {
        state.send_modify(SessionState::begin_request);
        Self { state }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.state.send_modify(SessionState::end_request);
    }
}

/// Owns the client-side session.
///
/// ## Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use humaniq_protocol::JsonCodec;
/// use humaniq_session::{
///     MemoryStorage, NoopNavigator, SessionConfig, SessionManager,
/// };
/// use humaniq_transport::HttpTransport;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpTransport::new("http://localhost:5000/api".parse()?);
/// let session = SessionManager::new(
///     transport,
///     JsonCodec,
///     Arc::new(MemoryStorage::new()),
///     Arc::new(NoopNavigator),
///     SessionConfig::default(),
/// );
///
/// session.initialize().await;
/// let user = session.login("ana@escola.br", "segredo").await?;
/// println!("hello, {}", user.name);
/// # Ok(())
/// # }
/// ```
pub struct SessionManager<T, C = JsonCodec> {
    api: Arc<ApiClient<T, C>>,
    state: Arc<watch::Sender<SessionState>>,
    /// Completed once the startup check has run.
    init: OnceCell<()>,
    config: SessionConfig,
}

impl<T: Transport, C: Codec> SessionManager<T, C> {
    /// Creates a manager in the `Initializing` state. No I/O happens
    /// until [`initialize`](Self::initialize).
    pub fn new(
        transport: T,
        codec: C,
        storage: Arc<dyn Storage>,
        navigator: Arc<dyn Navigator>,
        config: SessionConfig,
    ) -> Self {
        let state = Arc::new(watch::channel(SessionState::initializing()).0);
        let api = ApiClient::new(
            transport,
            codec,
            TokenStore::new(storage),
            navigator,
            config.routes.sign_in.clone(),
            Arc::clone(&state),
        );
        Self {
            api: Arc::new(api),
            state,
            init: OnceCell::new(),
            config,
        }
    }

    // -----------------------------------------------------------------
    // initialize()
    // -----------------------------------------------------------------

    /// Runs the startup check exactly once and returns the settled status.
    ///
    /// - No stored access token → `Unauthenticated`, no network call.
    /// - A JWT whose `exp` has passed → tokens cleared, `Unauthenticated`,
    ///   no network call.
    /// - Otherwise `GET /users/me` with the token: success signs the
    ///   user in, any failure clears both tokens.
    ///
    /// Concurrent callers share the same check. Callers after it has
    /// finished return immediately.
    pub async fn initialize(&self) -> SessionStatus {
        self.init
            .get_or_init(|| self.check_stored_session())
            .await;
        self.status()
    }

    /// `true` once the startup check has completed.
    pub fn is_initialized(&self) -> bool {
        self.init.initialized()
    }

    async fn check_stored_session(&self) {
        if self.state.borrow().is_settled() {
            // A sign-in (or sign-out) already decided the session.
            return;
        }

        let tokens = self.api.tokens();
        let Some(token) = tokens.access_token() else {
            self.settle(None);
            tracing::info!("no stored session");
            return;
        };

        if jwt::is_expired(&token, SystemTime::now()) {
            tracing::info!("stored token has expired, skipping startup check");
            if self.settle(None) {
                tokens.clear();
            }
            return;
        }

        let result = self
            .api
            .get_with_token::<CurrentUserResponse>(
                &self.config.endpoints.current_user,
                &token,
            )
            .await;

        match result {
            Ok(CurrentUserResponse { user }) => {
                let user_id = user.id;
                if self.settle(Some(user)) {
                    self.api.set_bearer(token);
                    self.api.rearm_expiry();
                    tracing::info!(%user_id, "stored session restored");
                }
            }
            Err(error) => {
                tracing::warn!(%error, "startup session check failed");
                if self.settle(None) {
                    tokens.clear();
                }
            }
        }
    }

    /// Moves `Initializing` to its outcome. Returns `false` (and changes
    /// nothing) if something else already settled the session.
    fn settle(&self, user: Option<User>) -> bool {
        self.state.send_if_modified(|state| {
            if state.is_settled() {
                return false;
            }
            match user {
                Some(user) => state.sign_in(user),
                None => state.sign_out(),
            }
            true
        })
    }

    // -----------------------------------------------------------------
    // login() / register()
    // -----------------------------------------------------------------

    /// Signs in with email and secret.
    ///
    /// On success the token pair is persisted, the default bearer is
    /// set and the user becomes current. On failure the session is left
    /// as it was, and `last_error` holds a message fit for display.
    ///
    /// # Errors
    /// - [`SessionError::Validation`]: rejected before any request.
    /// - [`SessionError::SignInFailed`]: the API refused, or was
    ///   unreachable.
    pub async fn login(
        &self,
        email: &str,
        secret: &str,
    ) -> Result<User, SessionError> {
        let request = LoginRequest::new(email.trim(), secret);
        validate_login(&request).map_err(|e| self.fail(e.into()))?;

        let _loading = LoadingGuard::begin(&self.state);
        let auth = self
            .api
            .post_credentials::<_, AuthResponse>(
                &self.config.endpoints.login,
                &request,
            )
            .await
            .map_err(|e| self.fail(SessionError::sign_in(e)))?;

        Ok(self.establish(auth))
    }

    /// Registers a student account and signs it in.
    ///
    /// # Errors
    /// See [`register_as`](Self::register_as).
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        secret: &str,
    ) -> Result<User, SessionError> {
        self.register_as(name, email, secret, Role::default()).await
    }

    /// Registers an account with an explicit role and signs it in.
    ///
    /// # Errors
    /// - [`SessionError::Validation`]: rejected before any request.
    /// - [`SessionError::MissingFields`]: the API answered 400.
    /// - [`SessionError::EmailTaken`]: the API answered 409.
    /// - [`SessionError::RegistrationFailed`]: anything else.
    pub async fn register_as(
        &self,
        name: &str,
        email: &str,
        secret: &str,
        role: Role,
    ) -> Result<User, SessionError> {
        let request =
            RegisterRequest::new(name.trim(), email.trim(), secret, role);
        validate_registration(&request).map_err(|e| self.fail(e.into()))?;

        let _loading = LoadingGuard::begin(&self.state);
        let auth = self
            .api
            .post_credentials::<_, AuthResponse>(
                &self.config.endpoints.register,
                &request,
            )
            .await
            .map_err(|e| self.fail(SessionError::registration(e)))?;

        Ok(self.establish(auth))
    }

    /// Records a failed sign-in/registration in `last_error`.
    fn fail(&self, error: SessionError) -> SessionError {
        tracing::info!(%error, "authentication rejected");
        let message = error.to_string();
        self.state.send_modify(|state| state.set_error(message));
        error
    }

    /// Makes a successful auth response the current session.
    fn establish(&self, auth: AuthResponse) -> User {
        let AuthResponse {
            access_token,
            refresh_token,
            user,
        } = auth;

        if let Err(error) = self
            .api
            .tokens()
            .save(&access_token, refresh_token.as_deref())
        {
            tracing::warn!(%error, "failed to persist tokens");
        }
        self.api.set_bearer(access_token);
        self.api.rearm_expiry();

        let signed_in = user.clone();
        self.state.send_modify(|state| {
            state.sign_in(signed_in);
            state.clear_error();
        });
        tracing::info!(user_id = %user.id, role = %user.role, "signed in");
        user
    }

    // -----------------------------------------------------------------
    // logout() and user updates
    // -----------------------------------------------------------------

    /// Signs out locally: both tokens and the default bearer are removed
    /// and the status becomes `Unauthenticated`. Never fails, never
    /// touches the network.
    pub fn logout(&self) {
        self.api.tokens().clear();
        self.api.clear_bearer();
        let was_signed_in = self.state.send_if_modified(|state| {
            let changed = state.status() != SessionStatus::Unauthenticated;
            state.sign_out();
            changed
        });
        if was_signed_in {
            tracing::info!("signed out");
        }
    }

    /// Replaces the current user, e.g. after joining a class or
    /// finishing the assessment. Tokens and status are left alone.
    ///
    /// Returns `false` and does nothing when nobody is signed in.
    pub fn update_user(&self, user: User) -> bool {
        let user_id = user.id;
        let updated = self.state.send_if_modified(|state| state.replace_user(user));
        if updated {
            tracing::debug!(%user_id, "current user updated");
        }
        updated
    }

    /// Re-fetches the current user from the API and makes it current.
    ///
    /// This is an ordinary call: a 401 ends the session.
    ///
    /// # Errors
    /// [`SessionError::NotSignedIn`] when there is no session to refresh,
    /// [`SessionError::Api`] when the call fails.
    pub async fn refresh_user(&self) -> Result<User, SessionError> {
        if self.state.borrow().current_user().is_none() {
            return Err(SessionError::NotSignedIn);
        }
        let CurrentUserResponse { user } = self
            .api
            .get(&self.config.endpoints.current_user)
            .await?;
        if self.update_user(user.clone()) {
            Ok(user)
        } else {
            Err(SessionError::NotSignedIn)
        }
    }

    /// Resets `last_error`.
    pub fn clear_error(&self) {
        self.state.send_if_modified(SessionState::clear_error);
    }

    // -----------------------------------------------------------------
    // Observation
    // -----------------------------------------------------------------

    pub fn status(&self) -> SessionStatus {
        self.state.borrow().status()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().current_user().cloned()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.borrow().last_error().map(str::to_string)
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    /// A copy of the whole current state.
    pub fn snapshot(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// A receiver that is notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// The shared request pipeline, for the rest of the application's
    /// API calls.
    pub fn api(&self) -> &Arc<ApiClient<T, C>> {
        &self.api
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl<T, C> std::fmt::Debug for SessionManager<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &*self.state.borrow())
            .field("initialized", &self.init.initialized())
            .finish_non_exhaustive()
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::future::join_all;
    use humaniq_transport::Method;
    use serde_json::{Value, json};

    use super::*;
    use crate::testing::ScriptedTransport;
    use crate::{
        ACCESS_TOKEN_KEY, MemoryNavigator, MemoryStorage, REFRESH_TOKEN_KEY,
        ValidationError, jwt::token_with_exp,
    };

    const ME: &str = "/users/me";
    const LOGIN: &str = "/auth/login";
    const REGISTER: &str = "/auth/register";

    struct Harness {
        session: SessionManager<ScriptedTransport>,
        transport: ScriptedTransport,
        storage: Arc<MemoryStorage>,
        navigator: Arc<MemoryNavigator>,
    }

    fn harness_with(storage: MemoryStorage) -> Harness {
        let transport = ScriptedTransport::new();
        let storage = Arc::new(storage);
        let navigator = Arc::new(MemoryNavigator::new());
        let session = SessionManager::new(
            transport.clone(),
            JsonCodec,
            storage.clone(),
            navigator.clone(),
            SessionConfig::default(),
        );
        Harness {
            session,
            transport,
            storage,
            navigator,
        }
    }

    fn harness() -> Harness {
        harness_with(MemoryStorage::new())
    }

    fn stored(token: &str) -> MemoryStorage {
        MemoryStorage::new()
            .with_entry(ACCESS_TOKEN_KEY, token)
            .with_entry(REFRESH_TOKEN_KEY, "refresh-old")
    }

    fn user_json(id: u64, role: &str) -> Value {
        json!({"id": id, "name": "Ana", "email": "a@b.com", "role": role})
    }

    fn auth_json(token: &str, id: u64, role: &str) -> Value {
        json!({
            "accessToken": token,
            "refreshToken": format!("refresh-{token}"),
            "user": user_json(id, role),
        })
    }

    fn stored_value(storage: &MemoryStorage, key: &str) -> Option<String> {
        storage.get(key).unwrap()
    }

    /// Checks currentUser ⟺ authenticated on a snapshot.
    fn assert_consistent(state: &SessionState) {
        assert_eq!(
            state.current_user().is_some(),
            state.status() == SessionStatus::Authenticated,
            "inconsistent state: {state:?}"
        );
    }

    // ===== initialize() =====

    #[tokio::test]
    async fn test_initialize_without_token_unauthenticated_no_request() {
        let h = harness();

        let status = h.session.initialize().await;

        assert_eq!(status, SessionStatus::Unauthenticated);
        assert_eq!(h.transport.total_calls(), 0);
        assert!(h.session.is_initialized());
    }

    #[tokio::test]
    async fn test_initialize_valid_token_authenticates() {
        let h = harness_with(stored("good"));
        h.transport.respond(Method::Get, ME, 200, json!({"user": user_json(1, "student")}));

        let status = h.session.initialize().await;

        assert_eq!(status, SessionStatus::Authenticated);
        assert_eq!(h.session.current_user().unwrap().id.0, 1);
        assert_eq!(h.session.api().bearer().as_deref(), Some("good"));
        let sent = h.transport.last_request(Method::Get, ME).unwrap();
        assert_eq!(sent.bearer.as_deref(), Some("good"));
    }

    #[tokio::test]
    async fn test_initialize_rejected_token_clears_both_without_redirect() {
        let h = harness_with(stored("stale"));
        h.transport.respond(Method::Get, ME, 401, json!({"message": "Token inválido"}));

        let status = h.session.initialize().await;

        assert_eq!(status, SessionStatus::Unauthenticated);
        assert!(stored_value(&h.storage, ACCESS_TOKEN_KEY).is_none());
        assert!(stored_value(&h.storage, REFRESH_TOKEN_KEY).is_none());
        // The startup check is exempt from global expiry.
        assert!(h.navigator.history().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_network_failure_clears_tokens() {
        let h = harness_with(stored("good"));
        h.transport.fail(Method::Get, ME);

        assert_eq!(h.session.initialize().await, SessionStatus::Unauthenticated);
        assert!(stored_value(&h.storage, ACCESS_TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn test_initialize_expired_jwt_skips_network() {
        let h = harness_with(stored(&token_with_exp(1)));

        assert_eq!(h.session.initialize().await, SessionStatus::Unauthenticated);
        assert_eq!(h.transport.total_calls(), 0);
        assert!(stored_value(&h.storage, ACCESS_TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn test_initialize_concurrent_calls_single_request() {
        let h = harness_with(stored("good"));
        h.transport.respond(Method::Get, ME, 200, json!({"user": user_json(1, "student")}));
        h.transport.set_delay(Duration::from_millis(20));

        let statuses = join_all((0..8).map(|_| h.session.initialize())).await;

        assert!(statuses.iter().all(|s| *s == SessionStatus::Authenticated));
        assert_eq!(h.transport.calls_to(Method::Get, ME), 1);
    }

    #[tokio::test]
    async fn test_initialize_repeated_calls_single_request() {
        let h = harness_with(stored("good"));
        h.transport.respond(Method::Get, ME, 200, json!({"user": user_json(1, "student")}));

        h.session.initialize().await;
        h.session.initialize().await;
        h.session.initialize().await;

        assert_eq!(h.transport.calls_to(Method::Get, ME), 1);
    }

    #[tokio::test]
    async fn test_initialize_after_login_keeps_session_and_skips_check() {
        let h = harness();
        h.transport.respond(Method::Post, LOGIN, 200, auth_json("t1", 1, "student"));

        h.session.login("a@b.com", "secret").await.unwrap();
        let status = h.session.initialize().await;

        assert_eq!(status, SessionStatus::Authenticated);
        assert_eq!(h.transport.calls_to(Method::Get, ME), 0);
    }

    #[tokio::test]
    async fn test_initialize_failing_check_does_not_undo_racing_login() {
        let h = harness_with(stored("stale"));
        h.transport.respond(Method::Get, ME, 401, json!({}));
        h.transport.respond(Method::Post, LOGIN, 200, auth_json("fresh", 1, "student"));
        // The startup check is still in flight when the login lands.
        h.transport.delay_route(Method::Get, ME, Duration::from_millis(50));

        let (status, login) =
            tokio::join!(h.session.initialize(), h.session.login("a@b.com", "secret"));

        assert!(login.is_ok());
        assert_eq!(status, SessionStatus::Authenticated);
        assert_eq!(
            stored_value(&h.storage, ACCESS_TOKEN_KEY).as_deref(),
            Some("fresh")
        );
        assert_eq!(h.session.api().bearer().as_deref(), Some("fresh"));
    }

    // ===== login() =====

    #[tokio::test]
    async fn test_login_success_persists_tokens_and_sets_user() {
        let h = harness();
        h.session.initialize().await;
        h.transport.respond(Method::Post, LOGIN, 200, auth_json("t1", 1, "student"));

        let user = h.session.login("a@b.com", "secret").await.unwrap();

        assert_eq!(user.id.0, 1);
        assert_eq!(h.session.status(), SessionStatus::Authenticated);
        assert_eq!(stored_value(&h.storage, ACCESS_TOKEN_KEY).as_deref(), Some("t1"));
        assert_eq!(
            stored_value(&h.storage, REFRESH_TOKEN_KEY).as_deref(),
            Some("refresh-t1")
        );
        assert_eq!(h.session.api().bearer().as_deref(), Some("t1"));
        assert!(h.session.last_error().is_none());
        assert!(!h.session.is_loading());
    }

    #[tokio::test]
    async fn test_login_sends_email_and_secret() {
        let h = harness();
        h.transport.respond(Method::Post, LOGIN, 200, auth_json("t1", 1, "student"));

        h.session.login("  a@b.com ", "secret").await.unwrap();

        let sent = h.transport.last_request(Method::Post, LOGIN).unwrap();
        let body: Value = serde_json::from_slice(&sent.body.unwrap()).unwrap();
        assert_eq!(body, json!({"email": "a@b.com", "secret": "secret"}));
    }

    #[tokio::test]
    async fn test_login_rejected_keeps_unauthenticated_with_server_message() {
        for status in [400, 401] {
            let h = harness();
            h.session.initialize().await;
            h.transport.respond(
                Method::Post,
                LOGIN,
                status,
                json!({"message": "Email ou senha inválidos"}),
            );

            let err = h.session.login("a@b.com", "wrong").await.unwrap_err();

            assert!(matches!(err, SessionError::SignInFailed { .. }));
            assert_eq!(h.session.status(), SessionStatus::Unauthenticated);
            assert_eq!(
                h.session.last_error().as_deref(),
                Some("Email ou senha inválidos")
            );
            assert!(stored_value(&h.storage, ACCESS_TOKEN_KEY).is_none());
            assert!(h.navigator.history().is_empty());
        }
    }

    #[tokio::test]
    async fn test_login_unreachable_uses_generic_message() {
        let h = harness();
        h.transport.fail(Method::Post, LOGIN);

        let err = h.session.login("a@b.com", "secret").await.unwrap_err();

        assert_eq!(err.to_string(), crate::error::SIGN_IN_FALLBACK);
        assert_eq!(
            h.session.last_error().as_deref(),
            Some(crate::error::SIGN_IN_FALLBACK)
        );
    }

    #[tokio::test]
    async fn test_login_invalid_email_rejected_without_request() {
        let h = harness();

        let err = h.session.login("not-an-email", "secret").await.unwrap_err();

        assert!(matches!(
            err,
            SessionError::Validation(ValidationError::EmailInvalid)
        ));
        assert_eq!(h.transport.total_calls(), 0);
        assert!(h.session.last_error().is_some());
    }

    #[tokio::test]
    async fn test_login_success_clears_previous_error() {
        let h = harness();
        h.transport.respond(Method::Post, LOGIN, 401, json!({"message": "nope"}));
        let _ = h.session.login("a@b.com", "wrong").await;
        assert!(h.session.last_error().is_some());

        h.transport.respond(Method::Post, LOGIN, 200, auth_json("t1", 1, "student"));
        h.session.login("a@b.com", "right").await.unwrap();

        assert!(h.session.last_error().is_none());
    }

    #[tokio::test]
    async fn test_login_loading_while_in_flight() {
        let h = Arc::new(harness());
        h.transport.respond(Method::Post, LOGIN, 200, auth_json("t1", 1, "student"));
        h.transport.set_delay(Duration::from_millis(50));
        let mut rx = h.session.subscribe();

        let task = {
            let h = Arc::clone(&h);
            tokio::spawn(async move { h.session.login("a@b.com", "secret").await.is_ok() })
        };

        rx.wait_for(|s| s.is_loading()).await.unwrap();
        assert!(task.await.unwrap());
        assert!(!h.session.is_loading());
    }

    // ===== register() =====

    #[tokio::test]
    async fn test_register_success_auto_signs_in_as_student() {
        let h = harness();
        h.transport.respond(Method::Post, REGISTER, 201, auth_json("t2", 7, "student"));

        let user = h.session.register("Ana Lima", "a@b.com", "123456").await.unwrap();

        assert_eq!(user.id.0, 7);
        assert_eq!(h.session.status(), SessionStatus::Authenticated);
        let sent = h.transport.last_request(Method::Post, REGISTER).unwrap();
        let body: Value = serde_json::from_slice(&sent.body.unwrap()).unwrap();
        assert_eq!(body["role"], "student");
        assert_eq!(body["name"], "Ana Lima");
    }

    #[tokio::test]
    async fn test_register_as_teacher_sends_role() {
        let h = harness();
        h.transport.respond(Method::Post, REGISTER, 201, auth_json("t3", 9, "teacher"));

        let user = h
            .session
            .register_as("Prof Rui", "rui@b.com", "123456", Role::Teacher)
            .await
            .unwrap();

        assert!(user.is_teacher());
        let sent = h.transport.last_request(Method::Post, REGISTER).unwrap();
        let body: Value = serde_json::from_slice(&sent.body.unwrap()).unwrap();
        assert_eq!(body["role"], "teacher");
    }

    #[tokio::test]
    async fn test_register_duplicate_email_specific_message() {
        let h = harness();
        h.transport.respond(Method::Post, REGISTER, 409, json!({"message": "dup"}));

        let err = h.session.register("Ana", "a@b.com", "123456").await.unwrap_err();

        assert!(matches!(err, SessionError::EmailTaken));
        let message = h.session.last_error().unwrap();
        assert_eq!(message, SessionError::EmailTaken.to_string());

        h.transport.respond(Method::Post, REGISTER, 500, json!({}));
        let _ = h.session.register("Ana", "a@b.com", "123456").await;
        assert_ne!(h.session.last_error().unwrap(), message);
        assert_eq!(h.session.status(), SessionStatus::Initializing);
    }

    #[tokio::test]
    async fn test_register_missing_fields_message() {
        let h = harness();
        h.transport.respond(Method::Post, REGISTER, 400, json!({}));

        let err = h.session.register("Ana", "a@b.com", "123456").await.unwrap_err();

        assert!(matches!(err, SessionError::MissingFields));
        assert!(stored_value(&h.storage, ACCESS_TOKEN_KEY).is_none());
    }

    #[tokio::test]
    async fn test_register_short_secret_rejected_without_request() {
        let h = harness();

        let err = h.session.register("Ana", "a@b.com", "123").await.unwrap_err();

        assert!(matches!(
            err,
            SessionError::Validation(ValidationError::SecretTooShort)
        ));
        assert_eq!(h.transport.total_calls(), 0);
    }

    // ===== logout() =====

    #[tokio::test]
    async fn test_logout_clears_tokens_header_and_user() {
        let h = harness();
        h.transport.respond(Method::Post, LOGIN, 200, auth_json("t1", 1, "student"));
        h.session.login("a@b.com", "secret").await.unwrap();

        h.session.logout();

        assert_eq!(h.session.status(), SessionStatus::Unauthenticated);
        assert!(h.session.current_user().is_none());
        assert!(stored_value(&h.storage, ACCESS_TOKEN_KEY).is_none());
        assert!(stored_value(&h.storage, REFRESH_TOKEN_KEY).is_none());
        assert!(h.session.api().bearer().is_none());
    }

    #[tokio::test]
    async fn test_logout_from_any_state_never_fails() {
        let h = harness_with(stored("t"));
        h.session.logout();
        h.session.logout();

        assert_eq!(h.session.status(), SessionStatus::Unauthenticated);
        assert!(stored_value(&h.storage, ACCESS_TOKEN_KEY).is_none());
        assert_eq!(h.transport.total_calls(), 0);
    }

    // ===== update_user() / refresh_user() =====

    #[tokio::test]
    async fn test_update_user_keeps_tokens_and_status() {
        let h = harness();
        h.transport.respond(Method::Post, LOGIN, 200, auth_json("t1", 1, "student"));
        let mut user = h.session.login("a@b.com", "secret").await.unwrap();

        user.class_id = Some(42);
        user.assessment_completed = true;
        assert!(h.session.update_user(user.clone()));

        assert_eq!(h.session.current_user(), Some(user));
        assert_eq!(h.session.status(), SessionStatus::Authenticated);
        assert_eq!(stored_value(&h.storage, ACCESS_TOKEN_KEY).as_deref(), Some("t1"));
        assert_eq!(
            stored_value(&h.storage, REFRESH_TOKEN_KEY).as_deref(),
            Some("refresh-t1")
        );
    }

    #[tokio::test]
    async fn test_update_user_signed_out_is_noop() {
        let h = harness();
        h.session.initialize().await;

        let user = User::new(1, "Ana", "a@b.com", Role::Student);
        assert!(!h.session.update_user(user));

        assert_eq!(h.session.status(), SessionStatus::Unauthenticated);
        assert!(h.session.current_user().is_none());
    }

    #[tokio::test]
    async fn test_refresh_user_replaces_current_user() {
        let h = harness();
        h.transport.respond(Method::Post, LOGIN, 200, auth_json("t1", 1, "student"));
        h.session.login("a@b.com", "secret").await.unwrap();
        h.transport.respond(
            Method::Get,
            ME,
            200,
            json!({"usuario": {"id": 1, "nome": "Ana", "email": "a@b.com",
                               "tipo_usuario": "aluno", "nivel": 3, "xp": 250}}),
        );

        let user = h.session.refresh_user().await.unwrap();

        assert_eq!(user.level, 3);
        assert_eq!(h.session.current_user().unwrap().xp, 250);
        let sent = h.transport.last_request(Method::Get, ME).unwrap();
        assert_eq!(sent.bearer.as_deref(), Some("t1"));
    }

    #[tokio::test]
    async fn test_refresh_user_signed_out_errors_without_request() {
        let h = harness();

        let err = h.session.refresh_user().await.unwrap_err();

        assert!(matches!(err, SessionError::NotSignedIn));
        assert_eq!(h.transport.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_refresh_user_unauthorized_expires_session() {
        let h = harness();
        h.transport.respond(Method::Post, LOGIN, 200, auth_json("t1", 1, "student"));
        h.session.login("a@b.com", "secret").await.unwrap();
        h.transport.respond(Method::Get, ME, 401, json!({}));

        let err = h.session.refresh_user().await.unwrap_err();

        assert!(matches!(err, SessionError::Api(crate::ApiError::SessionExpired)));
        assert_eq!(h.session.status(), SessionStatus::Unauthenticated);
        assert_eq!(h.navigator.history(), vec!["/login"]);
    }

    // ===== global expiry =====

    #[tokio::test]
    async fn test_unauthorized_call_redirects_once_and_rearms_on_login() {
        let h = harness();
        h.transport.respond(Method::Post, LOGIN, 200, auth_json("t1", 1, "student"));
        h.transport.respond(Method::Get, "/desafios", 401, json!({}));
        h.session.login("a@b.com", "secret").await.unwrap();

        for _ in 0..3 {
            let _ = h.session.api().get::<Value>("/desafios").await;
        }
        assert_eq!(h.navigator.history(), vec!["/login"]);
        assert!(stored_value(&h.storage, ACCESS_TOKEN_KEY).is_none());

        h.session.login("a@b.com", "secret").await.unwrap();
        let _ = h.session.api().get::<Value>("/desafios").await;
        assert_eq!(h.navigator.history(), vec!["/login", "/login"]);
    }

    #[tokio::test]
    async fn test_late_401_for_replaced_token_keeps_new_session() {
        let h = harness();
        h.transport.respond(Method::Post, LOGIN, 200, auth_json("old", 1, "student"));
        h.transport.respond(Method::Get, "/slow", 401, json!({}));
        h.transport.delay_route(Method::Get, "/slow", Duration::from_millis(80));
        h.session.login("a@b.com", "secret").await.unwrap();

        let relogin = async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            h.session.logout();
            h.transport.respond(Method::Post, LOGIN, 200, auth_json("new", 1, "student"));
            h.session.login("a@b.com", "secret").await
        };
        let (stale, relogin) =
            tokio::join!(h.session.api().get::<Value>("/slow"), relogin);

        assert!(relogin.is_ok());
        assert!(matches!(stale, Err(crate::ApiError::SessionExpired)));
        let sent = h.transport.last_request(Method::Get, "/slow").unwrap();
        assert_eq!(sent.bearer.as_deref(), Some("old"));
        assert_eq!(h.session.status(), SessionStatus::Authenticated);
        assert_eq!(h.session.api().bearer().as_deref(), Some("new"));
        assert_eq!(
            stored_value(&h.storage, ACCESS_TOKEN_KEY).as_deref(),
            Some("new")
        );
        assert!(h.navigator.history().is_empty());
    }

    // ===== clear_error() =====

    #[tokio::test]
    async fn test_clear_error_resets_message() {
        let h = harness();
        let _ = h.session.login("", "").await;
        assert!(h.session.last_error().is_some());

        h.session.clear_error();

        assert!(h.session.last_error().is_none());
    }

    // ===== invariants =====

    #[tokio::test]
    async fn test_user_present_iff_authenticated_across_sequence() {
        let h = harness_with(stored("good"));
        h.transport.respond(Method::Get, ME, 200, json!({"user": user_json(1, "student")}));
        h.transport.respond(Method::Post, LOGIN, 200, auth_json("t1", 2, "teacher"));
        h.transport.respond(Method::Get, "/x", 401, json!({}));

        assert_consistent(&h.session.snapshot());
        h.session.initialize().await;
        assert_consistent(&h.session.snapshot());
        h.session.logout();
        assert_consistent(&h.session.snapshot());
        let _ = h.session.login("bad", "").await;
        assert_consistent(&h.session.snapshot());
        h.session.login("a@b.com", "secret").await.unwrap();
        assert_consistent(&h.session.snapshot());
        let _ = h.session.api().get::<Value>("/x").await;
        assert_consistent(&h.session.snapshot());
        h.session.update_user(User::new(3, "X", "x@y.z", Role::Student));
        assert_consistent(&h.session.snapshot());
    }
}
