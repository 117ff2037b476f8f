//! `HumaniqClient` builder and handle.
//!
//! This is the entry point for applications. It ties together all the
//! layers: transport → protocol → session → guards.

use std::path::PathBuf;
use std::sync::Arc;

use humaniq_guard::{Guard, GuardDecision};
use humaniq_protocol::JsonCodec;
use humaniq_session::{
    ApiClient, FileStorage, MemoryStorage, Navigator, NoopNavigator, Routes,
    SessionConfig, SessionManager, SessionStatus, Storage,
};
use humaniq_transport::{HttpTransport, Transport};
use url::Url;

use crate::ClientConfig;

/// Builder for configuring a [`HumaniqClient`].
///
/// # Example
///
/// ```rust
/// use humaniq::prelude::*;
///
/// let client = HumaniqClient::builder()
///     .api_url("https://api.humaniq.example/api".parse().unwrap())
///     .build();
/// assert_eq!(client.session().status(), SessionStatus::Initializing);
/// ```
pub struct ClientBuilder {
    config: ClientConfig,
    storage: Option<Arc<dyn Storage>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl ClientBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            storage: None,
            navigator: None,
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the API base URL.
    pub fn api_url(mut self, url: Url) -> Self {
        self.config.api_url = url;
        self
    }

    /// Persists tokens in a JSON file at `path`.
    ///
    /// Ignored when a custom [`storage`](Self::storage) is set.
    pub fn token_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.token_file = Some(path.into());
        self
    }

    /// Sets the session configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Uses a custom token storage backend.
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Uses a custom navigator for session-expiry redirects.
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Builds a client that talks HTTP to the configured API URL.
    pub fn build(self) -> HumaniqClient<HttpTransport> {
        let transport = HttpTransport::new(self.config.api_url.clone());
        self.build_with_transport(transport)
    }

    /// Builds a client over any transport.
    ///
    /// Storage defaults to the configured token file, or memory when
    /// there is none. The navigator defaults to [`NoopNavigator`].
    pub fn build_with_transport<T: Transport>(
        self,
        transport: T,
    ) -> HumaniqClient<T> {
        let ClientConfig {
            api_url,
            token_file,
            session,
        } = self.config;

        let storage: Arc<dyn Storage> = match (self.storage, &token_file) {
            (Some(storage), _) => storage,
            (None, Some(path)) => Arc::new(FileStorage::new(path)),
            (None, None) => Arc::new(MemoryStorage::new()),
        };
        let navigator: Arc<dyn Navigator> = match self.navigator {
            Some(navigator) => navigator,
            None => Arc::new(NoopNavigator),
        };

        tracing::debug!(
            %api_url,
            persistent = token_file.is_some(),
            "building client"
        );

        HumaniqClient {
            session: Arc::new(SessionManager::new(
                transport, JsonCodec, storage, navigator, session,
            )),
        }
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A configured HUMANIQ client.
///
/// Cheap to clone: clones share the same session.
pub struct HumaniqClient<T = HttpTransport> {
    session: Arc<SessionManager<T>>,
}

impl<T> Clone for HumaniqClient<T> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl HumaniqClient<HttpTransport> {
    /// Creates a new builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

impl<T: Transport> HumaniqClient<T> {
    /// Runs the one-time startup check. Safe to call from several
    /// places; only the first call touches the network.
    pub async fn start(&self) -> SessionStatus {
        self.session.initialize().await
    }

    /// The session: sign-in, registration, sign-out, current user.
    pub fn session(&self) -> &Arc<SessionManager<T>> {
        &self.session
    }

    /// The shared request pipeline, for the application's own endpoints.
    pub fn api(&self) -> &Arc<ApiClient<T>> {
        self.session.api()
    }

    pub fn routes(&self) -> &Routes {
        &self.session.config().routes
    }

    /// What `guard` decides for the session as it is right now.
    pub fn guard(&self, guard: Guard) -> GuardDecision {
        guard.evaluate(&self.session.snapshot(), self.routes())
    }

    /// What `guard` decides once the session has settled.
    ///
    /// Returns `None` only if the session is torn down while waiting.
    pub async fn resolve_guard(&self, guard: Guard) -> Option<GuardDecision> {
        let mut session = self.session.subscribe();
        guard.resolve(&mut session, self.routes()).await
    }
}

impl<T> std::fmt::Debug for HumaniqClient<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HumaniqClient")
            .field("session", &self.session)
            .finish()
    }
}
