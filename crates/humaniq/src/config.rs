//! Client configuration, with defaults and environment overrides.
//!
//! | variable | effect | default |
//! |---|---|---|
//! | `HUMANIQ_API_URL` | API base URL | `http://localhost:5000/api` |
//! | `HUMANIQ_TOKEN_FILE` | persist tokens in this JSON file | in-memory |
//! | `HUMANIQ_SIGN_IN_PATH` | where expired sessions are sent | `/login` |

use std::path::PathBuf;

use humaniq_session::SessionConfig;
use url::Url;

pub const API_URL_VAR: &str = "HUMANIQ_API_URL";
pub const TOKEN_FILE_VAR: &str = "HUMANIQ_TOKEN_FILE";
pub const SIGN_IN_PATH_VAR: &str = "HUMANIQ_SIGN_IN_PATH";

/// Where the API lives when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";

/// A setting from the environment that couldn't be used.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL ({value:?}): {source}")]
    InvalidUrl {
        var: &'static str,
        value: String,
        #[source]
        source: url::ParseError,
    },
}

/// Everything needed to build a [`HumaniqClient`](crate::HumaniqClient).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_url: Url,
    /// `None` keeps tokens in memory only.
    pub token_file: Option<PathBuf>,
    pub session: SessionConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token_file: None,
            session: SessionConfig::default(),
        }
    }
}

fn default_api_url() -> Url {
    Url::parse(DEFAULT_API_URL).expect("default API URL is valid")
}

impl ClientConfig {
    /// Reads the `HUMANIQ_*` variables over the defaults. Unset and
    /// empty variables keep the default.
    ///
    /// # Errors
    /// [`ConfigError::InvalidUrl`] if `HUMANIQ_API_URL` doesn't parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup` instead of the process environment.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(value) = get(API_URL_VAR) {
            config.api_url =
                Url::parse(value.trim()).map_err(|source| ConfigError::InvalidUrl {
                    var: API_URL_VAR,
                    value,
                    source,
                })?;
        }
        if let Some(path) = get(TOKEN_FILE_VAR) {
            config.token_file = Some(PathBuf::from(path));
        }
        if let Some(path) = get(SIGN_IN_PATH_VAR) {
            config.session.routes.sign_in = path;
        }
        Ok(config)
    }
}
