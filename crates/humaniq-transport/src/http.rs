//! HTTP transport implementation using `reqwest`.

use url::Url;

use crate::{Method, Request, Response, Transport, TransportError};

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A `reqwest`-based [`Transport`] rooted at the API base URL.
///
/// Request paths are appended to the base URL's path, so a base of
/// `https://host/api` and a path of `/auth/login` hit
/// `https://host/api/auth/login`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport with a default `reqwest::Client`.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Uses a custom HTTP client (connection pool reuse, proxies, tests).
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The base URL every request path is appended to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, TransportError> {
        // `Url::join` would replace the base path on a leading slash.
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| TransportError::InvalidUrl(format!("{joined}: {e}")))
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let url = self.endpoint(&request.path)?;
        let mut builder = self.client.request(request.method.into(), url);

        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = request.body {
            builder = builder
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::debug!(id = %request.id, error = %e, "request failed");
            TransportError::Request(e)
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(TransportError::Body)?;

        tracing::debug!(
            id = %request.id,
            method = %request.method,
            path = %request.path,
            status,
            "request completed"
        );

        Ok(Response::new(status, body.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(base.parse().unwrap())
    }

    #[test]
    fn test_endpoint_appends_to_base_path() {
        let t = transport("http://localhost:5000/api");
        let url = t.endpoint("/auth/login").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/auth/login");
    }

    #[test]
    fn test_endpoint_tolerates_trailing_and_missing_slashes() {
        let t = transport("http://localhost:5000/api/");
        assert_eq!(
            t.endpoint("users/me").unwrap().as_str(),
            "http://localhost:5000/api/users/me"
        );
    }

    #[test]
    fn test_endpoint_bare_host() {
        let t = transport("http://localhost:5000");
        assert_eq!(
            t.endpoint("/users/me").unwrap().as_str(),
            "http://localhost:5000/users/me"
        );
    }

    #[test]
    fn test_method_converts_to_reqwest() {
        assert_eq!(reqwest::Method::from(Method::Put), reqwest::Method::PUT);
        assert_eq!(reqwest::Method::from(Method::Get), reqwest::Method::GET);
    }
}
