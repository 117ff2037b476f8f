//! A scripted [`Transport`] for unit tests.
//!
//! Routes are keyed by method and path. Unscripted routes answer 404.
//! Every request is recorded so tests can assert on call counts and on
//! the bearer that was sent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use humaniq_transport::{Method, Request, Response, Transport, TransportError};

#[derive(Debug, Clone)]
enum Scripted {
    Respond { status: u16, body: Vec<u8> },
    Fail,
}

#[derive(Debug, Default)]
struct Inner {
    routes: Mutex<HashMap<(Method, String), Scripted>>,
    calls: Mutex<Vec<Request>>,
    delay: Mutex<Option<Duration>>,
    route_delays: Mutex<HashMap<(Method, String), Duration>>,
}

/// Clones share routes and the call log.
#[derive(Debug, Clone, Default)]
pub(crate) struct ScriptedTransport {
    inner: Arc<Inner>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|p| p.into_inner())
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answers `method path` with `status` and a JSON body.
    pub(crate) fn respond(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: serde_json::Value,
    ) {
        let body = serde_json::to_vec(&body).unwrap_or_default();
        self.respond_raw(method, path, status, &body);
    }

    pub(crate) fn respond_raw(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: &[u8],
    ) {
        let scripted = Scripted::Respond {
            status,
            body: body.to_vec(),
        };
        lock(&self.inner.routes).insert((method, path.to_string()), scripted);
    }

    /// Makes `method path` fail as if the network were down.
    pub(crate) fn fail(&self, method: Method, path: &str) {
        lock(&self.inner.routes).insert((method, path.to_string()), Scripted::Fail);
    }

    /// Delays every response, to keep calls in flight.
    pub(crate) fn set_delay(&self, delay: Duration) {
        *lock(&self.inner.delay) = Some(delay);
    }

    /// Delays only `method path`, overriding the global delay.
    pub(crate) fn delay_route(&self, method: Method, path: &str, delay: Duration) {
        lock(&self.inner.route_delays).insert((method, path.to_string()), delay);
    }

    pub(crate) fn calls_to(&self, method: Method, path: &str) -> usize {
        lock(&self.inner.calls)
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        lock(&self.inner.calls).len()
    }

    pub(crate) fn last_request(&self, method: Method, path: &str) -> Option<Request> {
        lock(&self.inner.calls)
            .iter()
            .rev()
            .find(|r| r.method == method && r.path == path)
            .cloned()
    }
}

impl Transport for ScriptedTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let key = (request.method, request.path.clone());
        lock(&self.inner.calls).push(request);
        let scripted = lock(&self.inner.routes).get(&key).cloned();
        let delay = lock(&self.inner.route_delays)
            .get(&key)
            .copied()
            .or(*lock(&self.inner.delay));

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match scripted {
            Some(Scripted::Respond { status, body }) => Ok(Response::new(status, body)),
            Some(Scripted::Fail) => Err(TransportError::Unavailable(format!(
                "{} {} unreachable",
                key.0, key.1
            ))),
            None => Ok(Response::new(404, br#"{"message":"not found"}"#.to_vec())),
        }
    }
}
