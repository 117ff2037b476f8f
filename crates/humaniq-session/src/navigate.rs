//! Navigation: how the session sends the user to another view.
//!
//! The session layer doesn't know whether it runs behind a browser
//! router, a terminal UI or a test. It only needs "go to this path",
//! and that's what [`Navigator`] provides.

use std::sync::Mutex;

/// Moves the user to a view.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, path: &str);
}

/// Ignores every navigation. The default for headless clients.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, path: &str) {
        tracing::debug!(path, "navigation ignored");
    }
}

/// Records every navigation in order.
#[derive(Debug, Default)]
pub struct MemoryNavigator {
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every path navigated to, oldest first.
    pub fn history(&self) -> Vec<String> {
        self.entries().clone()
    }

    /// The most recent path, if any.
    pub fn current(&self) -> Option<String> {
        self.entries().last().cloned()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.history
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Navigator for MemoryNavigator {
    fn navigate(&self, path: &str) {
        self.entries().push(path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_navigator_records_in_order() {
        let nav = MemoryNavigator::new();
        assert!(nav.current().is_none());

        nav.navigate("/login");
        nav.navigate("/dashboard");

        assert_eq!(nav.history(), vec!["/login", "/dashboard"]);
        assert_eq!(nav.current().as_deref(), Some("/dashboard"));
    }
}
