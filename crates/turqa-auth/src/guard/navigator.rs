//! Navigation abstraction used by the route guard.

use std::sync::Mutex;

use tokio::sync::watch;

/// Something that owns the current location and can replace it.
pub trait Navigator: Send + Sync + std::fmt::Debug {
    /// Replace the current location with `path` (no history entry).
    fn replace(&self, path: &str);

    /// Observe the current location.
    fn location(&self) -> watch::Receiver<String>;
}

/// In-memory navigator used by the CLI and tests.
#[derive(Debug)]
pub struct MemoryNavigator {
    /// Current path
    path: watch::Sender<String>,
    /// Every path passed to `replace`, in order
    replacements: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    /// Create a navigator positioned at `initial`.
    pub fn new(initial: impl Into<String>) -> Self {
        let (path, _) = watch::channel(initial.into());
        Self {
            path,
            replacements: Mutex::new(Vec::new()),
        }
    }

    /// User-initiated navigation (a link click or typed URL).
    pub fn navigate(&self, path: impl Into<String>) {
        self.path.send_replace(path.into());
    }

    /// Current path.
    pub fn current(&self) -> String {
        self.path.borrow().clone()
    }

    /// Paths passed to `replace` so far.
    pub fn replacements(&self) -> Vec<String> {
        self.replacements
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Navigator for MemoryNavigator {
    fn replace(&self, path: &str) {
        self.replacements
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(path.to_string());
        self.path.send_replace(path.to_string());
    }

    fn location(&self) -> watch::Receiver<String> {
        self.path.subscribe()
    }
}
