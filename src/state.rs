//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::convert::{FallbackExecutor, ToolProber};
use crate::workspace::Workspace;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Open a fresh workspace under the configured temp root.
    pub fn workspace(&self) -> std::io::Result<Workspace> {
        Workspace::create(&self.inner.config.transform.temp_root)
    }

    /// Prober configured with the probe timeout.
    ///
    /// Built per request: availability snapshots are never cached.
    pub fn prober(&self) -> ToolProber {
        ToolProber::new(self.inner.config.transform.probe_timeout())
    }

    /// Executor configured with the per-attempt timeout.
    pub fn executor(&self) -> FallbackExecutor {
        FallbackExecutor::new(self.inner.config.transform.attempt_timeout())
    }
}
