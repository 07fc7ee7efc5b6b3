//! Tool availability prober
//!
//! Checks which external converter backends are present on the host by
//! running their version queries. Absence is a normal outcome, never an
//! error. The snapshot is probed freshly for every request: availability
//! can change between deployments and a redundant probe is cheaper than a
//! stale capability set.

use std::process::Stdio;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;

use super::invocation::Invocation;
use super::plan::Backend;

/// Immutable capability snapshot for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolAvailability {
    /// LibreOffice (general office renderer).
    pub soffice: bool,
    /// Ghostscript (PDF interpreter).
    pub ghostscript: bool,
    /// Camelot (exact-grid table engine).
    pub camelot: bool,
    /// Tabula (heuristic table engine).
    pub tabula: bool,
}

impl ToolAvailability {
    /// Whether a specific backend is present.
    pub fn has(&self, backend: Backend) -> bool {
        match backend {
            Backend::Soffice => self.soffice,
            Backend::Ghostscript => self.ghostscript,
            Backend::Camelot => self.camelot,
            Backend::Tabula => self.tabula,
        }
    }

    /// Snapshot with no backend present (useful for tests).
    pub fn none() -> Self {
        Self {
            soffice: false,
            ghostscript: false,
            camelot: false,
            tabula: false,
        }
    }
}

/// Probes the host for external converter backends.
pub struct ToolProber {
    timeout: Duration,
}

impl ToolProber {
    /// A prober whose version queries are bounded by `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Probe all backends concurrently.
    pub async fn probe(&self) -> ToolAvailability {
        let checks = Backend::ALL.map(|backend| self.check(backend.version_invocation()));
        let results = join_all(checks).await;

        let availability = ToolAvailability {
            soffice: results[0],
            ghostscript: results[1],
            camelot: results[2],
            tabula: results[3],
        };

        tracing::debug!(
            soffice = availability.soffice,
            ghostscript = availability.ghostscript,
            camelot = availability.camelot,
            tabula = availability.tabula,
            "Probed converter backends"
        );

        availability
    }

    /// Run one version query. Missing binary, non-zero exit, and timeout
    /// all mean "not available".
    async fn check(&self, invocation: Invocation) -> bool {
        let mut command = invocation.command();
        command.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

        match tokio::time::timeout(self.timeout, command.status()).await {
            Ok(Ok(status)) => status.success(),
            // Spawn failure: the binary is not on PATH.
            Ok(Err(_)) => false,
            // Timeout: the future is dropped here and kill_on_drop reaps
            // the child.
            Err(_) => false,
        }
    }
}
