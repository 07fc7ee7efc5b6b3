//! Conversion error taxonomy
//!
//! `BackendFailure`-class problems (one candidate failing) never surface
//! alone; they are recorded as [`AttemptFailure`] entries and drive the
//! fallback. Only plan-level failures reach the caller, and both carry the
//! full list of backends that were considered or attempted.

use thiserror::Error;

/// One failed candidate attempt, kept for the diagnostic chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFailure {
    /// Backend identifier (e.g. "ghostscript").
    pub backend: &'static str,
    /// Why the attempt failed: spawn error, exit status + stderr tail,
    /// timeout, or missing/empty output artifact.
    pub diagnostic: String,
}

/// Conversion orchestration errors
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The preference table filtered down to zero candidates.
    #[error("No backend available for {operation} (requires one of: {})", .considered.join(", "))]
    NoBackendAvailable {
        operation: String,
        /// Backends the preference table named, none of which are present.
        considered: Vec<&'static str>,
    },

    /// Every candidate in the plan failed.
    #[error("All {} conversion backends failed: {}", .attempts.len(), join_attempts(.attempts))]
    Exhausted { attempts: Vec<AttemptFailure> },
}

fn join_attempts(attempts: &[AttemptFailure]) -> String {
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.backend, a.diagnostic))
        .collect::<Vec<_>>()
        .join("; ")
}
