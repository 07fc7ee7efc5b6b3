//! Fallback executor
//!
//! Runs a plan's candidates strictly in priority order, one at a time,
//! short-circuiting on the first success. A candidate succeeds only when
//! its process exits zero within the per-attempt timeout AND the expected
//! output artifact exists and is non-empty. Every attempt is recorded so
//! an exhausted plan surfaces the complete diagnostic chain, not just the
//! last failure.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use super::error::{AttemptFailure, ConvertError};
use super::plan::{Backend, FallbackPlan, JobCandidate};

/// Outcome of one candidate attempt.
#[derive(Debug, Clone)]
pub enum AttemptOutcome {
    Succeeded,
    Failed { diagnostic: String },
}

/// Per-attempt record kept for diagnostics.
#[derive(Debug, Clone)]
pub struct AttemptRecord {
    pub backend: Backend,
    pub outcome: AttemptOutcome,
}

/// Result of a successfully executed plan.
#[derive(Debug)]
pub struct ExecutionReport {
    /// Backend that produced the output.
    pub backend: Backend,
    /// The output artifact.
    pub output: PathBuf,
    /// All attempts, failures first, ending with the success.
    pub attempts: Vec<AttemptRecord>,
}

/// Executes fallback plans sequentially with a per-attempt timeout.
pub struct FallbackExecutor {
    attempt_timeout: Duration,
}

impl FallbackExecutor {
    pub fn new(attempt_timeout: Duration) -> Self {
        Self { attempt_timeout }
    }

    /// Run the plan to a terminal state.
    ///
    /// The timeout applies per attempt, not per plan: a slow but
    /// successful later candidate is not penalised by time spent on
    /// earlier failures.
    pub async fn execute(&self, plan: &FallbackPlan) -> Result<ExecutionReport, ConvertError> {
        let mut attempts: Vec<AttemptRecord> = Vec::with_capacity(plan.len());

        for candidate in plan.candidates() {
            tracing::info!(
                backend = candidate.backend.id(),
                priority = candidate.priority,
                command = %candidate.invocation,
                "Attempting conversion candidate"
            );

            match self.attempt(candidate).await {
                Ok(output) => {
                    attempts.push(AttemptRecord {
                        backend: candidate.backend,
                        outcome: AttemptOutcome::Succeeded,
                    });
                    tracing::info!(
                        backend = candidate.backend.id(),
                        output = %output.display(),
                        failed_attempts = attempts.len() - 1,
                        "Conversion succeeded"
                    );
                    return Ok(ExecutionReport {
                        backend: candidate.backend,
                        output,
                        attempts,
                    });
                }
                Err(diagnostic) => {
                    tracing::warn!(
                        backend = candidate.backend.id(),
                        diagnostic = %diagnostic,
                        "Candidate failed, advancing to next"
                    );
                    // Discard any partial artifact before the next attempt.
                    remove_partial_output(candidate).await;
                    attempts.push(AttemptRecord {
                        backend: candidate.backend,
                        outcome: AttemptOutcome::Failed { diagnostic },
                    });
                }
            }
        }

        Err(ConvertError::Exhausted {
            attempts: attempts
                .into_iter()
                .map(|record| AttemptFailure {
                    backend: record.backend.id(),
                    diagnostic: match record.outcome {
                        AttemptOutcome::Failed { diagnostic } => diagnostic,
                        AttemptOutcome::Succeeded => unreachable!("success short-circuits"),
                    },
                })
                .collect(),
        })
    }

    /// Run one candidate to completion, returning the verified output path
    /// or a diagnostic describing why the attempt does not count.
    async fn attempt(&self, candidate: &JobCandidate) -> Result<PathBuf, String> {
        let mut command = candidate.invocation.command();
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match tokio::time::timeout(self.attempt_timeout, command.output()).await {
            // Dropping the output future kills the child (kill_on_drop).
            Err(_) => {
                return Err(format!(
                    "timed out after {}s",
                    self.attempt_timeout.as_secs_f64()
                ))
            }
            Ok(Err(e)) => {
                return Err(format!(
                    "failed to start {}: {}",
                    candidate.invocation.program(),
                    e
                ))
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = tail(&String::from_utf8_lossy(&output.stderr));
            return Err(match output.status.code() {
                Some(code) if stderr.is_empty() => format!("exited with code {}", code),
                Some(code) => format!("exited with code {}: {}", code, stderr),
                None => "terminated by signal".to_string(),
            });
        }

        // A zero exit is not enough; the artifact must exist and be
        // non-empty (some backends exit 0 having produced nothing).
        match tokio::fs::metadata(&candidate.expected_output).await {
            Ok(meta) if meta.len() > 0 => Ok(candidate.expected_output.clone()),
            Ok(_) => Err(format!(
                "produced empty output {}",
                candidate.expected_output.display()
            )),
            Err(_) => Err(format!(
                "produced no output at {}",
                candidate.expected_output.display()
            )),
        }
    }
}

/// Remove a failed attempt's partial artifact, best-effort.
async fn remove_partial_output(candidate: &JobCandidate) {
    // Usually NotFound; either way cleanup must not mask the failure.
    if tokio::fs::remove_file(&candidate.expected_output).await.is_ok() {
        tracing::debug!(
            path = %candidate.expected_output.display(),
            "Removed partial output"
        );
    }
}

/// Last line-ish slice of a diagnostic stream, single-line.
fn tail(text: &str) -> String {
    const MAX: usize = 400;
    let trimmed = text.trim();
    let flat = trimmed.replace(['\r', '\n'], " | ");
    if flat.len() > MAX {
        let start = flat.len() - MAX;
        // Avoid splitting a UTF-8 character.
        let start = (start..flat.len())
            .find(|&i| flat.is_char_boundary(i))
            .unwrap_or(0);
        format!("...{}", &flat[start..])
    } else {
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::invocation::Invocation;

    fn shell_candidate(priority: usize, script: String, expected: PathBuf) -> JobCandidate {
        // Tests drive the executor with `sh` directly; real plans never
        // route through a shell.
        JobCandidate {
            backend: Backend::ALL[priority % Backend::ALL.len()],
            priority,
            invocation: Invocation::new("sh").arg("-c").arg(script),
            expected_output: expected,
        }
    }

    fn executor() -> FallbackExecutor {
        FallbackExecutor::new(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn first_success_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let plan = FallbackPlan::new(vec![
            shell_candidate(0, format!("printf data > {}", out.display()), out.clone()),
            shell_candidate(1, "exit 9".to_string(), dir.path().join("unused")),
        ]);

        let report = executor().execute(&plan).await.unwrap();
        assert_eq!(report.output, out);
        assert_eq!(report.attempts.len(), 1);
    }

    #[tokio::test]
    async fn two_failures_then_success_records_full_chain() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("third.txt");
        let plan = FallbackPlan::new(vec![
            shell_candidate(0, "exit 1".to_string(), dir.path().join("a")),
            shell_candidate(1, "exit 2".to_string(), dir.path().join("b")),
            shell_candidate(2, format!("printf data > {}", out.display()), out.clone()),
        ]);

        let report = executor().execute(&plan).await.unwrap();
        assert_eq!(report.backend, plan.candidates()[2].backend);
        assert_eq!(report.attempts.len(), 3);

        let failures = report
            .attempts
            .iter()
            .filter(|a| matches!(a.outcome, AttemptOutcome::Failed { .. }))
            .count();
        assert_eq!(failures, 2);
        assert!(matches!(
            report.attempts[2].outcome,
            AttemptOutcome::Succeeded
        ));
    }

    #[tokio::test]
    async fn exhausted_plan_reports_every_attempt_and_cleans_partials() {
        let dir = tempfile::tempdir().unwrap();
        let partial = dir.path().join("partial.txt");
        let plan = FallbackPlan::new(vec![
            // Writes output, then fails: the partial must be discarded.
            shell_candidate(
                0,
                format!("printf junk > {} && exit 1", partial.display()),
                partial.clone(),
            ),
            shell_candidate(1, "exit 7".to_string(), dir.path().join("never")),
        ]);

        let err = executor().execute(&plan).await.unwrap_err();
        match err {
            ConvertError::Exhausted { attempts } => {
                assert_eq!(attempts.len(), 2);
                assert!(attempts[0].diagnostic.contains("exited with code 1"));
                assert!(attempts[1].diagnostic.contains("exited with code 7"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!partial.exists());
    }

    #[tokio::test]
    async fn zero_exit_with_missing_output_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let plan = FallbackPlan::new(vec![shell_candidate(
            0,
            "exit 0".to_string(),
            dir.path().join("ghost.txt"),
        )]);

        let err = executor().execute(&plan).await.unwrap_err();
        match err {
            ConvertError::Exhausted { attempts } => {
                assert!(attempts[0].diagnostic.contains("produced no output"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn zero_exit_with_empty_output_is_a_failure() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty.txt");
        let plan = FallbackPlan::new(vec![shell_candidate(
            0,
            format!("touch {}", out.display()),
            out,
        )]);

        let err = executor().execute(&plan).await.unwrap_err();
        match err {
            ConvertError::Exhausted { attempts } => {
                assert!(attempts[0].diagnostic.contains("produced empty output"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn hung_candidate_times_out_and_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.txt");
        let executor = FallbackExecutor::new(Duration::from_millis(200));
        let plan = FallbackPlan::new(vec![
            shell_candidate(0, "sleep 10".to_string(), dir.path().join("never")),
            shell_candidate(1, format!("printf ok > {}", out.display()), out.clone()),
        ]);

        let report = executor.execute(&plan).await.unwrap();
        assert_eq!(report.output, out);
        match &report.attempts[0].outcome {
            AttemptOutcome::Failed { diagnostic } => {
                assert!(diagnostic.contains("timed out"));
            }
            other => panic!("expected timeout failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_diagnostic() {
        let dir = tempfile::tempdir().unwrap();
        let plan = FallbackPlan::new(vec![JobCandidate {
            backend: Backend::Camelot,
            priority: 0,
            invocation: Invocation::new("prensa-test-no-such-binary").arg("x"),
            expected_output: dir.path().join("out"),
        }]);

        let err = executor().execute(&plan).await.unwrap_err();
        match err {
            ConvertError::Exhausted { attempts } => {
                assert_eq!(attempts[0].backend, "camelot");
                assert!(attempts[0].diagnostic.contains("failed to start"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn tail_flattens_and_bounds_output() {
        let long = "x".repeat(1000);
        let flattened = tail(&format!("line1\nline2\n{}", long));
        assert!(flattened.len() <= 410);
        assert!(flattened.starts_with("..."));
        assert!(!flattened.contains('\n'));
    }
}
