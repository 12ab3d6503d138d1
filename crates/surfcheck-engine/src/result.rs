//! Canonical run result
//!
//! One tagged union instead of ad hoc optional fields: a run is skipped,
//! executed, or failed, and everything downstream (comment rendering,
//! the Action's JSON output, the pass/fail boolean) reads this shape.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use surfcheck_classify::{OutputAnalysis, PassFail, TestCase};

/// Result of running one execution request.
///
/// Produced exactly once per run; downstream stages only read it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Whether the run itself is considered successful at the outer
    /// boundary. Execution and provisioning failures stay `true`.
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process never ran or was terminated by a signal
    pub exit_code: Option<i32>,
    /// Set when prerequisite tooling could not be installed or the run
    /// could not be started
    pub skipped: bool,
    pub error: Option<String>,
}

impl ExecutionOutcome {
    /// An outcome for a run that never started.
    #[must_use]
    pub fn skipped(error: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            skipped: true,
            error: Some(error.into()),
        }
    }
}

/// Canonical outcome of one Action invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunResult {
    /// The run stopped before or instead of executing: not applicable,
    /// no preview target, or provisioning failed. Still a success.
    Skipped {
        reason: String,
        /// Extracted cases, statuses forced to ready-to-run when a
        /// generated script exists
        cases: Vec<TestCase>,
    },
    /// The generated script ran to a verdict.
    Executed {
        verdict: PassFail,
        cases: Vec<TestCase>,
        analysis: OutputAnalysis,
        execution: ExecutionOutcome,
    },
    /// A required stage failed (LLM or source control unreachable).
    Failed { error: String },
}

impl RunResult {
    /// The boolean pass/fail surfaced as an Action output.
    ///
    /// Skips count as passed: the contract is "attempt to generate and
    /// surface tests", not "gate the PR".
    #[must_use]
    pub fn passed(&self) -> bool {
        match self {
            Self::Skipped { .. } => true,
            Self::Executed { verdict, .. } => verdict.is_passed(),
            Self::Failed { .. } => false,
        }
    }
}

/// Everything one invocation produces.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub pr_number: u64,
    pub result: RunResult,
    /// Where the generated script was persisted, if anywhere
    pub script_path: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_counts_as_passed() {
        let result = RunResult::Skipped {
            reason: "no preview URL".to_string(),
            cases: vec![],
        };
        assert!(result.passed());
    }

    #[test]
    fn test_failed_verdict_is_not_passed() {
        let result = RunResult::Executed {
            verdict: PassFail::Failed,
            cases: vec![],
            analysis: OutputAnalysis::default(),
            execution: ExecutionOutcome::skipped("x"),
        };
        assert!(!result.passed());
    }

    #[test]
    fn test_result_serializes_with_status_tag() {
        let result = RunResult::Failed {
            error: "LLM unreachable".to_string(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "LLM unreachable");
    }

    #[test]
    fn test_skipped_outcome_shape() {
        let outcome = ExecutionOutcome::skipped("install failed");
        assert!(outcome.success);
        assert!(outcome.skipped);
        assert_eq!(outcome.error.as_deref(), Some("install failed"));
        assert!(outcome.exit_code.is_none());
    }
}
