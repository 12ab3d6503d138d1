//! Outcome classification for generated test runs
//!
//! Generated scripts narrate their own progress in free text, so the
//! verdict comes from layered heuristics rather than a structured
//! protocol: explicit failure phrases beat explicit success phrases,
//! and both beat the exit code. A separate best-effort pass recovers
//! human-readable test cases from the script source and the narration.
//!
//! The verdict gates nothing; it exists to help a reviewer triage the
//! generated test quickly.

mod cases;
mod verdict;

pub use cases::{OutputAnalysis, TestCase, analyze_output, extract_cases};
pub use verdict::{FAILURE_PHRASES, PassFail, PhraseHeuristics, SUCCESS_PHRASES, classify};

use serde::{Deserialize, Serialize};

/// Status of one inferred test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Extracted from the script, not yet executed
    Generated,
    /// Execution was skipped; the script is ready to run manually
    ReadyToRun,
    Passed,
    Failed,
    Unknown,
}

/// Strategy seam for the pass/fail verdict.
///
/// The phrase heuristics are inherently fragile; this trait lets an
/// alternative strategy (e.g. structured output negotiated with the LLM)
/// be substituted without touching the engine.
pub trait ClassificationStrategy {
    /// Determine the verdict for one execution.
    ///
    /// `exit_code` is `None` when the process was terminated by a signal.
    fn classify(&self, stdout: &str, stderr: &str, exit_code: Option<i32>) -> PassFail;
}

impl ClassificationStrategy for PhraseHeuristics {
    fn classify(&self, stdout: &str, stderr: &str, exit_code: Option<i32>) -> PassFail {
        classify(stdout, stderr, exit_code)
    }
}
