//! Pass/fail verdict from narrated output

/// Binary machine verdict for one execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassFail {
    Passed,
    Failed,
}

impl PassFail {
    #[must_use]
    pub fn is_passed(self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Explicit failure phrases, matched against the lowercased combined output.
///
/// Checked before success phrases: a run that narrates both always fails.
pub const FAILURE_PHRASES: &[&str] = &[
    "test suite failed",
    "all tests failed",
    "failed",
    "error: test",
];

/// Explicit success phrases, matched against the lowercased combined output.
pub const SUCCESS_PHRASES: &[&str] = &[
    "all tests completed successfully",
    "tests passed",
    "success",
    "test completed",
];

/// Classify one execution.
///
/// Priority order, preserved exactly because changing it would silently
/// flip verdicts for existing scripts:
/// 1. any failure phrase in the combined output → `Failed`
/// 2. else any success phrase → `Passed`
/// 3. else exit code 0 → `Passed`, anything else (including signal
///    termination, `exit_code == None`) → `Failed`
///
/// The exit code alone is unreliable both ways: a narration-only crash
/// after the meaningful assertions already logged success should not flip
/// a good run, and a script that exits 0 without ever logging success
/// should not be blindly trusted.
#[must_use]
pub fn classify(stdout: &str, stderr: &str, exit_code: Option<i32>) -> PassFail {
    let combined = format!("{stdout}\n{stderr}").to_lowercase();

    if FAILURE_PHRASES.iter().any(|p| combined.contains(p)) {
        return PassFail::Failed;
    }

    if SUCCESS_PHRASES.iter().any(|p| combined.contains(p)) {
        return PassFail::Passed;
    }

    match exit_code {
        Some(0) => PassFail::Passed,
        _ => PassFail::Failed,
    }
}

/// Default [`crate::ClassificationStrategy`] implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhraseHeuristics;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_phrase_beats_nonzero_exit() {
        // Scenario A
        let verdict = classify("All tests completed successfully", "", Some(1));
        assert_eq!(verdict, PassFail::Passed);
    }

    #[test]
    fn test_silent_zero_exit_passes() {
        // Scenario B
        let verdict = classify("", "", Some(0));
        assert_eq!(verdict, PassFail::Passed);
    }

    #[test]
    fn test_failure_phrase_beats_zero_exit() {
        // Scenario C
        let verdict = classify("ERROR: Test foo failed", "", Some(0));
        assert_eq!(verdict, PassFail::Failed);
    }

    #[test]
    fn test_failure_phrase_beats_success_phrase() {
        let out = "tests passed\ntest suite failed";
        assert_eq!(classify(out, "", Some(0)), PassFail::Failed);
        assert_eq!(classify(out, "", Some(1)), PassFail::Failed);
    }

    #[test]
    fn test_phrases_in_stderr_count() {
        assert_eq!(classify("", "All Tests Failed", Some(0)), PassFail::Failed);
        assert_eq!(classify("", "Tests Passed", Some(1)), PassFail::Passed);
    }

    #[test]
    fn test_nonzero_exit_without_phrases_fails() {
        assert_eq!(classify("starting browser", "", Some(2)), PassFail::Failed);
    }

    #[test]
    fn test_signal_termination_fails() {
        assert_eq!(classify("mid-run narration", "", None), PassFail::Failed);
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert_eq!(classify("TEST SUITE FAILED", "", Some(0)), PassFail::Failed);
        assert_eq!(classify("Test Completed", "", Some(1)), PassFail::Passed);
    }

    proptest::proptest! {
        /// A failure phrase anywhere always yields Failed, whatever the
        /// exit code and whatever else was narrated around it.
        #[test]
        fn prop_failure_phrase_dominates(
            prefix in "[a-z ]{0,40}",
            suffix in "[a-z ]{0,40}",
            code in proptest::option::of(-2i32..3),
        ) {
            let stdout = format!("{prefix}test suite failed{suffix}");
            proptest::prop_assert_eq!(classify(&stdout, "", code), PassFail::Failed);
        }
    }
}
