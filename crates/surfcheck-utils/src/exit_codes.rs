//! CLI exit-code contract
//!
//! Handled outcomes always exit 0, including generated-test failures and
//! skipped executions: the Action's contract is "attempt to generate and
//! surface tests", not "gate merges on test results". Non-zero codes are
//! reserved for failures of the Action's own control plane.

/// Process exit codes for the surfcheck binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Handled outcome, including test failures and skipped runs
    Success,
    /// Unhandled error without a more specific class
    GeneralError,
    /// Missing/invalid input or wrong event type
    ConfigError,
    /// LLM or GitHub unreachable during a required stage
    CollaboratorError,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::GeneralError => 1,
            Self::ConfigError => 2,
            Self::CollaboratorError => 70,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::GeneralError.as_i32(), 1);
        assert_eq!(ExitCode::ConfigError.as_i32(), 2);
        assert_eq!(ExitCode::CollaboratorError.as_i32(), 70);
    }
}
