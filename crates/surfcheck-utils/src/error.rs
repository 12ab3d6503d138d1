//! Error taxonomy for surfcheck
//!
//! Errors are grouped by the failure classes the Action distinguishes:
//! setup errors are fatal, collaborator errors end the run in the error
//! state, and provisioning/execution/reporting errors are downgraded by
//! the engine rather than surfaced here.

use std::time::Duration;
use thiserror::Error;

use crate::exit_codes::ExitCode;

/// Top-level error type returned by surfcheck library operations.
///
/// # Error Categories
///
/// | Category | Description | Run impact |
/// |----------|-------------|------------|
/// | `Config` | Bad or missing Action input, wrong event type | fatal |
/// | `Llm` | LLM backend failure during a required stage | run fails |
/// | `Github` | GitHub REST failure during a required stage | run fails |
/// | `Provision` | Dependency/browser install failure | downgraded |
/// | `Runner` | Script spawn/timeout/exit failure | downgraded |
/// | `Report` | Comment posting failure | logged only |
///
/// The downgraded categories still exist as typed errors so the engine
/// can decide the degradation; they only reach the process boundary when
/// something bypasses that policy.
#[derive(Error, Debug)]
pub enum SurfCheckError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM backend error: {0}")]
    Llm(#[from] LlmError),

    #[error("GitHub API error: {0}")]
    Github(#[from] GithubError),

    #[error("Provisioning error: {0}")]
    Provision(#[from] ProvisionError),

    #[error("Runner error: {0}")]
    Runner(#[from] RunnerError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SurfCheckError {
    /// Map this error to the CLI exit code contract.
    ///
    /// Setup errors exit 2, collaborator failures during required stages
    /// exit 70. Everything else is a handled outcome and never reaches
    /// the process boundary as an error, so it maps to the generic
    /// failure code as a backstop.
    #[must_use]
    pub fn to_exit_code(&self) -> ExitCode {
        match self {
            Self::Config(_) => ExitCode::ConfigError,
            Self::Llm(_) | Self::Github(_) => ExitCode::CollaboratorError,
            _ => ExitCode::GeneralError,
        }
    }

    /// User-facing message with a likely-cause hint where one exists.
    #[must_use]
    pub fn display_for_user(&self) -> String {
        match self {
            Self::Config(e) => format!("{e}\n{}", e.hint()),
            Self::Llm(e) => format!("{e}\n{}", e.hint()),
            Self::Github(e) => format!("{e}"),
            other => other.to_string(),
        }
    }
}

/// Action input and event-context errors. All fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required input: {0}")]
    MissingRequired(String),

    #[error("Invalid value for input '{key}': {value}")]
    InvalidValue { key: String, value: String },

    #[error("Not running against a pull_request event (got '{event}')")]
    NotPullRequest { event: String },

    #[error("Event payload unreadable at {path}: {reason}")]
    EventPayloadUnreadable { path: String, reason: String },

    #[error("Input validation failed: {0} problem(s)")]
    ValidationFailed(usize),
}

impl ConfigError {
    /// One-line remediation hint appended to the fatal error message.
    #[must_use]
    pub fn hint(&self) -> String {
        match self {
            Self::MissingRequired(key) => {
                format!("Set the '{key}' input in your workflow's `with:` block.")
            }
            Self::InvalidValue { key, .. } => {
                format!("Check the documented format for the '{key}' input.")
            }
            Self::NotPullRequest { .. } => {
                "Trigger this Action from `on: pull_request` only.".to_string()
            }
            Self::EventPayloadUnreadable { .. } => {
                "This usually means the Action is running outside GitHub Actions.".to_string()
            }
            Self::ValidationFailed(_) => "See the preceding log lines for each problem.".to_string(),
        }
    }
}

/// LLM backend errors.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Misconfiguration: {0}")]
    Misconfiguration(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limit exceeded: {0}")]
    Quota(String),

    #[error("Provider outage: {0}")]
    Outage(String),

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Request timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Empty response from provider")]
    EmptyResponse,

    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl LlmError {
    #[must_use]
    pub fn hint(&self) -> String {
        match self {
            Self::Auth(_) => "Verify the anthropic-api-key input is valid.".to_string(),
            Self::Quota(_) => "Rate limited; re-run the workflow later.".to_string(),
            Self::Outage(_) | Self::Transport(_) => {
                "Likely transient; re-run the workflow.".to_string()
            }
            Self::Timeout { .. } => "Consider a smaller diff or a faster model tier.".to_string(),
            Self::Misconfiguration(_) | Self::EmptyResponse | Self::Malformed(_) => String::new(),
        }
    }
}

/// GitHub REST collaborator errors.
#[derive(Error, Debug)]
pub enum GithubError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Request timed out after {duration:?}")]
    Timeout { duration: Duration },
}

/// Dependency provisioning errors. Always downgraded by the engine.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Package manager not found: {0}")]
    ToolMissing(String),

    #[error("Install of {packages} failed: {reason}")]
    InstallFailed { packages: String, reason: String },

    #[error("Install of {packages} timed out after {timeout_seconds} seconds")]
    InstallTimeout {
        packages: String,
        timeout_seconds: u64,
    },

    #[error("Browser binary install failed: {reason}")]
    BrowserInstallFailed { reason: String },
}

/// Script execution errors. Downgraded by the engine, never fatal.
#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("Failed to spawn script process: {reason}")]
    SpawnFailed { reason: String },

    #[error("Failed to persist script to a temporary file: {reason}")]
    ScriptWriteFailed { reason: String },

    #[error("Script exited with code {code}")]
    ExitFailure {
        code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("Script timed out after {timeout_seconds} seconds")]
    Timeout {
        timeout_seconds: u64,
        stdout: String,
        stderr: String,
    },
}

/// Reporting errors. Logged only; never affect run status.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to post PR comment: {0}")]
    CommentFailed(String),

    #[error("Failed to write output artifact at {path}: {reason}")]
    ArtifactWriteFailed { path: String, reason: String },
}
