//! Action surface for surfcheck
//!
//! Every input maps to both a CLI flag and the `INPUT_*` environment
//! variable GitHub Actions injects, so the binary behaves identically
//! under `uses:` and when invoked by hand. GitHub sets unset optional
//! inputs to empty strings; normalization treats those as absent.

mod event;
mod inputs;

pub use event::EventContext;
pub use inputs::RawInputs;
pub use surfcheck_utils::error::ConfigError;

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

/// Configured test-user credentials for generated login flows.
///
/// These values must never appear in any externally visible surface;
/// the sanitizer is seeded with them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestUser {
    pub email: String,
    pub password: String,
}

/// Fully resolved, validated run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub github_token: String,
    /// "owner/name"
    pub repo: String,
    pub pr_number: u64,
    /// Wall-clock limit for the generated script
    pub execution_timeout: Duration,
    pub comment_on_pr: bool,
    /// Explicit preview URL; always wins over discovery
    pub base_url: Option<String>,
    /// How long to poll for a preview URL
    pub wait_for_preview: Duration,
    /// Free-text style examples fed into the generation prompt
    pub test_examples: Option<String>,
    /// Directory the generated script is persisted under
    pub output_dir: Option<PathBuf>,
    pub test_user: Option<TestUser>,
    pub verbose: bool,
}

impl Config {
    /// Resolve raw inputs plus event context into a validated config.
    ///
    /// Collects every violation before failing so a misconfigured
    /// workflow surfaces all problems in one run.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for missing required inputs or invalid
    /// values.
    pub fn resolve(raw: RawInputs, event: EventContext) -> Result<Self, ConfigError> {
        let mut problems = Vec::new();

        let anthropic_api_key = normalize(raw.anthropic_api_key);
        if anthropic_api_key.is_none() {
            problems.push("anthropic-api-key is required".to_string());
        }

        let github_token = normalize(raw.github_token);
        if github_token.is_none() {
            problems.push("github-token is required".to_string());
        }

        let base_url = normalize(raw.base_url);
        if let Some(ref candidate) = base_url {
            if url::Url::parse(candidate).is_err() {
                problems.push(format!("base-url is not a valid URL: {candidate}"));
            }
        }

        if raw.timeout_seconds == 0 {
            problems.push("timeout-seconds must be greater than zero".to_string());
        }

        let email = normalize(raw.test_user_email);
        let password = normalize(raw.test_user_password);
        let test_user = match (email, password) {
            (Some(email), Some(password)) => Some(TestUser { email, password }),
            (None, None) => None,
            _ => {
                problems.push(
                    "test-user-email and test-user-password must be provided together".to_string(),
                );
                None
            }
        };

        if !problems.is_empty() {
            for problem in &problems {
                warn!("Invalid input: {problem}");
            }
            if let Some(first_missing) = problems.iter().find(|p| p.ends_with("is required")) {
                let key = first_missing
                    .split_whitespace()
                    .next()
                    .unwrap_or_default()
                    .to_string();
                return Err(ConfigError::MissingRequired(key));
            }
            return Err(ConfigError::ValidationFailed(problems.len()));
        }

        Ok(Self {
            anthropic_api_key: anthropic_api_key.expect("checked above"),
            github_token: github_token.expect("checked above"),
            repo: event.repo,
            pr_number: event.pr_number,
            execution_timeout: Duration::from_secs(raw.timeout_seconds),
            comment_on_pr: raw.comment_on_pr,
            base_url,
            wait_for_preview: Duration::from_secs(raw.wait_for_preview),
            test_examples: normalize(raw.test_examples),
            output_dir: normalize(raw.output_dir).map(PathBuf::from),
            test_user,
            verbose: raw.verbose,
        })
    }

    /// Literal credential values the sanitizer must be seeded with.
    #[must_use]
    pub fn secret_literals(&self) -> Vec<&str> {
        let mut literals = vec![
            self.anthropic_api_key.as_str(),
            self.github_token.as_str(),
        ];
        if let Some(user) = &self.test_user {
            literals.push(user.email.as_str());
            literals.push(user.password.as_str());
        }
        literals
    }
}

/// Empty strings from unset Action inputs become `None`.
fn normalize(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}
