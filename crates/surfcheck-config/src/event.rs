//! GitHub Actions event context

use serde::Deserialize;
use std::path::Path;

use surfcheck_utils::error::ConfigError;

/// The minimum of the Actions event surface surfcheck needs: which repo,
/// which pull request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    /// "owner/name"
    pub repo: String,
    pub pr_number: u64,
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    pull_request: Option<PullRequestRef>,
    number: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PullRequestRef {
    number: u64,
}

impl EventContext {
    /// Read the event context from the Actions environment
    /// (`GITHUB_REPOSITORY`, `GITHUB_EVENT_NAME`, `GITHUB_EVENT_PATH`).
    ///
    /// # Errors
    ///
    /// - [`ConfigError::NotPullRequest`] when the workflow was not
    ///   triggered by a pull_request event
    /// - [`ConfigError::EventPayloadUnreadable`] when the payload is
    ///   missing or malformed
    pub fn from_env() -> Result<Self, ConfigError> {
        let repo = std::env::var("GITHUB_REPOSITORY")
            .map_err(|_| ConfigError::MissingRequired("GITHUB_REPOSITORY".to_string()))?;
        let event_name = std::env::var("GITHUB_EVENT_NAME").unwrap_or_default();
        let event_path = std::env::var("GITHUB_EVENT_PATH")
            .map_err(|_| ConfigError::MissingRequired("GITHUB_EVENT_PATH".to_string()))?;

        Self::from_parts(repo, &event_name, Path::new(&event_path))
    }

    /// Assemble the context from explicit parts (test seam).
    ///
    /// # Errors
    ///
    /// Same contract as [`EventContext::from_env`].
    pub fn from_parts(
        repo: String,
        event_name: &str,
        event_path: &Path,
    ) -> Result<Self, ConfigError> {
        if !event_name.starts_with("pull_request") {
            return Err(ConfigError::NotPullRequest {
                event: event_name.to_string(),
            });
        }

        let raw =
            std::fs::read_to_string(event_path).map_err(|e| ConfigError::EventPayloadUnreadable {
                path: event_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let payload: EventPayload =
            serde_json::from_str(&raw).map_err(|e| ConfigError::EventPayloadUnreadable {
                path: event_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let pr_number = payload
            .pull_request
            .map(|p| p.number)
            .or(payload.number)
            .ok_or_else(|| ConfigError::EventPayloadUnreadable {
                path: event_path.display().to_string(),
                reason: "payload carries no pull request number".to_string(),
            })?;

        Ok(Self { repo, pr_number })
    }
}
