//! Preview-URL discovery
//!
//! A preview deployment URL for the PR head is discovered by polling the
//! source-control collaborator: deployment statuses first, then bot
//! comments. An explicit override always wins and skips polling
//! entirely. Discovery failing is never fatal; the engine degrades the
//! run instead.

use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::types::{AuthorType, PullRequest};
use crate::SourceControlClient;

/// Fixed interval between discovery attempts.
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Where a preview URL came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewSource {
    /// Supplied explicitly via the base-url input
    Override,
    /// A successful deployment status for the head commit
    Deployment,
    /// A URL posted by a bot comment
    Comment,
}

/// A discovered preview target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub url: String,
    pub source: PreviewSource,
}

static URL_IN_TEXT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"https?://[^\s)\]>"'`]+"#).expect("valid pattern"));

/// Poll for a preview URL until `max_wait` elapses.
///
/// With `max_wait` of zero a single discovery pass still runs. Poll
/// failures are logged and retried rather than propagated.
pub async fn discover_preview_url(
    client: &dyn SourceControlClient,
    pr: &PullRequest,
    override_url: Option<&str>,
    max_wait: Duration,
) -> Option<Preview> {
    if let Some(url) = override_url {
        debug!(url, "Using explicit base URL, skipping preview discovery");
        return Some(Preview {
            url: url.to_string(),
            source: PreviewSource::Override,
        });
    }

    let deadline = Instant::now() + max_wait;

    loop {
        if let Some(preview) = discovery_pass(client, pr).await {
            return Some(preview);
        }

        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            debug!(
                wait_secs = max_wait.as_secs(),
                "No preview URL found within the wait window"
            );
            return None;
        }

        tokio::time::sleep(POLL_INTERVAL.min(remaining)).await;
    }
}

async fn discovery_pass(client: &dyn SourceControlClient, pr: &PullRequest) -> Option<Preview> {
    match client.list_deployment_urls(&pr.head_sha).await {
        Ok(urls) => {
            if let Some(url) = urls.into_iter().find(|u| is_plausible_preview(u)) {
                debug!(url, "Preview URL found in deployment statuses");
                return Some(Preview {
                    url,
                    source: PreviewSource::Deployment,
                });
            }
        }
        Err(e) => warn!(error = %e, "Deployment lookup failed, will keep polling"),
    }

    match client.list_comments(pr.number).await {
        Ok(comments) => {
            for comment in comments.iter().filter(|c| c.author_type == AuthorType::Bot) {
                for found in URL_IN_TEXT.find_iter(&comment.body) {
                    let candidate = found.as_str().trim_end_matches(['.', ',', '!', '?']);
                    if is_plausible_preview(candidate) {
                        debug!(url = candidate, "Preview URL found in bot comment");
                        return Some(Preview {
                            url: candidate.to_string(),
                            source: PreviewSource::Comment,
                        });
                    }
                }
            }
        }
        Err(e) => warn!(error = %e, "Comment lookup failed, will keep polling"),
    }

    None
}

/// Filter out URLs that cannot be a preview deployment, most notably
/// links back into github.com that bots routinely include.
fn is_plausible_preview(candidate: &str) -> bool {
    match url::Url::parse(candidate) {
        Ok(parsed) => parsed
            .host_str()
            .is_some_and(|host| host != "github.com" && !host.ends_with(".github.com")),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChangedFile, Comment};
    use async_trait::async_trait;
    use surfcheck_utils::error::GithubError;

    struct FakeClient {
        deployment_urls: Vec<String>,
        comments: Vec<Comment>,
    }

    #[async_trait]
    impl SourceControlClient for FakeClient {
        async fn get_pull_request(&self, _number: u64) -> Result<PullRequest, GithubError> {
            unimplemented!("not used by discovery")
        }

        async fn list_changed_files(&self, _n: u64) -> Result<Vec<ChangedFile>, GithubError> {
            unimplemented!("not used by discovery")
        }

        async fn list_comments(&self, _n: u64) -> Result<Vec<Comment>, GithubError> {
            Ok(self.comments.clone())
        }

        async fn create_comment(&self, _n: u64, _body: &str) -> Result<(), GithubError> {
            Ok(())
        }

        async fn get_file_content(&self, _path: &str) -> Result<Option<String>, GithubError> {
            Ok(None)
        }

        async fn list_deployment_urls(&self, _sha: &str) -> Result<Vec<String>, GithubError> {
            Ok(self.deployment_urls.clone())
        }
    }

    fn pr() -> PullRequest {
        PullRequest {
            number: 7,
            title: "t".into(),
            body: None,
            head_sha: "abc".into(),
            base_sha: "def".into(),
            author: "octocat".into(),
        }
    }

    fn bot_comment(body: &str) -> Comment {
        Comment {
            author_type: AuthorType::Bot,
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_override_wins_over_everything() {
        let client = FakeClient {
            deployment_urls: vec!["https://deploy.example.app".into()],
            comments: vec![],
        };
        let preview = discover_preview_url(
            &client,
            &pr(),
            Some("https://override.example.app"),
            Duration::ZERO,
        )
        .await
        .unwrap();
        assert_eq!(preview.url, "https://override.example.app");
        assert_eq!(preview.source, PreviewSource::Override);
    }

    #[tokio::test]
    async fn test_deployment_beats_comment() {
        let client = FakeClient {
            deployment_urls: vec!["https://deploy.example.app".into()],
            comments: vec![bot_comment("Preview ready at https://comment.example.app")],
        };
        let preview = discover_preview_url(&client, &pr(), None, Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(preview.url, "https://deploy.example.app");
        assert_eq!(preview.source, PreviewSource::Deployment);
    }

    #[tokio::test]
    async fn test_bot_comment_url_extracted() {
        let client = FakeClient {
            deployment_urls: vec![],
            comments: vec![
                Comment {
                    author_type: AuthorType::User,
                    body: "see https://human.example.app".to_string(),
                },
                bot_comment("✅ Deployed to https://pr-7.example.app! Enjoy."),
            ],
        };
        let preview = discover_preview_url(&client, &pr(), None, Duration::ZERO)
            .await
            .unwrap();
        // Human comments are ignored; trailing punctuation is trimmed.
        assert_eq!(preview.url, "https://pr-7.example.app");
        assert_eq!(preview.source, PreviewSource::Comment);
    }

    #[tokio::test]
    async fn test_github_links_filtered() {
        let client = FakeClient {
            deployment_urls: vec![],
            comments: vec![bot_comment(
                "Details: https://github.com/o/r/actions/runs/1",
            )],
        };
        let preview = discover_preview_url(&client, &pr(), None, Duration::ZERO).await;
        assert!(preview.is_none());
    }

    #[tokio::test]
    async fn test_no_candidates_yields_none() {
        let client = FakeClient {
            deployment_urls: vec![],
            comments: vec![],
        };
        let preview = discover_preview_url(&client, &pr(), None, Duration::ZERO).await;
        assert!(preview.is_none());
    }
}
