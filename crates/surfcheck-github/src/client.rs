//! REST v3 implementation of the source-control collaborator

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::types::{AuthorType, ChangedFile, Comment, PullRequest};
use crate::SourceControlClient;
use surfcheck_utils::error::GithubError;

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = "surfcheck";

/// Per-request timeout; GitHub answers fast or not at all.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry attempts for 5xx and network failures
const MAX_RETRIES: u32 = 2;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// How many deployments to inspect for a preview URL.
const DEPLOYMENT_SCAN_LIMIT: usize = 5;

/// GitHub REST client scoped to one repository.
#[derive(Clone)]
pub struct GithubClient {
    client: Client,
    base_url: String,
    repo: String,
    token: String,
}

impl GithubClient {
    /// # Errors
    ///
    /// Returns `GithubError::Transport` if the HTTP client cannot be built.
    pub fn new(repo: impl Into<String>, token: impl Into<String>) -> Result<Self, GithubError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GithubError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            repo: repo.into(),
            token: token.into(),
        })
    }

    /// Override the API endpoint (test seam and GHES support).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&self.token)
            .header("accept", "application/vnd.github+json")
            .header("x-github-api-version", API_VERSION)
            .timeout(REQUEST_TIMEOUT)
    }

    async fn send_with_retry(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<Response, GithubError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let request = builder
                .try_clone()
                .ok_or_else(|| GithubError::Transport("Failed to clone request".into()))?;

            match request.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status.is_server_error() && attempt <= MAX_RETRIES {
                        warn!(attempt, status = status.as_u16(), "GitHub server error, will retry");
                        tokio::time::sleep(INITIAL_BACKOFF * attempt).await;
                        continue;
                    }

                    if status.is_success() {
                        return Ok(response);
                    }

                    let message = response.text().await.unwrap_or_default();
                    return Err(map_status(status, &message));
                }
                Err(e) => {
                    if e.is_timeout() {
                        return Err(GithubError::Timeout {
                            duration: REQUEST_TIMEOUT,
                        });
                    }
                    if attempt <= MAX_RETRIES {
                        warn!(attempt, error = %e, "GitHub network error, will retry");
                        tokio::time::sleep(INITIAL_BACKOFF * attempt).await;
                        continue;
                    }
                    return Err(GithubError::Transport(e.to_string()));
                }
            }
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, GithubError> {
        let response = self.send_with_retry(self.get(path)).await?;
        response
            .json()
            .await
            .map_err(|e| GithubError::Transport(format!("Failed to parse response: {e}")))
    }
}

fn map_status(status: StatusCode, message: &str) -> GithubError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            GithubError::Auth(format!("{status}: {}", truncate(message)))
        }
        StatusCode::NOT_FOUND => GithubError::NotFound(truncate(message)),
        _ => GithubError::Api {
            status: status.as_u16(),
            message: truncate(message),
        },
    }
}

fn truncate(message: &str) -> String {
    message.chars().take(200).collect()
}

#[derive(Debug, Deserialize)]
struct ApiPull {
    number: u64,
    title: String,
    body: Option<String>,
    user: ApiUser,
    head: ApiRef,
    base: ApiRef,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
    #[serde(rename = "type", default)]
    user_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    filename: String,
    status: String,
    additions: u64,
    deletions: u64,
    patch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiComment {
    user: ApiUser,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiDeployment {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct ApiDeploymentStatus {
    state: String,
    environment_url: Option<String>,
}

fn author_type(user: &ApiUser) -> AuthorType {
    match user.user_type.as_deref() {
        Some("Bot") => AuthorType::Bot,
        _ => AuthorType::User,
    }
}

#[async_trait]
impl SourceControlClient for GithubClient {
    async fn get_pull_request(&self, number: u64) -> Result<PullRequest, GithubError> {
        let pull: ApiPull = self
            .get_json(&format!("/repos/{}/pulls/{number}", self.repo))
            .await?;

        Ok(PullRequest {
            number: pull.number,
            title: pull.title,
            body: pull.body,
            head_sha: pull.head.sha,
            base_sha: pull.base.sha,
            author: pull.user.login,
        })
    }

    async fn list_changed_files(&self, number: u64) -> Result<Vec<ChangedFile>, GithubError> {
        let files: Vec<ApiFile> = self
            .get_json(&format!(
                "/repos/{}/pulls/{number}/files?per_page=100",
                self.repo
            ))
            .await?;

        Ok(files
            .into_iter()
            .map(|f| ChangedFile {
                path: f.filename,
                status: f.status,
                additions: f.additions,
                deletions: f.deletions,
                patch: f.patch,
            })
            .collect())
    }

    async fn list_comments(&self, number: u64) -> Result<Vec<Comment>, GithubError> {
        let comments: Vec<ApiComment> = self
            .get_json(&format!(
                "/repos/{}/issues/{number}/comments?per_page=100",
                self.repo
            ))
            .await?;

        Ok(comments
            .into_iter()
            .map(|c| Comment {
                author_type: author_type(&c.user),
                body: c.body.unwrap_or_default(),
            })
            .collect())
    }

    async fn create_comment(&self, number: u64, body: &str) -> Result<(), GithubError> {
        let builder = self
            .client
            .post(format!(
                "{}/repos/{}/issues/{number}/comments",
                self.base_url, self.repo
            ))
            .bearer_auth(&self.token)
            .header("accept", "application/vnd.github+json")
            .header("x-github-api-version", API_VERSION)
            .timeout(REQUEST_TIMEOUT)
            .json(&serde_json::json!({ "body": body }));

        self.send_with_retry(builder).await?;
        debug!(pr = number, "Posted PR comment");
        Ok(())
    }

    async fn get_file_content(&self, path: &str) -> Result<Option<String>, GithubError> {
        // The raw media type avoids the base64 round trip of the default
        // contents representation.
        let builder = self
            .get(&format!("/repos/{}/contents/{path}", self.repo))
            .header("accept", "application/vnd.github.raw+json");

        match self.send_with_retry(builder).await {
            Ok(response) => {
                let text = response
                    .text()
                    .await
                    .map_err(|e| GithubError::Transport(e.to_string()))?;
                Ok(Some(text))
            }
            Err(GithubError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn list_deployment_urls(&self, sha: &str) -> Result<Vec<String>, GithubError> {
        let deployments: Vec<ApiDeployment> = self
            .get_json(&format!(
                "/repos/{}/deployments?sha={sha}&per_page=10",
                self.repo
            ))
            .await?;

        let mut urls = Vec::new();
        for deployment in deployments.into_iter().take(DEPLOYMENT_SCAN_LIMIT) {
            let statuses: Vec<ApiDeploymentStatus> = self
                .get_json(&format!(
                    "/repos/{}/deployments/{}/statuses?per_page=10",
                    self.repo, deployment.id
                ))
                .await?;

            urls.extend(
                statuses
                    .into_iter()
                    .filter(|s| s.state == "success")
                    .filter_map(|s| s.environment_url)
                    .filter(|u| !u.is_empty()),
            );
        }

        Ok(urls)
    }
}
