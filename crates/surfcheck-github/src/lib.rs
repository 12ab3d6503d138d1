//! GitHub collaborator for surfcheck
//!
//! The engine depends only on the [`SourceControlClient`] shapes, not on
//! any particular transport; [`GithubClient`] is the REST v3
//! implementation used in production, and tests substitute mocks.

mod client;
mod preview;
mod types;

pub use client::GithubClient;
pub use preview::{POLL_INTERVAL, Preview, PreviewSource, discover_preview_url};
pub use surfcheck_utils::error::GithubError;
pub use types::{AuthorType, ChangedFile, Comment, PullRequest};

use async_trait::async_trait;

/// Source-control operations the engine consumes.
#[async_trait]
pub trait SourceControlClient: Send + Sync {
    async fn get_pull_request(&self, number: u64) -> Result<PullRequest, GithubError>;

    async fn list_changed_files(&self, number: u64) -> Result<Vec<ChangedFile>, GithubError>;

    async fn list_comments(&self, number: u64) -> Result<Vec<Comment>, GithubError>;

    async fn create_comment(&self, number: u64, body: &str) -> Result<(), GithubError>;

    /// Fetch a file's content at the head of the default branch.
    /// Returns `None` when the path does not exist.
    async fn get_file_content(&self, path: &str) -> Result<Option<String>, GithubError>;

    /// Successful deployment environment URLs for a commit, newest first.
    async fn list_deployment_urls(&self, sha: &str) -> Result<Vec<String>, GithubError>;
}
