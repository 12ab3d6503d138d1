//! Shapes consumed from the source-control collaborator

use serde::{Deserialize, Serialize};

/// The pull request under test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub head_sha: String,
    pub base_sha: String,
    pub author: String,
}

/// One changed file in the PR diff.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangedFile {
    pub path: String,
    /// added | modified | removed | renamed
    pub status: String,
    pub additions: u64,
    pub deletions: u64,
    /// Unified diff hunk; absent for binary files
    pub patch: Option<String>,
}

/// Whether a comment was authored by a bot or a person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorType {
    Bot,
    User,
}

/// One issue comment on the PR.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub author_type: AuthorType,
    pub body: String,
}
