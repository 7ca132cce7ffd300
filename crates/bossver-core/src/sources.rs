//! Injectable data-source traits for the signals the engine consumes.
//!
//! Implement these to plug in a real forge API or test stubs. The engine
//! awaits them sequentially, one service at a time; implementations do not
//! need to be cancel-safe or retry-aware (there are no retries in this
//! layer by design).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SourceResult;

/// A recent commit on a service's default branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    /// Commit SHA.
    pub sha: String,
    /// Full commit message.
    pub message: String,
}

/// A closed pull request against the fixed target branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestInfo {
    pub number: u64,
    pub title: String,
    /// Merge timestamp; `None` means closed without merging.
    pub merged_at: Option<DateTime<Utc>>,
    /// Label names attached to the pull request.
    pub labels: Vec<String>,
}

/// Source of recent commits for a repository.
#[async_trait]
pub trait CommitSource: Send + Sync {
    /// Fetch up to `limit` most recent commits for `repo`, newest first.
    async fn recent_commits(&self, repo: &str, limit: usize) -> SourceResult<Vec<CommitInfo>>;
}

/// Source of release tags for a repository.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetch the newest release tag for `repo`, or `None` when the repo has
    /// no releases at all.
    async fn latest_release_tag(&self, repo: &str) -> SourceResult<Option<String>>;
}

/// Source of closed pull requests for a repository.
#[async_trait]
pub trait PullRequestSource: Send + Sync {
    /// Fetch one page of closed pull requests against the fixed target
    /// branch, ordered by most-recent-update descending.
    ///
    /// `page` is 1-based. A page shorter than `per_page` is the last one.
    async fn closed_pull_requests(
        &self,
        repo: &str,
        page: u32,
        per_page: u32,
    ) -> SourceResult<Vec<PullRequestInfo>>;
}
