//! GitHub REST client implementing the engine's source traits.
//!
//! One client serves all three signal kinds (commits, releases, pull
//! requests). Failures are mapped into the engine's recoverable
//! [`SourceError`] taxonomy; retry and timeout policy deliberately live
//! elsewhere.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use bossver_core::{
    CommitInfo, CommitSource, PullRequestInfo, PullRequestSource, ReleaseSource, SourceError,
    SourceResult,
};

/// GitHub API configuration.
#[derive(Debug, Clone)]
pub struct GithubConfig {
    /// API base URL. Override for GitHub Enterprise endpoints.
    pub api_base: String,
    /// Bearer token; optional for public repositories.
    pub token: Option<String>,
    /// Branch pull requests are filtered to.
    pub target_branch: String,
}

impl Default for GithubConfig {
    fn default() -> Self {
        GithubConfig {
            api_base: "https://api.github.com".to_string(),
            token: std::env::var("GITHUB_TOKEN").ok(),
            target_branch: "main".to_string(),
        }
    }
}

impl GithubConfig {
    /// Create a config from environment variables.
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Set the pull-request target branch.
    pub fn with_target_branch(mut self, branch: &str) -> Self {
        self.target_branch = branch.to_string();
        self
    }
}

/// GitHub REST client for fleet signal collection.
pub struct GithubClient {
    config: GithubConfig,
    http: reqwest::Client,
}

impl GithubClient {
    /// Create a new client. Panics only if the TLS backend cannot
    /// initialise, which is unrecoverable at startup anyway.
    pub fn new(config: GithubConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("bossver/", env!("CARGO_PKG_VERSION")))
            .build()
            .expect("failed to create HTTP client");
        GithubClient { config, http }
    }

    /// Create a client from environment variables.
    pub fn from_env() -> Self {
        Self::new(GithubConfig::from_env())
    }

    async fn get_json<T: DeserializeOwned>(&self, repo: &str, url: &str) -> SourceResult<T> {
        debug!(url = %url, "github request");
        let mut request = self
            .http
            .get(url)
            .header("Accept", "application/vnd.github+json");
        if let Some(token) = &self.config.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(|e| SourceError::Transport {
            repo: repo.to_string(),
            detail: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Transport {
                repo: repo.to_string(),
                detail: format!("HTTP {status} from {url}"),
            });
        }

        response.json().await.map_err(|e| SourceError::Decode {
            repo: repo.to_string(),
            detail: e.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct CommitDto {
    sha: String,
    commit: CommitBodyDto,
}

#[derive(Debug, Deserialize)]
struct CommitBodyDto {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ReleaseDto {
    tag_name: String,
}

#[derive(Debug, Deserialize)]
struct PullDto {
    number: u64,
    title: String,
    merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    labels: Vec<LabelDto>,
}

#[derive(Debug, Deserialize)]
struct LabelDto {
    name: String,
}

impl From<PullDto> for PullRequestInfo {
    fn from(dto: PullDto) -> Self {
        PullRequestInfo {
            number: dto.number,
            title: dto.title,
            merged_at: dto.merged_at,
            labels: dto.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

#[async_trait]
impl CommitSource for GithubClient {
    async fn recent_commits(&self, repo: &str, limit: usize) -> SourceResult<Vec<CommitInfo>> {
        let url = format!(
            "{}/repos/{}/commits?per_page={}",
            self.config.api_base, repo, limit
        );
        let commits: Vec<CommitDto> = self.get_json(repo, &url).await?;
        Ok(commits
            .into_iter()
            .map(|c| CommitInfo {
                sha: c.sha,
                message: c.commit.message,
            })
            .collect())
    }
}

#[async_trait]
impl ReleaseSource for GithubClient {
    async fn latest_release_tag(&self, repo: &str) -> SourceResult<Option<String>> {
        // Releases come back newest-first; only the newest tag matters.
        let url = format!(
            "{}/repos/{}/releases?per_page=1",
            self.config.api_base, repo
        );
        let releases: Vec<ReleaseDto> = self.get_json(repo, &url).await?;
        Ok(releases.into_iter().next().map(|r| r.tag_name))
    }
}

#[async_trait]
impl PullRequestSource for GithubClient {
    async fn closed_pull_requests(
        &self,
        repo: &str,
        page: u32,
        per_page: u32,
    ) -> SourceResult<Vec<PullRequestInfo>> {
        let url = format!(
            "{}/repos/{}/pulls?state=closed&base={}&sort=updated&direction=desc&per_page={}&page={}",
            self.config.api_base,
            repo,
            self.config.target_branch,
            per_page.min(100),
            page
        );
        let pulls: Vec<PullDto> = self.get_json(repo, &url).await?;
        Ok(pulls.into_iter().map(PullRequestInfo::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_dto_decodes_github_shape() {
        let json = r#"{
            "number": 142,
            "title": "Add payment retries",
            "merged_at": "2024-05-01T12:30:00Z",
            "labels": [{"name": "feature"}, {"name": "backend"}],
            "state": "closed",
            "user": {"login": "octocat"}
        }"#;
        let dto: PullDto = serde_json::from_str(json).expect("decode");
        let pr = PullRequestInfo::from(dto);
        assert_eq!(pr.number, 142);
        assert_eq!(pr.labels, vec!["feature".to_string(), "backend".to_string()]);
        assert!(pr.merged_at.is_some());
    }

    #[test]
    fn test_pull_dto_closed_without_merge_has_null_merged_at() {
        let json = r#"{"number": 7, "title": "abandoned", "merged_at": null}"#;
        let dto: PullDto = serde_json::from_str(json).expect("decode");
        let pr = PullRequestInfo::from(dto);
        assert!(pr.merged_at.is_none());
        assert!(pr.labels.is_empty());
    }

    #[test]
    fn test_commit_dto_decodes_nested_message() {
        let json = r#"[{"sha": "abc123", "commit": {"message": "fix: rollback"}}]"#;
        let commits: Vec<CommitDto> = serde_json::from_str(json).expect("decode");
        assert_eq!(commits[0].sha, "abc123");
        assert_eq!(commits[0].commit.message, "fix: rollback");
    }

    #[test]
    fn test_release_dto_decodes_tag_name() {
        let json = r#"[{"tag_name": "v2.1.0", "name": "2.1.0", "draft": false}]"#;
        let releases: Vec<ReleaseDto> = serde_json::from_str(json).expect("decode");
        assert_eq!(releases[0].tag_name, "v2.1.0");
    }

    #[test]
    fn test_config_builder() {
        let config = GithubConfig {
            api_base: "https://github.example.com/api/v3".to_string(),
            token: None,
            target_branch: "main".to_string(),
        }
        .with_token("tok")
        .with_target_branch("trunk");
        assert_eq!(config.token.as_deref(), Some("tok"));
        assert_eq!(config.target_branch, "trunk");
    }
}
