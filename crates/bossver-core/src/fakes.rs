//! In-memory fakes for the source traits and the state store (testing only)
//!
//! Provides `ScriptedCommits`, `ScriptedReleases`, `ScriptedPulls` and
//! `MemoryStateStore` that satisfy the trait contracts without any network
//! or filesystem, plus call counters so tests can assert on what the engine
//! actually requested.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{BossError, Result, SourceError, SourceResult};
use crate::sources::{CommitInfo, CommitSource, PullRequestInfo, PullRequestSource, ReleaseSource};
use crate::state::{FleetState, StateStore};

type ErrorFactory = Box<dyn Fn() -> SourceError + Send + Sync>;

// ---------------------------------------------------------------------------
// ScriptedCommits
// ---------------------------------------------------------------------------

#[derive(Default)]
struct CommitScript {
    commits: Vec<CommitInfo>,
    fail: Option<ErrorFactory>,
    calls: usize,
}

/// Commit source backed by a per-repo script. Unscripted repos return an
/// empty history.
#[derive(Default)]
pub struct ScriptedCommits {
    repos: Mutex<HashMap<String, CommitScript>>,
}

impl ScriptedCommits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, repo: &str, commits: Vec<CommitInfo>) {
        let mut repos = self.repos.lock().unwrap();
        repos.entry(repo.to_string()).or_default().commits = commits;
    }

    /// Make every fetch for `repo` fail with the produced error.
    pub fn fail(&self, repo: &str, factory: impl Fn() -> SourceError + Send + Sync + 'static) {
        let mut repos = self.repos.lock().unwrap();
        repos.entry(repo.to_string()).or_default().fail = Some(Box::new(factory));
    }

    /// Number of `recent_commits` calls made for `repo`.
    pub fn calls(&self, repo: &str) -> usize {
        self.repos
            .lock()
            .unwrap()
            .get(repo)
            .map(|s| s.calls)
            .unwrap_or(0)
    }
}

#[async_trait]
impl CommitSource for ScriptedCommits {
    async fn recent_commits(&self, repo: &str, limit: usize) -> SourceResult<Vec<CommitInfo>> {
        let mut repos = self.repos.lock().unwrap();
        let script = repos.entry(repo.to_string()).or_default();
        script.calls += 1;
        if let Some(factory) = &script.fail {
            return Err(factory());
        }
        Ok(script.commits.iter().take(limit).cloned().collect())
    }
}

// ---------------------------------------------------------------------------
// ScriptedReleases
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ReleaseScript {
    latest: Option<String>,
    fail: Option<ErrorFactory>,
}

/// Release source backed by a per-repo newest tag. Unscripted repos report
/// no releases.
#[derive(Default)]
pub struct ScriptedReleases {
    repos: Mutex<HashMap<String, ReleaseScript>>,
}

impl ScriptedReleases {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, repo: &str, latest: Option<&str>) {
        let mut repos = self.repos.lock().unwrap();
        repos.entry(repo.to_string()).or_default().latest = latest.map(|t| t.to_string());
    }

    pub fn fail(&self, repo: &str, factory: impl Fn() -> SourceError + Send + Sync + 'static) {
        let mut repos = self.repos.lock().unwrap();
        repos.entry(repo.to_string()).or_default().fail = Some(Box::new(factory));
    }
}

#[async_trait]
impl ReleaseSource for ScriptedReleases {
    async fn latest_release_tag(&self, repo: &str) -> SourceResult<Option<String>> {
        let repos = self.repos.lock().unwrap();
        match repos.get(repo) {
            Some(script) => {
                if let Some(factory) = &script.fail {
                    return Err(factory());
                }
                Ok(script.latest.clone())
            }
            None => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// ScriptedPulls
// ---------------------------------------------------------------------------

#[derive(Default)]
struct PullScript {
    /// Scripted pages, index 0 = page 1.
    pages: Vec<Vec<PullRequestInfo>>,
    /// Error produced for any page beyond the scripted ones.
    fail_after: Option<ErrorFactory>,
    requested: usize,
}

/// Pull-request source backed by scripted pages per repo.
///
/// Requests beyond the scripted pages return an empty page, or an error when
/// `fail_after_scripted` was set.
#[derive(Default)]
pub struct ScriptedPulls {
    repos: Mutex<HashMap<String, PullScript>>,
}

impl ScriptedPulls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, repo: &str, pages: Vec<Vec<PullRequestInfo>>) {
        let mut repos = self.repos.lock().unwrap();
        repos.entry(repo.to_string()).or_default().pages = pages;
    }

    /// Fail every request past the scripted pages with the produced error.
    pub fn fail_after_scripted(
        &self,
        repo: &str,
        factory: impl Fn() -> SourceError + Send + Sync + 'static,
    ) {
        let mut repos = self.repos.lock().unwrap();
        repos.entry(repo.to_string()).or_default().fail_after = Some(Box::new(factory));
    }

    /// Number of page requests made for `repo`.
    pub fn pages_requested(&self, repo: &str) -> usize {
        self.repos
            .lock()
            .unwrap()
            .get(repo)
            .map(|s| s.requested)
            .unwrap_or(0)
    }
}

#[async_trait]
impl PullRequestSource for ScriptedPulls {
    async fn closed_pull_requests(
        &self,
        repo: &str,
        page: u32,
        _per_page: u32,
    ) -> SourceResult<Vec<PullRequestInfo>> {
        let mut repos = self.repos.lock().unwrap();
        let script = repos.entry(repo.to_string()).or_default();
        script.requested += 1;
        let index = page.saturating_sub(1) as usize;
        match script.pages.get(index) {
            Some(page) => Ok(page.clone()),
            None => match &script.fail_after {
                Some(factory) => Err(factory()),
                None => Ok(Vec::new()),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStateStore
// ---------------------------------------------------------------------------

/// In-memory state store holding at most one record.
#[derive(Default)]
pub struct MemoryStateStore {
    state: Mutex<Option<FleetState>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seeded(state: FleetState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<FleetState> {
        self.state
            .lock()
            .unwrap()
            .clone()
            .ok_or(BossError::StateNotFound {
                path: "<memory>".to_string(),
            })
    }

    fn save(&self, state: &FleetState) -> Result<()> {
        *self.state.lock().unwrap() = Some(state.clone());
        Ok(())
    }
}
