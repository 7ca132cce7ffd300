//! The durable fleet record and its persistence contract.
//!
//! A run reads the last persisted [`FleetState`] once at start and replaces
//! it wholesale at the end. Partial updates are not permitted: an observer
//! must never see fields from two different runs mixed together.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::bump::BumpLevel;
use crate::error::{BossError, Result};
use crate::version::FleetVersion;

/// Manifest sentinel: the repository has no releases at all.
pub const TAG_NO_RELEASE: &str = "no-release";
/// Manifest sentinel: the release fetch failed and no stored tag existed.
pub const TAG_FETCH_ERROR: &str = "fetch-error";
/// Manifest sentinel: tag unknown on the priority-override fast path.
pub const TAG_UNKNOWN: &str = "unknown";

/// The persisted fleet record.
///
/// `boss_version` is non-decreasing across runs; `last_aggregated_at` always
/// advances to the run's completion time, even when the bump was `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetState {
    /// Current fleet ("BOSS") version.
    pub boss_version: FleetVersion,
    /// Fleet version before this record was written.
    pub previous_version: FleetVersion,
    /// Bump applied by the run that wrote this record.
    pub bump_type: BumpLevel,
    /// Human-readable justification for the bump decision.
    pub bump_reason: String,
    /// When this record was written.
    pub last_updated: DateTime<Utc>,
    /// Anchor for the next run's pull-request window.
    ///
    /// Absent in records written before the anchor field existed; readers
    /// fall back to `last_updated` via [`FleetState::anchor`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_aggregated_at: Option<DateTime<Utc>>,
    /// Last observed release tag (or sentinel) per configured service.
    pub services: BTreeMap<String, String>,
}

impl FleetState {
    /// Fresh first-run record at `version` with an empty manifest.
    pub fn seed(version: FleetVersion, now: DateTime<Utc>) -> Self {
        Self {
            boss_version: version,
            previous_version: version,
            bump_type: BumpLevel::None,
            bump_reason: "seed state".to_string(),
            last_updated: now,
            last_aggregated_at: Some(now),
            services: BTreeMap::new(),
        }
    }

    /// The scanning-window anchor for the next run.
    ///
    /// `last_aggregated_at` when present, else `last_updated` (migration
    /// compatibility for pre-anchor records).
    pub fn anchor(&self) -> DateTime<Utc> {
        self.last_aggregated_at.unwrap_or(self.last_updated)
    }

    /// Last observed tag for `service`, if it parses as a real tag and is
    /// not one of the sentinels.
    pub fn stored_tag(&self, service: &str) -> Option<&str> {
        self.services
            .get(service)
            .map(String::as_str)
            .filter(|tag| !matches!(*tag, TAG_NO_RELEASE | TAG_FETCH_ERROR | TAG_UNKNOWN))
    }
}

/// Persistence contract for the fleet record.
///
/// `save` replaces the entire record atomically; `load` fails when no seed
/// exists (the first run requires one).
pub trait StateStore: Send + Sync {
    fn load(&self) -> Result<FleetState>;
    fn save(&self, state: &FleetState) -> Result<()>;
}

/// JSON-file-backed state store with atomic replacement.
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a record already exists at this store's path.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> Result<FleetState> {
        let raw = std::fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BossError::StateNotFound {
                    path: self.path.display().to_string(),
                }
            } else {
                BossError::Io(e)
            }
        })?;
        serde_json::from_str(&raw)
            .map_err(|e| BossError::StateCorrupt(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, state: &FleetState) -> Result<()> {
        let json = serde_json::to_vec_pretty(state)?;
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        // Atomic replace: write to a temp file in the same directory, then
        // rename over the old record.
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&json)?;
        tmp.persist(&self.path).map_err(|e| BossError::Io(e.error))?;
        Ok(())
    }
}
