//! Priority-override detection from recent commit history.
//!
//! An emergency marker in any configured service's recent commits forces an
//! unconditional fleet-wide `Major` bump, bypassing normal signal
//! combination entirely.

use tracing::{info, warn};

use crate::config::ServiceSpec;
use crate::sources::CommitSource;

/// Literal marker token scanned for, case-insensitively.
pub const PRIORITY_MARKER: &str = "[priority-release]";

/// How many recent commits are inspected per service.
pub const COMMIT_SCAN_WINDOW: usize = 30;

/// A detected priority override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideHit {
    /// Name of the first configured service exhibiting the marker.
    pub service: String,
    /// SHA of the commit carrying the marker.
    pub commit_sha: String,
}

/// Scan services in configured order for the priority marker.
///
/// The first hit wins and halts scanning of the remaining services. A
/// transport failure while checking one service is treated as "marker not
/// found" for that service and does not abort the fleet-wide check.
pub async fn detect_override(
    commits: &dyn CommitSource,
    services: &[ServiceSpec],
) -> Option<OverrideHit> {
    for service in services {
        let recent = match commits.recent_commits(&service.repo, COMMIT_SCAN_WINDOW).await {
            Ok(recent) => recent,
            Err(e) => {
                warn!(service = %service.name, error = %e, "commit scan failed, treating as no marker");
                continue;
            }
        };
        for commit in recent {
            if commit.message.to_lowercase().contains(PRIORITY_MARKER) {
                info!(
                    service = %service.name,
                    commit = %commit.sha,
                    "priority override marker found"
                );
                return Some(OverrideHit {
                    service: service.name.clone(),
                    commit_sha: commit.sha,
                });
            }
        }
    }
    None
}
