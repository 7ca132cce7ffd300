//! Pull-request label collection since the last aggregation anchor.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::sources::PullRequestSource;

/// Page size requested from the pull-request source.
pub const PR_PAGE_SIZE: u32 = 100;

/// Collect the deduplicated label set of every pull request merged after
/// `anchor`.
///
/// Pages are walked in most-recent-update order. Closed-without-merge PRs
/// are discarded without affecting termination; the first PR whose merge
/// timestamp is at or before the anchor stops the scan (the rest of that
/// page and all later pages are skipped). A short page means the last page
/// was reached.
///
/// A transport or decode failure aborts collection for this repository
/// only: whatever was gathered before the failure is returned and the
/// failure is logged. No retry.
///
/// The returned labels are in lexicographic order, which downstream
/// classification relies on for deterministic tie-breaking.
pub async fn collect_merged_labels(
    source: &dyn PullRequestSource,
    repo: &str,
    anchor: DateTime<Utc>,
) -> Vec<String> {
    let mut labels = BTreeSet::new();
    let mut page = 1u32;

    'pages: loop {
        let prs = match source.closed_pull_requests(repo, page, PR_PAGE_SIZE).await {
            Ok(prs) => prs,
            Err(e) => {
                warn!(repo = %repo, page = page, error = %e, "pull request page fetch failed, using labels gathered so far");
                break;
            }
        };
        let page_len = prs.len();

        for pr in prs {
            let merged_at = match pr.merged_at {
                Some(ts) => ts,
                // Closed without merging: no signal, keep scanning.
                None => continue,
            };
            if merged_at <= anchor {
                debug!(repo = %repo, pr = pr.number, "reached pre-anchor merge, stopping scan");
                break 'pages;
            }
            for label in pr.labels {
                labels.insert(label);
            }
        }

        if page_len < PR_PAGE_SIZE as usize {
            break;
        }
        page += 1;
    }

    labels.into_iter().collect()
}
