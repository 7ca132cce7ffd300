//! The fleet bump-decision engine.
//!
//! One [`BossEngine::evaluate`] call is one aggregation cycle: a priority
//! override check first, then a sequential fold over every configured
//! service combining its version-delta "floor" signal with its label
//! "business" signal, tier-capped, into a single fleet-wide bump and a
//! justification for it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::bump::{classify_labels, BumpLevel, Tier};
use crate::collector::collect_merged_labels;
use crate::config::{FleetConfig, ServiceSpec};
use crate::priority::detect_override;
use crate::sources::{CommitSource, PullRequestSource, ReleaseSource};
use crate::state::{FleetState, TAG_FETCH_ERROR, TAG_NO_RELEASE, TAG_UNKNOWN};
use crate::version::classify_delta;

/// The signal that drove a service's contribution.
///
/// When the floor and business signals tie, the version delta is the
/// attributed driver (magnitude is identical either way).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceSignal {
    /// A release-tag delta: what actually shipped.
    VersionDelta { from: String, to: String },
    /// A pull-request label: classification intent.
    Label { label: String },
}

impl std::fmt::Display for ServiceSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceSignal::VersionDelta { from, to } => write!(f, "released {from} -> {to}"),
            ServiceSignal::Label { label } => write!(f, "merged '{label}' work"),
        }
    }
}

/// Immutable per-service evaluation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceOutcome {
    pub name: String,
    pub tier: Tier,
    /// Combined signal before tier weighting.
    pub raw_bump: BumpLevel,
    /// Contribution after tier weighting.
    pub bump: BumpLevel,
    /// Driving signal, absent when the service contributed `None`.
    pub signal: Option<ServiceSignal>,
    /// Tag (or sentinel) recorded for this service in the manifest.
    pub manifest_entry: String,
}

/// The fleet-wide decision for one aggregation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetDecision {
    /// Globally winning bump level.
    pub bump: BumpLevel,
    /// Human-readable justification for `bump`.
    pub reason: String,
    /// Per-service outcomes in configuration order. Empty on the
    /// priority-override fast path, which bypasses per-service evaluation.
    pub services: Vec<ServiceOutcome>,
    /// Tag (or sentinel) per configured service; always one entry each.
    pub manifest: BTreeMap<String, String>,
    /// Whether a priority override forced this decision.
    pub overridden: bool,
}

/// Outcome of a full run: the decision plus the state to persist.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub decision: FleetDecision,
    pub next: FleetState,
}

/// Fleet bump-decision engine over injectable signal sources.
pub struct BossEngine {
    commits: Arc<dyn CommitSource>,
    releases: Arc<dyn ReleaseSource>,
    pulls: Arc<dyn PullRequestSource>,
}

impl BossEngine {
    pub fn new(
        commits: Arc<dyn CommitSource>,
        releases: Arc<dyn ReleaseSource>,
        pulls: Arc<dyn PullRequestSource>,
    ) -> Self {
        Self {
            commits,
            releases,
            pulls,
        }
    }

    /// Evaluate one aggregation cycle against the previously persisted
    /// state.
    ///
    /// All source failures are recoverable and degrade the affected
    /// service to its weakest signal; this method itself cannot fail.
    pub async fn evaluate(&self, config: &FleetConfig, state: &FleetState) -> FleetDecision {
        if let Some(hit) = detect_override(self.commits.as_ref(), &config.services).await {
            let manifest = self.override_manifest(config, state).await;
            return FleetDecision {
                bump: BumpLevel::Major,
                reason: format!(
                    "priority override marker in {} commit {}",
                    hit.service, hit.commit_sha
                ),
                services: Vec::new(),
                manifest,
                overridden: true,
            };
        }

        let anchor = state.anchor();
        debug!(anchor = %anchor, "scanning pull requests merged after anchor");

        let mut outcomes = Vec::with_capacity(config.services.len());
        for service in &config.services {
            outcomes.push(self.evaluate_service(service, state, anchor).await);
        }

        let manifest = outcomes
            .iter()
            .map(|o| (o.name.clone(), o.manifest_entry.clone()))
            .collect();

        // Fold for the strict maximum: the first service (in configuration
        // order) reaching the winning level supplies the justification.
        let winner = outcomes
            .iter()
            .fold(None::<&ServiceOutcome>, |best, outcome| {
                if outcome.bump == BumpLevel::None {
                    return best;
                }
                match best {
                    Some(current) if outcome.bump <= current.bump => best,
                    _ => Some(outcome),
                }
            });

        let (bump, reason) = match winner {
            Some(outcome) => {
                let signal = outcome
                    .signal
                    .as_ref()
                    .expect("winning outcome always carries its signal");
                (
                    outcome.bump,
                    format!("{} (tier {}) {}", outcome.name, outcome.tier, signal),
                )
            }
            None => (
                BumpLevel::None,
                "no services changed this cycle".to_string(),
            ),
        };

        info!(bump = %bump, reason = %reason, "fleet decision");
        FleetDecision {
            bump,
            reason,
            services: outcomes,
            manifest,
            overridden: false,
        }
    }

    /// Build the state record the store should persist after `decision`.
    ///
    /// `previous_version` becomes the pre-run version, and the anchor
    /// advances to `now` whether or not anything bumped.
    pub fn advance(state: &FleetState, decision: &FleetDecision, now: DateTime<Utc>) -> FleetState {
        FleetState {
            boss_version: state.boss_version.bump(decision.bump),
            previous_version: state.boss_version,
            bump_type: decision.bump,
            bump_reason: decision.reason.clone(),
            last_updated: now,
            last_aggregated_at: Some(now),
            services: decision.manifest.clone(),
        }
    }

    /// Evaluate and advance in one step, stamping the current instant.
    pub async fn run(&self, config: &FleetConfig, state: &FleetState) -> RunOutcome {
        let decision = self.evaluate(config, state).await;
        let next = Self::advance(state, &decision, Utc::now());
        RunOutcome { decision, next }
    }

    /// Combine one service's floor and business signals.
    async fn evaluate_service(
        &self,
        service: &ServiceSpec,
        state: &FleetState,
        anchor: DateTime<Utc>,
    ) -> ServiceOutcome {
        let stored = state.stored_tag(&service.name);

        let fresh = match self.releases.latest_release_tag(&service.repo).await {
            Ok(fresh) => fresh,
            Err(e) => {
                // No usable signal, not "assume worst case": contribute
                // nothing and skip the PR scan entirely.
                warn!(service = %service.name, error = %e, "release fetch failed, service contributes no signal");
                let manifest_entry = state
                    .services
                    .get(&service.name)
                    .cloned()
                    .unwrap_or_else(|| TAG_FETCH_ERROR.to_string());
                return ServiceOutcome {
                    name: service.name.clone(),
                    tier: service.tier,
                    raw_bump: BumpLevel::None,
                    bump: BumpLevel::None,
                    signal: None,
                    manifest_entry,
                };
            }
        };

        let manifest_entry = fresh
            .clone()
            .unwrap_or_else(|| TAG_NO_RELEASE.to_string());

        let version_bump = classify_delta(stored, fresh.as_deref());

        let labels =
            collect_merged_labels(self.pulls.as_ref(), &service.repo, anchor).await;
        let label_verdict = classify_labels(
            service.tier,
            labels.iter().map(String::as_str),
        );

        let raw_bump = version_bump.max(label_verdict.level);
        // Version delta wins ties for provenance; magnitude is identical.
        let signal = if raw_bump == BumpLevel::None {
            None
        } else if version_bump >= label_verdict.level {
            Some(ServiceSignal::VersionDelta {
                from: stored.unwrap_or(TAG_UNKNOWN).to_string(),
                to: manifest_entry.clone(),
            })
        } else {
            label_verdict.label.map(|label| ServiceSignal::Label { label })
        };

        let bump = service.tier.cap(raw_bump);
        debug!(
            service = %service.name,
            version_bump = %version_bump,
            label_bump = %label_verdict.level,
            weighted = %bump,
            "service evaluated"
        );

        ServiceOutcome {
            name: service.name.clone(),
            tier: service.tier,
            raw_bump,
            bump,
            signal,
            manifest_entry,
        }
    }

    /// Best-effort manifest for the override fast path. Record-keeping
    /// only; it has no influence on the forced decision.
    async fn override_manifest(
        &self,
        config: &FleetConfig,
        state: &FleetState,
    ) -> BTreeMap<String, String> {
        let mut manifest = BTreeMap::new();
        for service in &config.services {
            let entry = match self.releases.latest_release_tag(&service.repo).await {
                Ok(Some(tag)) => tag,
                _ => state
                    .services
                    .get(&service.name)
                    .cloned()
                    .unwrap_or_else(|| TAG_UNKNOWN.to_string()),
            };
            manifest.insert(service.name.clone(), entry);
        }
        manifest
    }
}
