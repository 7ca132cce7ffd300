//! End-to-end aggregation scenarios over in-memory fakes and a real
//! file-backed state store.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use bossver_core::fakes::{ScriptedCommits, ScriptedPulls, ScriptedReleases};
use bossver_core::{
    BossEngine, BumpLevel, CommitInfo, CommitSource, FleetConfig, FleetState, FleetVersion,
    JsonStateStore, PullRequestInfo, PullRequestSource, ReleaseSource, ServiceSpec, StateStore,
    Tier,
};

struct Fleet {
    commits: Arc<ScriptedCommits>,
    releases: Arc<ScriptedReleases>,
    pulls: Arc<ScriptedPulls>,
    engine: BossEngine,
}

fn fleet() -> Fleet {
    let commits = Arc::new(ScriptedCommits::new());
    let releases = Arc::new(ScriptedReleases::new());
    let pulls = Arc::new(ScriptedPulls::new());
    let engine = BossEngine::new(
        Arc::clone(&commits) as Arc<dyn CommitSource>,
        Arc::clone(&releases) as Arc<dyn ReleaseSource>,
        Arc::clone(&pulls) as Arc<dyn PullRequestSource>,
    );
    Fleet {
        commits,
        releases,
        pulls,
        engine,
    }
}

fn service(name: &str, tier: Tier) -> ServiceSpec {
    ServiceSpec {
        name: name.to_string(),
        repo: format!("org/{name}"),
        tier,
    }
}

fn ts(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap()
}

fn merged_pr(number: u64, hour: u32, labels: &[&str]) -> PullRequestInfo {
    PullRequestInfo {
        number,
        title: format!("pr #{number}"),
        merged_at: Some(ts(hour)),
        labels: labels.iter().map(|l| l.to_string()).collect(),
    }
}

/// End-to-end: tier-1 service, no tag delta, a "bugfix" label merged
/// since the anchor. The label floor beats delta-none and the fleet goes
/// 1.0.0 -> 1.0.1.
#[tokio::test]
async fn test_label_only_cycle_bumps_patch() {
    let f = fleet();
    let config = FleetConfig {
        services: vec![service("payments", Tier::Critical)],
    };
    f.releases.script("org/payments", Some("v1.0.0"));
    f.pulls
        .script("org/payments", vec![vec![merged_pr(41, 2, &["bugfix"])]]);

    let mut state = FleetState::seed(FleetVersion::new(1, 0, 0), ts(0));
    state
        .services
        .insert("payments".to_string(), "v1.0.0".to_string());

    let outcome = f.engine.run(&config, &state).await;
    assert_eq!(outcome.decision.bump, BumpLevel::Patch);
    assert_eq!(outcome.next.boss_version, FleetVersion::new(1, 0, 1));
    assert_eq!(outcome.next.previous_version, FleetVersion::new(1, 0, 0));
    assert!(outcome.next.bump_reason.contains("payments (tier 1)"));
}

/// End-to-end: tier-2 service with a major tag delta and no labels.
/// Tier weighting caps the raw Major to Minor.
#[tokio::test]
async fn test_tier2_major_delta_bumps_fleet_minor_only() {
    let f = fleet();
    let config = FleetConfig {
        services: vec![service("catalog", Tier::Important)],
    };
    f.releases.script("org/catalog", Some("v3.0.0"));
    f.pulls.script("org/catalog", vec![vec![]]);

    let mut state = FleetState::seed(FleetVersion::new(2, 4, 7), ts(0));
    state
        .services
        .insert("catalog".to_string(), "v2.1.0".to_string());

    let outcome = f.engine.run(&config, &state).await;
    assert_eq!(outcome.decision.bump, BumpLevel::Minor);
    assert_eq!(outcome.next.boss_version, FleetVersion::new(2, 5, 0));
    assert_eq!(outcome.next.services["catalog"], "v3.0.0");
}

/// End-to-end: the only changed service's release fetch fails. The
/// manifest falls back to the stored tag, the service contributes nothing,
/// and the fleet version does not move.
#[tokio::test]
async fn test_fetch_failure_for_only_changed_service_is_a_noop() {
    let f = fleet();
    let config = FleetConfig {
        services: vec![service("payments", Tier::Critical)],
    };
    f.releases
        .fail("org/payments", || bossver_core::SourceError::Transport {
            repo: "org/payments".to_string(),
            detail: "HTTP 503".to_string(),
        });

    let mut state = FleetState::seed(FleetVersion::new(1, 2, 3), ts(0));
    state
        .services
        .insert("payments".to_string(), "v4.0.0".to_string());

    let outcome = f.engine.run(&config, &state).await;
    assert_eq!(outcome.decision.bump, BumpLevel::None);
    assert_eq!(outcome.next.boss_version, FleetVersion::new(1, 2, 3));
    assert_eq!(outcome.next.services["payments"], "v4.0.0");
}

/// Idempotence: zero qualifying PRs and no tag change for every service
/// leaves the version alone while the anchor still advances.
#[tokio::test]
async fn test_noop_cycle_advances_only_the_anchor() {
    let f = fleet();
    let config = FleetConfig {
        services: vec![
            service("payments", Tier::Critical),
            service("catalog", Tier::Important),
        ],
    };
    f.releases.script("org/payments", Some("v1.0.0"));
    f.releases.script("org/catalog", Some("v2.0.0"));
    f.pulls.script("org/payments", vec![vec![]]);
    f.pulls.script("org/catalog", vec![vec![]]);

    let mut state = FleetState::seed(FleetVersion::new(5, 1, 0), ts(0));
    state
        .services
        .insert("payments".to_string(), "v1.0.0".to_string());
    state
        .services
        .insert("catalog".to_string(), "v2.0.0".to_string());
    let old_anchor = state.anchor();

    let outcome = f.engine.run(&config, &state).await;
    assert_eq!(outcome.decision.bump, BumpLevel::None);
    assert_eq!(outcome.next.boss_version, FleetVersion::new(5, 1, 0));
    assert_eq!(outcome.next.bump_reason, "no services changed this cycle");
    assert!(outcome.next.anchor() > old_anchor);
}

/// Override short-circuit: service A (checked first) carries the marker
/// while service B would produce a higher ordinary bump. The justification
/// names A and the bump is Major regardless.
#[tokio::test]
async fn test_override_names_first_service_even_when_another_changed_more() {
    let f = fleet();
    let config = FleetConfig {
        services: vec![
            service("alpha", Tier::Supporting),
            service("beta", Tier::Critical),
        ],
    };
    f.commits.script(
        "org/alpha",
        vec![CommitInfo {
            sha: "deadbeef".to_string(),
            message: "emergency rollback [priority-release]".to_string(),
        }],
    );
    // beta shipped a major release, which would normally drive the cycle.
    f.releases.script("org/alpha", Some("v0.1.0"));
    f.releases.script("org/beta", Some("v9.0.0"));

    let mut state = FleetState::seed(FleetVersion::new(3, 0, 0), ts(0));
    state
        .services
        .insert("beta".to_string(), "v8.2.0".to_string());

    let outcome = f.engine.run(&config, &state).await;
    assert!(outcome.decision.overridden);
    assert_eq!(outcome.decision.bump, BumpLevel::Major);
    assert!(outcome.decision.reason.contains("alpha"));
    assert!(!outcome.decision.reason.contains("beta"));
    assert_eq!(outcome.next.boss_version, FleetVersion::new(4, 0, 0));
    // Manifest still has one entry per configured service.
    assert_eq!(outcome.next.services.len(), 2);
    assert_eq!(outcome.next.services["alpha"], "v0.1.0");
    assert_eq!(outcome.next.services["beta"], "v9.0.0");
}

/// Two consecutive cycles through a real file-backed store: the second run
/// starts from the advanced anchor and does not re-count the first run's
/// pull request.
#[tokio::test]
async fn test_second_cycle_does_not_recount_prs_before_new_anchor() {
    let f = fleet();
    let config = FleetConfig {
        services: vec![service("payments", Tier::Critical)],
    };
    f.releases.script("org/payments", Some("v1.0.0"));
    f.pulls
        .script("org/payments", vec![vec![merged_pr(41, 2, &["feature"])]]);

    let dir = tempfile::tempdir().unwrap();
    let store = JsonStateStore::new(dir.path().join("boss-state.json"));
    let mut seed = FleetState::seed(FleetVersion::new(1, 0, 0), ts(0));
    seed.services
        .insert("payments".to_string(), "v1.0.0".to_string());
    store.save(&seed).unwrap();

    // First cycle: the feature PR qualifies and bumps minor.
    let state = store.load().unwrap();
    let first = f.engine.run(&config, &state).await;
    assert_eq!(first.decision.bump, BumpLevel::Minor);
    store.save(&first.next).unwrap();

    // Second cycle: the anchor moved past the PR's merge time, so the same
    // PR terminates the scan instead of contributing again.
    let state = store.load().unwrap();
    let second = f.engine.run(&config, &state).await;
    assert_eq!(second.decision.bump, BumpLevel::None);
    assert_eq!(
        second.next.boss_version,
        FleetVersion::new(1, 1, 0),
        "version must not move twice for one merged PR"
    );
}

/// The fleet version is non-decreasing across arbitrary persisted cycles.
#[tokio::test]
async fn test_boss_version_is_non_decreasing_across_cycles() {
    let f = fleet();
    let config = FleetConfig {
        services: vec![service("payments", Tier::Critical)],
    };
    f.releases.script("org/payments", Some("v1.0.0"));
    f.pulls.script("org/payments", vec![vec![]]);

    let mut state = FleetState::seed(FleetVersion::new(1, 0, 0), ts(0));
    state
        .services
        .insert("payments".to_string(), "v1.0.0".to_string());

    for _ in 0..3 {
        let outcome = f.engine.run(&config, &state).await;
        assert!(outcome.next.boss_version >= state.boss_version);
        state = outcome.next;
    }
}
