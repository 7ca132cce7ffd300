//! BOSS Version Core
//!
//! The fleet-wide semantic version bump-decision engine: ingests per-service
//! release-tag deltas, pull-request labels and commit markers, classifies
//! and tier-weights them, and combines them deterministically into the next
//! fleet ("BOSS") version plus a durable anchor for the next run.
//!
//! Transport, credentials and console output live outside this crate; the
//! engine only sees the [`sources`] traits and a [`state::StateStore`].

pub mod bump;
pub mod collector;
pub mod config;
pub mod engine;
pub mod error;
pub mod fakes;
pub mod priority;
pub mod sources;
pub mod state;
pub mod telemetry;
pub mod version;

pub use bump::{classify_label, classify_labels, BumpLevel, LabelVerdict, Tier};
pub use collector::{collect_merged_labels, PR_PAGE_SIZE};
pub use config::{FleetConfig, ServiceSpec};
pub use engine::{BossEngine, FleetDecision, RunOutcome, ServiceOutcome, ServiceSignal};
pub use error::{BossError, Result, SourceError, SourceResult};
pub use priority::{detect_override, OverrideHit, COMMIT_SCAN_WINDOW, PRIORITY_MARKER};
pub use sources::{CommitInfo, CommitSource, PullRequestInfo, PullRequestSource, ReleaseSource};
pub use state::{
    FleetState, JsonStateStore, StateStore, TAG_FETCH_ERROR, TAG_NO_RELEASE, TAG_UNKNOWN,
};
pub use telemetry::init_tracing;
pub use version::{classify_delta, FleetVersion, VersionTag};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
