//! GitHub REST signal sources for the BOSS version engine.
//!
//! Implements the engine's `CommitSource`, `ReleaseSource` and
//! `PullRequestSource` traits over the GitHub REST API.

pub mod client;

pub use client::{GithubClient, GithubConfig};
