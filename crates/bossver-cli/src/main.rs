//! BOSS Version - fleet-wide semantic version aggregation CLI
//!
//! The `bossver` command reads the fleet configuration and the persisted
//! state, evaluates one aggregation cycle against GitHub, and replaces the
//! state with the next fleet version.
//!
//! ## Commands
//!
//! - `run`: Evaluate one aggregation cycle and persist the result
//! - `status`: Print the persisted fleet state
//! - `init`: Seed a first-run state file

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{info, Level};

use bossver_core::{
    init_tracing, BossEngine, FleetConfig, FleetState, FleetVersion, JsonStateStore, StateStore,
};
use bossver_github::GithubClient;

#[derive(Parser)]
#[command(name = "bossver")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Fleet-wide semantic version aggregation", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one aggregation cycle and persist the next fleet state
    Run {
        /// Path to the fleet configuration file (JSON)
        #[arg(short, long, default_value = "fleet.json")]
        config: PathBuf,

        /// Path to the persisted state file
        #[arg(short, long, default_value = "boss-state.json")]
        state: PathBuf,

        /// Evaluate and report without persisting the result
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the persisted fleet state
    Status {
        /// Path to the persisted state file
        #[arg(short, long, default_value = "boss-state.json")]
        state: PathBuf,
    },

    /// Seed a first-run state file
    Init {
        /// Path to the state file to create
        #[arg(short, long, default_value = "boss-state.json")]
        state: PathBuf,

        /// Starting fleet version
        #[arg(long, default_value = "0.1.0")]
        version: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    match cli.command {
        Commands::Run {
            config,
            state,
            dry_run,
        } => run(config, state, dry_run).await,
        Commands::Status { state } => status(state),
        Commands::Init { state, version } => init(state, version),
    }
}

async fn run(config_path: PathBuf, state_path: PathBuf, dry_run: bool) -> Result<()> {
    let config = FleetConfig::from_path(&config_path)
        .with_context(|| format!("loading fleet configuration from {}", config_path.display()))?;

    let store = JsonStateStore::new(&state_path);
    let state = store.load().with_context(|| {
        format!(
            "loading state from {} (first run requires a seed, see `bossver init`)",
            state_path.display()
        )
    })?;

    let client = Arc::new(GithubClient::from_env());
    let engine = BossEngine::new(client.clone(), client.clone(), client);

    let run_id = uuid::Uuid::new_v4();
    let span = tracing::info_span!("bossver.run", run_id = %run_id);
    let _guard = span.enter();

    info!(
        services = config.services.len(),
        current = %state.boss_version,
        anchor = %state.anchor(),
        "starting aggregation cycle"
    );

    let outcome = engine.run(&config, &state).await;
    info!(
        bump = %outcome.decision.bump,
        reason = %outcome.decision.reason,
        previous = %state.boss_version,
        next = %outcome.next.boss_version,
        overridden = outcome.decision.overridden,
        "cycle evaluated"
    );

    if dry_run {
        info!("dry run, state not persisted");
    } else {
        store
            .save(&outcome.next)
            .with_context(|| format!("persisting state to {}", state_path.display()))?;
    }

    println!("{}", serde_json::to_string_pretty(&outcome.next)?);
    Ok(())
}

fn status(state_path: PathBuf) -> Result<()> {
    let store = JsonStateStore::new(&state_path);
    let state = store
        .load()
        .with_context(|| format!("loading state from {}", state_path.display()))?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

fn init(state_path: PathBuf, version: String) -> Result<()> {
    let store = JsonStateStore::new(&state_path);
    if store.exists() {
        bail!(
            "state file {} already exists, refusing to overwrite",
            state_path.display()
        );
    }
    let version = FleetVersion::try_from(version).map_err(|e| anyhow!(e))?;
    let state = FleetState::seed(version, Utc::now());
    store.save(&state)?;
    info!(path = %state_path.display(), version = %state.boss_version, "seed state written");
    Ok(())
}
