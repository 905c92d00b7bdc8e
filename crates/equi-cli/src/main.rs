//! `equi`: event registration, seating and team balancing.
//!
//! # Usage
//!
//! ```text
//! equi serve
//! equi event create --name "Orientation" --rows 10 --cols 12 --cluster-size 2
//! equi register <EVENT> --gender female --name Ada
//! equi seats <EVENT>
//! equi teams allocate <EVENT> --mode equality
//! ```
//!
//! Settings come from `equi.toml` (or `--config`) under `EQUI_*` environment
//! overrides; see [`config`].

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use equi_core::{balancer::BalanceMode, participant::Gender};
use equi_store_sqlite::SqliteStore;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::config::EquiConfig;

// ─── CLI args ────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "equi", version, about = "Event registration with balanced seating and teams")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, value_name = "FILE", default_value = "equi.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Serve the JSON API.
  Serve,

  /// Create, list, show or delete events.
  #[command(subcommand)]
  Event(EventCommand),

  /// Register one person into an event.
  Register {
    event: Uuid,
    /// Required unless the detector label is given and binary.
    #[arg(long)]
    gender: Option<Gender>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    external_id: Option<String>,
    #[arg(long)]
    branch: Option<String>,
    #[arg(long)]
    age: Option<u32>,
    /// Face embedding as comma-separated floats.
    #[arg(long, value_delimiter = ',')]
    embedding: Vec<f32>,
  },

  /// Print an event's roster.
  Roster { event: Uuid },

  /// Print an event's seat map.
  Seats { event: Uuid },

  /// Remove one participant by serial number.
  Remove { event: Uuid, serial: u32 },

  /// Apply a JSON array of participant row edits, all or nothing.
  Edit {
    event: Uuid,
    #[arg(value_name = "FILE")]
    file:  PathBuf,
  },

  /// Bulk-register a JSON array of registration requests.
  Import {
    event: Uuid,
    #[arg(value_name = "FILE")]
    file: PathBuf,
  },

  /// Role allocation and random team generation.
  #[command(subcommand)]
  Teams(TeamsCommand),
}

#[derive(Subcommand, Debug)]
enum EventCommand {
  Create {
    #[arg(long)]
    name: String,
    #[arg(long)]
    rows: u32,
    #[arg(long)]
    cols: u32,
    #[arg(long, default_value_t = 1)]
    cluster_size: u32,
    /// Do not store names, ids or branches.
    #[arg(long)]
    privacy: bool,
  },
  /// Change the hall; nobody is re-seated.
  Resize {
    event:        Uuid,
    #[arg(long)]
    rows:         u32,
    #[arg(long)]
    cols:         u32,
    #[arg(long, default_value_t = 1)]
    cluster_size: u32,
  },
  List,
  Show { event: Uuid },
  Delete { event: Uuid },
}

#[derive(Subcommand, Debug)]
enum TeamsCommand {
  /// Replace the candidate pool from a JSON file.
  SetCandidates {
    event: Uuid,
    #[arg(value_name = "FILE")]
    file: PathBuf,
  },
  /// Replace the roles from a JSON file.
  SetRoles {
    event: Uuid,
    #[arg(value_name = "FILE")]
    file: PathBuf,
  },
  /// Assign candidates to roles and rebalance genders.
  Allocate {
    event: Uuid,
    /// off, balance or equality; defaults to the configured mode.
    #[arg(long, conflicts_with = "threshold")]
    mode: Option<BalanceMode>,
    #[arg(long)]
    threshold: Option<f64>,
  },
  /// Deal people into gender-mixed random teams.
  Generate {
    event: Uuid,
    #[arg(long)]
    size: usize,
    #[arg(long)]
    seed: Option<u64>,
    /// Use the candidate pool instead of the roster.
    #[arg(long)]
    candidates: bool,
  },
}

// ─── Entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();
  let cfg = EquiConfig::load(&cli.config)?;

  let store = SqliteStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  match cli.command {
    Command::Serve => commands::serve(store, &cfg).await,
    Command::Event(cmd) => match cmd {
      EventCommand::Create { name, rows, cols, cluster_size, privacy } => {
        commands::create_event(&store, name, rows, cols, cluster_size, privacy).await
      }
      EventCommand::Resize { event, rows, cols, cluster_size } => {
        commands::resize_event(&store, event, rows, cols, cluster_size).await
      }
      EventCommand::List => commands::list_events(&store).await,
      EventCommand::Show { event } => commands::show_event(&store, event).await,
      EventCommand::Delete { event } => commands::delete_event(&store, event).await,
    },
    Command::Register { event, gender, name, external_id, branch, age, embedding } => {
      let request = equi_core::registration::RegistrationRequest {
        gender,
        detected_gender: None,
        name,
        external_id,
        branch,
        age,
        embedding,
      };
      commands::register(&store, &cfg, event, request).await
    }
    Command::Roster { event } => commands::roster(&store, event).await,
    Command::Seats { event } => commands::seats(&store, event).await,
    Command::Remove { event, serial } => commands::remove(&store, event, serial).await,
    Command::Edit { event, file } => commands::edit(&store, event, &file).await,
    Command::Import { event, file } => commands::import(&store, &cfg, event, &file).await,
    Command::Teams(cmd) => match cmd {
      TeamsCommand::SetCandidates { event, file } => {
        commands::set_candidates(&store, event, &file).await
      }
      TeamsCommand::SetRoles { event, file } => commands::set_roles(&store, event, &file).await,
      TeamsCommand::Allocate { event, mode, threshold } => {
        let threshold = threshold.unwrap_or_else(|| mode.unwrap_or(cfg.teams.mode).threshold());
        commands::allocate(&store, event, threshold).await
      }
      TeamsCommand::Generate { event, size, seed, candidates } => {
        commands::generate(&store, event, size, seed, candidates).await
      }
    },
  }
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory as _;

  use super::*;

  #[test]
  fn cli_definition_is_consistent() { Cli::command().debug_assert(); }

  #[test]
  fn parses_register_with_embedding() {
    let id = Uuid::new_v4();
    let cli = Cli::try_parse_from([
      "equi",
      "register",
      &id.to_string(),
      "--gender",
      "nb",
      "--embedding",
      "0.5,-0.25,1",
    ])
    .unwrap();
    match cli.command {
      Command::Register { event, gender, embedding, .. } => {
        assert_eq!(event, id);
        assert_eq!(gender, Some(Gender::NonBinary));
        assert_eq!(embedding, vec![0.5, -0.25, 1.0]);
      }
      other => panic!("unexpected command: {other:?}"),
    }
  }

  #[test]
  fn parses_event_resize() {
    let id = Uuid::new_v4();
    let cli = Cli::try_parse_from([
      "equi", "event", "resize", &id.to_string(), "--rows", "4", "--cols", "6",
    ])
    .unwrap();
    match cli.command {
      Command::Event(EventCommand::Resize { event, rows, cols, cluster_size }) => {
        assert_eq!(event, id);
        assert_eq!((rows, cols, cluster_size), (4, 6, 1));
      }
      other => panic!("unexpected command: {other:?}"),
    }
  }

  #[test]
  fn mode_and_threshold_conflict() {
    let id = Uuid::new_v4().to_string();
    let res = Cli::try_parse_from([
      "equi", "teams", "allocate", &id, "--mode", "balance", "--threshold", "0.1",
    ]);
    assert!(res.is_err());
  }
}
