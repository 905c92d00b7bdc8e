//! Subcommand implementations. Each one talks to the store directly, except
//! `serve`, which hands it to the API router.

use std::{path::Path, sync::Arc};

use anyhow::{Context as _, bail};
use equi_api::{AppState, api_router};
use equi_core::{
  balancer,
  event::{Event, HallLayout, NewEvent},
  grouping::{self, Gendered},
  participant::{Participant, ParticipantEdit},
  registration::{self, RegistrationOutcome, RegistrationRequest},
  roster as roster_ops,
  seating::{self, SeatMap, SlotType},
  store::EventStore,
  team::{Role, TeamCandidate},
};
use equi_store_sqlite::SqliteStore;
use rand::{SeedableRng, rngs::StdRng};
use serde::de::DeserializeOwned;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::EquiConfig;

// ─── Helpers ─────────────────────────────────────────────────────────────────

async fn load_event(store: &SqliteStore, id: Uuid) -> anyhow::Result<Event> {
  store
    .get_event(id)
    .await?
    .with_context(|| format!("event {id} not found"))
}

fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
  let raw = std::fs::read_to_string(path)
    .with_context(|| format!("reading {}", path.display()))?;
  serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn describe(p: &Participant) -> String {
  format!(
    "{:>4}  {:<10}  {:<16}  {}",
    p.serial_no,
    p.gender,
    p.seat.as_deref().unwrap_or(seating::FULL),
    p.display_label()
  )
}

// ─── Server ──────────────────────────────────────────────────────────────────

pub async fn serve(store: SqliteStore, cfg: &EquiConfig) -> anyhow::Result<()> {
  let state = AppState::new(Arc::new(store), cfg.api_settings());
  let app = api_router(state).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", cfg.host, cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;
  Ok(())
}

// ─── Events ──────────────────────────────────────────────────────────────────

pub async fn create_event(
  store: &SqliteStore,
  name: String,
  rows: u32,
  cols: u32,
  cluster_size: u32,
  privacy_mode: bool,
) -> anyhow::Result<()> {
  let layout = HallLayout::new(rows, cols, cluster_size)?;
  let event = store.create_event(NewEvent { name, layout, privacy_mode }).await?;
  println!("{}", event.event_id);
  Ok(())
}

pub async fn resize_event(
  store: &SqliteStore,
  id: Uuid,
  rows: u32,
  cols: u32,
  cluster_size: u32,
) -> anyhow::Result<()> {
  let layout = HallLayout::new(rows, cols, cluster_size)?;
  let event = roster_ops::resize(store, id, layout).await?;
  let outside = store
    .list_participants(id)
    .await?
    .iter()
    .filter_map(|p| p.seat.as_deref())
    .filter(|label| seating::locate_seat(&event.layout, label).is_none())
    .count();
  println!("{rows}x{cols} (cluster {cluster_size})");
  if outside > 0 {
    println!("{outside} participant(s) now seated outside the hall");
  }
  Ok(())
}

pub async fn list_events(store: &SqliteStore) -> anyhow::Result<()> {
  for e in store.list_events().await? {
    println!(
      "{}  {:<24}  {}x{} (cluster {}){}",
      e.event_id,
      e.name,
      e.layout.rows(),
      e.layout.cols(),
      e.layout.cluster_size(),
      if e.privacy_mode { "  [private]" } else { "" }
    );
  }
  Ok(())
}

pub async fn show_event(store: &SqliteStore, id: Uuid) -> anyhow::Result<()> {
  let event = load_event(store, id).await?;
  let roster = store.list_participants(id).await?;
  let seated = roster.iter().filter(|p| p.seat.is_some()).count();
  println!("{}", serde_json::to_string_pretty(&event)?);
  println!(
    "{} registered, {} seated, {} seats in total",
    roster.len(),
    seated,
    event.layout.capacity()
  );
  Ok(())
}

pub async fn delete_event(store: &SqliteStore, id: Uuid) -> anyhow::Result<()> {
  if !store.delete_event(id).await? {
    bail!("event {id} not found");
  }
  Ok(())
}

// ─── Registration ────────────────────────────────────────────────────────────

pub async fn register(
  store: &SqliteStore,
  cfg: &EquiConfig,
  event: Uuid,
  request: RegistrationRequest,
) -> anyhow::Result<()> {
  match registration::register(store, event, request, &cfg.policy()).await? {
    RegistrationOutcome::Registered { participant } => println!("{}", describe(&participant)),
    RegistrationOutcome::Duplicate { matched } => bail!(
      "already registered as {} (similarity {:.3})",
      matched.matched_label.unwrap_or_default(),
      matched.similarity.unwrap_or_default()
    ),
    RegistrationOutcome::HallFull => bail!("no seat left for this gender"),
  }
  Ok(())
}

pub async fn import(
  store: &SqliteStore,
  cfg: &EquiConfig,
  event: Uuid,
  file: &Path,
) -> anyhow::Result<()> {
  let records: Vec<RegistrationRequest> = read_json(file)?;
  let report = registration::import(store, event, records, &cfg.policy()).await?;
  for p in &report.registered {
    println!("{}", describe(p));
  }
  for s in &report.skipped {
    eprintln!("record {} skipped: {}", s.index, s.reason);
  }
  Ok(())
}

pub async fn edit(store: &SqliteStore, event: Uuid, file: &Path) -> anyhow::Result<()> {
  let edits: Vec<ParticipantEdit> = read_json(file)?;
  for p in roster_ops::edit(store, event, edits).await? {
    println!("{}", describe(&p));
  }
  Ok(())
}

pub async fn roster(store: &SqliteStore, event: Uuid) -> anyhow::Result<()> {
  load_event(store, event).await?;
  for p in store.list_participants(event).await? {
    println!("{}", describe(&p));
  }
  Ok(())
}

pub async fn remove(store: &SqliteStore, event: Uuid, serial: u32) -> anyhow::Result<()> {
  if !store.remove_participant(event, serial).await? {
    bail!("participant #{serial} not found in event {event}");
  }
  Ok(())
}

/// One character per seat: `F`/`M` for free female/male slots, `f`/`m` for
/// taken ones.
pub async fn seats(store: &SqliteStore, event: Uuid) -> anyhow::Result<()> {
  let e = load_event(store, event).await?;
  let map = SeatMap::build(&e.layout, &store.list_participants(event).await?);
  for (row, cells) in map.rows.iter().enumerate() {
    let line: String = cells
      .iter()
      .map(|c| match (c.slot, c.occupant.is_some()) {
        (SlotType::Female, false) => 'F',
        (SlotType::Female, true) => 'f',
        (SlotType::Male, false) => 'M',
        (SlotType::Male, true) => 'm',
      })
      .collect();
    println!("{}  {line}", char::from(b'A' + row as u8));
  }
  println!("{} of {} seats taken", map.occupied(), e.layout.capacity());
  if !map.unseated.is_empty() {
    println!("unseated: {:?}", map.unseated);
  }
  Ok(())
}

// ─── Teams ───────────────────────────────────────────────────────────────────

pub async fn set_candidates(store: &SqliteStore, event: Uuid, file: &Path) -> anyhow::Result<()> {
  let pool: Vec<TeamCandidate> = read_json(file)?;
  let n = pool.len();
  store.replace_candidates(event, pool).await?;
  println!("{n} candidates stored");
  Ok(())
}

pub async fn set_roles(store: &SqliteStore, event: Uuid, file: &Path) -> anyhow::Result<()> {
  let roles: Vec<Role> = read_json(file)?;
  let n = roles.len();
  store.replace_roles(event, roles).await?;
  println!("{n} roles stored");
  Ok(())
}

pub async fn allocate(store: &SqliteStore, event: Uuid, threshold: f64) -> anyhow::Result<()> {
  load_event(store, event).await?;
  let candidates = store.list_candidates(event).await?;
  let roles = store.list_roles(event).await?;
  let result = balancer::allocate_roles(&candidates, &roles, threshold)?;

  for line in result.audit_lines() {
    println!("{line}");
  }
  for ra in &result.assignment.roles {
    let (m, f) = ra.gender_counts();
    println!("\n{} ({m}M/{f}F)", ra.role);
    for p in &ra.members {
      println!("  {:<20} {:<10} {:.2}", p.candidate.name, p.candidate.gender, p.score);
    }
  }
  if !result.assignment.unassigned.is_empty() {
    println!("\nunassigned");
    for c in &result.assignment.unassigned {
      println!("  {:<20} {}", c.name, c.gender);
    }
  }
  Ok(())
}

fn print_teams<T: Gendered>(teams: &[Vec<T>], label: impl Fn(&T) -> String) {
  for (i, team) in teams.iter().enumerate() {
    let names: Vec<String> =
      team.iter().map(|m| format!("{} ({})", label(m), m.gender())).collect();
    println!("Team {}: {}", i + 1, names.join(", "));
  }
}

pub async fn generate(
  store: &SqliteStore,
  event: Uuid,
  size: usize,
  seed: Option<u64>,
  from_candidates: bool,
) -> anyhow::Result<()> {
  load_event(store, event).await?;
  let mut rng = match seed {
    Some(seed) => StdRng::seed_from_u64(seed),
    None => StdRng::from_entropy(),
  };

  if from_candidates {
    let pool = store.list_candidates(event).await?;
    let teams = grouping::generate_teams(&pool, size, &mut rng)?;
    print_teams(&teams, |c| c.name.clone());
  } else {
    let roster = store.list_participants(event).await?;
    let teams = grouping::generate_teams(&roster, size, &mut rng)?;
    print_teams(&teams, Participant::display_label);
  }
  Ok(())
}
