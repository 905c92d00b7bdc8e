//! Runtime configuration, layered from an optional TOML file and `EQUI_*`
//! environment variables.
//!
//! ```toml
//! host       = "0.0.0.0"
//! port       = 8080
//! store_path = "~/.local/share/equi/equi.db"
//!
//! [matcher]
//! metric    = "euclidean"
//! threshold = 0.45
//!
//! [registration]
//! on_full = "block"
//!
//! [teams]
//! mode = "equality"
//! ```
//!
//! Nested keys use a double underscore in the environment:
//! `EQUI_MATCHER__THRESHOLD=0.7`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use equi_api::ApiSettings;
use equi_core::{
  balancer::BalanceMode,
  matcher::SimilarityMetric,
  registration::{FullHallPolicy, RegistrationPolicy},
};
use serde::Deserialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
  #[default]
  Cosine,
  Euclidean,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
  pub metric:    MetricKind,
  /// Falls back to the metric's own default when unset.
  pub threshold: Option<f32>,
}

impl MatcherConfig {
  pub fn metric(&self) -> SimilarityMetric {
    match (self.metric, self.threshold) {
      (MetricKind::Cosine, Some(t)) => SimilarityMetric::Cosine(t),
      (MetricKind::Cosine, None) => SimilarityMetric::cosine(),
      (MetricKind::Euclidean, Some(t)) => SimilarityMetric::Euclidean(t),
      (MetricKind::Euclidean, None) => SimilarityMetric::euclidean(),
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
  pub on_full: FullHallPolicy,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TeamsConfig {
  pub mode: BalanceMode,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EquiConfig {
  pub host:         String,
  pub port:         u16,
  pub store_path:   PathBuf,
  pub matcher:      MatcherConfig,
  pub registration: RegistrationConfig,
  pub teams:        TeamsConfig,
}

impl Default for EquiConfig {
  fn default() -> Self {
    Self {
      host:         "127.0.0.1".to_owned(),
      port:         8080,
      store_path:   PathBuf::from("equi.db"),
      matcher:      MatcherConfig::default(),
      registration: RegistrationConfig::default(),
      teams:        TeamsConfig::default(),
    }
  }
}

impl EquiConfig {
  /// Read `path` (if it exists) under `EQUI_*` environment overrides.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("EQUI").separator("__"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: EquiConfig = settings
      .try_deserialize()
      .context("failed to deserialise EquiConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn policy(&self) -> RegistrationPolicy {
    RegistrationPolicy {
      metric:  self.matcher.metric(),
      on_full: self.registration.on_full,
    }
  }

  pub fn api_settings(&self) -> ApiSettings {
    ApiSettings {
      registration: self.policy(),
      balance:      self.teams.mode,
    }
  }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
