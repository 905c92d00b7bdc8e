//! Team candidates, roles, and fit scoring.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::{Error, Result, participant::Gender};

/// Proficiency values in the legacy representation run from 0 to this value.
pub const MAX_PROFICIENCY: u8 = 10;

// ─── Skills ──────────────────────────────────────────────────────────────────

/// What a candidate can do.
///
/// Current data uses plain capability tags. Older rosters carried a 0–10
/// proficiency per skill; those still load (a JSON object rather than an
/// array) and score on the proficiency scale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SkillSet {
  Tags(BTreeSet<String>),
  Proficiency(BTreeMap<String, u8>),
}

impl Default for SkillSet {
  fn default() -> Self { Self::Tags(BTreeSet::new()) }
}

impl SkillSet {
  pub fn tags<I, S>(tags: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self::Tags(tags.into_iter().map(Into::into).collect())
  }

  pub fn is_empty(&self) -> bool {
    match self {
      Self::Tags(t) => t.is_empty(),
      Self::Proficiency(p) => p.is_empty(),
    }
  }
}

// ─── Candidate ───────────────────────────────────────────────────────────────

/// A person eligible for role assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamCandidate {
  pub id:     String,
  pub name:   String,
  pub gender: Gender,
  #[serde(default)]
  pub skills: SkillSet,
}

// ─── Role ────────────────────────────────────────────────────────────────────

/// A position to fill, with weighted skill requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
  pub name:         String,
  pub capacity:     u32,
  #[serde(default)]
  pub requirements: BTreeMap<String, f64>,
}

impl Role {
  pub fn new(name: impl Into<String>, capacity: u32) -> Self {
    Self { name: name.into(), capacity, requirements: BTreeMap::new() }
  }

  pub fn require(mut self, skill: impl Into<String>, weight: f64) -> Self {
    self.requirements.insert(skill.into(), weight);
    self
  }

  fn validate(&self) -> Result<()> {
    if self.capacity == 0 {
      return Err(Error::ZeroCapacity(self.name.clone()));
    }
    if let Some(skill) = self
      .requirements
      .iter()
      .find(|(_, w)| !w.is_finite() || **w < 0.0)
      .map(|(s, _)| s)
    {
      return Err(Error::InvalidWeight {
        role:  self.name.clone(),
        skill: skill.clone(),
      });
    }
    Ok(())
  }
}

/// Check a role list: names unique, capacities at least 1, weights finite
/// and non-negative.
pub fn validate_roles(roles: &[Role]) -> Result<()> {
  let mut seen = HashSet::new();
  for role in roles {
    role.validate()?;
    if !seen.insert(role.name.as_str()) {
      return Err(Error::DuplicateRole(role.name.clone()));
    }
  }
  Ok(())
}

/// Check that candidate ids are unique.
pub fn validate_candidates(candidates: &[TeamCandidate]) -> Result<()> {
  let mut seen = HashSet::new();
  match candidates.iter().find(|c| !seen.insert(c.id.as_str())) {
    Some(dup) => Err(Error::DuplicateCandidate(dup.id.clone())),
    None => Ok(()),
  }
}

// ─── Scoring ─────────────────────────────────────────────────────────────────

/// How well `skills` cover `requirements`, in `[0, 1]`.
///
/// Skill names compare case-insensitively. With tags, each satisfied
/// requirement contributes its full weight; with proficiencies, the weight
/// is scaled by `proficiency / 10`. A zero total weight scores 0.
pub fn fit_score(skills: &SkillSet, requirements: &BTreeMap<String, f64>) -> f64 {
  let total_weight: f64 = requirements.values().sum();
  if total_weight <= 0.0 {
    return 0.0;
  }

  match skills {
    SkillSet::Tags(tags) => {
      let have: HashSet<String> = tags.iter().map(|t| t.to_lowercase()).collect();
      let sum: f64 = requirements
        .iter()
        .filter(|(skill, _)| have.contains(&skill.to_lowercase()))
        .map(|(_, w)| w)
        .sum();
      sum / total_weight
    }
    SkillSet::Proficiency(levels) => {
      let levels: BTreeMap<String, u8> = levels
        .iter()
        .map(|(k, v)| (k.to_lowercase(), (*v).min(MAX_PROFICIENCY)))
        .collect();
      let sum: f64 = requirements
        .iter()
        .map(|(skill, w)| {
          f64::from(levels.get(&skill.to_lowercase()).copied().unwrap_or(0)) * w
        })
        .sum();
      sum / (total_weight * f64::from(MAX_PROFICIENCY))
    }
  }
}
