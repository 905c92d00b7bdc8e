//! Role allocation with gender-balance correction.
//!
//! Allocation runs in two phases:
//!
//! 1. **Greedy.** Every `(role, candidate)` pair is scored with
//!    [`fit_score`]; the pairs are walked from best to worst and a candidate
//!    is placed when they are still free and the role still has room. Ties
//!    keep role order, then candidate order.
//! 2. **Balance.** Only when `balance_threshold > 0`. A role whose male and
//!    female counts differ by two or more gives up its weakest member of the
//!    dominant gender, replaced either by a free candidate of the other
//!    gender or by a swap with another role. No replacement may cost more
//!    than `balance_threshold` in fit score. The pass budget is
//!    `2 * roles.len()`, so the loop always terminates; the result is best
//!    effort.
//!
//! Non-binary candidates are placed normally but do not count towards
//! either side of the balance.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
  Result,
  participant::Gender,
  team::{Role, TeamCandidate, fit_score, validate_candidates, validate_roles},
};

// ─── Balance modes ───────────────────────────────────────────────────────────

/// Named balance thresholds offered to organisers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceMode {
  /// Pure skill fit; no balancing.
  Off,
  /// Accept up to 0.20 fit loss per swap.
  #[default]
  Balance,
  /// Accept up to 0.30 fit loss per swap.
  Equality,
}

impl BalanceMode {
  pub fn threshold(self) -> f64 {
    match self {
      Self::Off => 0.0,
      Self::Balance => 0.20,
      Self::Equality => 0.30,
    }
  }
}

impl FromStr for BalanceMode {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "off" | "none" | "skill" => Ok(Self::Off),
      "balance" => Ok(Self::Balance),
      "equality" => Ok(Self::Equality),
      other => Err(format!("unknown balance mode: {other:?}")),
    }
  }
}

// ─── Output ──────────────────────────────────────────────────────────────────

/// A candidate placed in a role, with their fit for that role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
  pub candidate: TeamCandidate,
  pub score:     f64,
}

/// Everyone placed in one role, in placement order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAssignment {
  pub role:    String,
  pub members: Vec<Placement>,
}

impl RoleAssignment {
  /// `(male, female)` counts; non-binary members are not counted.
  pub fn gender_counts(&self) -> (usize, usize) {
    count_genders(self.members.iter().map(|p| p.candidate.gender))
  }
}

/// The result of [`allocate_roles`]: one entry per role, in role order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
  pub roles:      Vec<RoleAssignment>,
  /// Candidates left without a role, in roster order.
  pub unassigned: Vec<TeamCandidate>,
}

impl Assignment {
  pub fn role(&self, name: &str) -> Option<&RoleAssignment> {
    self.roles.iter().find(|r| r.role == name)
  }

  /// The role a candidate ended up in, if any.
  pub fn role_of(&self, candidate_id: &str) -> Option<&str> {
    self
      .roles
      .iter()
      .find(|r| r.members.iter().any(|p| p.candidate.id == candidate_id))
      .map(|r| r.role.as_str())
  }
}

/// One line of the balancing audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AuditEntry {
  BalanceStarted {
    threshold: f64,
  },
  ImbalanceFound {
    role:     String,
    dominant: Gender,
    target:   Gender,
  },
  SwappedUnassigned {
    role:     String,
    outgoing: String,
    incoming: String,
    loss:     f64,
  },
  SwappedAcrossRoles {
    role:       String,
    other_role: String,
    /// Leaves `role` for `other_role`.
    outgoing:   String,
    /// Leaves `other_role` for `role`.
    incoming:   String,
  },
}

impl fmt::Display for AuditEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::BalanceStarted { threshold } => {
        write!(f, "Starting balance check (threshold: {threshold:.2})")
      }
      Self::ImbalanceFound { role, dominant, target } => write!(
        f,
        "Fixing imbalance in '{role}' ({dominant} dominant). Target: {target}"
      ),
      Self::SwappedUnassigned { outgoing, incoming, loss, .. } => write!(
        f,
        "-> Swapped unassigned: {outgoing} (out) <-> {incoming} (in). Loss: {loss:.2}"
      ),
      Self::SwappedAcrossRoles { role, other_role, outgoing, incoming } => write!(
        f,
        "-> Swapped with '{other_role}': {outgoing} (to {other_role}) <-> {incoming} (to {role})"
      ),
    }
  }
}

/// Assignment plus the audit trail explaining every balancing move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleAllocation {
  pub assignment: Assignment,
  pub audit:      Vec<AuditEntry>,
  /// Balancing passes actually run; never more than `2 * roles`.
  pub passes:     usize,
}

impl RoleAllocation {
  pub fn audit_lines(&self) -> Vec<String> {
    self.audit.iter().map(ToString::to_string).collect()
  }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

/// Assign `candidates` to `roles`, then correct gender skew within
/// `balance_threshold`.
///
/// Inputs are not modified. Fails only on contract violations: invalid roles
/// (see [`validate_roles`]) or duplicate candidate ids. Empty rosters, empty
/// role lists and zero-weight roles are fine.
pub fn allocate_roles(
  candidates: &[TeamCandidate],
  roles: &[Role],
  balance_threshold: f64,
) -> Result<RoleAllocation> {
  validate_roles(roles)?;
  validate_candidates(candidates)?;

  let mut balancer = Balancer::new(candidates, roles, balance_threshold);
  balancer.assign_greedy();
  let passes = if balance_threshold > 0.0 { balancer.rebalance() } else { 0 };

  tracing::debug!(
    roles = roles.len(),
    candidates = candidates.len(),
    moves = balancer.audit.len(),
    passes,
    "role allocation finished"
  );
  Ok(balancer.finish(passes))
}

// ─── Internals ───────────────────────────────────────────────────────────────

fn count_genders(genders: impl Iterator<Item = Gender>) -> (usize, usize) {
  genders.fold((0, 0), |(m, f), g| match g {
    Gender::Male => (m + 1, f),
    Gender::Female => (m, f + 1),
    Gender::NonBinary => (m, f),
  })
}

#[derive(Debug, Clone, Copy)]
struct Slot {
  candidate: usize,
  score:     f64,
}

/// A balancing move, found but not yet applied.
enum Fix {
  FromPool {
    role:     usize,
    out_pos:  usize,
    incoming: usize,
    score:    f64,
    loss:     f64,
  },
  Swap {
    role:        usize,
    out_pos:     usize,
    other:       usize,
    in_pos:      usize,
    /// Incoming candidate's fit in `role`.
    score_here:  f64,
    /// Outgoing candidate's fit in `other`.
    score_there: f64,
  },
}

struct Balancer<'a> {
  candidates: &'a [TeamCandidate],
  roles:      &'a [Role],
  /// `scores[role][candidate]`
  scores:     Vec<Vec<f64>>,
  slots:      Vec<Vec<Slot>>,
  assigned:   Vec<bool>,
  threshold:  f64,
  audit:      Vec<AuditEntry>,
}

impl<'a> Balancer<'a> {
  fn new(candidates: &'a [TeamCandidate], roles: &'a [Role], threshold: f64) -> Self {
    let scores = roles
      .iter()
      .map(|r| {
        candidates
          .iter()
          .map(|c| fit_score(&c.skills, &r.requirements))
          .collect()
      })
      .collect();
    Self {
      candidates,
      roles,
      scores,
      slots: vec![Vec::new(); roles.len()],
      assigned: vec![false; candidates.len()],
      threshold,
      audit: Vec::new(),
    }
  }

  fn gender(&self, candidate: usize) -> Gender { self.candidates[candidate].gender }

  fn counts(&self, role: usize) -> (usize, usize) {
    count_genders(self.slots[role].iter().map(|s| self.gender(s.candidate)))
  }

  fn assign_greedy(&mut self) {
    let mut options: Vec<(usize, usize, f64)> = self
      .scores
      .iter()
      .enumerate()
      .flat_map(|(r, row)| row.iter().enumerate().map(move |(c, s)| (r, c, *s)))
      .collect();
    // Stable: ties keep role-major, candidate-minor order.
    options.sort_by(|a, b| b.2.total_cmp(&a.2));

    for (r, c, score) in options {
      if self.assigned[c] || self.slots[r].len() >= self.roles[r].capacity as usize {
        continue;
      }
      self.slots[r].push(Slot { candidate: c, score });
      self.assigned[c] = true;
    }
  }

  /// Run balancing passes until nothing changes or the budget runs out.
  /// Returns the number of passes run.
  fn rebalance(&mut self) -> usize {
    self.audit.push(AuditEntry::BalanceStarted { threshold: self.threshold });

    let budget = 2 * self.roles.len();
    let mut passes = 0;
    while passes < budget {
      passes += 1;
      let mut changed = false;
      for role in 0..self.roles.len() {
        if let Some(fix) = self.find_fix(role) {
          self.apply(fix);
          changed = true;
          // Counts changed; rescan from the first role.
          break;
        }
      }
      if !changed {
        break;
      }
    }
    passes
  }

  fn find_fix(&mut self, role: usize) -> Option<Fix> {
    if self.slots[role].is_empty() {
      return None;
    }
    let (m, f) = self.counts(role);
    let diff = m as i64 - f as i64;
    let dominant = match diff {
      d if d >= 2 => Gender::Male,
      d if d <= -2 => Gender::Female,
      _ => return None,
    };
    let target = dominant.opposite()?;

    // The weakest member of the dominant gender; first one on ties.
    let mut out: Option<(usize, Slot)> = None;
    for (pos, slot) in self.slots[role].iter().enumerate() {
      if self.gender(slot.candidate) == dominant
        && out.is_none_or(|(_, best)| slot.score < best.score)
      {
        out = Some((pos, *slot));
      }
    }
    let (out_pos, outgoing) = out?;

    let fix = self
      .from_pool(role, out_pos, outgoing, target)
      .or_else(|| self.swap(role, out_pos, outgoing, dominant, target));

    if fix.is_some() {
      self.audit.push(AuditEntry::ImbalanceFound {
        role: self.roles[role].name.clone(),
        dominant,
        target,
      });
    }
    fix
  }

  /// Best free candidate of `target` gender within the threshold.
  fn from_pool(
    &self,
    role: usize,
    out_pos: usize,
    outgoing: Slot,
    target: Gender,
  ) -> Option<Fix> {
    let mut best: Option<(usize, f64)> = None;
    for (c, candidate) in self.candidates.iter().enumerate() {
      if self.assigned[c] || candidate.gender != target {
        continue;
      }
      let score = self.scores[role][c];
      if outgoing.score - score <= self.threshold
        && best.is_none_or(|(_, s)| score > s)
      {
        best = Some((c, score));
      }
    }
    best.map(|(incoming, score)| Fix::FromPool {
      role,
      out_pos,
      incoming,
      score,
      loss: outgoing.score - score,
    })
  }

  /// First acceptable swap with a `target`-gender member of another role.
  fn swap(
    &self,
    role: usize,
    out_pos: usize,
    outgoing: Slot,
    dominant: Gender,
    target: Gender,
  ) -> Option<Fix> {
    // Receiving one `dominant` and losing one `target` shifts the other
    // role's male-minus-female difference by two.
    let shift: i64 = if dominant == Gender::Male { 2 } else { -2 };

    for other in (0..self.roles.len()).filter(|&o| o != role) {
      let (m, f) = self.counts(other);
      let current = m as i64 - f as i64;
      let after = current + shift;
      if after.abs() >= 2 && after.abs() >= current.abs() {
        continue;
      }

      let score_there = self.scores[other][outgoing.candidate];
      for (in_pos, incoming) in self.slots[other].iter().enumerate() {
        if self.gender(incoming.candidate) != target {
          continue;
        }
        let score_here = self.scores[role][incoming.candidate];
        let loss_here = outgoing.score - score_here;
        let loss_there = incoming.score - score_there;
        if loss_here <= self.threshold && loss_there <= self.threshold {
          return Some(Fix::Swap {
            role,
            out_pos,
            other,
            in_pos,
            score_here,
            score_there,
          });
        }
      }
    }
    None
  }

  fn apply(&mut self, fix: Fix) {
    match fix {
      Fix::FromPool { role, out_pos, incoming, score, loss } => {
        let out = self.slots[role].remove(out_pos);
        self.assigned[out.candidate] = false;
        self.slots[role].push(Slot { candidate: incoming, score });
        self.assigned[incoming] = true;

        let entry = AuditEntry::SwappedUnassigned {
          role: self.roles[role].name.clone(),
          outgoing: self.candidates[out.candidate].name.clone(),
          incoming: self.candidates[incoming].name.clone(),
          loss,
        };
        tracing::debug!(%entry, "balance move");
        self.audit.push(entry);
      }
      Fix::Swap { role, out_pos, other, in_pos, score_here, score_there } => {
        let out = self.slots[role].remove(out_pos);
        let inc = self.slots[other].remove(in_pos);
        self.slots[role].push(Slot { candidate: inc.candidate, score: score_here });
        self.slots[other].push(Slot { candidate: out.candidate, score: score_there });

        let entry = AuditEntry::SwappedAcrossRoles {
          role: self.roles[role].name.clone(),
          other_role: self.roles[other].name.clone(),
          outgoing: self.candidates[out.candidate].name.clone(),
          incoming: self.candidates[inc.candidate].name.clone(),
        };
        tracing::debug!(%entry, "balance move");
        self.audit.push(entry);
      }
    }
  }

  fn finish(self, passes: usize) -> RoleAllocation {
    let roles = self
      .roles
      .iter()
      .zip(&self.slots)
      .map(|(role, slots)| RoleAssignment {
        role:    role.name.clone(),
        members: slots
          .iter()
          .map(|s| Placement {
            candidate: self.candidates[s.candidate].clone(),
            score:     s.score,
          })
          .collect(),
      })
      .collect();
    let unassigned = self
      .candidates
      .iter()
      .zip(&self.assigned)
      .filter(|(_, a)| !**a)
      .map(|(c, _)| c.clone())
      .collect();

    RoleAllocation {
      assignment: Assignment { roles, unassigned },
      audit: self.audit,
      passes,
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;

  use super::*;
  use crate::{Error, team::SkillSet};

  fn cand(id: &str, gender: Gender, skills: &[&str]) -> TeamCandidate {
    TeamCandidate {
      id: id.to_owned(),
      name: id.to_owned(),
      gender,
      skills: SkillSet::tags(skills.iter().copied()),
    }
  }

  fn member_ids(alloc: &RoleAllocation, role: &str) -> Vec<String> {
    alloc
      .assignment
      .role(role)
      .unwrap()
      .members
      .iter()
      .map(|p| p.candidate.id.clone())
      .collect()
  }

  fn assert_well_formed(alloc: &RoleAllocation, roles: &[Role]) {
    let mut seen = HashSet::new();
    for (ra, role) in alloc.assignment.roles.iter().zip(roles) {
      assert_eq!(ra.role, role.name);
      assert!(ra.members.len() <= role.capacity as usize);
      for p in &ra.members {
        assert!(seen.insert(p.candidate.id.clone()), "{} placed twice", p.candidate.id);
      }
    }
    for c in &alloc.assignment.unassigned {
      assert!(!seen.contains(&c.id));
    }
    assert!(alloc.passes <= 2 * roles.len());
  }

  #[test]
  fn greedy_prefers_best_fit() {
    let roles = [Role::new("MC", 1).require("humor", 8.0).require("stage_presence", 5.0)];
    let candidates = [
      cand("B", Gender::Male, &["humor"]),
      cand("A", Gender::Female, &["humor", "stage_presence"]),
    ];
    let alloc = allocate_roles(&candidates, &roles, 0.0).unwrap();
    let mc = alloc.assignment.role("MC").unwrap();
    assert_eq!(mc.members.len(), 1);
    assert_eq!(mc.members[0].candidate.id, "A");
    assert_eq!(mc.members[0].score, 1.0);
    assert_eq!(alloc.assignment.unassigned[0].id, "B");
    assert!(alloc.audit.is_empty());
    assert_eq!(alloc.passes, 0);
  }

  fn build_team() -> (Vec<TeamCandidate>, Vec<Role>) {
    let roles = vec![
      Role::new("Build", 3)
        .require("code", 5.0)
        .require("design", 3.0)
        .require("test", 2.0),
    ];
    let candidates = vec![
      cand("M1", Gender::Male, &["code", "design", "test"]),
      cand("M2", Gender::Male, &["code", "design", "test"]),
      cand("M3", Gender::Male, &["code", "design"]),
      cand("F1", Gender::Female, &["code", "test"]),
    ];
    (candidates, roles)
  }

  #[test]
  fn unassigned_female_replaces_weakest_male() {
    let (candidates, roles) = build_team();
    let alloc = allocate_roles(&candidates, &roles, 0.2).unwrap();

    assert_eq!(member_ids(&alloc, "Build"), ["M1", "M2", "F1"]);
    assert_eq!(alloc.assignment.role("Build").unwrap().gender_counts(), (2, 1));
    assert_eq!(alloc.assignment.unassigned[0].id, "M3");
    assert!(alloc.audit.iter().any(|e| matches!(
      e,
      AuditEntry::SwappedUnassigned { outgoing, incoming, .. }
        if outgoing == "M3" && incoming == "F1"
    )));
    assert_well_formed(&alloc, &roles);
  }

  #[test]
  fn threshold_caps_score_loss() {
    let (candidates, roles) = build_team();
    let alloc = allocate_roles(&candidates, &roles, 0.05).unwrap();
    assert_eq!(member_ids(&alloc, "Build"), ["M1", "M2", "M3"]);
    assert_eq!(alloc.audit, vec![AuditEntry::BalanceStarted { threshold: 0.05 }]);
    assert_eq!(alloc.passes, 1);
  }

  #[test]
  fn zero_threshold_skips_balancing() {
    let (candidates, roles) = build_team();
    let alloc = allocate_roles(&candidates, &roles, 0.0).unwrap();
    assert_eq!(member_ids(&alloc, "Build"), ["M1", "M2", "M3"]);
    assert!(alloc.audit.is_empty());
  }

  #[test]
  fn swaps_across_roles_when_pool_is_empty() {
    let roles = vec![
      Role::new("A", 2).require("a", 1.0),
      Role::new("B", 2).require("b", 1.0),
    ];
    let candidates = vec![
      cand("M1", Gender::Male, &["a", "b"]),
      cand("M2", Gender::Male, &["a", "b"]),
      cand("F1", Gender::Female, &["a", "b"]),
      cand("F2", Gender::Female, &["b"]),
    ];
    let alloc = allocate_roles(&candidates, &roles, 0.2).unwrap();

    assert_eq!(member_ids(&alloc, "A"), ["M2", "F1"]);
    assert_eq!(member_ids(&alloc, "B"), ["F2", "M1"]);
    assert_eq!(alloc.assignment.role("A").unwrap().gender_counts(), (1, 1));
    assert_eq!(alloc.assignment.role("B").unwrap().gender_counts(), (1, 1));
    assert!(alloc.audit.iter().any(|e| matches!(
      e,
      AuditEntry::SwappedAcrossRoles { role, other_role, outgoing, incoming }
        if role == "A" && other_role == "B" && outgoing == "M1" && incoming == "F1"
    )));
    assert_well_formed(&alloc, &roles);
  }

  #[test]
  fn cross_role_swap_refuses_to_unbalance_other_role() {
    let roles = vec![
      Role::new("A", 2).require("a", 1.0),
      Role::new("B", 2).require("b", 1.0),
    ];
    // B ends up 1M/1F; taking its woman would leave it 2M/0F.
    let candidates = vec![
      cand("M1", Gender::Male, &["a", "b"]),
      cand("M2", Gender::Male, &["a", "b"]),
      cand("F1", Gender::Female, &["a", "b"]),
      cand("M3", Gender::Male, &["b"]),
    ];
    let alloc = allocate_roles(&candidates, &roles, 0.5).unwrap();
    assert_eq!(member_ids(&alloc, "A"), ["M1", "M2"]);
    assert_eq!(member_ids(&alloc, "B"), ["F1", "M3"]);
    assert_eq!(alloc.audit.len(), 1);
  }

  #[test]
  fn cross_role_swap_allowed_when_other_role_improves() {
    let roles = vec![
      Role::new("A", 2).require("a", 1.0),
      Role::new("B", 4).require("b", 1.0),
    ];
    // Greedy leaves A at 2M/0F and B at 0M/4F. Trading M1 for F1 moves B to
    // 1M/3F: still skewed, but less than before.
    let candidates = vec![
      cand("M1", Gender::Male, &["a", "b"]),
      cand("M2", Gender::Male, &["a", "b"]),
      cand("F1", Gender::Female, &["a", "b"]),
      cand("F2", Gender::Female, &["a", "b"]),
      cand("F3", Gender::Female, &["a", "b"]),
      cand("F4", Gender::Female, &["a", "b"]),
    ];
    let alloc = allocate_roles(&candidates, &roles, 0.2).unwrap();

    assert_eq!(member_ids(&alloc, "A"), ["M2", "F1"]);
    assert_eq!(member_ids(&alloc, "B"), ["F2", "F3", "F4", "M1"]);
    assert_eq!(alloc.assignment.role("A").unwrap().gender_counts(), (1, 1));
    assert_eq!(alloc.assignment.role("B").unwrap().gender_counts(), (1, 3));
    assert_eq!(alloc.audit.len(), 3);
    assert!(matches!(
      &alloc.audit[2],
      AuditEntry::SwappedAcrossRoles { role, other_role, outgoing, incoming }
        if role == "A" && other_role == "B" && outgoing == "M1" && incoming == "F1"
    ));
    assert_well_formed(&alloc, &roles);
  }

  #[test]
  fn non_binary_members_do_not_count() {
    let roles = vec![Role::new("Crew", 3).require("x", 1.0)];
    let candidates = vec![
      cand("M1", Gender::Male, &["x"]),
      cand("N1", Gender::NonBinary, &["x"]),
      cand("N2", Gender::NonBinary, &["x"]),
      cand("F1", Gender::Female, &["x"]),
    ];
    let alloc = allocate_roles(&candidates, &roles, 0.3).unwrap();
    assert_eq!(member_ids(&alloc, "Crew"), ["M1", "N1", "N2"]);
    assert_eq!(alloc.assignment.role("Crew").unwrap().gender_counts(), (1, 0));
    assert_eq!(alloc.audit.len(), 1);
  }

  #[test]
  fn female_dominance_is_corrected_too() {
    let roles = vec![Role::new("Crew", 2).require("x", 1.0)];
    let candidates = vec![
      cand("F1", Gender::Female, &["x"]),
      cand("F2", Gender::Female, &["x"]),
      cand("M1", Gender::Male, &["x"]),
    ];
    let alloc = allocate_roles(&candidates, &roles, 0.2).unwrap();
    assert_eq!(member_ids(&alloc, "Crew"), ["F2", "M1"]);
  }

  #[test]
  fn hopeless_imbalance_terminates_within_budget() {
    let roles: Vec<Role> = (0..4)
      .map(|i| Role::new(format!("R{i}"), 3).require("x", 1.0))
      .collect();
    let candidates: Vec<TeamCandidate> = (0..12)
      .map(|i| cand(&format!("M{i}"), Gender::Male, &["x"]))
      .collect();
    let alloc = allocate_roles(&candidates, &roles, 1.0).unwrap();
    assert!(alloc.assignment.roles.iter().all(|r| r.gender_counts() == (3, 0)));
    assert_eq!(alloc.passes, 1);
    assert_well_formed(&alloc, &roles);
  }

  #[test]
  fn balancing_is_bounded_on_a_mixed_roster() {
    let roles: Vec<Role> = ["stage", "tech", "ops"]
      .iter()
      .map(|n| Role::new(*n, 4).require(*n, 3.0).require("general", 1.0))
      .collect();
    let skills = [
      &["stage", "general"][..],
      &["tech"][..],
      &["ops", "general"][..],
      &["stage", "tech"][..],
      &["general"][..],
    ];
    let candidates: Vec<TeamCandidate> = (0..15)
      .map(|i| {
        let gender = if i % 3 == 0 { Gender::Female } else { Gender::Male };
        cand(&format!("c{i}"), gender, skills[i % skills.len()])
      })
      .collect();

    let alloc = allocate_roles(&candidates, &roles, 0.3).unwrap();
    assert_well_formed(&alloc, &roles);

    // Every recorded move stayed within the threshold.
    for entry in &alloc.audit {
      if let AuditEntry::SwappedUnassigned { loss, .. } = entry {
        assert!(*loss <= 0.3);
      }
    }

    // Deterministic and free of side effects.
    let again = allocate_roles(&candidates, &roles, 0.3).unwrap();
    assert_eq!(alloc, again);
  }

  #[test]
  fn degenerate_inputs_allocate_nothing() {
    let alloc = allocate_roles(&[], &[Role::new("x", 2)], 0.2).unwrap();
    assert!(alloc.assignment.roles[0].members.is_empty());

    let candidates = [cand("a", Gender::Male, &[])];
    let alloc = allocate_roles(&candidates, &[], 0.2).unwrap();
    assert!(alloc.assignment.roles.is_empty());
    assert_eq!(alloc.assignment.unassigned.len(), 1);
    assert_eq!(alloc.passes, 0);
  }

  #[test]
  fn zero_weight_role_still_fills_with_zero_scores() {
    let roles = [Role::new("helpers", 2)];
    let candidates = [cand("a", Gender::Male, &["x"]), cand("b", Gender::Female, &[])];
    let alloc = allocate_roles(&candidates, &roles, 0.0).unwrap();
    let helpers = alloc.assignment.role("helpers").unwrap();
    assert_eq!(helpers.members.len(), 2);
    assert!(helpers.members.iter().all(|p| p.score == 0.0));
  }

  #[test]
  fn contract_violations_are_rejected() {
    assert!(matches!(
      allocate_roles(&[], &[Role::new("x", 0)], 0.2),
      Err(Error::ZeroCapacity(_))
    ));
    let dup = [cand("a", Gender::Male, &[]), cand("a", Gender::Female, &[])];
    assert!(matches!(
      allocate_roles(&dup, &[Role::new("x", 1)], 0.2),
      Err(Error::DuplicateCandidate(_))
    ));
  }

  #[test]
  fn audit_lines_read_naturally() {
    let (candidates, roles) = build_team();
    let alloc = allocate_roles(&candidates, &roles, 0.2).unwrap();
    assert_eq!(alloc.audit_lines(), [
      "Starting balance check (threshold: 0.20)",
      "Fixing imbalance in 'Build' (Male dominant). Target: Female",
      "-> Swapped unassigned: M3 (out) <-> F1 (in). Loss: 0.10",
    ]);
  }

  #[test]
  fn balance_modes_map_to_thresholds() {
    assert_eq!(BalanceMode::Off.threshold(), 0.0);
    assert_eq!("balance".parse::<BalanceMode>().unwrap().threshold(), 0.20);
    assert_eq!("Equality".parse::<BalanceMode>().unwrap().threshold(), 0.30);
    assert!("fair".parse::<BalanceMode>().is_err());
  }
}
