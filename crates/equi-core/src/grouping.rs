//! Random, gender-spread team generation.
//!
//! Unlike the role balancer this ignores skills entirely: people are split by
//! gender, each group is shuffled, and the groups are dealt round-robin into
//! `ceil(n / team_size)` teams so every team gets as even a share of each
//! gender as the numbers allow.

use rand::{Rng, seq::SliceRandom};

use crate::{
  Error, Result,
  participant::{Gender, Participant},
  team::TeamCandidate,
};

/// Anything that carries a gender and can be dealt into teams.
pub trait Gendered {
  fn gender(&self) -> Gender;
}

impl Gendered for Participant {
  fn gender(&self) -> Gender { self.gender }
}

impl Gendered for TeamCandidate {
  fn gender(&self) -> Gender { self.gender }
}

/// Deal `people` into teams of roughly `team_size`.
///
/// Dealing restarts at the first team for each gender group, so team sizes
/// can differ by more than one when the groups are uneven. An empty roster
/// yields no teams.
pub fn generate_teams<T, R>(
  people: &[T],
  team_size: usize,
  rng: &mut R,
) -> Result<Vec<Vec<T>>>
where
  T: Gendered + Clone,
  R: Rng + ?Sized,
{
  if team_size == 0 {
    return Err(Error::ZeroTeamSize);
  }
  if people.is_empty() {
    return Ok(Vec::new());
  }

  let mut groups: [Vec<T>; 3] = Default::default();
  for person in people {
    let slot = match person.gender() {
      Gender::Male => 0,
      Gender::Female => 1,
      Gender::NonBinary => 2,
    };
    groups[slot].push(person.clone());
  }

  let team_count = people.len().div_ceil(team_size);
  let mut teams: Vec<Vec<T>> = (0..team_count).map(|_| Vec::new()).collect();
  for mut group in groups {
    group.shuffle(rng);
    for (i, person) in group.into_iter().enumerate() {
      teams[i % team_count].push(person);
    }
  }

  tracing::debug!(people = people.len(), team_count, "generated teams");
  Ok(teams)
}
