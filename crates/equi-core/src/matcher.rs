//! Duplicate detection by face embedding similarity.
//!
//! A pure query: given a new embedding and the embeddings already registered
//! for the same event, decide whether the new face belongs to someone who is
//! already on the roster. Callers are responsible for scoping `known` to a
//! single event.

use serde::{Deserialize, Serialize};

use crate::participant::Participant;

/// Default cosine similarity threshold (match when strictly above).
pub const DEFAULT_COSINE_THRESHOLD: f32 = 0.65;

/// Default Euclidean distance threshold (match when strictly below).
pub const DEFAULT_EUCLIDEAN_THRESHOLD: f32 = 0.5;

// ─── Metric ──────────────────────────────────────────────────────────────────

/// How two embeddings are compared, together with the match threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", content = "threshold", rename_all = "snake_case")]
pub enum SimilarityMetric {
  /// `dot(a, b) / (|a| |b|)`; higher is closer. Stable across embedding
  /// magnitudes.
  Cosine(f32),
  /// `|a - b|`; lower is closer. Used with the older, simpler models.
  Euclidean(f32),
}

impl Default for SimilarityMetric {
  fn default() -> Self { Self::Cosine(DEFAULT_COSINE_THRESHOLD) }
}

impl SimilarityMetric {
  pub fn cosine() -> Self { Self::Cosine(DEFAULT_COSINE_THRESHOLD) }

  pub fn euclidean() -> Self { Self::Euclidean(DEFAULT_EUCLIDEAN_THRESHOLD) }

  /// Compare two embeddings. `None` when they cannot be compared: differing
  /// lengths, an empty vector, a zero or non-finite norm on either side, or
  /// a non-finite result.
  pub fn measure(&self, a: &[f32], b: &[f32]) -> Option<f32> {
    if a.is_empty() || a.len() != b.len() {
      return None;
    }
    let norm_a = norm(a);
    let norm_b = norm(b);
    if !is_usable_norm(norm_a) || !is_usable_norm(norm_b) {
      return None;
    }
    let value = match self {
      Self::Cosine(_) => {
        let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        Some(dot / (norm_a * norm_b))
      }
      Self::Euclidean(_) => Some(
        a.iter()
          .zip(b)
          .map(|(x, y)| (x - y) * (x - y))
          .sum::<f32>()
          .sqrt(),
      ),
    };
    value.filter(|v| v.is_finite())
  }

  /// Whether a measured value counts as the same person.
  pub fn is_match(&self, value: f32) -> bool {
    match *self {
      Self::Cosine(threshold) => value > threshold,
      Self::Euclidean(threshold) => value < threshold,
    }
  }

  /// Whether `candidate` is a strictly better measurement than `current`.
  fn is_better(&self, candidate: f32, current: f32) -> bool {
    match self {
      Self::Cosine(_) => candidate > current,
      Self::Euclidean(_) => candidate < current,
    }
  }
}

fn norm(v: &[f32]) -> f32 { v.iter().map(|x| x * x).sum::<f32>().sqrt() }

fn is_usable_norm(n: f32) -> bool { n.is_finite() && n > 0.0 }

/// Whether every component of an embedding is a finite number.
pub fn is_finite_embedding(v: &[f32]) -> bool { v.iter().all(|x| x.is_finite()) }

// ─── Query ───────────────────────────────────────────────────────────────────

/// A stored embedding together with the label reported on a match.
#[derive(Debug, Clone, Copy)]
pub struct KnownFace<'a> {
  pub embedding: &'a [f32],
  pub label:     &'a str,
}

/// The answer to a duplicate query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcome {
  pub is_duplicate:  bool,
  /// Label of the best matching registrant; only set on a match.
  pub matched_label: Option<String>,
  /// Best similarity (cosine) or distance (Euclidean) seen across all
  /// comparable known faces; `None` when nothing was comparable.
  pub similarity:    Option<f32>,
}

impl MatchOutcome {
  fn no_match(similarity: Option<f32>) -> Self {
    Self { is_duplicate: false, matched_label: None, similarity }
  }
}

/// Decide whether `embedding` matches any of the `known` faces.
///
/// When several known faces pass the threshold the single closest one is
/// reported; on exact ties the earliest wins. An empty `known` list, an
/// empty or zero-norm query never match.
pub fn is_duplicate(
  embedding: &[f32],
  known: &[KnownFace<'_>],
  metric: SimilarityMetric,
) -> MatchOutcome {
  let mut best: Option<(f32, &str)> = None;
  for face in known {
    let Some(value) = metric.measure(embedding, face.embedding) else {
      continue;
    };
    if best.is_none_or(|(current, _)| metric.is_better(value, current)) {
      best = Some((value, face.label));
    }
  }

  match best {
    Some((value, label)) if metric.is_match(value) => {
      tracing::debug!(label, value, "embedding matches a registered face");
      MatchOutcome {
        is_duplicate:  true,
        matched_label: Some(label.to_owned()),
        similarity:    Some(value),
      }
    }
    Some((value, _)) => MatchOutcome::no_match(Some(value)),
    None => MatchOutcome::no_match(None),
  }
}

/// Run [`is_duplicate`] against a roster, labelling each registrant by
/// [`Participant::display_label`]. Registrants without an embedding are
/// skipped.
pub fn check_roster(
  embedding: &[f32],
  roster: &[Participant],
  metric: SimilarityMetric,
) -> MatchOutcome {
  let labels: Vec<String> =
    roster.iter().map(Participant::display_label).collect();
  let known: Vec<KnownFace<'_>> = roster
    .iter()
    .zip(&labels)
    .filter(|(p, _)| !p.embedding.is_empty())
    .map(|(p, label)| KnownFace { embedding: &p.embedding, label })
    .collect();
  is_duplicate(embedding, &known, metric)
}

#[cfg(test)]
mod tests {
  use super::*;

  /// A unit vector at `angle` radians in the xy-plane.
  fn at_angle(angle: f32) -> Vec<f32> { vec![angle.cos(), angle.sin(), 0.0] }

  #[test]
  fn empty_known_list_is_never_a_duplicate() {
    let out = is_duplicate(&[1.0, 0.0], &[], SimilarityMetric::cosine());
    assert!(!out.is_duplicate);
    assert_eq!(out.matched_label, None);
    assert_eq!(out.similarity, None);
  }

  #[test]
  fn self_match_has_unit_similarity() {
    let v = vec![0.3, -1.2, 4.5, 0.01];
    let known = [KnownFace { embedding: &v, label: "Ada" }];
    let out = is_duplicate(&v, &known, SimilarityMetric::cosine());
    assert!(out.is_duplicate);
    assert_eq!(out.matched_label.as_deref(), Some("Ada"));
    assert!((out.similarity.unwrap() - 1.0).abs() < 1e-6);
  }

  #[test]
  fn cosine_threshold_separates_near_and_far() {
    let stored = at_angle(0.0);
    let known = [KnownFace { embedding: &stored, label: "stored" }];

    // cos(θ) = 0.9 → duplicate
    let near = at_angle(0.9_f32.acos());
    let out = is_duplicate(&near, &known, SimilarityMetric::cosine());
    assert!(out.is_duplicate);
    assert!((out.similarity.unwrap() - 0.9).abs() < 1e-5);

    // cos(θ) = 0.4 → not a duplicate
    let far = at_angle(0.4_f32.acos());
    let out = is_duplicate(&far, &known, SimilarityMetric::cosine());
    assert!(!out.is_duplicate);
    assert_eq!(out.matched_label, None);
    assert!((out.similarity.unwrap() - 0.4).abs() < 1e-5);
  }

  #[test]
  fn cosine_ignores_magnitude() {
    let stored = vec![1.0, 2.0, 3.0];
    let scaled = vec![10.0, 20.0, 30.0];
    let known = [KnownFace { embedding: &stored, label: "x" }];
    assert!(is_duplicate(&scaled, &known, SimilarityMetric::cosine()).is_duplicate);
    assert!(!is_duplicate(&scaled, &known, SimilarityMetric::euclidean()).is_duplicate);
  }

  #[test]
  fn best_of_several_matches_wins() {
    let a = at_angle(0.5);
    let b = at_angle(0.1);
    let c = at_angle(0.3);
    let known = [
      KnownFace { embedding: &a, label: "a" },
      KnownFace { embedding: &b, label: "b" },
      KnownFace { embedding: &c, label: "c" },
    ];
    let out = is_duplicate(&at_angle(0.0), &known, SimilarityMetric::cosine());
    assert_eq!(out.matched_label.as_deref(), Some("b"));
  }

  #[test]
  fn euclidean_picks_the_closest() {
    let a = vec![0.0, 0.0, 1.0];
    let b = vec![0.0, 0.1, 1.0];
    let known = [
      KnownFace { embedding: &a, label: "a" },
      KnownFace { embedding: &b, label: "b" },
    ];
    let out = is_duplicate(&[0.0, 0.09, 1.0], &known, SimilarityMetric::euclidean());
    assert!(out.is_duplicate);
    assert_eq!(out.matched_label.as_deref(), Some("b"));

    let out = is_duplicate(&[0.0, 3.0, 1.0], &known, SimilarityMetric::euclidean());
    assert!(!out.is_duplicate);
  }

  #[test]
  fn zero_norm_vectors_never_match() {
    let zero = vec![0.0; 4];
    let v = vec![1.0, 0.0, 0.0, 0.0];
    let known = [KnownFace { embedding: &zero, label: "zero" }];
    assert!(!is_duplicate(&v, &known, SimilarityMetric::cosine()).is_duplicate);

    let known = [KnownFace { embedding: &v, label: "v" }];
    assert!(!is_duplicate(&zero, &known, SimilarityMetric::cosine()).is_duplicate);
    assert!(!is_duplicate(&zero, &known, SimilarityMetric::euclidean()).is_duplicate);
  }

  #[test]
  fn mismatched_lengths_are_skipped() {
    let short = vec![1.0, 0.0];
    let long = vec![1.0, 0.0, 0.0];
    let known = [KnownFace { embedding: &short, label: "short" }];
    let out = is_duplicate(&long, &known, SimilarityMetric::cosine());
    assert!(!out.is_duplicate);
    assert_eq!(out.similarity, None);
  }

  #[test]
  fn non_finite_known_face_does_not_hide_a_later_match() {
    let bad = vec![f32::NAN, 1.0];
    let huge = vec![f32::INFINITY, 1.0];
    let twin = vec![1.0, 0.0];
    let known = [
      KnownFace { embedding: &bad, label: "bad" },
      KnownFace { embedding: &huge, label: "huge" },
      KnownFace { embedding: &twin, label: "twin" },
    ];
    for metric in [SimilarityMetric::cosine(), SimilarityMetric::euclidean()] {
      let out = is_duplicate(&[1.0, 0.0], &known, metric);
      assert!(out.is_duplicate, "{metric:?}");
      assert_eq!(out.matched_label.as_deref(), Some("twin"));
    }
    assert_eq!(SimilarityMetric::cosine().measure(&[1.0, 0.0], &bad), None);
    assert_eq!(SimilarityMetric::euclidean().measure(&huge, &[1.0, 0.0]), None);
  }

  #[test]
  fn finite_embedding_check() {
    assert!(is_finite_embedding(&[]));
    assert!(is_finite_embedding(&[0.5, -1.0]));
    assert!(!is_finite_embedding(&[0.5, f32::NAN]));
    assert!(!is_finite_embedding(&[f32::NEG_INFINITY]));
  }

  #[test]
  fn metric_serialises_with_threshold() {
    let json = serde_json::to_string(&SimilarityMetric::euclidean()).unwrap();
    assert_eq!(json, r#"{"metric":"euclidean","threshold":0.5}"#);
  }
}
