//! The contract with the external face detection provider.
//!
//! The model itself lives outside this workspace; only its output shape is
//! described here.

use serde::{Deserialize, Serialize};

use crate::participant::DetectedGender;

/// Pixel coordinates of a detected face, in `(top, right, bottom, left)`
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
  pub top:    u32,
  pub right:  u32,
  pub bottom: u32,
  pub left:   u32,
}

impl BoundingBox {
  pub fn width(&self) -> u32 { self.right.saturating_sub(self.left) }

  pub fn height(&self) -> u32 { self.bottom.saturating_sub(self.top) }
}

/// One face as reported by the detection provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedFace {
  pub bbox:       BoundingBox,
  /// Fixed-length descriptor; the length depends on the model (128, 512, ...).
  pub embedding:  Vec<f32>,
  pub gender:     DetectedGender,
  /// Confidence of the gender label, as reported by the provider.
  #[serde(default)]
  pub confidence: f32,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn unknown_gender_deserialises() {
    let face: DetectedFace = serde_json::from_str(
      r#"{"bbox":{"top":10,"right":60,"bottom":70,"left":20},
          "embedding":[0.1,0.2],"gender":"Unknown"}"#,
    )
    .unwrap();
    assert_eq!(face.gender, DetectedGender::Unknown);
    assert_eq!(face.confidence, 0.0);
    assert_eq!(face.bbox.width(), 40);
    assert_eq!(face.bbox.height(), 60);
  }
}
