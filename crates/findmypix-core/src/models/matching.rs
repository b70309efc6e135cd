use serde::{Deserialize, Serialize};

use super::Embedding;

/// Pixel box of a matched face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

/// A face in an event image that matched the query face.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub embedding_id: i64,
    pub image_id: i64,
    pub image_path: String,
    pub distance: f64,
    pub threshold: f64,
    pub bbox: BoundingBox,
    /// The other faces found in the same image.
    #[serde(default)]
    pub other_embeddings: Option<Vec<Embedding>>,
}

impl MatchResult {
    /// Returns true if the match falls within the backend's threshold.
    pub fn is_within_threshold(&self) -> bool {
        self.distance <= self.threshold
    }
}
