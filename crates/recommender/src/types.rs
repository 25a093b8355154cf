//! Result types returned by the engine.

use serde::{Deserialize, Serialize};

/// One ranked recommendation for a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item_id: String,
    /// Predicted affinity; the cold-start placeholder score is 1.0
    pub score: f32,
}

impl Recommendation {
    pub fn new(item_id: impl Into<String>, score: f32) -> Self {
        Self {
            item_id: item_id.into(),
            score,
        }
    }
}

/// An item close to a query item in latent space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarItem {
    pub item_id: String,
    /// Cosine similarity of the two item factor vectors
    pub similarity: f32,
}
