//! Explanations for individual recommendations.
//!
//! An explanation is a read-only derivation from item-item similarity: it
//! never re-ranks or alters the recommendation it describes.

use crate::engine::FactorizationEngine;
use crate::error::{EngineError, Result};
use crate::factorizer::Factorizer;
use crate::types::SimilarItem;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of neighbours listed in a similarity-based explanation
pub const EXPLANATION_NEIGHBORS: usize = 5;

/// Why an item was recommended
///
/// Serialized with a `kind` tag:
/// `{"kind":"cold_start"}` or
/// `{"kind":"similarity_based","similar_items":[...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Explanation {
    /// User or item unknown to the model; the item came from the popular list
    ColdStart,
    /// Items near the recommended one in latent space, most similar first
    SimilarityBased { similar_items: Vec<SimilarItem> },
}

impl Explanation {
    /// Human-readable rationale
    pub fn message(&self) -> &'static str {
        match self {
            Explanation::ColdStart => "Cold start: popular item recommendation",
            Explanation::SimilarityBased { .. } => {
                "Recommended because user interacted with similar items"
            }
        }
    }

    pub fn is_cold_start(&self) -> bool {
        matches!(self, Explanation::ColdStart)
    }
}

impl<F: Factorizer> FactorizationEngine<F> {
    /// Explain recommending `item_id` to `user_id`
    ///
    /// Unknown users or items yield [`Explanation::ColdStart`], never an
    /// error; only querying an untrained engine fails.
    pub fn explain(&self, user_id: &str, item_id: &str) -> Result<Explanation> {
        if !self.catalog().users.contains(user_id) {
            // still surfaces NotTrained before answering
            self.factors()?;
            return Ok(Explanation::ColdStart);
        }

        match self.similar_items(item_id, EXPLANATION_NEIGHBORS) {
            Ok(similar_items) => {
                debug!(
                    "Explaining {} for {} with {} similar items",
                    item_id,
                    user_id,
                    similar_items.len()
                );
                Ok(Explanation::SimilarityBased { similar_items })
            }
            Err(EngineError::UnknownIdentity { .. }) => Ok(Explanation::ColdStart),
            Err(e) => Err(e),
        }
    }
}
