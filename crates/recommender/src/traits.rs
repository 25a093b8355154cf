//! Core trait for anything that produces ranked recommendations.
//!
//! The evaluator is written against this trait rather than the concrete
//! engine, so any model sharing a [`Catalog`] can be scored the same way.

use crate::error::Result;
use crate::preprocess::Catalog;
use crate::types::Recommendation;

/// A trained recommender
///
/// `Send + Sync` allows read-only queries from several threads at once.
pub trait Recommend: Send + Sync {
    /// Up to `n` recommendations for `user_id`, best first
    fn recommend(&self, user_id: &str, n: usize) -> Result<Vec<Recommendation>>;

    /// The identity maps and popular items the model was trained against
    fn catalog(&self) -> &Catalog;
}
