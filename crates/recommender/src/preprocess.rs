//! Turning a raw interaction log into model inputs.
//!
//! ## Algorithm
//! 1. Build the user and item identity maps (first-seen order)
//! 2. Fit the min-max scaler on the weight column
//! 3. Build the sparse matrix of normalized weights
//! 4. Rank items by total raw weight for the cold-start list
//!
//! The maps, scaler and popular list are bundled into an immutable
//! [`Catalog`] that the engine and the evaluator share.

use crate::error::{EngineError, IdentityKind, Result};
use crate::identity::IdentityMap;
use crate::matrix::{InteractionMatrix, InteractionMatrixBuilder};
use crate::scaler::MinMaxScaler;
use data_loader::Interaction;
use std::collections::HashMap;
use tracing::{info, instrument};

/// Default length of the popular items list
pub const DEFAULT_POPULAR_ITEMS: usize = 100;

/// Everything fixed at preprocessing time that a trained model depends on
#[derive(Debug, Clone)]
pub struct Catalog {
    pub users: IdentityMap,
    pub items: IdentityMap,
    /// Item IDs by total raw weight, descending
    pub popular_items: Vec<String>,
    pub scaler: MinMaxScaler,
}

impl Catalog {
    /// Shape every matrix trained against this catalog must have
    pub fn shape(&self) -> (usize, usize) {
        (self.users.len(), self.items.len())
    }
}

/// Output of [`Preprocessor::preprocess`]
#[derive(Debug, Clone)]
pub struct Preprocessed {
    pub matrix: InteractionMatrix,
    pub catalog: Catalog,
}

/// Builds the catalog and interaction matrix from a training log
#[derive(Debug, Clone)]
pub struct Preprocessor {
    popular_limit: usize,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self {
            popular_limit: DEFAULT_POPULAR_ITEMS,
        }
    }

    /// Configure the popular items list length (default: 100)
    pub fn with_popular_limit(mut self, limit: usize) -> Self {
        self.popular_limit = limit;
        self
    }

    /// Preprocess a training log
    ///
    /// The log is expected to hold one record per (user, item) pair; any
    /// repeats are summed in the matrix.
    #[instrument(skip_all, fields(interactions = interactions.len()))]
    pub fn preprocess(&self, interactions: &[Interaction]) -> Result<Preprocessed> {
        if interactions.is_empty() {
            return Err(EngineError::EmptyInput);
        }

        let users = IdentityMap::build(
            IdentityKind::User,
            interactions.iter().map(|i| i.user_id.as_str()),
        );
        let items = IdentityMap::build(
            IdentityKind::Item,
            interactions.iter().map(|i| i.item_id.as_str()),
        );

        let scaler = MinMaxScaler::fit(interactions.iter().map(|i| i.weight))?;

        let mut builder = InteractionMatrixBuilder::new(&users, &items);
        for interaction in interactions {
            builder.push(
                &interaction.user_id,
                &interaction.item_id,
                scaler.transform(interaction.weight) as f32,
            )?;
        }
        let matrix = builder.build()?;

        let popular_items = self.rank_popular(interactions, &items)?;

        info!(
            "Preprocessed {} interactions into a {}x{} matrix ({} stored entries)",
            interactions.len(),
            users.len(),
            items.len(),
            matrix.nnz()
        );

        Ok(Preprocessed {
            matrix,
            catalog: Catalog {
                users,
                items,
                popular_items,
                scaler,
            },
        })
    }

    /// Items by summed raw weight, descending; ties keep first-seen order
    fn rank_popular(&self, interactions: &[Interaction], items: &IdentityMap) -> Result<Vec<String>> {
        let mut totals: HashMap<usize, f64> = HashMap::new();
        for interaction in interactions {
            let index = items.to_index(&interaction.item_id)?;
            *totals.entry(index).or_insert(0.0) += interaction.weight;
        }

        let mut ranked: Vec<(usize, f64)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(self.popular_limit);

        ranked
            .into_iter()
            .map(|(index, _)| items.to_external(index).map(str::to_string))
            .collect()
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}
