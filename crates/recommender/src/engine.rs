//! # Factorization Engine
//!
//! Owns a trained latent factor model and answers queries against it:
//! per-user top-N recommendations, item-to-item similarity and the
//! popularity fallback for users the model has never seen.
//!
//! ## State machine
//! `Untrained -> Trained`. The trained state owns both the latent factors
//! and the interaction matrix they were fitted on; the matrix rows are the
//! per-user histories excluded at recommend time. Retraining requires
//! [`FactorizationEngine::reset`] and a freshly built matrix.

use crate::als::AlsFactorizer;
use crate::config::Hyperparameters;
use crate::error::{EngineError, Result};
use crate::factorizer::{Factorizer, LatentFactors};
use crate::matrix::InteractionMatrix;
use crate::preprocess::Catalog;
use crate::traits::Recommend;
use crate::types::{Recommendation, SimilarItem};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Score attached to every cold-start recommendation
pub const COLD_START_SCORE: f32 = 1.0;

/// A fitted model together with the matrix it was fitted on
#[derive(Debug)]
struct TrainedModel {
    factors: LatentFactors,
    interactions: InteractionMatrix,
}

#[derive(Debug)]
enum EngineState {
    Untrained,
    Trained(TrainedModel),
}

/// Latent factor recommender over a fixed [`Catalog`]
pub struct FactorizationEngine<F: Factorizer = AlsFactorizer> {
    /// Shared with the evaluator (read-only, so no Mutex needed)
    catalog: Arc<Catalog>,
    params: Hyperparameters,
    factorizer: F,
    state: EngineState,
}

impl FactorizationEngine<AlsFactorizer> {
    /// Create an untrained engine backed by the built-in ALS solver
    pub fn new(catalog: Arc<Catalog>, params: Hyperparameters) -> Self {
        Self::with_factorizer(catalog, params, AlsFactorizer)
    }
}

impl<F: Factorizer> FactorizationEngine<F> {
    /// Create an untrained engine backed by any solver
    pub fn with_factorizer(catalog: Arc<Catalog>, params: Hyperparameters, factorizer: F) -> Self {
        Self {
            catalog,
            params,
            factorizer,
            state: EngineState::Untrained,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn hyperparameters(&self) -> &Hyperparameters {
        &self.params
    }

    pub fn is_trained(&self) -> bool {
        matches!(self.state, EngineState::Trained(_))
    }

    /// Drop the model and return to `Untrained`
    pub fn reset(&mut self) {
        self.state = EngineState::Untrained;
    }

    /// Fit the model on `matrix` and keep the matrix for history exclusion
    ///
    /// Blocks until the solver finishes. Solver errors propagate unchanged.
    #[instrument(skip_all, fields(solver = self.factorizer.name()))]
    pub fn train(&mut self, matrix: InteractionMatrix) -> Result<()> {
        if self.is_trained() {
            return Err(EngineError::AlreadyTrained);
        }
        if matrix.shape() != self.catalog.shape() {
            return Err(EngineError::ShapeMismatch(format!(
                "matrix shape {:?} does not match catalog shape {:?}",
                matrix.shape(),
                self.catalog.shape()
            )));
        }
        self.params.validate()?;

        info!(
            "Training {} (factors: {}, regularization: {}, iterations: {})",
            self.factorizer.name(),
            self.params.factors,
            self.params.regularization,
            self.params.iterations
        );
        let factors = self.factorizer.fit(&matrix, &self.params)?;

        if factors.num_users() != matrix.num_rows() || factors.num_items() != matrix.num_cols() {
            return Err(EngineError::ShapeMismatch(format!(
                "solver returned {}x{} factors for a {:?} matrix",
                factors.num_users(),
                factors.num_items(),
                matrix.shape()
            )));
        }

        self.state = EngineState::Trained(TrainedModel {
            factors,
            interactions: matrix,
        });
        Ok(())
    }

    fn trained(&self) -> Result<&TrainedModel> {
        match &self.state {
            EngineState::Trained(model) => Ok(model),
            EngineState::Untrained => Err(EngineError::NotTrained),
        }
    }

    /// The fitted latent factors
    pub fn factors(&self) -> Result<&LatentFactors> {
        Ok(&self.trained()?.factors)
    }

    /// Up to `n` items for `user_id`, best first
    ///
    /// Items in the user's training history are never returned. Unknown
    /// users get the cold-start list instead of an error.
    #[instrument(skip(self))]
    pub fn recommend(&self, user_id: &str, n: usize) -> Result<Vec<Recommendation>> {
        let model = self.trained()?;

        let user = match self.catalog.users.to_index(user_id) {
            Ok(index) => index,
            Err(EngineError::UnknownIdentity { .. }) => {
                warn!("User {} not found, using cold start", user_id);
                return Ok(self.cold_start(n));
            }
            Err(e) => return Err(e),
        };

        let ranked = model
            .factors
            .recommend(user, model.interactions.row(user), n)?;

        let recommendations = ranked
            .into_iter()
            .map(|(item, score)| {
                let item_id = self.catalog.items.to_external(item)?;
                Ok(Recommendation::new(item_id, score))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Generated {} recommendations", recommendations.len());
        Ok(recommendations)
    }

    /// First `n` popular items, each with the placeholder score
    pub fn cold_start(&self, n: usize) -> Vec<Recommendation> {
        self.catalog
            .popular_items
            .iter()
            .take(n)
            .map(|item_id| Recommendation::new(item_id.as_str(), COLD_START_SCORE))
            .collect()
    }

    /// The `n` items most similar to `item_id`, excluding `item_id` itself
    ///
    /// Fails with `UnknownIdentity` for items outside the catalog.
    #[instrument(skip(self))]
    pub fn similar_items(&self, item_id: &str, n: usize) -> Result<Vec<SimilarItem>> {
        let model = self.trained()?;
        let item = self.catalog.items.to_index(item_id)?;

        model
            .factors
            .similar_items(item, n)?
            .into_iter()
            .map(|(other, similarity)| {
                Ok(SimilarItem {
                    item_id: self.catalog.items.to_external(other)?.to_string(),
                    similarity,
                })
            })
            .collect()
    }
}

impl<F: Factorizer> Recommend for FactorizationEngine<F> {
    fn recommend(&self, user_id: &str, n: usize) -> Result<Vec<Recommendation>> {
        FactorizationEngine::recommend(self, user_id, n)
    }

    fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocess::{Preprocessed, Preprocessor};
    use data_loader::Interaction;
    use ndarray::Array2;

    /// Solver that returns fixed factors, so rankings are known exactly
    struct FixedFactorizer {
        users: Array2<f32>,
        items: Array2<f32>,
    }

    impl Factorizer for FixedFactorizer {
        fn name(&self) -> &str {
            "Fixed"
        }

        fn fit(&self, _matrix: &InteractionMatrix, _params: &Hyperparameters) -> Result<LatentFactors> {
            LatentFactors::new(self.users.clone(), self.items.clone())
        }
    }

    struct FailingFactorizer;

    impl Factorizer for FailingFactorizer {
        fn name(&self) -> &str {
            "Failing"
        }

        fn fit(&self, _matrix: &InteractionMatrix, _params: &Hyperparameters) -> Result<LatentFactors> {
            Err(EngineError::Factorization("did not converge".to_string()))
        }
    }

    fn preprocessed() -> Preprocessed {
        let log = vec![
            Interaction::new("u1", "i1", 5.0),
            Interaction::new("u1", "i2", 1.0),
            Interaction::new("u2", "i2", 3.0),
            Interaction::new("u3", "i3", 2.0),
            Interaction::new("u3", "i4", 4.0),
        ];
        Preprocessor::new().preprocess(&log).unwrap()
    }

    /// Item scores for u1 (index 0): i1=4, i2=3, i3=2, i4=1
    fn fixed() -> FixedFactorizer {
        FixedFactorizer {
            users: ndarray::array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
            items: ndarray::array![[4.0, 0.0], [3.0, 1.0], [2.0, 2.0], [1.0, 3.0]],
        }
    }

    fn trained() -> FactorizationEngine<FixedFactorizer> {
        let Preprocessed { matrix, catalog } = preprocessed();
        let mut engine =
            FactorizationEngine::with_factorizer(Arc::new(catalog), Hyperparameters::default(), fixed());
        engine.train(matrix).unwrap();
        engine
    }

    #[test]
    fn test_queries_require_training() {
        let Preprocessed { catalog, .. } = preprocessed();
        let engine = FactorizationEngine::new(Arc::new(catalog), Hyperparameters::default());

        assert!(!engine.is_trained());
        assert!(matches!(engine.recommend("u1", 3), Err(EngineError::NotTrained)));
        assert!(matches!(engine.recommend("ghost", 3), Err(EngineError::NotTrained)));
        assert!(matches!(engine.similar_items("i1", 3), Err(EngineError::NotTrained)));
    }

    #[test]
    fn test_recommend_excludes_history() {
        let engine = trained();
        let recs = engine.recommend("u1", 10).unwrap();

        assert_eq!(recs, vec![Recommendation::new("i3", 2.0), Recommendation::new("i4", 1.0)]);
    }

    #[test]
    fn test_recommend_truncates_and_handles_zero() {
        let engine = trained();
        assert_eq!(engine.recommend("u2", 2).unwrap().len(), 2);
        assert!(engine.recommend("u2", 0).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_user_gets_popular_items() {
        let engine = trained();
        let recs = engine.recommend("ghost", 3).unwrap();

        // totals: i1 = 5, i2 = 4, i4 = 4, i3 = 2
        assert_eq!(
            recs,
            vec![
                Recommendation::new("i1", 1.0),
                Recommendation::new("i2", 1.0),
                Recommendation::new("i4", 1.0),
            ]
        );
        assert_eq!(engine.recommend("ghost", 50).unwrap().len(), 4);
    }

    #[test]
    fn test_similar_items() {
        let engine = trained();
        let similar = engine.similar_items("i1", 10).unwrap();

        let ids: Vec<&str> = similar.iter().map(|s| s.item_id.as_str()).collect();
        assert_eq!(ids, vec!["i2", "i3", "i4"]);
        assert!(similar.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }

    #[test]
    fn test_similar_items_unknown_item() {
        let engine = trained();
        assert!(matches!(
            engine.similar_items("ghost", 3),
            Err(EngineError::UnknownIdentity { .. })
        ));
    }

    #[test]
    fn test_train_is_one_way() {
        let Preprocessed { matrix, catalog } = preprocessed();
        let mut engine =
            FactorizationEngine::with_factorizer(Arc::new(catalog), Hyperparameters::default(), fixed());

        engine.train(matrix.clone()).unwrap();
        assert!(matches!(engine.train(matrix.clone()), Err(EngineError::AlreadyTrained)));

        engine.reset();
        assert!(!engine.is_trained());
        engine.train(matrix).unwrap();
        assert!(engine.is_trained());
    }

    #[test]
    fn test_train_rejects_wrong_shape() {
        let Preprocessed { catalog, .. } = preprocessed();
        let mut engine = FactorizationEngine::new(Arc::new(catalog), Hyperparameters::default());

        let matrix = InteractionMatrix::from_triplets(2, 2, vec![]).unwrap();
        assert!(matches!(engine.train(matrix), Err(EngineError::ShapeMismatch(_))));
    }

    #[test]
    fn test_solver_errors_propagate() {
        let Preprocessed { matrix, catalog } = preprocessed();
        let mut engine = FactorizationEngine::with_factorizer(
            Arc::new(catalog),
            Hyperparameters::default(),
            FailingFactorizer,
        );

        assert!(matches!(engine.train(matrix), Err(EngineError::Factorization(_))));
        assert!(!engine.is_trained());
    }
}
