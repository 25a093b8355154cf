//! The pluggable factorization seam and the latent factor model it produces.
//!
//! A [`Factorizer`] turns an interaction matrix into user and item factor
//! matrices. Everything downstream (ranking, similarity, explanation) only
//! reads the resulting [`LatentFactors`], so alternative solvers can be
//! swapped in without touching the engine.

use crate::config::Hyperparameters;
use crate::error::{EngineError, Result};
use crate::matrix::{InteractionMatrix, MatrixRow};
use ndarray::{Array1, Array2, ArrayView2, Axis};

/// Fits latent factors from a weighted sparse interaction matrix.
///
/// `Send + Sync` so a trained engine can be shared across threads.
pub trait Factorizer: Send + Sync {
    /// Returns the name of this solver (for logging)
    fn name(&self) -> &str;

    /// Fit user factors `(rows x factors)` and item factors `(cols x factors)`
    fn fit(&self, matrix: &InteractionMatrix, params: &Hyperparameters) -> Result<LatentFactors>;
}

/// Trained user and item factor matrices, indexed by dense identity indices
#[derive(Debug, Clone)]
pub struct LatentFactors {
    user_factors: Array2<f32>,
    item_factors: Array2<f32>,
    item_norms: Array1<f32>,
}

impl LatentFactors {
    /// Wrap factor matrices; both must share the latent dimension
    pub fn new(user_factors: Array2<f32>, item_factors: Array2<f32>) -> Result<Self> {
        if user_factors.ncols() != item_factors.ncols() {
            return Err(EngineError::ShapeMismatch(format!(
                "user factors have {} columns, item factors have {}",
                user_factors.ncols(),
                item_factors.ncols()
            )));
        }

        let item_norms = item_factors.map_axis(Axis(1), |row| row.dot(&row).sqrt());
        Ok(Self {
            user_factors,
            item_factors,
            item_norms,
        })
    }

    pub fn num_users(&self) -> usize {
        self.user_factors.nrows()
    }

    pub fn num_items(&self) -> usize {
        self.item_factors.nrows()
    }

    pub fn num_factors(&self) -> usize {
        self.user_factors.ncols()
    }

    pub fn user_factors(&self) -> ArrayView2<'_, f32> {
        self.user_factors.view()
    }

    pub fn item_factors(&self) -> ArrayView2<'_, f32> {
        self.item_factors.view()
    }

    /// Predicted affinity of `user` for `item` (dot product)
    pub fn score(&self, user: usize, item: usize) -> f32 {
        self.user_factors.row(user).dot(&self.item_factors.row(item))
    }

    /// Top-`n` items for `user` by predicted affinity, skipping every item
    /// stored in `history`.
    ///
    /// Returns fewer than `n` pairs when fewer eligible items exist.
    pub fn recommend(&self, user: usize, history: MatrixRow<'_>, n: usize) -> Result<Vec<(usize, f32)>> {
        if user >= self.num_users() {
            return Err(EngineError::ShapeMismatch(format!(
                "user index {} outside model with {} users",
                user,
                self.num_users()
            )));
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let scores = self.item_factors.dot(&self.user_factors.row(user));
        let candidates = scores
            .iter()
            .copied()
            .enumerate()
            .filter(|&(item, _)| !history.contains(item));

        Ok(top_n(candidates, n))
    }

    /// Top-`n` items by cosine similarity to `item`, never including `item`
    pub fn similar_items(&self, item: usize, n: usize) -> Result<Vec<(usize, f32)>> {
        if item >= self.num_items() {
            return Err(EngineError::ShapeMismatch(format!(
                "item index {} outside model with {} items",
                item,
                self.num_items()
            )));
        }
        if n == 0 {
            return Ok(Vec::new());
        }

        let query_norm = self.item_norms[item];
        let dots = self.item_factors.dot(&self.item_factors.row(item));
        let candidates = dots
            .iter()
            .zip(self.item_norms.iter())
            .enumerate()
            .filter(|&(other, _)| other != item)
            .map(|(other, (&dot, &norm))| {
                let denom = query_norm * norm;
                let similarity = if denom > 0.0 { dot / denom } else { 0.0 };
                (other, similarity)
            });

        Ok(top_n(candidates, n))
    }
}

/// Highest `n` scores, descending; ties go to the lower index
fn top_n<I>(candidates: I, n: usize) -> Vec<(usize, f32)>
where
    I: Iterator<Item = (usize, f32)>,
{
    let mut ranked: Vec<(usize, f32)> = candidates.filter(|(_, score)| !score.is_nan()).collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}
