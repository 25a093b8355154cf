//! Implicit-feedback alternating least squares.
//!
//! Every stored entry `(u, i)` with normalized weight `w` is an observed
//! preference `p = 1` with confidence `c = 1 + alpha * w`; every other cell
//! is preference 0 with confidence 1. Each sweep holds one side fixed and
//! solves the regularized normal equations for every row of the other:
//!
//! ```text
//! (YᵀY + Yᵀ(Cᵤ - I)Y + λI) xᵤ = YᵀCᵤp(u)
//! ```
//!
//! `YᵀY` is shared by all rows, so a row only pays for its own stored
//! entries. Rows are solved in parallel with Rayon.

use crate::config::Hyperparameters;
use crate::error::{EngineError, Result};
use crate::factorizer::{Factorizer, LatentFactors};
use crate::matrix::{InteractionMatrix, MatrixRow};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, instrument};

/// Initial factors are drawn uniformly from `[0, INIT_SCALE)`
const INIT_SCALE: f32 = 0.01;

/// Floor on the diagonal shift, relative to the mean diagonal of the normal
/// equations. Keeps rank-deficient systems positive definite when
/// `regularization` is 0.
const MIN_RELATIVE_RIDGE: f64 = 1e-8;

/// The built-in solver
#[derive(Debug, Clone, Copy, Default)]
pub struct AlsFactorizer;

impl Factorizer for AlsFactorizer {
    fn name(&self) -> &str {
        "AlternatingLeastSquares"
    }

    #[instrument(skip_all, fields(rows = matrix.num_rows(), cols = matrix.num_cols()))]
    fn fit(&self, matrix: &InteractionMatrix, params: &Hyperparameters) -> Result<LatentFactors> {
        params.validate()?;
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut init = |rows: usize| {
            Array2::from_shape_fn((rows, params.factors), |_| rng.random::<f32>() * INIT_SCALE)
        };
        let mut user_factors = init(matrix.num_rows());
        let mut item_factors = init(matrix.num_cols());

        let item_users = matrix.transpose();

        for iteration in 0..params.iterations {
            user_factors = solve_side(matrix, &item_factors, params)?;
            item_factors = solve_side(&item_users, &user_factors, params)?;

            debug!(
                "ALS iteration {}: loss = {:.6}",
                iteration,
                weighted_loss(matrix, &user_factors, &item_factors, params)
            );
        }

        info!(
            "Fitted {} factors for {} users and {} items",
            params.factors,
            user_factors.nrows(),
            item_factors.nrows()
        );
        LatentFactors::new(user_factors, item_factors)
    }
}

/// Recompute every row of one side with `fixed` held constant
fn solve_side(
    rows: &InteractionMatrix,
    fixed: &Array2<f32>,
    params: &Hyperparameters,
) -> Result<Array2<f32>> {
    let fixed64 = fixed.mapv(f64::from);
    let gram = fixed64.t().dot(&fixed64);

    let solved: Vec<Array1<f32>> = (0..rows.num_rows())
        .into_par_iter()
        .map(|r| solve_row(rows.row(r), &fixed64, &gram, params))
        .collect::<Result<_>>()?;

    let mut out = Array2::zeros((rows.num_rows(), params.factors));
    for (r, x) in solved.into_iter().enumerate() {
        out.row_mut(r).assign(&x);
    }
    Ok(out)
}

fn solve_row(
    row: MatrixRow<'_>,
    fixed: &Array2<f64>,
    gram: &Array2<f64>,
    params: &Hyperparameters,
) -> Result<Array1<f32>> {
    let k = params.factors;
    // no observed preferences: the right-hand side is zero, so is x
    if row.is_empty() {
        return Ok(Array1::zeros(k));
    }

    let alpha = f64::from(params.alpha);
    let mut a = gram.clone();
    let mut b = Array1::<f64>::zeros(k);

    for (col, weight) in row.iter() {
        let y = fixed.row(col);
        let confidence = 1.0 + alpha * f64::from(weight);

        for i in 0..k {
            for j in 0..k {
                a[[i, j]] += (confidence - 1.0) * y[i] * y[j];
            }
            b[i] += confidence * y[i];
        }
    }
    let mean_diagonal = (0..k).map(|i| a[[i, i]]).sum::<f64>() / k as f64;
    let ridge = f64::from(params.regularization)
        .max(MIN_RELATIVE_RIDGE * mean_diagonal)
        .max(f64::MIN_POSITIVE);
    for i in 0..k {
        a[[i, i]] += ridge;
    }

    let x = cholesky_solve(&a, &b)?;
    Ok(x.mapv(|v| v as f32))
}

/// Solve `A x = b` for symmetric positive definite `A`
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
    let n = a.nrows();
    let mut l = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[[i, j]];
            for p in 0..j {
                sum -= l[[i, p]] * l[[j, p]];
            }

            if i == j {
                if sum <= 0.0 || !sum.is_finite() {
                    return Err(EngineError::Factorization(format!(
                        "normal equations are not positive definite (pivot {} = {})",
                        i, sum
                    )));
                }
                l[[i, i]] = sum.sqrt();
            } else {
                l[[i, j]] = sum / l[[j, j]];
            }
        }
    }

    // forward: L y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = b[i];
        for p in 0..i {
            sum -= l[[i, p]] * y[p];
        }
        y[i] = sum / l[[i, i]];
    }

    // backward: Lᵀ x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = y[i];
        for p in (i + 1)..n {
            sum -= l[[p, i]] * x[p];
        }
        x[i] = sum / l[[i, i]];
    }

    Ok(x)
}

/// Confidence-weighted squared error over the full grid plus the L2 penalty,
/// normalized by the number of cells
fn weighted_loss(
    matrix: &InteractionMatrix,
    user_factors: &Array2<f32>,
    item_factors: &Array2<f32>,
    params: &Hyperparameters,
) -> f64 {
    let cells = (matrix.num_rows() * matrix.num_cols()).max(1) as f64;
    let alpha = f64::from(params.alpha);
    let item_gram = item_factors.t().dot(item_factors).mapv(f64::from);

    let mut loss = 0.0;
    for u in 0..matrix.num_rows() {
        let x = user_factors.row(u).mapv(f64::from);
        // every cell treated as an unobserved zero...
        loss += x.dot(&item_gram.dot(&x));
        // ...then corrected for the stored entries
        for (i, weight) in matrix.row(u).iter() {
            let pred = f64::from(user_factors.row(u).dot(&item_factors.row(i)));
            let confidence = 1.0 + alpha * f64::from(weight);
            loss += confidence * (1.0 - pred).powi(2) - pred * pred;
        }
    }

    let penalty = f64::from(params.regularization)
        * (user_factors.iter().map(|&v| f64::from(v * v)).sum::<f64>()
            + item_factors.iter().map(|&v| f64::from(v * v)).sum::<f64>());

    (loss + penalty) / cells
}
