//! Hyperparameters for latent factor training.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Settings handed to a [`Factorizer`](crate::factorizer::Factorizer)
///
/// Deserializable so a JSON config file can supply any subset of fields;
/// missing fields take the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Hyperparameters {
    /// Latent dimensionality, > 0
    pub factors: usize,
    /// L2 penalty, >= 0
    pub regularization: f32,
    /// Alternating sweeps, > 0
    pub iterations: usize,
    /// Confidence scaling: an entry of weight `w` gets confidence `1 + alpha * w`
    pub alpha: f32,
    /// Seed for factor initialization
    pub seed: u64,
}

impl Default for Hyperparameters {
    fn default() -> Self {
        Self {
            factors: 100,
            regularization: 0.01,
            iterations: 15,
            alpha: 40.0,
            seed: 42,
        }
    }
}

impl Hyperparameters {
    pub fn with_factors(mut self, factors: usize) -> Self {
        self.factors = factors;
        self
    }

    pub fn with_regularization(mut self, regularization: f32) -> Self {
        self.regularization = regularization;
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.factors == 0 {
            return Err(invalid("factors", self.factors));
        }
        if self.iterations == 0 {
            return Err(invalid("iterations", self.iterations));
        }
        if !self.regularization.is_finite() || self.regularization < 0.0 {
            return Err(invalid("regularization", self.regularization));
        }
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(invalid("alpha", self.alpha));
        }
        Ok(())
    }
}

fn invalid(name: &'static str, value: impl ToString) -> EngineError {
    EngineError::InvalidHyperparameters {
        name,
        value: value.to_string(),
    }
}
