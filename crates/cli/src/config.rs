//! Run configuration: hyperparameters, split settings and input columns.
//!
//! Loaded from an optional JSON file; every field has a default, so a file
//! only needs the keys it changes:
//!
//! ```json
//! { "hyperparameters": { "factors": 50 }, "test_size": 0.1 }
//! ```

use anyhow::{Context, Result};
use data_loader::ColumnSpec;
use recommender::Hyperparameters;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub hyperparameters: Hyperparameters,
    /// Share of interactions held out for evaluation
    pub test_size: f64,
    /// Seed for the train/held-out shuffle and the factor initialization;
    /// replaces any `hyperparameters.seed` given in the file
    pub seed: u64,
    pub columns: ColumnSpec,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            hyperparameters: Hyperparameters::default(),
            test_size: 0.2,
            seed: 42,
            columns: ColumnSpec::default(),
        }
    }
}

/// Command-line values that take precedence over the file
#[derive(Debug, Clone, Copy, Default)]
pub struct Overrides {
    pub factors: Option<usize>,
    pub iterations: Option<usize>,
    pub regularization: Option<f32>,
    pub test_size: Option<f64>,
    pub seed: Option<u64>,
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Defaults, then the optional file, then command-line overrides
    pub fn resolve(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        Ok(config.apply(overrides))
    }

    fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(factors) = overrides.factors {
            self.hyperparameters.factors = factors;
        }
        if let Some(iterations) = overrides.iterations {
            self.hyperparameters.iterations = iterations;
        }
        if let Some(regularization) = overrides.regularization {
            self.hyperparameters.regularization = regularization;
        }
        if let Some(test_size) = overrides.test_size {
            self.test_size = test_size;
        }
        if let Some(seed) = overrides.seed {
            self.seed = seed;
        }
        // one seed drives both the split and the factor initialization
        self.hyperparameters.seed = self.seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"hyperparameters": {{"factors": 20}}, "columns": {{"weight": "plays"}}}}"#
        )
        .unwrap();

        let config = RunConfig::load(file.path()).unwrap();
        assert_eq!(config.hyperparameters.factors, 20);
        assert_eq!(config.hyperparameters.iterations, 15);
        assert_eq!(config.test_size, 0.2);
        assert_eq!(config.columns.user, "user_id");
        assert_eq!(config.columns.weight, "plays");
    }

    #[test]
    fn test_overrides_win() {
        let overrides = Overrides {
            factors: Some(8),
            seed: Some(7),
            ..Overrides::default()
        };
        let config = RunConfig::resolve(None, overrides).unwrap();

        assert_eq!(config.hyperparameters.factors, 8);
        assert_eq!(config.hyperparameters.seed, 7);
        assert_eq!(config.seed, 7);
        assert_eq!(config.hyperparameters.regularization, 0.01);
    }

    #[test]
    fn test_file_seed_also_seeds_factors() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"seed": 7, "hyperparameters": {{"seed": 3}}}}"#).unwrap();

        let config = RunConfig::resolve(Some(file.path()), Overrides::default()).unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.hyperparameters.seed, 7);

        let overridden = RunConfig::resolve(
            Some(file.path()),
            Overrides {
                seed: Some(11),
                ..Overrides::default()
            },
        )
        .unwrap();
        assert_eq!(overridden.seed, 11);
        assert_eq!(overridden.hyperparameters.seed, 11);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(RunConfig::load(Path::new("/nonexistent/recs.json")).is_err());
    }
}
