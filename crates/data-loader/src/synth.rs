//! Synthetic implicit-feedback generator.
//!
//! Produces click logs whose item popularity follows a power law, which is
//! the shape real interaction data tends to have: a few blockbuster items
//! and a long tail.
//!
//! ## Algorithm
//! 1. Draw `users` distinct 8-hex-character user IDs
//! 2. Name items `item_0 .. item_{items-1}`
//! 3. Give each item a Zipf(a) popularity draw
//! 4. For each event pick a user uniformly and an item proportional to
//!    its popularity, with a click count uniform in `[1, 10)`
//! 5. Aggregate repeated (user, item) pairs

use crate::aggregate::aggregate_duplicates;
use crate::error::{DataLoadError, Result};
use crate::types::{DatasetStats, Interaction};
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, instrument};

/// Upper bound on a single popularity draw; keeps heavy-tail outliers finite
const MAX_POPULARITY: f64 = 1.0e12;

/// Shape of the generated log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticConfig {
    pub users: usize,
    pub items: usize,
    /// Raw events before aggregation
    pub interactions: usize,
    /// Zipf exponent for item popularity, must be > 1
    pub zipf_exponent: f64,
    pub seed: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            users: 1000,
            items: 5000,
            interactions: 10_000,
            zipf_exponent: 2.0,
            seed: 42,
        }
    }
}

impl SyntheticConfig {
    pub fn with_users(mut self, users: usize) -> Self {
        self.users = users;
        self
    }

    pub fn with_items(mut self, items: usize) -> Self {
        self.items = items;
        self
    }

    pub fn with_interactions(mut self, interactions: usize) -> Self {
        self.interactions = interactions;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.users == 0 {
            return Err(invalid("users", self.users));
        }
        if self.items == 0 {
            return Err(invalid("items", self.items));
        }
        if self.zipf_exponent.is_nan() || self.zipf_exponent <= 1.0 {
            return Err(invalid("zipf_exponent", self.zipf_exponent));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: impl ToString) -> DataLoadError {
    DataLoadError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

/// Rejection sampler for the Zipf distribution (Devroye, 1986)
fn sample_zipf<R: Rng>(rng: &mut R, exponent: f64) -> f64 {
    let am1 = exponent - 1.0;
    let b = 2f64.powf(am1);
    loop {
        let u = 1.0 - rng.random::<f64>();
        let v = rng.random::<f64>();
        let x = u.powf(-1.0 / am1).floor();
        if !(1.0..=MAX_POPULARITY).contains(&x) {
            continue;
        }
        let t = (1.0 + 1.0 / x).powf(am1);
        if v * x * (t - 1.0) / (b - 1.0) <= t / b {
            return x;
        }
    }
}

fn generate_user_ids<R: Rng>(rng: &mut R, count: usize) -> Vec<String> {
    let mut seen = HashSet::with_capacity(count);
    let mut ids = Vec::with_capacity(count);
    while ids.len() < count {
        let id = format!("{:08x}", rng.random::<u32>());
        if seen.insert(id.clone()) {
            ids.push(id);
        }
    }
    ids
}

/// Generate a synthetic interaction log
///
/// Deterministic for a given config. The result is already aggregated:
/// one record per distinct (user, item) pair.
#[instrument(skip(config), fields(users = config.users, items = config.items))]
pub fn generate_synthetic(config: &SyntheticConfig) -> Result<Vec<Interaction>> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    let user_ids = generate_user_ids(&mut rng, config.users);
    let item_ids: Vec<String> = (0..config.items).map(|i| format!("item_{}", i)).collect();

    let popularity: Vec<f64> = (0..config.items)
        .map(|_| sample_zipf(&mut rng, config.zipf_exponent))
        .collect();
    let item_dist = WeightedIndex::new(&popularity)
        .map_err(|e| invalid("popularity", e))?;

    let events: Vec<Interaction> = (0..config.interactions)
        .map(|_| {
            let user = &user_ids[rng.random_range(0..user_ids.len())];
            let item = &item_ids[item_dist.sample(&mut rng)];
            let clicks = rng.random_range(1..10u32);
            Interaction::new(user.clone(), item.clone(), f64::from(clicks))
        })
        .collect();

    let log = aggregate_duplicates(events);

    let stats = DatasetStats::compute(&log);
    info!(
        "Generated dataset with {} unique interactions ({} users, {} items, sparsity {:.4}%)",
        stats.interactions,
        stats.users,
        stats.items,
        stats.sparsity * 100.0
    );
    Ok(log)
}
