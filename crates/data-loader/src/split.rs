//! Random train/held-out partition of an interaction log.

use crate::error::{DataLoadError, Result};
use crate::types::Interaction;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

/// Shuffle `interactions` with a seeded RNG and cut off a held-out share.
///
/// The held-out side receives `ceil(test_fraction * n)` records. Both sides
/// are disjoint and together contain every input record exactly once.
///
/// # Returns
/// `(train, held_out)`
pub fn train_test_split(
    mut interactions: Vec<Interaction>,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<Interaction>, Vec<Interaction>)> {
    if !(0.0..1.0).contains(&test_fraction) {
        return Err(DataLoadError::InvalidValue {
            field: "test_fraction".to_string(),
            value: test_fraction.to_string(),
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    interactions.shuffle(&mut rng);

    let n_test = (test_fraction * interactions.len() as f64).ceil() as usize;
    let train = interactions.split_off(n_test);
    Ok((train, interactions))
}
