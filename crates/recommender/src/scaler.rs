//! Min-max rescaling of raw interaction weights into `[0, 1]`.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

/// Scaler whose bounds are fixed once at fit time
///
/// The same fitted scaler must be reused for every later normalization in
/// a session; refitting per batch would shift the meaning of a weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    min: f64,
    max: f64,
}

impl MinMaxScaler {
    /// Capture min and max of `weights`
    pub fn fit<I: IntoIterator<Item = f64>>(weights: I) -> Result<Self> {
        let (min, max) = weights
            .into_iter()
            .fold(None, |bounds: Option<(f64, f64)>, w| match bounds {
                None => Some((w, w)),
                Some((lo, hi)) => Some((lo.min(w), hi.max(w))),
            })
            .ok_or(EngineError::EmptyInput)?;

        Ok(Self { min, max })
    }

    /// `(w - min) / (max - min)`; a constant column maps to 0
    pub fn transform(&self, weight: f64) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 {
            0.0
        } else {
            (weight - self.min) / range
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scales_to_unit_interval() {
        let scaler = MinMaxScaler::fit([5.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(scaler.transform(1.0), 0.0);
        assert_eq!(scaler.transform(5.0), 1.0);
        assert_eq!(scaler.transform(3.0), 0.5);
    }

    #[test]
    fn test_bounds_are_fixed_after_fit() {
        let scaler = MinMaxScaler::fit([2.0, 4.0]).unwrap();
        // values outside the fitted range are not clipped
        assert_eq!(scaler.transform(6.0), 2.0);
        assert_eq!(scaler.min(), 2.0);
        assert_eq!(scaler.max(), 4.0);
    }

    #[test]
    fn test_constant_column() {
        let scaler = MinMaxScaler::fit([7.0, 7.0]).unwrap();
        assert_eq!(scaler.transform(7.0), 0.0);
    }

    #[test]
    fn test_empty_input() {
        assert!(matches!(
            MinMaxScaler::fit(Vec::new()),
            Err(EngineError::EmptyInput)
        ));
    }
}
