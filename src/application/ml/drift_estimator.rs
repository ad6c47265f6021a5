use super::predictor::SequencePredictor;
use crate::domain::errors::PredictionError;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

/// Placeholder estimator used when no trained model is available.
///
/// Takes the last observed value, applies a small drift from the sign of the
/// most recent delta, and adds bounded jitter so repeated calls do not freeze
/// on a constant output. This is NOT a trained forecast; it only exists so
/// the blender always has a base estimate to work with.
pub struct DriftEstimator {
    rng: Mutex<StdRng>,
}

const DRIFT: f64 = 0.001;
const JITTER: f64 = 0.01;

impl DriftEstimator {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic variant for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn estimate(&self, last: f64, prev: Option<f64>) -> f64 {
        let drift = match prev {
            Some(p) if last > p => DRIFT,
            Some(_) => -DRIFT,
            None => DRIFT,
        };

        let jitter = match self.rng.lock() {
            Ok(mut rng) => rng.random_range(-JITTER..=JITTER),
            Err(_) => 0.0,
        };

        last * (1.0 + drift + jitter)
    }
}

impl Default for DriftEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl SequencePredictor for DriftEstimator {
    fn predict(&self, history: &[f64], horizon: usize) -> Result<Vec<f64>, PredictionError> {
        if horizon == 0 {
            return Err(PredictionError::InvalidHorizon { horizon });
        }

        let Some(&last) = history.last() else {
            return Ok(vec![100.0; horizon]);
        };

        let mut prev = if history.len() > 1 {
            Some(history[history.len() - 2])
        } else {
            None
        };

        let mut current = last;
        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let next = self.estimate(current, prev);
            out.push(next);
            prev = Some(current);
            current = next;
        }

        Ok(out)
    }

    fn name(&self) -> &str {
        "Drift Estimator"
    }

    fn version(&self) -> &str {
        "heuristic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_returns_default_price() {
        let estimator = DriftEstimator::with_seed(7);
        let out = estimator.predict(&[], 1).unwrap();
        assert_eq!(out, vec![100.0]);
    }

    #[test]
    fn estimate_stays_within_jitter_bounds() {
        let estimator = DriftEstimator::with_seed(7);

        // drift +- jitter bounds the move to ~1.1%
        for _ in 0..100 {
            let out = estimator.predict(&[100.0, 101.0], 1).unwrap();
            assert!(out[0] > 101.0 * (1.0 - DRIFT - JITTER - 1e-9));
            assert!(out[0] < 101.0 * (1.0 + DRIFT + JITTER + 1e-9));
        }
    }

    #[test]
    fn seeded_estimator_is_deterministic() {
        let a = DriftEstimator::with_seed(42);
        let b = DriftEstimator::with_seed(42);
        assert_eq!(
            a.predict(&[100.0, 99.0], 3).unwrap(),
            b.predict(&[100.0, 99.0], 3).unwrap()
        );
    }

    #[test]
    fn zero_horizon_is_a_contract_violation() {
        let estimator = DriftEstimator::with_seed(1);
        assert!(matches!(
            estimator.predict(&[100.0], 0),
            Err(PredictionError::InvalidHorizon { .. })
        ));
    }
}
