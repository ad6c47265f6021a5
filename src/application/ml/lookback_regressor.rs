use super::drift_estimator::DriftEstimator;
use super::predictor::SequencePredictor;
use crate::domain::errors::PredictionError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use smartcore::linalg::basic::matrix::DenseMatrix;
use smartcore::linear::linear_regression::{LinearRegression, LinearRegressionParameters};
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

type Model = LinearRegression<f64, f64, DenseMatrix<f64>, Vec<f64>>;

/// Fitted model plus the min-max scaler captured at fit time.
#[derive(Serialize, Deserialize)]
struct FittedState {
    lookback: usize,
    min: f64,
    max: f64,
    model: Model,
}

impl FittedState {
    fn scale(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 {
            return 0.5;
        }
        (value - self.min) / range
    }

    fn unscale(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range == 0.0 {
            return self.min;
        }
        self.min + value * range
    }
}

/// Linear regressor over a fixed lookback window of normalized closes.
///
/// All interior computation happens in scaled [0, 1] space; estimates are
/// denormalized before return. Multi-step horizons roll forward by feeding
/// each prediction back as the newest window element, so error compounds
/// with every step.
///
/// When untrained, or when the history is shorter than the lookback window,
/// prediction fails closed to the `DriftEstimator` placeholder.
pub struct LookbackRegressor {
    lookback: usize,
    fitted: Option<FittedState>,
    fallback: DriftEstimator,
}

pub const DEFAULT_LOOKBACK: usize = 60;

impl LookbackRegressor {
    pub fn new(lookback: usize) -> Self {
        Self {
            lookback,
            fitted: None,
            fallback: DriftEstimator::new(),
        }
    }

    /// Deterministic fallback jitter for tests.
    pub fn with_seed(lookback: usize, seed: u64) -> Self {
        Self {
            lookback,
            fitted: None,
            fallback: DriftEstimator::with_seed(seed),
        }
    }

    /// Load a previously fitted model. A missing file leaves the regressor
    /// untrained (heuristic output) rather than failing startup.
    pub fn from_file(path: &Path) -> Self {
        let mut regressor = Self::new(DEFAULT_LOOKBACK);

        if !path.exists() {
            warn!(
                "Model file not found at {:?}. Regressor will return heuristic estimates.",
                path
            );
            return regressor;
        }

        match File::open(path) {
            Ok(file) => match serde_json::from_reader::<_, FittedState>(file) {
                Ok(state) => {
                    info!("Loaded fitted model from {:?}", path);
                    regressor.lookback = state.lookback;
                    regressor.fitted = Some(state);
                }
                Err(e) => warn!("Failed to deserialize model from {:?}: {}", path, e),
            },
            Err(e) => warn!("Failed to open model file {:?}: {}", path, e),
        }

        regressor
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let state = self
            .fitted
            .as_ref()
            .context("Cannot save an untrained regressor")?;
        let file = File::create(path).context("Failed to create model file")?;
        serde_json::to_writer(file, state).context("Failed to serialize model")?;
        Ok(())
    }

    pub fn is_trained(&self) -> bool {
        self.fitted.is_some()
    }

    /// Fit the regressor on sliding windows of a close-price history.
    pub fn fit(&mut self, history: &[f64]) -> Result<(), PredictionError> {
        if history.len() < self.lookback + 1 {
            return Err(PredictionError::InsufficientHistory {
                ticker: String::new(),
                got: history.len(),
                need: self.lookback + 1,
            });
        }

        let min = history.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = history.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let range = if max > min { max - min } else { 1.0 };
        let scaled: Vec<f64> = history.iter().map(|v| (v - min) / range).collect();

        let mut rows = Vec::with_capacity(scaled.len() - self.lookback);
        let mut targets = Vec::with_capacity(scaled.len() - self.lookback);
        for i in self.lookback..scaled.len() {
            rows.push(scaled[i - self.lookback..i].to_vec());
            targets.push(scaled[i]);
        }

        let x = DenseMatrix::from_2d_vec(&rows).map_err(|e| PredictionError::NumericFailure {
            ticker: String::new(),
            reason: format!("matrix creation failed: {}", e),
        })?;

        let model = Model::fit(&x, &targets, LinearRegressionParameters::default()).map_err(
            |e| PredictionError::NumericFailure {
                ticker: String::new(),
                reason: format!("fit failed: {}", e),
            },
        )?;

        info!(
            "Fitted lookback regressor on {} windows of {} points",
            targets.len(),
            self.lookback
        );

        self.fitted = Some(FittedState {
            lookback: self.lookback,
            min,
            max,
            model,
        });
        Ok(())
    }

    /// Autoregressive rollout in scaled space. Any smartcore failure returns
    /// None so the caller can fail closed to the heuristic.
    fn rollout(&self, state: &FittedState, history: &[f64], horizon: usize) -> Option<Vec<f64>> {
        let mut window: Vec<f64> = history[history.len() - self.lookback..]
            .iter()
            .map(|v| state.scale(*v))
            .collect();

        let mut out = Vec::with_capacity(horizon);
        for _ in 0..horizon {
            let x = DenseMatrix::from_2d_vec(&vec![window.clone()]).ok()?;
            let scaled_pred = *state.model.predict(&x).ok()?.first()?;
            out.push(state.unscale(scaled_pred));

            window.rotate_left(1);
            if let Some(last) = window.last_mut() {
                *last = scaled_pred;
            }
        }

        Some(out)
    }
}

impl SequencePredictor for LookbackRegressor {
    fn predict(&self, history: &[f64], horizon: usize) -> Result<Vec<f64>, PredictionError> {
        if horizon == 0 {
            return Err(PredictionError::InvalidHorizon { horizon });
        }

        let Some(state) = &self.fitted else {
            warn!("Regressor not trained, returning heuristic estimate");
            return self.fallback.predict(history, horizon);
        };

        if history.len() < self.lookback {
            warn!(
                "Insufficient history for regression: {} < {}",
                history.len(),
                self.lookback
            );
            return self.fallback.predict(history, horizon);
        }

        match self.rollout(state, history, horizon) {
            Some(out) => Ok(out),
            None => {
                warn!("Regression rollout failed, returning heuristic estimate");
                self.fallback.predict(history, horizon)
            }
        }
    }

    fn name(&self) -> &str {
        "Lookback Linear Regressor"
    }

    fn version(&self) -> &str {
        "v1.0"
    }
}
