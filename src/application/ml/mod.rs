pub mod drift_estimator;
pub mod lookback_regressor;
pub mod predictor;

pub use drift_estimator::DriftEstimator;
pub use lookback_regressor::{DEFAULT_LOOKBACK, LookbackRegressor};
pub use predictor::SequencePredictor;
