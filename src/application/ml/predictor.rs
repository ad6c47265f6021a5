use crate::domain::errors::PredictionError;

/// Interface for next-step price models.
///
/// Implementations are stateless at inference time and must fail closed:
/// any data condition (untrained model, short history) degrades to a
/// heuristic estimate instead of erroring. The only permitted error is
/// `InvalidHorizon`, a caller contract violation.
pub trait SequencePredictor: Send + Sync {
    /// Predict `horizon` steps ahead from an ordered close-price history.
    /// Returns one estimate per step; `horizon` must be >= 1.
    fn predict(&self, history: &[f64], horizon: usize) -> Result<Vec<f64>, PredictionError>;

    /// Get model name/type
    fn name(&self) -> &str;

    /// Get model version/id
    fn version(&self) -> &str;
}
