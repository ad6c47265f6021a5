use thiserror::Error;

/// Errors raised inside the prediction core.
///
/// Only `InvalidHorizon` is allowed to surface past the public entry point;
/// it signals caller misuse rather than a runtime data condition. Everything
/// else is absorbed by the degradation ladder and turned into a
/// `degraded = true` record.
#[derive(Debug, Error)]
pub enum PredictionError {
    #[error("Invalid horizon: {horizon} (must be >= 1)")]
    InvalidHorizon { horizon: usize },

    #[error("Insufficient history for {ticker}: {got} points, need {need}")]
    InsufficientHistory {
        ticker: String,
        got: usize,
        need: usize,
    },

    #[error("Store unavailable: {reason}")]
    StoreUnavailable { reason: String },

    #[error("Malformed prediction record for {ticker}: {reason}")]
    MalformedRecord { ticker: String, reason: String },

    #[error("Numeric failure in blend for {ticker}: {reason}")]
    NumericFailure { ticker: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_formatting() {
        let err = PredictionError::InsufficientHistory {
            ticker: "TSLA".to_string(),
            got: 12,
            need: 30,
        };

        let msg = err.to_string();
        assert!(msg.contains("TSLA"));
        assert!(msg.contains("12"));
        assert!(msg.contains("30"));
    }

    #[test]
    fn test_invalid_horizon_formatting() {
        let err = PredictionError::InvalidHorizon { horizon: 0 };
        assert!(err.to_string().contains(">= 1"));
    }
}
