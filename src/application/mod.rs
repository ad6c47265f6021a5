// Signal blending and the degradation ladder
pub mod blender;

// Sequence prediction models
pub mod ml;

// Sentiment batch aggregation
pub mod sentiment;

// Freshness gate / cache policy
pub mod service;

pub use blender::{EnsembleBlender, EnsembleWeights};
pub use sentiment::SentimentAggregator;
pub use service::{PredictionService, ServicePolicy};
