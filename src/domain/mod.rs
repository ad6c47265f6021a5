// Price series domain
pub mod market;

// Prediction record domain
pub mod prediction;

// News sentiment domain
pub mod sentiment;

// Port interfaces to the store/cache collaborators
pub mod ports;

// Domain-specific error types
pub mod errors;
