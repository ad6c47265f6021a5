pub mod database;
pub mod stores;

pub use database::Database;
pub use stores::{SqliteMarketStore, SqlitePredictionStore};
