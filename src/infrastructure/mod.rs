pub mod cache;
pub mod mock;
pub mod persistence;
pub mod sentiment;

pub use cache::InMemoryTtlCache;
pub use mock::MockMarketStore;
