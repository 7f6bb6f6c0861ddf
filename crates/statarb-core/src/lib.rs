pub mod analysis;
pub mod cointegration;
pub mod error;
pub mod signals;
pub mod types;
pub mod zscore;

pub use error::StatArbError;
pub use types::*;

/// Standard result type for all stat-arb operations
pub type StatArbResult<T> = Result<T, StatArbError>;
