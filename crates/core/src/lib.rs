#![forbid(unsafe_code)]

pub mod error;
pub mod model;
pub mod stats;
pub mod time;

pub use error::Error;
pub use stats::{DerivedStatistics, StatsError, compute_stats};
pub use time::Clock;
