//! Aggregation over vehicle registration records.
//!
//! Every function here is a pure transform of its inputs: records are
//! never mutated and malformed fields only shrink the result.

pub mod dashboard;
pub mod density;
pub mod error;
pub mod geo;
pub mod hierarchy;
pub mod histogram;
pub mod metrics;
pub mod ranking;
pub mod ratio;
pub mod tally;
pub mod trends;

pub use dashboard::DashboardOptions;
pub use error::AnalysisError;
