//! Precondition errors raised by the analysis layer.
//!
//! Data-quality problems never surface here; malformed records are simply
//! left out of the aggregate that needed them.

use thiserror::Error;

/// A caller supplied a parameter the aggregators cannot work with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    #[error("histogram bin width must be a finite number of at least 1e-6, got {0}")]
    InvalidBinWidth(f64),

    #[error("marker scale must be a non-negative finite number, got {0}")]
    InvalidMarkerScale(f64),
}
