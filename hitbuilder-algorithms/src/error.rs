//! Algorithm error types.

use thiserror::Error;

/// Reasons a waveform fit produced no result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    /// Trace too short to estimate a baseline and a pulse.
    #[error("waveform has {got} samples, need at least {needed}")]
    InsufficientSamples {
        /// Samples in the trace.
        got: usize,
        /// Samples required.
        needed: usize,
    },

    /// No pulse rises above the baseline.
    #[error("no pulse above baseline (amplitude {amplitude:.2})")]
    FlatTrace {
        /// Largest deviation found.
        amplitude: f64,
    },
}
