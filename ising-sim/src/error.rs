use thiserror::Error;

/// Errors surfaced by [`run`](crate::run) and the pieces it drives.
#[derive(Debug, Error)]
pub enum SimError {
    /// A configuration parameter is out of range. Raised before any sampling.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    /// A probability or energy became non-finite.
    #[error("numeric instability at T = {temperature}: {detail}")]
    NumericInstability { temperature: f64, detail: String },
    /// The interrupt flag was observed at a temperature-point boundary.
    #[error("sweep interrupted after {completed} temperature point(s)")]
    Interrupted { completed: usize },
}
