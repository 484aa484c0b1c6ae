//! Unified error handling for the analysis pipeline.
//!
//! Every fault raised here indicates a broken invariant rather than ordinary
//! bad data, so callers are expected to abort the current analysis run. No
//! component terminates the process itself; the binary decides policy.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors raised by the residential-area inference pipeline.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The event sequence is empty or a record could not be decoded.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    /// A tolerance, interval, or threshold parameter is out of range.
    #[error("invalid argument: {name} = {value}")]
    InvalidArgument { name: &'static str, value: String },

    /// Adjacent events are chronologically inverted. The sort precondition
    /// was violated upstream; the run must not continue.
    #[error("time ordering violation at event {index}: elapsed {elapsed_secs}s")]
    TimeOrderingViolation { index: usize, elapsed_secs: i64 },

    /// A location tag has no matching group.
    #[error("unknown location tag: {tag}")]
    UnknownTag { tag: String },

    /// A midpoint was requested for an area with no assigned events.
    #[error("area {area_id} has no assigned events")]
    EmptyArea { area_id: u32 },

    /// File adapter failure (ingestion or emission).
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// Tabular emission failure.
    #[error("csv failure: {0}")]
    Csv(#[from] csv::Error),
}

impl AnalysisError {
    pub(crate) fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput { reason: reason.into() }
    }

    pub(crate) fn invalid_argument(name: &'static str, value: impl ToString) -> Self {
        Self::InvalidArgument { name, value: value.to_string() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalysisError::UnknownTag { tag: "CELL_133".to_string() };
        assert!(err.to_string().contains("CELL_133"));

        let err = AnalysisError::TimeOrderingViolation { index: 7, elapsed_secs: -42 };
        assert!(err.to_string().contains("7"));
        assert!(err.to_string().contains("-42"));
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "data.csv");
        let err: AnalysisError = io.into();
        assert!(matches!(err, AnalysisError::Io(_)));
    }
}
