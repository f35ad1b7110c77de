//! Error types for rate queries.

use thiserror::Error;

/// Result type alias for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors that can occur while answering a rate or series query.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid scale {0:?} (expected hour, day, or week)")]
    InvalidScale(String),

    #[error("unknown metric {0:?}")]
    UnknownMetric(String),

    #[error(transparent)]
    Store(#[from] wirestat_store::StoreError),
}

impl QueryError {
    /// True when the failure is the caller's fault rather than the system's.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidScale(_) | Self::UnknownMetric(_))
    }
}
