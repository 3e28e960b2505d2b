use std::sync::Arc;

use thiserror::Error;

/// Boxed error type returned by bulk-fetch functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for loader operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors surfaced to `load` callers.
///
/// A single failing bulk fetch fails every key of its batch: the engine
/// cannot tell which key a bulk-query failure implicates, so no per-key
/// granularity is offered. Callers needing isolated failure semantics must
/// retry individually outside the batching engine.
#[derive(Error, Debug, Clone)]
pub enum LoadError {
    /// The bulk fetch for the batch containing this key failed. Every caller
    /// waiting on that batch receives a clone of the same error.
    #[error("Bulk fetch failed: {0}")]
    Fetch(Arc<dyn std::error::Error + Send + Sync>),

    /// The fetch function broke the position-alignment contract by returning
    /// a result list of the wrong length.
    #[error("Bulk fetch returned {got} results for {expected} keys")]
    ShapeMismatch { expected: usize, got: usize },

    /// The batch was dropped before delivering a result, e.g. because the
    /// runtime shut down mid-dispatch.
    #[error("Batch was abandoned before delivering a result")]
    Aborted,
}
