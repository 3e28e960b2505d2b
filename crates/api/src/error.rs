use thiserror::Error;

use folio_loader::LoadError;
use folio_pg::StoreError;

/// Result type for resolver operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by the resolver layer.
///
/// A failed batched load carries the shared whole-batch error; the executor
/// reports it for every field that was awaiting that batch.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Direct repository access failed.
    #[error("Data layer error: {0}")]
    Store(#[from] StoreError),

    /// A batched relation load failed.
    #[error("Relation load error: {0}")]
    Load(#[from] LoadError),
}
