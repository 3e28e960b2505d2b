//! # folio-loader
//!
//! A request-scoped key-batching engine for the folio workspace.
//!
//! Resolving a graph of related records one field at a time produces one
//! query per edge (the N+1 problem). `BatchLoader` coalesces the keys
//! requested during a short wait window into a single bulk fetch, then fans
//! the results back out to every caller — each caller still sees exactly the
//! value (or error) for the key it asked for.
//!
//! ## Features
//!
//! - **Key coalescing**: concurrent `load` calls within the wait window share
//!   one bulk fetch, with duplicate keys dispatched only once
//! - **Bounded latency**: a non-empty batch dispatches after `wait` even if
//!   no further keys arrive
//! - **Bounded batches**: reaching `max_batch` distinct keys dispatches
//!   immediately
//! - **Per-instance memoization**: a resolved key is served from memory for
//!   the lifetime of the loader (one request), never across instances
//! - **Relation-agnostic**: works purely in terms of opaque keys and values;
//!   row grouping belongs to the caller's fetch function
//!
//! ## Quick Start
//!
//! ```rust
//! use folio_loader::BatchLoader;
//!
//! # tokio_test::block_on(async {
//! // Both keys below are resolved by a single call to this function.
//! let loader = BatchLoader::new(|keys: Vec<i64>| async move {
//!     Ok(keys.iter().map(|key| key * 10).collect())
//! });
//!
//! let (a, b) = tokio::join!(loader.load(1), loader.load(2));
//! assert_eq!(a.unwrap(), 10);
//! assert_eq!(b.unwrap(), 20);
//! # });
//! ```

pub mod batch;
pub mod config;
pub mod error;


pub use batch::{BatchLoader, FetchFuture};
pub use config::BatchConfig;
pub use error::{BoxError, LoadError, LoadResult};
