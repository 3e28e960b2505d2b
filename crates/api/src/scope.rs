//! Per-request lifecycle of the loader registry.
//!
//! The binder sits where a middleware would: the transport layer holds one
//! `ScopeBinder` for the lifetime of the process and has it construct a
//! fresh `RequestScope` at the start of every inbound request, before any
//! traversal logic runs. The scope is then threaded to resolvers as an
//! explicit parameter — there is no ambient lookup, so traversal code that
//! could run against an unbound request does not typecheck.

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use folio_loader::BatchConfig;
use folio_pg::Repository;

use crate::loaders::Loaders;

/// Per-request handle to the batching layer.
///
/// Dropping the scope drops its loaders and everything they batched or
/// memoized; nothing survives into the next request.
pub struct RequestScope {
    loaders: Loaders,
}

impl RequestScope {
    pub(crate) fn new(loaders: Loaders) -> Self {
        Self { loaders }
    }

    /// The relation loaders bound to this request.
    pub fn loaders(&self) -> &Loaders {
        &self.loaders
    }
}

/// Builds one fresh `RequestScope` per inbound request.
pub struct ScopeBinder {
    repo: Arc<dyn Repository>,
    config: BatchConfig,
}

impl ScopeBinder {
    /// Create a binder with the default batch configuration.
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self::with_config(repo, BatchConfig::default())
    }

    /// Create a binder with a custom batch configuration.
    pub fn with_config(repo: Arc<dyn Repository>, config: BatchConfig) -> Self {
        Self { repo, config }
    }

    /// Construct a fresh scope for one request.
    pub fn bind(&self) -> RequestScope {
        debug!("Binding fresh request scope");
        RequestScope::new(Loaders::new(Arc::clone(&self.repo), self.config.clone()))
    }

    /// Run one request unit-of-work against a freshly bound scope.
    ///
    /// Equivalent to calling `bind` and passing the scope to `run`; the
    /// scope is dropped when `run` completes.
    pub async fn scoped<F, Fut, T>(&self, run: F) -> T
    where
        F: FnOnce(RequestScope) -> Fut,
        Fut: Future<Output = T>,
    {
        run(self.bind()).await
    }
}
