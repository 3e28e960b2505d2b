//! The generic key-batching engine.
//!
//! One `BatchLoader` instance serves one relation for one request. Keys
//! requested while a batch is open join it; the batch closes when it reaches
//! `max_batch` distinct keys or when `wait` elapses, whichever comes first,
//! and the bulk-fetch function runs exactly once for the batch. The fetch
//! call and the callers' suspension both happen outside the state lock, so
//! concurrent `load` calls never block each other from joining a batch.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

use crate::config::BatchConfig;
use crate::error::{BoxError, LoadError, LoadResult};

/// Future returned by a bulk-fetch function.
///
/// The resolved list must align position-for-position with the key list the
/// function was called with; absence of a match is expressed by the value
/// type (an empty collection, a `None`), never by omission.
pub type FetchFuture<V> = Pin<Box<dyn Future<Output = Result<Vec<V>, BoxError>> + Send>>;

type FetchFn<K, V> = Box<dyn Fn(Vec<K>) -> FetchFuture<V> + Send + Sync>;

/// Generic batching loader, parameterized over key and value types.
///
/// Cloning is cheap and clones share the same pending batch and memo; a
/// fresh instance per request is what provides request isolation.
pub struct BatchLoader<K, V> {
    shared: Arc<Shared<K, V>>,
}

impl<K, V> Clone for BatchLoader<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct Shared<K, V> {
    config: BatchConfig,
    fetch: FetchFn<K, V>,
    state: Mutex<State<K, V>>,
}

struct State<K, V> {
    /// The currently open batch, if any. `None` between dispatches.
    batch: Option<Batch<K, V>>,
    /// Identifier handed to the next batch, so a dispatch timer only ever
    /// closes the batch it was started for.
    next_id: u64,
    /// Values resolved during this loader's lifetime.
    memo: HashMap<K, V>,
}

struct Batch<K, V> {
    id: u64,
    /// Distinct keys in first-seen order.
    keys: Vec<K>,
    index: HashMap<K, usize>,
    waiters: Vec<Waiter<V>>,
}

struct Waiter<V> {
    slot: usize,
    tx: oneshot::Sender<LoadResult<V>>,
}

impl<K, V> Batch<K, V> {
    fn new(id: u64) -> Self {
        Self {
            id,
            keys: Vec::new(),
            index: HashMap::new(),
            waiters: Vec::new(),
        }
    }
}

enum Enqueued<V> {
    Memoized(V),
    Pending(oneshot::Receiver<LoadResult<V>>),
}

impl<K, V> BatchLoader<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Create a loader with the default configuration.
    pub fn new<F, Fut>(fetch: F) -> Self
    where
        F: Fn(Vec<K>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<V>, BoxError>> + Send + 'static,
    {
        Self::with_config(BatchConfig::default(), fetch)
    }

    /// Create a loader with a custom configuration.
    pub fn with_config<F, Fut>(config: BatchConfig, fetch: F) -> Self
    where
        F: Fn(Vec<K>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<V>, BoxError>> + Send + 'static,
    {
        Self {
            shared: Arc::new(Shared {
                config,
                fetch: Box::new(move |keys| Box::pin(fetch(keys))),
                state: Mutex::new(State {
                    batch: None,
                    next_id: 0,
                    memo: HashMap::new(),
                }),
            }),
        }
    }

    /// Request the value for one key.
    ///
    /// Suspends until the batch containing the key has been dispatched and
    /// resolved. Safe to call concurrently from many resolution paths; all
    /// callers of the same key receive the same value or the same error.
    pub async fn load(&self, key: K) -> LoadResult<V> {
        let entry = {
            let mut state = self.shared.state.lock().await;
            self.enqueue(&mut state, key)
        };
        match entry {
            Enqueued::Memoized(value) => Ok(value),
            Enqueued::Pending(rx) => rx.await.unwrap_or(Err(LoadError::Aborted)),
        }
    }

    /// Request values for several keys, returning results in input order.
    ///
    /// Semantically equivalent to one `load` per key, except that all keys
    /// join the open batch atomically.
    pub async fn load_many(&self, keys: Vec<K>) -> Vec<LoadResult<V>> {
        let entries: Vec<Enqueued<V>> = {
            let mut state = self.shared.state.lock().await;
            keys.into_iter()
                .map(|key| self.enqueue(&mut state, key))
                .collect()
        };

        let mut results = Vec::with_capacity(entries.len());
        for entry in entries {
            results.push(match entry {
                Enqueued::Memoized(value) => Ok(value),
                Enqueued::Pending(rx) => rx.await.unwrap_or(Err(LoadError::Aborted)),
            });
        }
        results
    }

    /// Seed the memo with a value, without fetching.
    ///
    /// A key that is already memoized keeps its existing value.
    pub async fn prime(&self, key: K, value: V) {
        let mut state = self.shared.state.lock().await;
        state.memo.entry(key).or_insert(value);
    }

    /// Drop a memoized value so the next `load` fetches it again.
    pub async fn clear(&self, key: &K) {
        let mut state = self.shared.state.lock().await;
        state.memo.remove(key);
    }

    /// Register a key with the open batch. Must be called with the state
    /// lock held; never awaits.
    fn enqueue(&self, state: &mut State<K, V>, key: K) -> Enqueued<V> {
        if let Some(hit) = state.memo.get(&key) {
            return Enqueued::Memoized(hit.clone());
        }

        let mut batch = match state.batch.take() {
            Some(batch) => batch,
            None => {
                let id = state.next_id;
                state.next_id = state.next_id.wrapping_add(1);
                let shared = Arc::clone(&self.shared);
                tokio::spawn(async move {
                    tokio::time::sleep(shared.config.wait).await;
                    shared.expire(id).await;
                });
                Batch::new(id)
            }
        };

        let (tx, rx) = oneshot::channel();
        let slot = match batch.index.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = batch.keys.len();
                batch.index.insert(key.clone(), slot);
                batch.keys.push(key);
                slot
            }
        };
        batch.waiters.push(Waiter { slot, tx });

        if batch.keys.len() >= self.shared.config.max_batch.max(1) {
            let shared = Arc::clone(&self.shared);
            tokio::spawn(async move { shared.run(batch).await });
        } else {
            state.batch = Some(batch);
        }

        Enqueued::Pending(rx)
    }
}

impl<K, V> Shared<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Close and dispatch the batch with the given id if it is still open.
    /// The batch may already have been dispatched by reaching `max_batch`,
    /// in which case a newer batch (with a newer id) owns the slot.
    async fn expire(&self, id: u64) {
        let expired = {
            let mut state = self.state.lock().await;
            if state.batch.as_ref().map(|batch| batch.id) == Some(id) {
                state.batch.take()
            } else {
                None
            }
        };
        if let Some(batch) = expired {
            self.run(batch).await;
        }
    }

    /// Invoke the bulk fetch for a closed batch and deliver each key's
    /// result to every caller that requested it. Runs outside the state
    /// lock.
    async fn run(&self, batch: Batch<K, V>) {
        debug!(
            "dispatching batch {} with {} distinct keys and {} waiters",
            batch.id,
            batch.keys.len(),
            batch.waiters.len()
        );

        let result = (self.fetch)(batch.keys.clone()).await;

        match result {
            Ok(values) if values.len() == batch.keys.len() => {
                {
                    let mut state = self.state.lock().await;
                    for (key, value) in batch.keys.iter().zip(values.iter()) {
                        state.memo.insert(key.clone(), value.clone());
                    }
                }
                for waiter in batch.waiters {
                    // A waiter abandoned by its request has dropped its
                    // receiver; the failed send is ignored.
                    let _ = waiter.tx.send(Ok(values[waiter.slot].clone()));
                }
            }
            Ok(values) => {
                warn!(
                    "bulk fetch for batch {} returned {} results for {} keys",
                    batch.id,
                    values.len(),
                    batch.keys.len()
                );
                let err = LoadError::ShapeMismatch {
                    expected: batch.keys.len(),
                    got: values.len(),
                };
                for waiter in batch.waiters {
                    let _ = waiter.tx.send(Err(err.clone()));
                }
            }
            Err(source) => {
                warn!("bulk fetch for batch {} failed: {}", batch.id, source);
                let err = LoadError::Fetch(Arc::from(source));
                for waiter in batch.waiters {
                    let _ = waiter.tx.send(Err(err.clone()));
                }
            }
        }
    }
}
