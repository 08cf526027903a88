//! Generic request-scoped batch loader.
//!
//! `load(key)` never queries the store by itself. The key joins the
//! pending batch and a flush task is scheduled for the end of the current
//! cooperative scheduling turn: the task yields once, so every `load`
//! issued while the request handler is still producing its page joins
//! the same batch, and the bulk fetch runs exactly once with the distinct
//! key list. Under a multi-threaded runtime the turn boundary is
//! best-effort, which can only shrink a batch, never change a result.
//!
//! Results are memoized per key for the loader's lifetime, errors
//! included; a caller that must re-read after a write clears the key
//! first. The pending batch is snapshotted and emptied before the bulk
//! fetch is invoked, so a continuation that loads the same key again
//! joins the next batch instead of the one already in flight.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::future::{BoxFuture, Shared};
use futures_util::FutureExt;
use lectern_core::{LoadError, StoreResult};
use tokio::sync::oneshot;

/// Per-key outcome of a bulk fetch.
///
/// `Missing` is the explicit not-found marker; it is distinct from any
/// business value and turns into [`LoadError::NotFound`] for exactly the
/// callers waiting on that key.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchItem<V> {
    Found(V),
    Missing,
}

impl<V> From<Option<V>> for BatchItem<V> {
    fn from(row: Option<V>) -> Self {
        match row {
            Some(value) => BatchItem::Found(value),
            None => BatchItem::Missing,
        }
    }
}

/// Bulk-fetch contract supplied per entity loader.
///
/// The result must align positionally to `keys`: `items[i]` answers
/// `keys[i]`. An `Err` fails the whole batch; there is no partial
/// success, the implementation is expected to be a single query.
#[async_trait]
pub trait BatchFetch<K, V>: Send + Sync {
    async fn fetch(&self, keys: &[K]) -> StoreResult<Vec<BatchItem<V>>>;
}

type SharedLoad<V> = Shared<BoxFuture<'static, Result<V, LoadError>>>;
type ResultSender<V> = oneshot::Sender<Result<V, LoadError>>;

struct LoaderState<K, V> {
    /// Key -> in-flight or settled lookup, for the loader's lifetime.
    memo: HashMap<K, SharedLoad<V>>,
    /// Distinct keys of the batch being assembled, in registration order.
    pending_keys: Vec<K>,
    /// Waiters per pending key, in registration order.
    waiters: HashMap<K, Vec<ResultSender<V>>>,
    flush_scheduled: bool,
}

impl<K, V> Default for LoaderState<K, V> {
    fn default() -> Self {
        Self {
            memo: HashMap::new(),
            pending_keys: Vec::new(),
            waiters: HashMap::new(),
            flush_scheduled: false,
        }
    }
}

/// A batching, memoizing loader over one bulk-fetch function.
///
/// Cheap to clone; clones share the memo and the pending batch. One
/// loader belongs to one logical request and must not outlive it.
pub struct Loader<K, V> {
    fetch: Arc<dyn BatchFetch<K, V>>,
    state: Arc<Mutex<LoaderState<K, V>>>,
}

impl<K, V> Clone for Loader<K, V> {
    fn clone(&self) -> Self {
        Self {
            fetch: Arc::clone(&self.fetch),
            state: Arc::clone(&self.state),
        }
    }
}

impl<K, V> Loader<K, V>
where
    K: Eq + Hash + Clone + fmt::Display + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(fetch: Arc<dyn BatchFetch<K, V>>) -> Self {
        Self {
            fetch,
            state: Arc::new(Mutex::new(LoaderState::default())),
        }
    }

    /// Load one key, joining the current batch on first sight and
    /// returning the memoized outcome on every later call.
    pub async fn load(&self, key: K) -> Result<V, LoadError> {
        let shared = {
            let mut state = recover(self.state.lock());
            if let Some(existing) = state.memo.get(&key) {
                existing.clone()
            } else {
                let (sender, receiver) = oneshot::channel();
                let shared: SharedLoad<V> = receiver
                    .map(|delivered| match delivered {
                        Ok(result) => result,
                        Err(_) => Err(LoadError::Aborted),
                    })
                    .boxed()
                    .shared();

                state.memo.insert(key.clone(), shared.clone());
                state.waiters.entry(key.clone()).or_default().push(sender);
                if !state.pending_keys.contains(&key) {
                    state.pending_keys.push(key);
                }
                if !state.flush_scheduled {
                    state.flush_scheduled = true;
                    self.schedule_flush();
                }
                shared
            }
        };
        shared.await
    }

    /// Load each key independently, resolving once all settle. Individual
    /// failures stay individual; the call as a whole never fails.
    pub async fn load_many(&self, keys: Vec<K>) -> Vec<Result<V, LoadError>> {
        futures_util::future::join_all(keys.into_iter().map(|key| self.load(key))).await
    }

    /// Forget one memoized key so the next `load` refetches. Required for
    /// read-your-writes within a single request.
    pub fn clear(&self, key: &K) {
        recover(self.state.lock()).memo.remove(key);
    }

    /// Forget every memoized key.
    pub fn clear_all(&self) {
        recover(self.state.lock()).memo.clear();
    }

    /// Seed the memo with an already-known value. A key that is already
    /// memoized keeps its existing outcome.
    pub fn prime(&self, key: K, value: V) {
        let mut state = recover(self.state.lock());
        state
            .memo
            .entry(key)
            .or_insert_with(|| futures_util::future::ready(Ok(value)).boxed().shared());
    }

    fn schedule_flush(&self) {
        let fetch = Arc::clone(&self.fetch);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            // Close the batch only after everything queued in the current
            // turn has had its chance to join.
            tokio::task::yield_now().await;
            Self::flush(fetch, state).await;
        });
    }

    async fn flush(fetch: Arc<dyn BatchFetch<K, V>>, state: Arc<Mutex<LoaderState<K, V>>>) {
        let (keys, mut waiters) = {
            let mut state = recover(state.lock());
            state.flush_scheduled = false;
            (
                std::mem::take(&mut state.pending_keys),
                std::mem::take(&mut state.waiters),
            )
        };
        if keys.is_empty() {
            return;
        }

        match fetch.fetch(&keys).await {
            Ok(items) if items.len() == keys.len() => {
                for (key, item) in keys.into_iter().zip(items) {
                    let result = match item {
                        BatchItem::Found(value) => Ok(value),
                        BatchItem::Missing => Err(LoadError::NotFound {
                            key: key.to_string(),
                        }),
                    };
                    deliver(waiters.remove(&key), &result);
                }
            }
            Ok(items) => {
                let error = LoadError::Misaligned {
                    expected: keys.len(),
                    got: items.len(),
                };
                for senders in waiters.into_values() {
                    deliver(Some(senders), &Err(error.clone()));
                }
            }
            Err(store_error) => {
                let error = LoadError::Fetch(Arc::new(store_error));
                for senders in waiters.into_values() {
                    deliver(Some(senders), &Err(error.clone()));
                }
            }
        }
    }
}

fn deliver<V: Clone>(senders: Option<Vec<ResultSender<V>>>, result: &Result<V, LoadError>) {
    for sender in senders.into_iter().flatten() {
        // A waiter that dropped its future is not an error.
        let _ = sender.send(result.clone());
    }
}

fn recover<G>(result: Result<G, std::sync::PoisonError<G>>) -> G {
    result.unwrap_or_else(std::sync::PoisonError::into_inner)
}
