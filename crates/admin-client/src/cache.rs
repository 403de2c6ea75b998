//! Resource query cache keyed by (endpoint, parameters).
//!
//! Entries are replaced wholesale on refetch, never merged. Equal keys share
//! one cached payload and at most one in-flight fetch; late subscribers join
//! the existing fetch instead of issuing a duplicate request. A failed
//! background refetch keeps the previous payload (stale-but-available) and
//! raises the error flag instead of discarding data.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::ClientError;

/// Default freshness window, matching the dashboard refresh cadence.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30);

/// Canonical cache key: endpoint name plus every parameter that affects the
/// result. Parameters are sorted so equal keys compare equal by value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    endpoint: String,
    params: Vec<(String, String)>,
}

impl QueryKey {
    pub fn new<S: Into<String>>(endpoint: S, mut params: Vec<(String, String)>) -> Self {
        params.sort();
        Self {
            endpoint: endpoint.into(),
            params,
        }
    }

    pub fn bare<S: Into<String>>(endpoint: S) -> Self {
        Self::new(endpoint, Vec::new())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.endpoint.starts_with(prefix)
    }
}

type FetchResult = Result<Arc<Value>, Arc<ClientError>>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

struct CacheEntry {
    payload: Arc<Value>,
    fetched_at: Instant,
    stale: bool,
    error: bool,
}

/// Point-in-time view of a cached entry.
#[derive(Debug, Clone)]
pub struct QueryState {
    pub data: Option<Arc<Value>>,
    pub is_error: bool,
    pub is_stale: bool,
}

struct CacheInner {
    ttl: Duration,
    entries: Mutex<FxHashMap<QueryKey, CacheEntry>>,
    inflight: Mutex<FxHashMap<QueryKey, SharedFetch>>,
    invalidations: broadcast::Sender<String>,
}

impl CacheInner {
    fn complete(&self, key: &QueryKey, result: &FetchResult) {
        self.inflight.lock().remove(key);
        let mut entries = self.entries.lock();
        match result {
            Ok(payload) => {
                entries.insert(
                    key.clone(),
                    CacheEntry {
                        payload: Arc::clone(payload),
                        fetched_at: Instant::now(),
                        stale: false,
                        error: false,
                    },
                );
            }
            Err(err) => {
                // Keep whatever we had; the caller still sees the error.
                if let Some(entry) = entries.get_mut(key) {
                    entry.error = true;
                }
                warn!(endpoint = key.endpoint(), error = %err, "query fetch failed");
            }
        }
    }
}

/// Cheaply cloneable cache handle; clones share entries and in-flight state.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl QueryCache {
    pub fn new(ttl: Duration) -> Self {
        let (invalidations, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(CacheInner {
                ttl,
                entries: Mutex::new(FxHashMap::default()),
                inflight: Mutex::new(FxHashMap::default()),
                invalidations,
            }),
        }
    }

    /// Serve a fresh cached payload, join an in-flight fetch, or run the
    /// fetcher and cache its result.
    pub async fn fetch<F, Fut>(&self, key: &QueryKey, fetcher: F) -> FetchResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ClientError>> + Send + 'static,
    {
        self.fetch_inner(key, fetcher, false).await
    }

    /// Bypass freshness and revalidate now. Still joins an in-flight fetch
    /// for the same key rather than stacking a second request.
    pub async fn refetch<F, Fut>(&self, key: &QueryKey, fetcher: F) -> FetchResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ClientError>> + Send + 'static,
    {
        self.fetch_inner(key, fetcher, true).await
    }

    async fn fetch_inner<F, Fut>(&self, key: &QueryKey, fetcher: F, force: bool) -> FetchResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ClientError>> + Send + 'static,
    {
        if !force && let Some(hit) = self.fresh(key) {
            return Ok(hit);
        }

        let shared = {
            let mut inflight = self.inner.inflight.lock();
            if let Some(existing) = inflight.get(key) {
                existing.clone()
            } else {
                let inner = Arc::clone(&self.inner);
                let key_owned = key.clone();
                let fut = fetcher();
                let shared: SharedFetch = async move {
                    let result = fut.await.map(Arc::new).map_err(Arc::new);
                    inner.complete(&key_owned, &result);
                    result
                }
                .boxed()
                .shared();
                inflight.insert(key.clone(), shared.clone());
                shared
            }
        };
        shared.await
    }

    fn fresh(&self, key: &QueryKey) -> Option<Arc<Value>> {
        let entries = self.inner.entries.lock();
        entries.get(key).and_then(|entry| {
            (!entry.stale && entry.fetched_at.elapsed() < self.inner.ttl)
                .then(|| Arc::clone(&entry.payload))
        })
    }

    /// Current state of a key without touching the network.
    pub fn snapshot(&self, key: &QueryKey) -> Option<QueryState> {
        let entries = self.inner.entries.lock();
        entries.get(key).map(|entry| QueryState {
            data: Some(Arc::clone(&entry.payload)),
            is_error: entry.error,
            is_stale: entry.stale || entry.fetched_at.elapsed() >= self.inner.ttl,
        })
    }

    /// Mark every entry whose endpoint starts with `prefix` as stale and
    /// nudge mounted watchers to revalidate immediately.
    pub fn invalidate_prefix(&self, prefix: &str) {
        let mut hits = 0usize;
        {
            let mut entries = self.inner.entries.lock();
            for (key, entry) in entries.iter_mut() {
                if key.matches_prefix(prefix) {
                    entry.stale = true;
                    hits += 1;
                }
            }
        }
        debug!(prefix, hits, "invalidated query entries");
        let _ = self.inner.invalidations.send(prefix.to_owned());
    }

    /// Revalidate `key` now and then on every `interval` tick while the
    /// returned handle is alive. Invalidations matching the key refetch
    /// immediately. Dropping the handle stops the timer; a fetch already in
    /// flight is left to complete and populate the cache.
    pub fn watch<F, Fut>(&self, key: QueryKey, interval: Duration, fetcher: F) -> RefetchHandle
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, ClientError>> + Send + 'static,
    {
        let cache = self.clone();
        let mut invalidations = self.inner.invalidations.subscribe();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    recv = invalidations.recv() => match recv {
                        Ok(prefix) => {
                            if !key.matches_prefix(&prefix) {
                                continue;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(_)) => {}
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
                // Errors are already recorded on the entry by complete().
                let _ = cache.refetch(&key, || fetcher()).await;
            }
        });
        RefetchHandle { task }
    }
}

/// Guard for a background revalidation task; aborts the timer on drop.
pub struct RefetchHandle {
    task: JoinHandle<()>,
}

impl Drop for RefetchHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_fetcher(
        counter: Arc<AtomicUsize>,
        payload: Value,
    ) -> impl Fn() -> BoxFuture<'static, Result<Value, ClientError>> {
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            let payload = payload.clone();
            async move { Ok(payload) }.boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_fetches_share_one_request() {
        let cache = QueryCache::default();
        let key = QueryKey::bare("admin/dashboard/stats");
        let counter = Arc::new(AtomicUsize::new(0));

        let slow = |counter: Arc<AtomicUsize>| {
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok(serde_json::json!({"total_users": 10}))
                }
            }
        };

        let (a, b) = tokio::join!(
            cache.fetch(&key, slow(Arc::clone(&counter))),
            cache.fetch(&key, slow(Arc::clone(&counter))),
        );

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), b.unwrap());
    }

    #[tokio::test]
    async fn distinct_params_get_distinct_entries() {
        let cache = QueryCache::default();
        let page1 = QueryKey::new(
            "admin/dashboard/users",
            vec![
                ("user_type".into(), "referrer".into()),
                ("page".into(), "1".into()),
            ],
        );
        let page2 = QueryKey::new(
            "admin/dashboard/users",
            vec![
                ("user_type".into(), "referrer".into()),
                ("page".into(), "2".into()),
            ],
        );

        cache
            .fetch(&page1, || async { Ok(serde_json::json!({"page": 1})) })
            .await
            .unwrap();
        cache
            .fetch(&page2, || async { Ok(serde_json::json!({"page": 2})) })
            .await
            .unwrap();

        // Both retrievable from cache without refetching.
        let counter = Arc::new(AtomicUsize::new(0));
        let one = cache
            .fetch(&page1, counting_fetcher(Arc::clone(&counter), Value::Null))
            .await
            .unwrap();
        let two = cache
            .fetch(&page2, counting_fetcher(Arc::clone(&counter), Value::Null))
            .await
            .unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(*one, serde_json::json!({"page": 1}));
        assert_eq!(*two, serde_json::json!({"page": 2}));
    }

    #[tokio::test]
    async fn key_params_are_order_insensitive() {
        let a = QueryKey::new(
            "users",
            vec![("b".into(), "2".into()), ("a".into(), "1".into())],
        );
        let b = QueryKey::new(
            "users",
            vec![("a".into(), "1".into()), ("b".into(), "2".into())],
        );
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn invalidate_prefix_forces_refetch() {
        let cache = QueryCache::default();
        let key = QueryKey::new("withdrawals/admin/all", vec![("status".into(), "pending".into())]);
        let counter = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(Arc::clone(&counter), serde_json::json!([]));

        cache.fetch(&key, &fetcher).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        // Fresh hit, no refetch.
        cache.fetch(&key, &fetcher).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        cache.invalidate_prefix("withdrawals");
        cache.fetch(&key, &fetcher).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_other_prefix_leaves_entry_fresh() {
        let cache = QueryCache::default();
        let key = QueryKey::bare("settings/all");
        let counter = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(Arc::clone(&counter), serde_json::json!([]));

        cache.fetch(&key, &fetcher).await.unwrap();
        cache.invalidate_prefix("withdrawals");
        cache.fetch(&key, &fetcher).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_refetch_keeps_stale_payload_and_flags_error() {
        let cache = QueryCache::default();
        let key = QueryKey::bare("admin/dashboard/stats");

        cache
            .fetch(&key, || async { Ok(serde_json::json!({"total_users": 42})) })
            .await
            .unwrap();
        cache.invalidate_prefix("admin/dashboard");

        let err = cache
            .fetch(&key, || async {
                Err(ClientError::Http {
                    status: 500,
                    body: "boom".to_owned(),
                })
            })
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(500));

        let state = cache.snapshot(&key).expect("entry should survive");
        assert!(state.is_error);
        assert_eq!(
            state.data.as_deref(),
            Some(&serde_json::json!({"total_users": 42}))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn entries_go_stale_after_ttl() {
        let cache = QueryCache::new(Duration::from_secs(30));
        let key = QueryKey::bare("admin/dashboard/stats");
        let counter = Arc::new(AtomicUsize::new(0));
        let fetcher = counting_fetcher(Arc::clone(&counter), Value::Null);

        cache.fetch(&key, &fetcher).await.unwrap();
        tokio::time::advance(Duration::from_secs(31)).await;

        assert!(cache.snapshot(&key).unwrap().is_stale);
        cache.fetch(&key, &fetcher).await.unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn watcher_refetches_on_interval() {
        let cache = QueryCache::new(Duration::from_secs(5));
        let key = QueryKey::bare("admin/dashboard/stats");
        let counter = Arc::new(AtomicUsize::new(0));

        let fetch_counter = Arc::clone(&counter);
        let handle = cache.watch(key.clone(), Duration::from_secs(10), move || {
            fetch_counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(Value::Null) }
        });

        for _ in 0..3 {
            tokio::time::advance(Duration::from_secs(11)).await;
            tokio::task::yield_now().await;
        }
        assert!(counter.load(Ordering::SeqCst) >= 2);
        drop(handle);
    }

    #[tokio::test(start_paused = true)]
    async fn watcher_refetches_immediately_on_invalidation() {
        let cache = QueryCache::new(Duration::from_secs(60));
        let key = QueryKey::new("withdrawals/admin/all", vec![("status".into(), "pending".into())]);
        let counter = Arc::new(AtomicUsize::new(0));

        let fetch_counter = Arc::clone(&counter);
        let _handle = cache.watch(key.clone(), Duration::from_secs(600), move || {
            fetch_counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(serde_json::json!([])) }
        });

        // Initial tick.
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        let initial = counter.load(Ordering::SeqCst);
        assert!(initial >= 1);

        cache.invalidate_prefix("withdrawals");
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }
        assert!(counter.load(Ordering::SeqCst) > initial);
    }
}
