use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};
use tokio::time::Instant;

use crate::{log_debug, log_info, log_warn};

use super::entry::{CacheEntry, Freshness, Snapshot};
use super::FetchError;

const ENABLE_LOGS: bool = true;

/// Source of one collection, usually a remote list endpoint.
#[async_trait]
pub trait Fetcher<T>: Send + Sync + 'static {
    async fn fetch(&self) -> anyhow::Result<Vec<T>>;
}

type RefreshResult<T> = Result<Arc<Vec<T>>, FetchError>;
type RefreshSender<T> = broadcast::Sender<RefreshResult<T>>;

struct CacheState<T> {
    entry: Option<CacheEntry<T>>,
    /// Generation the refresh started under, and its sender. The refresh task
    /// owns the only strong reference; if it dies the upgrade fails.
    in_flight: Option<(u64, Weak<RefreshSender<T>>)>,
    /// Bumped by `invalidate`/`dispose`; a refresh that started under an older
    /// generation is stored but never counted as fresh.
    generation: u64,
    /// Generation the stored entry was fetched under.
    entry_generation: u64,
}

struct Inner<T> {
    collection: &'static str,
    freshness: Duration,
    fetcher: Arc<dyn Fetcher<T>>,
    state: Mutex<CacheState<T>>,
}

/// Time-boxed snapshot of one remote collection with stale-on-error fallback.
///
/// Concurrent `get` calls that need the network share a single refresh. The
/// refresh runs on its own task so a caller that goes away does not cancel it.
pub struct CollectionCache<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for CollectionCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> CollectionCache<T>
where
    T: Send + Sync + 'static,
{
    pub fn new(collection: &'static str, freshness: Duration, fetcher: Arc<dyn Fetcher<T>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                collection,
                freshness,
                fetcher,
                state: Mutex::new(CacheState {
                    entry: None,
                    in_flight: None,
                    generation: 0,
                    entry_generation: 0,
                }),
            }),
        }
    }

    /// Return the collection, refreshing when stale or when forced.
    ///
    /// A failed refresh falls back to the previous snapshot, fresh or not,
    /// marked [`Freshness::Stale`]. Only when there is no previous snapshot is
    /// the failure returned.
    pub async fn get(&self, force_refresh: bool) -> Result<Snapshot<T>, FetchError> {
        let mut receiver = {
            let mut state = self.inner.state.lock().await;

            if !force_refresh {
                if let Some(entry) = state
                    .entry
                    .as_ref()
                    .filter(|entry| entry.is_fresh(self.inner.freshness, Instant::now()))
                {
                    log_debug!("{} served from cache", self.inner.collection);
                    return Ok(Snapshot {
                        records: entry.records.clone(),
                        freshness: Freshness::Cached,
                    });
                }
            }

            // A refresh that began before the last invalidation may carry data
            // older than the write that invalidated it; never join it.
            let generation = state.generation;
            let joined = state
                .in_flight
                .as_ref()
                .filter(|(started, _)| *started == generation)
                .and_then(|(_, sender)| sender.upgrade());
            match joined {
                Some(sender) => {
                    log_debug!("{} joining in-flight refresh", self.inner.collection);
                    sender.subscribe()
                }
                None => self.start_refresh(&mut state),
            }
        };

        match receiver.recv().await {
            Ok(Ok(records)) => Ok(Snapshot {
                records,
                freshness: Freshness::Refreshed,
            }),
            Ok(Err(err)) => self.fallback(err).await,
            Err(_) => {
                log_warn!("{} refresh ended without a result", self.inner.collection);
                self.fallback(FetchError::Abandoned {
                    collection: self.inner.collection,
                })
                .await
            }
        }
    }

    /// Force the next `get` to refetch. The last snapshot is kept as fallback.
    pub async fn invalidate(&self) {
        let mut state = self.inner.state.lock().await;
        state.generation = state.generation.wrapping_add(1);
        if let Some(entry) = state.entry.as_mut() {
            entry.invalidated = true;
        }
        log_info!("{} cache invalidated", self.inner.collection);
    }

    /// Drop the snapshot entirely; the next `get` has no fallback.
    pub async fn dispose(&self) {
        let mut state = self.inner.state.lock().await;
        state.generation = state.generation.wrapping_add(1);
        state.entry = None;
    }

    pub async fn age(&self) -> Option<Duration> {
        let state = self.inner.state.lock().await;
        state.entry.as_ref().map(|entry| entry.age(Instant::now()))
    }

    pub async fn has_snapshot(&self) -> bool {
        self.inner.state.lock().await.entry.is_some()
    }

    fn start_refresh(&self, state: &mut CacheState<T>) -> broadcast::Receiver<RefreshResult<T>> {
        let (sender, receiver) = broadcast::channel(1);
        let sender = Arc::new(sender);
        let generation = state.generation;
        state.in_flight = Some((generation, Arc::downgrade(&sender)));

        let inner = self.inner.clone();
        tokio::spawn(async move {
            let result = inner.fetcher.fetch().await;

            let outcome = {
                let mut state = inner.state.lock().await;
                if matches!(state.in_flight, Some((started, _)) if started == generation) {
                    state.in_flight = None;
                }
                match result {
                    Ok(records) => {
                        let records = Arc::new(records);
                        let superseded =
                            state.entry.is_some() && generation < state.entry_generation;
                        if superseded {
                            log_debug!(
                                "{} refresh superseded by a newer one; not stored",
                                inner.collection
                            );
                        } else {
                            let mut entry = CacheEntry::new(records.clone(), Instant::now());
                            entry.invalidated = state.generation != generation;
                            log_info!(
                                "{} refreshed ({} records{})",
                                inner.collection,
                                records.len(),
                                if entry.invalidated { ", invalidated during fetch" } else { "" }
                            );
                            state.entry = Some(entry);
                            state.entry_generation = generation;
                        }
                        Ok(records)
                    }
                    Err(err) => {
                        let err = FetchError::transient(inner.collection, &err);
                        if state.entry.is_some() {
                            log_warn!("{err}; serving previous snapshot");
                        } else {
                            log_warn!("{err}; no snapshot to fall back to");
                        }
                        Err(err)
                    }
                }
            };

            // No receivers left is fine: every caller may have gone away.
            let _ = sender.send(outcome);
        });

        receiver
    }

    async fn fallback(&self, err: FetchError) -> Result<Snapshot<T>, FetchError> {
        let state = self.inner.state.lock().await;
        match state.entry.as_ref() {
            Some(entry) => Ok(Snapshot {
                records: entry.records.clone(),
                freshness: Freshness::Stale(err),
            }),
            None => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingFetcher {
        calls: AtomicUsize,
        fail: AtomicBool,
        panic: AtomicBool,
        delay: Duration,
    }

    impl CountingFetcher {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
                panic: AtomicBool::new(false),
                delay,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Fetcher<u32> for CountingFetcher {
        async fn fetch(&self) -> anyhow::Result<Vec<u32>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) as u32 + 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.panic.load(Ordering::SeqCst) {
                panic!("fetcher blew up");
            }
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("remote down");
            }
            Ok(vec![call])
        }
    }

    fn cache(fetcher: &Arc<CountingFetcher>) -> CollectionCache<u32> {
        CollectionCache::new("numbers", Duration::from_secs(300), fetcher.clone())
    }

    #[tokio::test(start_paused = true)]
    async fn serves_from_memory_inside_window() {
        let fetcher = CountingFetcher::new(Duration::ZERO);
        let cache = cache(&fetcher);

        let first = cache.get(false).await.unwrap();
        assert_eq!(first.freshness, Freshness::Refreshed);
        assert_eq!(*first.records, vec![1]);

        tokio::time::advance(Duration::from_secs(120)).await;
        let second = cache.get(false).await.unwrap();
        assert_eq!(second.freshness, Freshness::Cached);
        assert_eq!(fetcher.calls(), 1);

        tokio::time::advance(Duration::from_secs(181)).await;
        let third = cache.get(false).await.unwrap();
        assert_eq!(third.freshness, Freshness::Refreshed);
        assert_eq!(*third.records, vec![2]);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn force_refresh_bypasses_window() {
        let fetcher = CountingFetcher::new(Duration::ZERO);
        let cache = cache(&fetcher);

        cache.get(false).await.unwrap();
        let forced = cache.get(true).await.unwrap();
        assert_eq!(*forced.records, vec![2]);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn failure_with_previous_snapshot_is_stale_not_error() {
        let fetcher = CountingFetcher::new(Duration::ZERO);
        let cache = cache(&fetcher);

        cache.get(false).await.unwrap();
        fetcher.fail.store(true, Ordering::SeqCst);

        let snapshot = cache.get(true).await.unwrap();
        assert!(snapshot.is_stale());
        assert_eq!(*snapshot.records, vec![1]);
        assert!(matches!(
            snapshot.stale_reason(),
            Some(FetchError::Transient { collection: "numbers", .. })
        ));
    }

    #[tokio::test]
    async fn failure_without_snapshot_propagates() {
        let fetcher = CountingFetcher::new(Duration::ZERO);
        fetcher.fail.store(true, Ordering::SeqCst);
        let cache = cache(&fetcher);

        let err = cache.get(false).await.unwrap_err();
        assert!(err.to_string().contains("remote down"));
        assert!(!cache.has_snapshot().await);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch_but_keeps_fallback() {
        let fetcher = CountingFetcher::new(Duration::ZERO);
        let cache = cache(&fetcher);

        cache.get(false).await.unwrap();
        cache.invalidate().await;

        let refreshed = cache.get(false).await.unwrap();
        assert_eq!(refreshed.freshness, Freshness::Refreshed);
        assert_eq!(fetcher.calls(), 2);

        cache.invalidate().await;
        fetcher.fail.store(true, Ordering::SeqCst);
        let fallback = cache.get(false).await.unwrap();
        assert!(fallback.is_stale());
        assert_eq!(*fallback.records, vec![2]);
    }

    #[tokio::test]
    async fn dispose_drops_fallback() {
        let fetcher = CountingFetcher::new(Duration::ZERO);
        let cache = cache(&fetcher);

        cache.get(false).await.unwrap();
        cache.dispose().await;
        fetcher.fail.store(true, Ordering::SeqCst);
        assert!(cache.get(false).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_gets_share_one_fetch() {
        let fetcher = CountingFetcher::new(Duration::from_millis(50));
        let cache = cache(&fetcher);

        let (a, b, c) = tokio::join!(cache.get(false), cache.get(true), cache.get(false));
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(*a.unwrap().records, vec![1]);
        assert_eq!(*b.unwrap().records, vec![1]);
        assert_eq!(*c.unwrap().records, vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_failures_all_see_the_error() {
        let fetcher = CountingFetcher::new(Duration::from_millis(50));
        fetcher.fail.store(true, Ordering::SeqCst);
        let cache = cache(&fetcher);

        let (a, b) = tokio::join!(cache.get(false), cache.get(false));
        assert_eq!(fetcher.calls(), 1);
        assert!(a.is_err());
        assert_eq!(a.unwrap_err(), b.unwrap_err());
    }

    #[tokio::test(start_paused = true)]
    async fn invalidation_during_fetch_leaves_result_stale() {
        let fetcher = CountingFetcher::new(Duration::from_millis(50));
        let cache = cache(&fetcher);

        let (first, _) = tokio::join!(cache.get(false), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cache.invalidate().await;
        });
        assert_eq!(*first.unwrap().records, vec![1]);

        let next = cache.get(false).await.unwrap();
        assert_eq!(next.freshness, Freshness::Refreshed);
        assert_eq!(fetcher.calls(), 2);
    }

    #[tokio::test]
    async fn dropped_caller_does_not_cancel_refresh() {
        let fetcher = CountingFetcher::new(Duration::from_millis(20));
        let cache = cache(&fetcher);

        let pending = tokio::time::timeout(Duration::from_millis(1), cache.get(false)).await;
        assert!(pending.is_err());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let snapshot = cache.get(false).await.unwrap();
        assert_eq!(snapshot.freshness, Freshness::Cached);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn age_tracks_snapshot() {
        let fetcher = CountingFetcher::new(Duration::ZERO);
        let cache = cache(&fetcher);
        assert!(cache.age().await.is_none());
        cache.get(false).await.unwrap();
        assert!(cache.age().await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn get_after_invalidate_does_not_join_older_refresh() {
        let fetcher = CountingFetcher::new(Duration::from_millis(50));
        let cache = cache(&fetcher);

        let (first, second) = tokio::join!(cache.get(false), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            cache.invalidate().await;
            cache.get(false).await
        });
        assert_eq!(*first.unwrap().records, vec![1]);

        let second = second.unwrap();
        assert_eq!(second.freshness, Freshness::Refreshed);
        assert_eq!(*second.records, vec![2]);
        assert_eq!(fetcher.calls(), 2);

        let cached = cache.get(false).await.unwrap();
        assert_eq!(cached.freshness, Freshness::Cached);
        assert_eq!(*cached.records, vec![2]);
    }

    #[tokio::test]
    async fn panicking_fetch_without_snapshot_is_abandoned() {
        let fetcher = CountingFetcher::new(Duration::ZERO);
        fetcher.panic.store(true, Ordering::SeqCst);
        let cache = cache(&fetcher);

        let result = tokio::time::timeout(Duration::from_secs(5), cache.get(false))
            .await
            .expect("get must return after the refresh task dies");
        assert_eq!(
            result.unwrap_err(),
            FetchError::Abandoned {
                collection: "numbers"
            }
        );
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn panicking_fetch_falls_back_to_previous_snapshot() {
        let fetcher = CountingFetcher::new(Duration::ZERO);
        let cache = cache(&fetcher);
        cache.get(false).await.unwrap();

        fetcher.panic.store(true, Ordering::SeqCst);
        let snapshot = cache.get(true).await.unwrap();
        assert!(snapshot.is_stale());
        assert_eq!(*snapshot.records, vec![1]);
        assert!(matches!(
            snapshot.stale_reason(),
            Some(FetchError::Abandoned { .. })
        ));
        assert_eq!(fetcher.calls(), 2);
    }
}
