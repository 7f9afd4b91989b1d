//! Read Cache
//!
//! Loads each key at most once and replays the cached value to every later
//! reader. Subscribers get a `watch` receiver that already holds the last
//! value. Entries are never evicted.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{watch, Mutex};

use crate::domain::DomainResult;

struct Slot<V> {
    value: watch::Sender<Option<V>>,
    /// Held while this key loads; other keys are not blocked
    loading: Arc<Mutex<()>>,
}

impl<V> Slot<V> {
    fn new(value: Option<V>) -> Self {
        Self {
            value: watch::channel(value).0,
            loading: Arc::new(Mutex::new(())),
        }
    }
}

pub struct ReadCache<V: Clone + Send + Sync + 'static> {
    entries: Mutex<HashMap<String, Slot<V>>>,
}

impl<V: Clone + Send + Sync + 'static> Default for ReadCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync + 'static> ReadCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Cached value for `key`, running `load` only on a miss.
    ///
    /// Concurrent misses on the same key wait for the first load instead of
    /// loading twice. A failed load caches nothing.
    pub async fn get_or_load<F, Fut>(&self, key: &str, load: F) -> DomainResult<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DomainResult<V>>,
    {
        let loading = {
            let mut entries = self.entries.lock().await;
            let slot = entries.entry(key.to_string()).or_insert_with(|| Slot::new(None));
            if let Some(value) = slot.value.borrow().clone() {
                return Ok(value);
            }
            slot.loading.clone()
        };

        let _guard = loading.lock().await;
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let value = load().await?;
        self.publish(key, value.clone()).await;
        Ok(value)
    }

    /// Receiver replaying the current value (`None` until loaded)
    pub async fn subscribe(&self, key: &str) -> watch::Receiver<Option<V>> {
        let mut entries = self.entries.lock().await;
        entries
            .entry(key.to_string())
            .or_insert_with(|| Slot::new(None))
            .value
            .subscribe()
    }

    /// Replace the cached value and notify subscribers
    pub async fn publish(&self, key: &str, value: V) {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some(slot) => {
                slot.value.send_replace(Some(value));
            }
            None => {
                entries.insert(key.to_string(), Slot::new(Some(value)));
            }
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        let entries = self.entries.lock().await;
        entries.get(key).and_then(|slot| slot.value.borrow().clone())
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::{sleep, Duration, Instant};
    use crate::domain::DomainError;

    #[tokio::test]
    async fn test_loads_once() {
        let cache = ReadCache::new();
        let loads = AtomicUsize::new(0);

        for _ in 0..3 {
            let value = cache
                .get_or_load("bob", || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok(42u32)
                })
                .await
                .unwrap();
            assert_eq!(value, 42);
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let cache = ReadCache::<u32>::new();
        let err = cache
            .get_or_load("bob", || async { Err(DomainError::Storage("offline".to_string())) })
            .await;
        assert!(err.is_err());
        assert_eq!(cache.get("bob").await, None);

        let value = cache.get_or_load("bob", || async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_load_does_not_block_other_keys() {
        let cache = ReadCache::new();
        let start = Instant::now();

        let slow = cache.get_or_load("bob", || async {
            sleep(Duration::from_secs(10)).await;
            Ok(1u32)
        });
        let fast = async {
            let value = cache.get_or_load("carol", || async { Ok(2u32) }).await;
            (value, start.elapsed())
        };
        let (slow, (fast, fast_elapsed)) = tokio::join!(slow, fast);

        assert_eq!(slow.unwrap(), 1);
        assert_eq!(fast.unwrap(), 2);
        assert!(fast_elapsed < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_load_once() {
        let cache = ReadCache::new();
        let loads = AtomicUsize::new(0);
        let counter = &loads;
        let load = move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            sleep(Duration::from_millis(100)).await;
            Ok(5u32)
        };

        let (a, b) = tokio::join!(cache.get_or_load("bob", load), cache.get_or_load("bob", load));

        assert_eq!((a.unwrap(), b.unwrap()), (5, 5));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_last_value() {
        let cache = ReadCache::new();
        let mut early = cache.subscribe("bob").await;
        assert_eq!(*early.borrow(), None);

        cache.publish("bob", "first".to_string()).await;
        cache.publish("bob", "second".to_string()).await;

        early.changed().await.unwrap();
        assert_eq!(early.borrow_and_update().as_deref(), Some("second"));

        let late = cache.subscribe("bob").await;
        assert_eq!(late.borrow().as_deref(), Some("second"));
        assert_eq!(cache.len().await, 1);
    }
}
