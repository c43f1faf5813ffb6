//! # Client Mirror Cache
//!
//! A bounded-staleness copy of server state for consoles and menu clients.
//!
//! ## Reconciliation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  get_or_load(Products)                                                  │
//! │       │                                                                 │
//! │       ├── entry younger than max_staleness? ──► serve cached            │
//! │       │                                                                 │
//! │       └── missing / too old ──► loader() ──► store ──► serve            │
//! │                                                                         │
//! │  pushed event ──► apply_event ──► evict affected keys                   │
//! │  channel lag  ──► invalidate_all                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A missed push costs at most `max_staleness` of stale data; the server
//! stays the authority on prices and totals.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use menu_notify::{
//!     BroadcastNotifier, CatalogChange, MenuEvent, MirrorCache, MirrorKey, Notification,
//! };
//! use tokio::time::Duration;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let notifier = BroadcastNotifier::new(64);
//! let cache = Arc::new(MirrorCache::new(Duration::from_secs(30)));
//! let _invalidator = Arc::clone(&cache).spawn_invalidator(notifier.subscribe());
//!
//! let menu = cache
//!     .get_or_load(MirrorKey::Products, || async {
//!         Ok::<_, String>(vec!["Margherita", "Cola"])
//!     })
//!     .await;
//! assert_eq!(menu, Ok(vec!["Margherita", "Cola"]));
//!
//! // The invalidator does this for every event published on `notifier`
//! let pushed = Notification::new(MenuEvent::products_changed(CatalogChange::Updated, 1));
//! assert_eq!(cache.apply_event(&pushed).await, 1);
//! assert!(cache.is_empty().await);
//! # }
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::event::{MenuEvent, Notification};

/// What a cached entry holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MirrorKey {
    Products,
    Vouchers,
    TaxSettings,
    Orders,
    Order(String),
}

impl MirrorKey {
    /// Keys whose cached value an event makes stale.
    pub fn affected_by(event: &MenuEvent) -> Vec<MirrorKey> {
        match event {
            MenuEvent::OrderCreated(_) => vec![MirrorKey::Orders],
            MenuEvent::OrderUpdated(e) => {
                vec![MirrorKey::Orders, MirrorKey::Order(e.order_id.clone())]
            }
            MenuEvent::OrderDeleted(e) => {
                vec![MirrorKey::Orders, MirrorKey::Order(e.order_id.clone())]
            }
            MenuEvent::VoucherCreated(_)
            | MenuEvent::VoucherUpdated(_)
            | MenuEvent::VoucherDeleted(_)
            | MenuEvent::VoucherApplied(_) => vec![MirrorKey::Vouchers],
            MenuEvent::ProductsChanged(_) => vec![MirrorKey::Products],
            MenuEvent::TaxSettingsUpdated(_) => vec![MirrorKey::TaxSettings],
        }
    }
}

#[derive(Debug)]
struct Entry<V> {
    value: V,
    loaded_at: Instant,
}

/// Cache of loaded values, each trusted for at most `max_staleness`.
#[derive(Debug)]
pub struct MirrorCache<V> {
    entries: RwLock<HashMap<MirrorKey, Entry<V>>>,
    max_staleness: Duration,
}

impl<V: Clone + Send + Sync + 'static> MirrorCache<V> {
    pub fn new(max_staleness: Duration) -> Self {
        MirrorCache {
            entries: RwLock::new(HashMap::new()),
            max_staleness,
        }
    }

    /// Returns the cached value if fresh enough, otherwise loads and stores
    /// a new one. A loader error is returned and nothing is cached.
    pub async fn get_or_load<F, Fut, E>(&self, key: MirrorKey, loader: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&key) {
                if entry.loaded_at.elapsed() < self.max_staleness {
                    return Ok(entry.value.clone());
                }
            }
        }

        debug!(key = ?key, "Mirror miss, loading");
        let value = loader().await?;

        self.entries.write().await.insert(
            key,
            Entry {
                value: value.clone(),
                loaded_at: Instant::now(),
            },
        );
        Ok(value)
    }

    /// Drops one entry. Returns whether anything was cached under `key`.
    pub async fn invalidate(&self, key: &MirrorKey) -> bool {
        self.entries.write().await.remove(key).is_some()
    }

    pub async fn invalidate_all(&self) {
        self.entries.write().await.clear();
    }

    /// Evicts every entry the event affects. Returns how many were evicted.
    pub async fn apply_event(&self, notification: &Notification) -> usize {
        let keys = MirrorKey::affected_by(&notification.event);
        let mut entries = self.entries.write().await;
        keys.iter().filter(|k| entries.remove(k).is_some()).count()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Applies pushed events until the channel closes.
    ///
    /// Missing events means not knowing what changed, so a lag clears
    /// the whole cache.
    pub fn spawn_invalidator(
        self: Arc<Self>,
        mut receiver: broadcast::Receiver<Notification>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(notification) => {
                        let evicted = self.apply_event(&notification).await;
                        debug!(event = notification.event.kind(), evicted, "Mirror invalidated");
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Mirror lagged, clearing");
                        self.invalidate_all().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::CatalogChange;
    use crate::notifier::{BroadcastNotifier, Notifier};
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn load(cache: &MirrorCache<u32>, key: MirrorKey, calls: &AtomicUsize) -> u32 {
        cache
            .get_or_load(key, || async {
                Ok::<_, String>(calls.fetch_add(1, Ordering::SeqCst) as u32)
            })
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_serves_fresh_then_reloads_stale() {
        let cache = MirrorCache::new(Duration::from_secs(10));
        let calls = AtomicUsize::new(0);

        assert_eq!(load(&cache, MirrorKey::Products, &calls).await, 0);
        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(load(&cache, MirrorKey::Products, &calls).await, 0);

        tokio::time::advance(Duration::from_secs(2)).await;
        assert_eq!(load(&cache, MirrorKey::Products, &calls).await, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_loader_error_not_cached() {
        let cache: MirrorCache<u32> = MirrorCache::new(Duration::from_secs(60));

        let err = cache
            .get_or_load(MirrorKey::Vouchers, || async { Err::<u32, _>("offline") })
            .await;
        assert_eq!(err, Err("offline"));
        assert!(cache.is_empty().await);

        let ok = cache
            .get_or_load(MirrorKey::Vouchers, || async { Ok::<_, &str>(7) })
            .await;
        assert_eq!(ok, Ok(7));
    }

    #[tokio::test]
    async fn test_event_evicts_only_affected_keys() {
        let cache = MirrorCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);
        for key in [
            MirrorKey::Products,
            MirrorKey::Orders,
            MirrorKey::Order("o-1".to_string()),
            MirrorKey::Order("o-2".to_string()),
        ] {
            load(&cache, key, &calls).await;
        }

        let evicted = cache
            .apply_event(&Notification::new(MenuEvent::order_deleted("o-1")))
            .await;
        assert_eq!(evicted, 2);
        assert_eq!(cache.len().await, 2);
        assert!(!cache.invalidate(&MirrorKey::Order("o-1".to_string())).await);
        assert!(cache.invalidate(&MirrorKey::Order("o-2".to_string())).await);
    }

    #[tokio::test]
    async fn test_invalidator_follows_notifier() {
        let notifier = BroadcastNotifier::new(8);
        let cache = Arc::new(MirrorCache::new(Duration::from_secs(60)));
        let calls = AtomicUsize::new(0);
        load(&cache, MirrorKey::Products, &calls).await;
        load(&cache, MirrorKey::TaxSettings, &calls).await;

        let handle = Arc::clone(&cache).spawn_invalidator(notifier.subscribe());
        notifier
            .notify(MenuEvent::products_changed(CatalogChange::DiscountApplied, 6))
            .unwrap();

        // Wait for the invalidator to catch up
        for _ in 0..100 {
            if cache.len().await == 1 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(cache.len().await, 1);
        assert!(cache.invalidate(&MirrorKey::TaxSettings).await);

        drop(notifier);
        handle.await.unwrap();
    }
}
