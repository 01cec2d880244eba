//! Per-key mutual exclusion for the validate-then-append step.
//!
//! The ledger serializes movements per location and per lot instead of taking
//! a global lock; movements against disjoint keys never block each other.
//! Multi-key operations (transfers, lot-linked movements) acquire their keys
//! in sorted order, so acquisition follows one global total order and cannot
//! deadlock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use assetflow_core::{MasterLotId, WarehouseId};
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A serialization key. The derived `Ord` is the global acquisition order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum LockKey {
    /// All movements touching a location (any article, any lot).
    Location(WarehouseId, String),
    /// All movements linked to a master lot (ceiling checks sum across
    /// locations).
    Lot(MasterLotId),
}

/// Registry of per-key async mutexes.
///
/// The registry itself is guarded by a std mutex held only for the map
/// lookup, never across an await. Handles nobody holds anymore are evicted
/// on the next lookup, so the registry tracks keys in use rather than every
/// key ever touched.
#[derive(Debug, Default)]
pub(crate) struct KeyLocks {
    registry: StdMutex<HashMap<LockKey, Arc<Mutex<()>>>>,
}

impl KeyLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn handle(&self, key: &LockKey) -> Arc<Mutex<()>> {
        let mut registry = self.registry.lock().expect("lock registry poisoned");
        // A strong count of 1 means only the registry still holds the handle:
        // every guard clones the Arc, so released keys can be dropped here.
        registry.retain(|_, lock| Arc::strong_count(lock) > 1);
        Arc::clone(registry.entry(key.clone()).or_default())
    }

    /// Acquire all `keys`, sorted and deduplicated, returning the guards.
    ///
    /// The guards release on drop; hold them for the whole validate-then-
    /// append critical section.
    pub(crate) async fn acquire(&self, mut keys: Vec<LockKey>) -> Vec<OwnedMutexGuard<()>> {
        keys.sort();
        keys.dedup();
        let mut guards = Vec::with_capacity(keys.len());
        for key in &keys {
            guards.push(self.handle(key).lock_owned().await);
        }
        guards
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_same_key_is_mutually_exclusive() {
        let locks = Arc::new(KeyLocks::new());
        let key = LockKey::Lot(MasterLotId::new(1));

        let held = locks.acquire(vec![key.clone()]).await;
        let locks2 = Arc::clone(&locks);
        let key2 = key.clone();
        let contender =
            tokio::spawn(async move { locks2.acquire(vec![key2]).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        drop(held);
        contender.await.expect("contender task panicked");
    }

    #[tokio::test]
    async fn test_opposed_multi_key_acquisition_does_not_deadlock() {
        let locks = Arc::new(KeyLocks::new());
        let a = LockKey::Location(WarehouseId::new(1), "A1-01".to_string());
        let b = LockKey::Location(WarehouseId::new(1), "B2-02".to_string());

        let mut tasks = Vec::new();
        for _ in 0..50 {
            let (locks_ab, locks_ba) = (Arc::clone(&locks), Arc::clone(&locks));
            let (a1, b1) = (a.clone(), b.clone());
            let (a2, b2) = (a.clone(), b.clone());
            tasks.push(tokio::spawn(async move {
                drop(locks_ab.acquire(vec![a1, b1]).await);
            }));
            tasks.push(tokio::spawn(async move {
                drop(locks_ba.acquire(vec![b2, a2]).await);
            }));
        }
        let all = async {
            for task in tasks {
                task.await.expect("lock task panicked");
            }
        };
        tokio::time::timeout(Duration::from_secs(5), all)
            .await
            .expect("deadlocked acquiring opposed key orders");
    }

    #[tokio::test]
    async fn test_released_handles_are_evicted() {
        let locks = KeyLocks::new();
        let a = LockKey::Location(WarehouseId::new(1), "A1-01".to_string());
        let b = LockKey::Lot(MasterLotId::new(1));

        drop(locks.acquire(vec![a.clone()]).await);
        let held = locks.acquire(vec![b]).await;

        // Acquiring b evicted the released handle for a; b is live.
        let registry = locks.registry.lock().expect("lock registry poisoned");
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains_key(&a));
        drop(registry);
        drop(held);
    }

    #[tokio::test]
    async fn test_duplicate_keys_are_acquired_once() {
        let locks = KeyLocks::new();
        let key = LockKey::Lot(MasterLotId::new(7));
        let guards = locks.acquire(vec![key.clone(), key]).await;
        assert_eq!(guards.len(), 1);
    }
}
