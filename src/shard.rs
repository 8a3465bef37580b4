use crate::stats::{Op, ShardStats};
use hashbrown::HashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::sync::Arc;

/// One stored entry: the key as the caller gave it, plus the shared value.
pub(crate) struct Slot<K, V> {
    pub key: K,
    pub value: Arc<V>,
}

/// Canonical key -> slot.
pub(crate) type Table<K, V> = HashMap<String, Slot<K, V>, ahash::RandomState>;

/// A single shard containing a HashMap protected by a read-write lock.
///
/// Every method takes the lock for its own duration and releases it before
/// returning. Nothing in here ever holds this lock while acquiring another
/// shard's lock.
pub(crate) struct Shard<K, V> {
    map: RwLock<Table<K, V>>,
    stats: ShardStats,
}

impl<K, V> Shard<K, V> {
    pub fn new(capacity: Option<usize>) -> Self {
        let hasher = ahash::RandomState::new();
        let table = match capacity {
            Some(capacity) => HashMap::with_capacity_and_hasher(capacity, hasher),
            None => HashMap::with_hasher(hasher),
        };

        Self {
            map: RwLock::new(table),
            stats: ShardStats::new(),
        }
    }

    #[inline]
    pub fn read_lock(&self) -> RwLockReadGuard<'_, Table<K, V>> {
        self.stats.record(Op::Lock);
        self.map.read()
    }

    #[inline]
    fn write_lock(&self) -> RwLockWriteGuard<'_, Table<K, V>> {
        self.stats.record(Op::Lock);
        #[cfg(feature = "lock-timing")]
        let start = std::time::Instant::now();
        let guard = self.map.write();
        #[cfg(feature = "lock-timing")]
        self.stats
            .record_lock_wait(u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX));
        guard
    }

    /// Insert or overwrite, returning the displaced value if any.
    pub fn store(&self, canonical: String, key: K, value: V) -> Option<Arc<V>> {
        let slot = Slot {
            key,
            value: Arc::new(value),
        };
        let mut map = self.write_lock();
        self.stats.record(Op::Store);
        map.insert(canonical, slot).map(|previous| previous.value)
    }

    /// Get a value by canonical key. The `Arc` is cloned, the value is not.
    pub fn load(&self, canonical: &str) -> Option<Arc<V>> {
        let map = self.read_lock();
        let result = map.get(canonical).map(|slot| Arc::clone(&slot.value));
        if result.is_some() {
            self.stats.record(Op::Load);
        }
        result
    }

    /// Remove an entry, returning its value. Absent keys are a no-op.
    pub fn delete(&self, canonical: &str) -> Option<Arc<V>> {
        let mut map = self.write_lock();
        let result = map.remove(canonical).map(|slot| slot.value);
        if result.is_some() {
            self.stats.record(Op::Delete);
        }
        result
    }

    pub fn contains(&self, canonical: &str) -> bool {
        self.read_lock().contains_key(canonical)
    }

    /// Number of entries at the moment the lock was held.
    pub fn count(&self) -> usize {
        self.read_lock().len()
    }

    /// Drop every entry present when the lock is taken. Returns how many.
    pub fn clear(&self) -> usize {
        let mut map = self.write_lock();
        let removed = map.len();
        map.clear();
        removed
    }

    pub fn stats(&self) -> crate::stats::ShardOps {
        self.stats.snapshot()
    }
}

impl<K: Clone, V> Shard<K, V> {
    /// Copy out every entry under the read lock.
    pub fn entries(&self) -> Vec<(K, Arc<V>)> {
        let map = self.read_lock();
        map.values()
            .map(|slot| (slot.key.clone(), Arc::clone(&slot.value)))
            .collect()
    }

    /// Visit every entry with the lock *released*.
    ///
    /// Entries are copied out first, so `f` may call back into this shard
    /// (including deleting the entry it is looking at). Stops at the first
    /// error and returns it.
    pub fn try_for_each<E, F>(&self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&K, &V) -> Result<(), E>,
    {
        for (key, value) in self.entries() {
            f(&key, &value)?;
        }
        Ok(())
    }

    pub fn for_each<F>(&self, mut f: F)
    where
        F: FnMut(&K, &V),
    {
        for (key, value) in self.entries() {
            f(&key, &value);
        }
    }
}
