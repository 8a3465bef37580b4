use crate::cancel::CancelToken;
use crate::config::{Config, DEFAULT_SHARD_COUNT};
use crate::error::Error;
use crate::hash::{fnv1a32, shard_index};
use crate::iter::Snapshot;
use crate::key::ShardKey;
use crate::shard::Shard;
use crate::stats::{Diagnostics, ShardDiagnostics, ShardOps, Stats};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::sync::Arc;
use tracing::{debug, trace};

/// Concurrent map split into independently locked shards.
///
/// Every key is reduced to its canonical string (see [`ShardKey`]) and routed
/// to shard `fnv1a32(canonical) % shard_count`. Single-key operations lock
/// exactly that one shard. Whole-map operations ([`len`](Self::len),
/// [`range`](Self::range), [`clear`](Self::clear)) run one task per shard on
/// the rayon pool and return once every task has finished.
///
/// # Consistency
///
/// Whole-map operations look at each shard independently and at slightly
/// different instants. Under concurrent writes, `len` may return a total the
/// map never held at any single moment, and `range` may see a store on one
/// shard but miss an earlier one on another. Use [`snapshot`](Self::snapshot)
/// when an atomic view is needed.
///
/// # Example
///
/// ```rust
/// use fnvshard::ShardMap;
///
/// let map = ShardMap::new();
/// map.store("key1", "value1");
///
/// if let Some(value) = map.load(&"key1") {
///     println!("Found: {}", *value);
/// }
/// ```
pub struct ShardMap<K, V> {
    shards: Vec<Shard<K, V>>,
}

impl<K, V> ShardMap<K, V>
where
    K: ShardKey + Clone + Send + Sync,
    V: Send + Sync,
{
    /// Create a new map with 32 shards.
    pub fn new() -> Self {
        Self::from_parts(DEFAULT_SHARD_COUNT, None)
    }

    /// Create a new map with `shard_count` shards.
    pub fn with_shards(shard_count: usize) -> Result<Self, Error> {
        Self::with_config(Config::new().shard_count(shard_count)?)
    }

    /// Create a new map with custom config.
    pub fn with_config(config: Config) -> Result<Self, Error> {
        if config.shard_count == 0 {
            return Err(Error::InvalidShardCount);
        }
        Ok(Self::from_parts(config.shard_count, config.capacity_per_shard))
    }

    fn from_parts(shard_count: usize, capacity_per_shard: Option<usize>) -> Self {
        let shards = (0..shard_count)
            .map(|_| Shard::new(capacity_per_shard))
            .collect();
        debug!(shard_count, ?capacity_per_shard, "created shard map");
        Self { shards }
    }

    /// Number of shards, fixed for the lifetime of the map.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Index of the shard that owns `key`. Pure function of the key.
    ///
    /// ```rust
    /// use fnvshard::ShardMap;
    ///
    /// let map: ShardMap<u32, ()> = ShardMap::new();
    /// // fnv1a32("42") == 494316163, and 494316163 % 32 == 3
    /// assert_eq!(map.shard_for(&42u32), 3);
    /// ```
    pub fn shard_for<Q>(&self, key: &Q) -> usize
    where
        Q: ShardKey + ?Sized,
    {
        shard_index(fnv1a32(&key.canonical()), self.shards.len())
    }

    #[inline]
    fn shard(&self, canonical: &str) -> &Shard<K, V> {
        &self.shards[shard_index(fnv1a32(canonical), self.shards.len())]
    }

    /// Insert or overwrite. Returns the previous value, if any.
    ///
    /// Keys are equal when their canonical strings are, so storing `42u8`
    /// replaces an entry stored under `42i64` or `"42"`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fnvshard::ShardMap;
    ///
    /// let map = ShardMap::new();
    /// assert!(map.store("key", "value").is_none());
    /// assert_eq!(map.store("key", "new_value").unwrap().as_ref(), &"value");
    /// ```
    pub fn store(&self, key: K, value: V) -> Option<Arc<V>> {
        let canonical = key.canonical().into_owned();
        self.shard(&canonical).store(canonical, key, value)
    }

    /// Get a value by key. Returns an `Arc<V>` so you can share it without copying.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fnvshard::ShardMap;
    ///
    /// let map = ShardMap::new();
    /// map.store(42u64, "answer");
    ///
    /// assert_eq!(*map.load(&42u64).unwrap(), "answer");
    /// assert!(map.load(&7u64).is_none());
    /// ```
    pub fn load<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        Q: ShardKey + ?Sized,
    {
        let canonical = key.canonical();
        self.shard(&canonical).load(&canonical)
    }

    /// Remove an entry, returning its value. Deleting an absent key is a no-op.
    pub fn delete<Q>(&self, key: &Q) -> Option<Arc<V>>
    where
        Q: ShardKey + ?Sized,
    {
        let canonical = key.canonical();
        self.shard(&canonical).delete(&canonical)
    }

    /// Check if a key exists without cloning the value.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        Q: ShardKey + ?Sized,
    {
        let canonical = key.canonical();
        self.shard(&canonical).contains(&canonical)
    }

    /// Total number of entries, counted shard by shard in parallel.
    ///
    /// Not an atomic snapshot; see the type-level docs.
    pub fn len(&self) -> usize {
        self.shards.par_iter().map(Shard::count).sum()
    }

    /// Check if the map is empty. Same consistency as [`len`](Self::len).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Call `visitor` once per entry, one parallel task per shard.
    ///
    /// `visitor` may run on several threads at once (never twice at once for
    /// the same shard) and may call back into the map, including deleting
    /// the entry it is visiting. Order is unspecified.
    ///
    /// # Example
    ///
    /// ```rust
    /// use fnvshard::ShardMap;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    ///
    /// let map = ShardMap::new();
    /// map.store("key1", 1);
    /// map.store("key2", 2);
    ///
    /// let sum = AtomicUsize::new(0);
    /// map.range(|_key, value| {
    ///     sum.fetch_add(*value, Ordering::Relaxed);
    /// });
    /// assert_eq!(sum.into_inner(), 3);
    /// ```
    pub fn range<F>(&self, visitor: F)
    where
        F: Fn(&K, &V) + Sync,
    {
        self.shards
            .par_iter()
            .for_each(|shard| shard.for_each(&visitor));
    }

    /// Like [`range`](Self::range), with a fallible visitor.
    ///
    /// A shard stops visiting at its first error. Other shards keep going to
    /// completion, and once all have finished the first error recorded is
    /// returned.
    pub fn try_range<E, F>(&self, visitor: F) -> Result<(), E>
    where
        F: Fn(&K, &V) -> Result<(), E> + Sync,
        E: Send,
    {
        let result = self.fan_out(|index, shard| {
            shard.try_for_each(&visitor).inspect_err(|_| {
                trace!(shard = index, "visitor failed, shard traversal stopped");
            })
        });
        if result.is_err() {
            debug!("range finished with a visitor error");
        }
        result
    }

    /// Remove every entry, one parallel task per shard.
    ///
    /// A store racing with this call may survive it.
    pub fn clear(&self) {
        let removed: usize = self.shards.par_iter().map(Shard::clear).sum();
        debug!(removed, "cleared shard map");
    }

    /// [`len`](Self::len) that stops early once `token` is cancelled.
    ///
    /// Returns [`Error::Cancelled`] if any shard task saw the cancellation.
    /// Every task is still joined before returning.
    pub fn len_with(&self, token: &CancelToken) -> Result<usize, Error> {
        let counts: Vec<Result<usize, Error>> = self
            .shards
            .par_iter()
            .enumerate()
            .map(|(index, shard)| -> Result<usize, Error> {
                checkpoint(token, index)?;
                Ok(shard.count())
            })
            .collect();
        counts.into_iter().sum::<Result<usize, Error>>().inspect_err(|_| {
            debug!("len cancelled");
        })
    }

    /// [`range`](Self::range) that stops visiting once `token` is cancelled.
    ///
    /// The token is checked before each shard starts and between entries.
    /// Returns [`Error::Cancelled`] if any shard was cut short; entries
    /// already visited stay visited.
    pub fn range_with<F>(&self, token: &CancelToken, visitor: F) -> Result<(), Error>
    where
        F: Fn(&K, &V) + Sync,
    {
        self.fan_out(|index, shard| -> Result<(), Error> {
            checkpoint(token, index)?;
            shard.try_for_each(|key, value| -> Result<(), Error> {
                checkpoint(token, index)?;
                visitor(key, value);
                Ok(())
            })
        })
        .inspect_err(|_| debug!("range cancelled"))
    }

    /// [`clear`](Self::clear) that skips shards not yet started once `token`
    /// is cancelled. A shard is either fully cleared or left untouched.
    pub fn clear_with(&self, token: &CancelToken) -> Result<(), Error> {
        self.fan_out(|index, shard| -> Result<(), Error> {
            checkpoint(token, index)?;
            shard.clear();
            Ok(())
        })
        .inspect_err(|_| debug!("clear cancelled"))
    }

    /// Run `task` on every shard in parallel and wait for all of them.
    ///
    /// No task is skipped because another failed; the first error to be
    /// recorded is returned after the join.
    fn fan_out<E, T>(&self, task: T) -> Result<(), E>
    where
        T: Fn(usize, &Shard<K, V>) -> Result<(), E> + Sync,
        E: Send,
    {
        let first_error = Mutex::new(None);
        self.shards
            .par_iter()
            .enumerate()
            .for_each(|(index, shard)| {
                if let Err(err) = task(index, shard) {
                    let mut slot = first_error.lock();
                    if slot.is_none() {
                        *slot = Some(err);
                    }
                }
            });

        match first_error.into_inner() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Copy every entry while holding all shard locks at once.
    ///
    /// Locks are taken in ascending shard order and released before this
    /// returns. Writers to any shard wait for the copy to finish, so this is
    /// far more disruptive than [`range`](Self::range).
    ///
    /// # Example
    ///
    /// ```rust
    /// use fnvshard::ShardMap;
    ///
    /// let map = ShardMap::new();
    /// map.store("key1", "value1");
    /// map.store("key2", "value2");
    ///
    /// let snapshot = map.snapshot();
    /// assert_eq!(snapshot.len(), 2);
    /// for (key, value) in snapshot {
    ///     println!("{}: {}", key, *value);
    /// }
    /// ```
    pub fn snapshot(&self) -> Snapshot<K, V> {
        Snapshot::capture(&self.shards)
    }

    /// Number of entries per shard (index = shard index).
    pub fn shard_loads(&self) -> Vec<usize> {
        self.shards.par_iter().map(Shard::count).collect()
    }

    /// Get detailed statistics about the map and its shards.
    pub fn stats(&self) -> Stats {
        let shard_sizes = self.shard_loads();
        let operations: Vec<ShardOps> = self.shards.iter().map(|s| s.stats()).collect();
        let size: usize = shard_sizes.iter().sum();

        Stats {
            size,
            shard_sizes,
            operations,
        }
    }

    /// Per-shard load and, with the `metrics` feature, operation counts.
    pub fn diagnostics(&self) -> Diagnostics {
        let shards = self
            .shards
            .iter()
            .map(|shard| ShardDiagnostics {
                entries: shard.count(),
                ops: shard.stats(),
            })
            .collect();
        Diagnostics::from_shards(shards)
    }
}

impl<K, V> Default for ShardMap<K, V>
where
    K: ShardKey + Clone + Send + Sync,
    V: Send + Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> std::fmt::Debug for ShardMap<K, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardMap")
            .field("shard_count", &self.shards.len())
            .finish_non_exhaustive()
    }
}

#[inline]
fn checkpoint(token: &CancelToken, shard: usize) -> Result<(), Error> {
    if token.is_cancelled() {
        trace!(shard, "fan-out task observed cancellation");
        return Err(Error::Cancelled);
    }
    Ok(())
}
