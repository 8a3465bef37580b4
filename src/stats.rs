//! Statistics and diagnostics types.

#[cfg(feature = "metrics")]
use std::sync::atomic::{AtomicU64, Ordering};

/// Per-shard operation statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShardOps {
    /// Number of successful loads on this shard.
    pub loads: u64,
    /// Number of stores on this shard. An overwrite counts as a store.
    pub stores: u64,
    /// Number of deletes that removed an entry.
    pub deletes: u64,
    /// Number of lock acquisitions (0 when metrics feature disabled).
    pub lock_acquisitions: u64,
    /// Cumulative write-lock wait time in nanoseconds (0 when lock-timing disabled).
    pub lock_wait_nanos: u64,
}

impl ShardOps {
    /// Loads + stores + deletes.
    pub fn total(&self) -> u64 {
        self.loads + self.stores + self.deletes
    }
}

/// Operations a shard counts when the `metrics` feature is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Op {
    Load,
    Store,
    Delete,
    Lock,
}

/// Per-shard counters, one relaxed atomic per [`Op`].
#[cfg(feature = "metrics")]
#[derive(Default)]
pub(crate) struct ShardStats {
    counts: [AtomicU64; 4],
    #[cfg(feature = "lock-timing")]
    lock_wait_nanos: AtomicU64,
}

#[cfg(feature = "metrics")]
impl ShardStats {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record(&self, op: Op) {
        self.counts[op as usize].fetch_add(1, Ordering::Relaxed);
    }

    #[cfg(feature = "lock-timing")]
    #[inline]
    pub fn record_lock_wait(&self, nanos: u64) {
        self.lock_wait_nanos.fetch_add(nanos, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ShardOps {
        let count = |op: Op| self.counts[op as usize].load(Ordering::Relaxed);
        ShardOps {
            loads: count(Op::Load),
            stores: count(Op::Store),
            deletes: count(Op::Delete),
            lock_acquisitions: count(Op::Lock),
            #[cfg(feature = "lock-timing")]
            lock_wait_nanos: self.lock_wait_nanos.load(Ordering::Relaxed),
            #[cfg(not(feature = "lock-timing"))]
            lock_wait_nanos: 0,
        }
    }
}

/// Zero-sized placeholder when metrics are disabled.
#[cfg(not(feature = "metrics"))]
pub(crate) struct ShardStats;

#[cfg(not(feature = "metrics"))]
impl ShardStats {
    pub fn new() -> Self {
        ShardStats
    }

    #[inline]
    pub fn record(&self, _op: Op) {}

    pub fn snapshot(&self) -> ShardOps {
        ShardOps::default()
    }
}

/// Aggregate statistics for a ShardMap instance.
///
/// Gathered shard by shard, so `size` carries the same weak consistency as
/// [`ShardMap::len`](crate::ShardMap::len).
#[derive(Debug, Clone)]
pub struct Stats {
    /// Total number of entries across all shards.
    pub size: usize,
    /// Number of entries in each shard.
    pub shard_sizes: Vec<usize>,
    /// Operation counts for each shard.
    pub operations: Vec<ShardOps>,
}

/// Per-shard diagnostics snapshot.
#[derive(Debug, Clone)]
pub struct ShardDiagnostics {
    /// Number of entries in this shard.
    pub entries: usize,
    /// Operation counters (all zero when metrics disabled).
    pub ops: ShardOps,
}

/// Structured snapshot for load-balance introspection.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    /// Total number of entries across all shards.
    pub total_entries: usize,
    /// Per-shard diagnostics.
    pub shards: Vec<ShardDiagnostics>,
    /// Total load + store + delete operations (0 when metrics disabled).
    pub total_operations: u64,
    /// Average load (entries) per shard.
    pub avg_load_per_shard: f64,
    /// Max load / avg load ratio; 0.0 for an empty map.
    pub max_load_ratio: f64,
}

impl Diagnostics {
    pub(crate) fn from_shards(shards: Vec<ShardDiagnostics>) -> Self {
        let total_entries: usize = shards.iter().map(|s| s.entries).sum();
        let total_operations = shards.iter().map(|s| s.ops.total()).sum();
        let avg_load_per_shard = if shards.is_empty() {
            0.0
        } else {
            total_entries as f64 / shards.len() as f64
        };
        let max_entries = shards.iter().map(|s| s.entries).max().unwrap_or(0);
        let max_load_ratio = if avg_load_per_shard > 0.0 {
            max_entries as f64 / avg_load_per_shard
        } else {
            0.0
        };

        Self {
            total_entries,
            shards,
            total_operations,
            avg_load_per_shard,
            max_load_ratio,
        }
    }
}
