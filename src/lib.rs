//! # fnvshard
//!
//! A concurrent map split across a fixed number of shards, each behind its
//! own lock, with deterministic FNV-based routing.
//!
//! Every key is turned into a canonical string (strings as-is, integers in
//! base 10) and hashed with a 32-bit FNV variant. The shard is
//! `hash % shard_count`, so placement depends only on the key. Operations on
//! different shards never contend. Whole-map operations fan out one task per
//! shard in parallel and wait for all of them.
//!
//! ## Features
//!
//! - **Deterministic routing**: same key, same shard, on every run
//! - **Canonical keys**: `42u8`, `42i64` and `"42"` are the same key
//! - **Parallel aggregates**: `len`, `range` and `clear` fan out with rayon
//! - **Reentrant visitors**: a `range` visitor may delete what it's visiting
//! - **Cancellation**: `*_with` variants take a [`CancelToken`]
//! - **Snapshots**: an explicit, lock-everything consistent copy
//! - **Statistics**: per-shard sizes, op counters behind `metrics`
//!
//! ## Example
//!
//! ```rust
//! use fnvshard::ShardMap;
//!
//! let map = ShardMap::new();
//!
//! for i in 0..10 {
//!     map.store(format!("key{}", i), format!("value{}", i));
//! }
//! assert_eq!(map.len(), 10);
//!
//! if let Some(value) = map.load("key8") {
//!     println!("key8 = {}", *value);
//! }
//!
//! map.range(|key, value| {
//!     println!("{}: {}", key, value);
//! });
//!
//! map.clear();
//! assert_eq!(map.len(), 0);
//! ```
//!
//! ## Configuration
//!
//! ```rust
//! use fnvshard::ShardMapBuilder;
//!
//! let map = ShardMapBuilder::new()
//!     .shard_count(64)?
//!     .capacity_per_shard(256)
//!     .build::<u64, String>()?;
//! # Ok::<(), fnvshard::Error>(())
//! ```

#![deny(missing_docs)]
#![warn(clippy::all)]

/// Cancellation for whole-map operations.
pub mod cancel;
/// Configuration and builder types.
pub mod config;
/// Error types.
pub mod error;
/// Shard routing hash.
pub mod hash;
/// Consistent snapshots.
pub mod iter;
/// Key canonicalization.
pub mod key;
/// Internal shard implementation.
pub mod shard;
/// Main ShardMap implementation.
pub mod shardmap;
/// Statistics and metrics collection.
pub mod stats;

// Re-export main types
pub use cancel::CancelToken;
pub use config::{Config, ShardMapBuilder, DEFAULT_SHARD_COUNT};
pub use error::Error;
pub use hash::fnv1a32;
pub use iter::Snapshot;
pub use key::ShardKey;
pub use shardmap::ShardMap;
pub use stats::{Diagnostics, ShardDiagnostics, ShardOps, Stats};
