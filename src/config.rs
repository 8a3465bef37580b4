use crate::error::Error;
use crate::key::ShardKey;

/// Number of shards used when none is configured.
pub const DEFAULT_SHARD_COUNT: usize = 32;

/// Configuration for a ShardMap instance.
///
/// # Choosing a shard count
///
/// More shards mean less contention between single-key operations: with
/// uniformly distributed keys, two writers collide on a lock roughly 1/N of
/// the time. The cost is paid by whole-map operations (`len`, `range`,
/// `clear`), which do one task per shard, and by the fixed per-shard memory.
/// Any count of at least 1 works; powers of two are recommended.
#[derive(Debug, Clone)]
pub struct Config {
    pub(crate) shard_count: usize,
    pub(crate) capacity_per_shard: Option<usize>,
}

impl Config {
    /// Create a new config with defaults (32 shards).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of shards. Must be greater than 0.
    pub fn shard_count(mut self, count: usize) -> Result<Self, Error> {
        if count == 0 {
            return Err(Error::InvalidShardCount);
        }
        self.shard_count = count;
        Ok(self)
    }

    /// Set initial capacity per shard. Total capacity will be approximately
    /// `capacity_per_shard * shard_count`. Omitted by default (HashMap default).
    pub fn capacity_per_shard(mut self, capacity: usize) -> Self {
        self.capacity_per_shard = Some(capacity);
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shard_count: DEFAULT_SHARD_COUNT,
            capacity_per_shard: None,
        }
    }
}

/// Builder for creating a ShardMap with custom configuration.
#[derive(Debug, Default)]
pub struct ShardMapBuilder {
    config: Config,
}

impl ShardMapBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of shards. Must be greater than 0.
    pub fn shard_count(mut self, count: usize) -> Result<Self, Error> {
        self.config = self.config.shard_count(count)?;
        Ok(self)
    }

    /// Set initial capacity per shard. Total capacity will be approximately
    /// `capacity_per_shard * shard_count`.
    pub fn capacity_per_shard(mut self, capacity: usize) -> Self {
        self.config = self.config.capacity_per_shard(capacity);
        self
    }

    /// Build a ShardMap with the configured settings.
    pub fn build<K, V>(self) -> Result<crate::ShardMap<K, V>, Error>
    where
        K: ShardKey + Clone + Send + Sync,
        V: Send + Sync,
    {
        crate::ShardMap::with_config(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new();
        assert_eq!(config.shard_count, 32);
        assert!(config.capacity_per_shard.is_none());
    }

    #[test]
    fn test_shard_count_validation() {
        assert_eq!(
            Config::new().shard_count(0).unwrap_err(),
            Error::InvalidShardCount
        );
        assert_eq!(Config::new().shard_count(1).unwrap().shard_count, 1);
        // Non powers of two are allowed; routing is a plain modulo.
        assert_eq!(Config::new().shard_count(7).unwrap().shard_count, 7);
    }

    #[test]
    fn test_capacity() {
        let config = Config::new().capacity_per_shard(128);
        assert_eq!(config.capacity_per_shard, Some(128));
    }

    #[test]
    fn test_builder_forwards_capacity() {
        let builder = ShardMapBuilder::new().capacity_per_shard(64);
        assert_eq!(builder.config.capacity_per_shard, Some(64));
        assert_eq!(builder.config.shard_count, DEFAULT_SHARD_COUNT);
    }
}
