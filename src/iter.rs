use crate::shard::Shard;
use std::sync::Arc;

/// A consistent point-in-time copy of every entry in a map.
///
/// Unlike [`ShardMap::range`](crate::ShardMap::range), which visits shards
/// independently, a snapshot is taken while *all* shard read locks are held,
/// so its contents reflect a state the map was actually in. The locks are
/// released before this value is returned.
#[derive(Debug, Clone)]
pub struct Snapshot<K, V> {
    entries: Vec<(K, Arc<V>)>,
}

impl<K: Clone, V> Snapshot<K, V> {
    /// Lock every shard in ascending index order, copy, then unlock.
    ///
    /// Acquiring in a fixed order means two concurrent snapshots can't
    /// deadlock; ordinary operations only ever hold one shard lock.
    pub(crate) fn capture(shards: &[Shard<K, V>]) -> Self {
        let guards: Vec<_> = shards.iter().map(|shard| shard.read_lock()).collect();
        let total = guards.iter().map(|guard| guard.len()).sum();

        let mut entries = Vec::with_capacity(total);
        for guard in &guards {
            entries.extend(
                guard
                    .values()
                    .map(|slot| (slot.key.clone(), Arc::clone(&slot.value))),
            );
        }
        drop(guards);

        Self { entries }
    }
}

impl<K, V> Snapshot<K, V> {
    /// Number of entries captured.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map was empty when captured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Borrowing iterator over captured entries, in unspecified order.
    pub fn iter(&self) -> std::slice::Iter<'_, (K, Arc<V>)> {
        self.entries.iter()
    }
}

impl<K, V> IntoIterator for Snapshot<K, V> {
    type Item = (K, Arc<V>);
    type IntoIter = std::vec::IntoIter<(K, Arc<V>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a, K, V> IntoIterator for &'a Snapshot<K, V> {
    type Item = &'a (K, Arc<V>);
    type IntoIter = std::slice::Iter<'a, (K, Arc<V>)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
