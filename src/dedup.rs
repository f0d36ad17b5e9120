//! Concurrent deduplicating entry set
//!
//! Dictionary chunks are scanned on several rayon workers at once, all
//! inserting into one set. Sharding by hash keeps lock contention low.

use ahash::RandomState;
use hashbrown::HashSet;
use parking_lot::RwLock;
use std::hash::{BuildHasher, Hash, Hasher};

/// Sharded in-memory set for parallel inserts
///
/// Iteration order of the collected entries is unspecified.
pub struct ShardedDeduplicator {
    shards: Vec<RwLock<HashSet<String, RandomState>>>,
    hasher: RandomState,
}

impl ShardedDeduplicator {
    pub fn new(num_shards: usize) -> Self {
        Self::with_capacity(num_shards, 0)
    }

    pub fn with_capacity(num_shards: usize, capacity_per_shard: usize) -> Self {
        let shards = (0..num_shards.max(1))
            .map(|_| {
                RwLock::new(HashSet::with_capacity_and_hasher(
                    capacity_per_shard,
                    RandomState::new(),
                ))
            })
            .collect();

        Self {
            shards,
            hasher: RandomState::new(),
        }
    }

    /// Shard count sized for the current machine
    pub fn for_workers() -> Self {
        Self::new(num_cpus::get() * 4)
    }

    fn get_shard_index(&self, item: &str) -> usize {
        let mut hasher = self.hasher.build_hasher();
        item.hash(&mut hasher);
        hasher.finish() as usize % self.shards.len()
    }

    /// Insert an item, returning true if it was not seen before
    pub fn insert(&self, item: &str) -> bool {
        let shard_idx = self.get_shard_index(item);
        if self.shards[shard_idx].read().contains(item) {
            return false;
        }
        self.shards[shard_idx].write().insert(item.to_string())
    }

    pub fn insert_owned(&self, item: String) -> bool {
        let shard_idx = self.get_shard_index(&item);
        self.shards[shard_idx].write().insert(item)
    }

    #[cfg(test)]
    fn contains(&self, item: &str) -> bool {
        let shard_idx = self.get_shard_index(item);
        self.shards[shard_idx].read().contains(item)
    }

    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the set, returning every unique entry
    pub fn into_entries(self) -> Vec<String> {
        let mut entries = Vec::with_capacity(self.len());
        for shard in self.shards {
            entries.extend(shard.into_inner());
        }
        entries
    }
}

impl Default for ShardedDeduplicator {
    fn default() -> Self {
        Self::for_workers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    #[test]
    fn test_sharded_deduplicator() {
        let dedup = ShardedDeduplicator::new(4);

        assert!(dedup.insert("test1"));
        assert!(dedup.insert("test2"));
        assert!(dedup.insert_owned("test3".to_string()));
        assert!(!dedup.insert("test1"));
        assert!(!dedup.insert_owned("test3".to_string()));

        assert_eq!(dedup.len(), 3);
        assert!(dedup.contains("test2"));
        assert!(!dedup.contains("test4"));
    }

    #[test]
    fn test_parallel_inserts() {
        let dedup = ShardedDeduplicator::new(8);

        (0..10_000u32).into_par_iter().for_each(|i| {
            dedup.insert(&(i % 1000).to_string());
        });

        let mut entries = dedup.into_entries();
        entries.sort_by_key(|e| e.parse::<u32>().unwrap());
        assert_eq!(entries.len(), 1000);
        assert_eq!(entries[0], "0");
        assert_eq!(entries[999], "999");
    }

    #[test]
    fn test_zero_shards_clamped() {
        let dedup = ShardedDeduplicator::new(0);
        assert!(dedup.is_empty());
        assert!(dedup.insert("x"));
    }
}
