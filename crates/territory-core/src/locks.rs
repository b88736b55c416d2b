//! Sharded keyed locks (spec.md §5, §9 "Keyed locks"). A naive global mutex
//! would be correct but serializes unrelated tiles; this keeps one
//! `tokio::sync::Mutex` per distinct key instead, created lazily.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex as StdMutex};

use tokio::sync::{Mutex, OwnedMutexGuard};

pub struct KeyedLocks<K> {
    shards: StdMutex<HashMap<K, Arc<Mutex<()>>>>,
}

impl<K> Default for KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            shards: StdMutex::new(HashMap::new()),
        }
    }

    fn shard_for(&self, key: &K) -> Arc<Mutex<()>> {
        let mut shards = self.shards.lock().expect("lock shard map");
        shards
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub async fn lock(&self, key: &K) -> OwnedMutexGuard<()> {
        self.shard_for(key).lock_owned().await
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone + Ord,
{
    /// Lock several distinct keys in a total order to prevent deadlock
    /// against a concurrent call locking the same set (spec.md §5: "a total
    /// order to prevent deadlock, e.g. sort by user id"). Duplicate keys are
    /// collapsed to a single lock acquisition.
    pub async fn lock_many(&self, keys: Vec<K>) -> Vec<OwnedMutexGuard<()>> {
        let mut sorted = keys;
        sorted.sort();
        sorted.dedup();

        let mut guards = Vec::with_capacity(sorted.len());
        for key in &sorted {
            guards.push(self.lock(key).await);
        }
        guards
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn distinct_keys_do_not_block_each_other() {
        let locks: KeyedLocks<String> = KeyedLocks::new();
        let _a = locks.lock(&"a".to_string()).await;
        // Must not deadlock: different key, independent shard.
        let _b = locks.lock(&"b".to_string()).await;
    }

    #[tokio::test]
    async fn lock_many_dedups_and_sorts() {
        let locks: KeyedLocks<String> = KeyedLocks::new();
        let guards = locks
            .lock_many(vec!["b".to_string(), "a".to_string(), "a".to_string()])
            .await;
        assert_eq!(guards.len(), 2);
    }
}
