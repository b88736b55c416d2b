//! In-memory doubles for [`crate::kv::KVStore`], [`crate::snapshot::SnapshotSink`]
//! and [`crate::error_sink::ErrorSink`]. Deliberately not behind
//! `#[cfg(test)]` so both this crate's tests and `territory-server`'s
//! integration tests can depend on them (mirrors how `backbay_server`'s own
//! test modules reuse its production types directly rather than mocking).

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use territory_protocol::StoreError;
use tokio_util::sync::CancellationToken;

use crate::error_sink::{ErrorSink, LoopKind};
use crate::kv::{KVStore, ScanPage};
use crate::snapshot::SnapshotSink;
use territory_protocol::Tile;

/// A fresh, never-cancelled token for tests that don't exercise cancellation.
pub fn no_cancel() -> CancellationToken {
    CancellationToken::new()
}

#[derive(Default)]
pub struct InMemoryKVStore {
    hashes: Mutex<HashMap<String, HashMap<String, String>>>,
    sets: Mutex<HashMap<String, BTreeSet<String>>>,
    zsets: Mutex<HashMap<String, HashMap<String, f64>>>,
}

impl InMemoryKVStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KVStore for InMemoryKVStore {
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        Ok(self
            .hashes
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .unwrap_or_default())
    }

    async fn hash_set(
        &self,
        key: &str,
        fields: HashMap<String, String>,
    ) -> Result<usize, StoreError> {
        let mut hashes = self.hashes.lock().unwrap();
        let entry = hashes.entry(key.to_string()).or_default();
        let count = fields.len();
        entry.extend(fields);
        Ok(count)
    }

    async fn hash_incr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError> {
        let mut hashes = self.hashes.lock().unwrap();
        let entry = hashes.entry(key.to_string()).or_default();
        let current: i64 = entry
            .get(field)
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);
        let next = current + delta;
        entry.insert(field.to_string(), next.to_string());
        Ok(next)
    }

    async fn hash_set_nx(&self, key: &str, field: &str, value: &str) -> Result<bool, StoreError> {
        let mut hashes = self.hashes.lock().unwrap();
        let entry = hashes.entry(key.to_string()).or_default();
        if entry.contains_key(field) {
            Ok(false)
        } else {
            entry.insert(field.to_string(), value.to_string());
            Ok(true)
        }
    }

    async fn zset_incr_by(&self, key: &str, delta: f64, member: &str) -> Result<f64, StoreError> {
        let mut zsets = self.zsets.lock().unwrap();
        let entry = zsets.entry(key.to_string()).or_default();
        let score = entry.entry(member.to_string()).or_insert(0.0);
        *score += delta;
        Ok(*score)
    }

    async fn zset_range_with_scores(
        &self,
        key: &str,
        min: isize,
        max: isize,
        reverse: bool,
    ) -> Result<Vec<(String, f64)>, StoreError> {
        let zsets = self.zsets.lock().unwrap();
        let Some(members) = zsets.get(key) else {
            return Ok(Vec::new());
        };

        let mut entries: Vec<(String, f64)> = members.clone().into_iter().collect();
        entries.sort_by(|a, b| {
            a.1.partial_cmp(&b.1)
                .unwrap()
                .then_with(|| a.0.cmp(&b.0))
        });
        if reverse {
            entries.reverse();
        }

        let len = entries.len() as isize;
        let start = min.max(0).min(len) as usize;
        let end = if max < 0 { len } else { (max + 1).min(len) } as usize;
        if start >= end {
            return Ok(Vec::new());
        }
        Ok(entries[start..end].to_vec())
    }

    async fn set_add(&self, key: &str, members: &[String]) -> Result<usize, StoreError> {
        let mut sets = self.sets.lock().unwrap();
        let entry = sets.entry(key.to_string()).or_default();
        let mut added = 0;
        for m in members {
            if entry.insert(m.clone()) {
                added += 1;
            }
        }
        Ok(added)
    }

    async fn set_remove(&self, key: &str, members: &[String]) -> Result<usize, StoreError> {
        let mut sets = self.sets.lock().unwrap();
        let Some(entry) = sets.get_mut(key) else {
            return Ok(0);
        };
        let mut removed = 0;
        for m in members {
            if entry.remove(m) {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        Ok(self
            .sets
            .lock()
            .unwrap()
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn set_scan(
        &self,
        key: &str,
        cursor: &str,
        count: Option<usize>,
    ) -> Result<ScanPage, StoreError> {
        let sets = self.sets.lock().unwrap();
        let members: Vec<String> = sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default();

        let start: usize = cursor.parse().unwrap_or(0);
        let page_size = count.unwrap_or(members.len().max(1));
        let end = (start + page_size).min(members.len());

        let page = members.get(start..end).unwrap_or_default().to_vec();
        let next_cursor = if end >= members.len() {
            "0".to_string()
        } else {
            end.to_string()
        };

        Ok(ScanPage {
            cursor: next_cursor,
            members: page,
        })
    }
}

pub struct InMemorySnapshotSink {
    pub rows: Mutex<BTreeMap<(i32, i32), Tile>>,
}

impl Default for InMemorySnapshotSink {
    fn default() -> Self {
        Self {
            rows: Mutex::new(BTreeMap::new()),
        }
    }
}

impl InMemorySnapshotSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }
}

#[async_trait]
impl SnapshotSink for InMemorySnapshotSink {
    async fn upsert_tiles(&self, tiles: &[Tile]) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        for tile in tiles {
            rows.insert((tile.coord.q, tile.coord.r), tile.clone());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryErrorSink {
    pub reports: Mutex<Vec<(LoopKind, String)>>,
}

impl InMemoryErrorSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ErrorSink for InMemoryErrorSink {
    async fn report(&self, loop_kind: LoopKind, message: String) {
        self.reports.lock().unwrap().push((loop_kind, message));
    }
}
