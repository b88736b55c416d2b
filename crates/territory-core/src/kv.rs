//! `KVStore` — the abstract key-value surface WorldEngine is built against
//! (spec.md §6.1). Production uses Redis; tests use
//! [`crate::testing::InMemoryKVStore`].

use std::collections::HashMap;

use async_trait::async_trait;
use territory_protocol::StoreError;

/// One page of a cursor-based set scan. `cursor == "0"` both starts and
/// terminates an iteration, matching Redis `SSCAN` semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanPage {
    pub cursor: String,
    pub members: Vec<String>,
}

#[async_trait]
pub trait KVStore: Send + Sync {
    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    async fn hash_set(
        &self,
        key: &str,
        fields: HashMap<String, String>,
    ) -> Result<usize, StoreError>;

    async fn hash_incr_by(&self, key: &str, field: &str, delta: i64) -> Result<i64, StoreError>;

    async fn hash_set_nx(&self, key: &str, field: &str, value: &str) -> Result<bool, StoreError>;

    async fn zset_incr_by(&self, key: &str, delta: f64, member: &str) -> Result<f64, StoreError>;

    /// Returns `(member, score)` pairs ordered by score. `reverse` selects
    /// descending order; `min`/`max` bound the rank window (`0..=limit-1`
    /// style slices are expressed by the caller via min/max on rank, not
    /// score, to keep this a plain top-N / bottom-N primitive).
    async fn zset_range_with_scores(
        &self,
        key: &str,
        min: isize,
        max: isize,
        reverse: bool,
    ) -> Result<Vec<(String, f64)>, StoreError>;

    async fn set_add(&self, key: &str, members: &[String]) -> Result<usize, StoreError>;

    async fn set_remove(&self, key: &str, members: &[String]) -> Result<usize, StoreError>;

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError>;

    async fn set_scan(
        &self,
        key: &str,
        cursor: &str,
        count: Option<usize>,
    ) -> Result<ScanPage, StoreError>;
}
