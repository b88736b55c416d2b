//! `SnapshotSink` — the durable-write collaborator the snapshot flush loop
//! writes to (spec.md §4.4, §6.2). Production implementation is relational
//! (`territory-server`'s Postgres driver); tests use
//! [`crate::testing::InMemorySnapshotSink`].

use async_trait::async_trait;
use territory_protocol::{StoreError, Tile};

#[async_trait]
pub trait SnapshotSink: Send + Sync {
    /// Idempotent upsert keyed by `(q, r)`. The caller is responsible for
    /// batching; a single call may receive up to `snapshotBatchSize` tiles.
    async fn upsert_tiles(&self, tiles: &[Tile]) -> Result<(), StoreError>;
}
