//! The snapshot flush (spec.md §4.4): streams the tile index to the
//! injected [`crate::snapshot::SnapshotSink`] in batches.

use std::sync::Arc;
use std::time::Duration;

use territory_protocol::{EngineError, Hex, SnapshotReport};
use tokio::sync::Notify;

use crate::error_sink::LoopKind;
use crate::keys::{parse_coord_member, tiles_index};

use super::WorldEngine;

impl WorldEngine {
    pub async fn run_snapshot_flush_once(&self) -> Result<SnapshotReport, EngineError> {
        let mut report = SnapshotReport::default();
        let batch_size = self.config().snapshot_batch_size.max(1);
        let mut batch = Vec::with_capacity(batch_size);

        let mut cursor = String::from("0");
        loop {
            let page = self
                .store
                .set_scan(tiles_index(), &cursor, Some(batch_size))
                .await?;

            for member in &page.members {
                let Some((q, r)) = parse_coord_member(member) else {
                    continue;
                };
                if let Some(tile) = self.load_tile(Hex::new(q, r)).await? {
                    batch.push(tile);
                }
                if batch.len() >= batch_size {
                    report.tiles_persisted += batch.len();
                    self.sink.upsert_tiles(&batch).await?;
                    report.batches += 1;
                    batch.clear();
                }
            }

            if page.cursor == "0" {
                break;
            }
            cursor = page.cursor;
        }

        if !batch.is_empty() {
            report.tiles_persisted += batch.len();
            self.sink.upsert_tiles(&batch).await?;
            report.batches += 1;
        }

        Ok(report)
    }

    pub async fn run_snapshot_loop(self: Arc<Self>, cancel: Arc<Notify>) {
        let interval = Duration::from_millis(self.config().snapshot_interval_ms);
        loop {
            tokio::select! {
                _ = cancel.notified() => break,
                _ = tokio::time::sleep(interval) => {}
            }
            match self.run_snapshot_flush_once().await {
                Ok(report) => tracing::info!(?report, "snapshot flush complete"),
                Err(err) => {
                    self.error_sink
                        .report(LoopKind::SnapshotFlush, err.to_string())
                        .await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error_sink::TracingErrorSink;
    use crate::testing::{no_cancel, InMemoryKVStore, InMemorySnapshotSink};
    use crate::WorldEngine;
    use std::sync::Arc;
    use territory_protocol::EngineConfig;

    fn engine_with_batch(batch_size: usize) -> (WorldEngine, Arc<InMemorySnapshotSink>) {
        let mut config = EngineConfig::default();
        config.snapshot_batch_size = batch_size;
        let sink = Arc::new(InMemorySnapshotSink::new());
        let engine = WorldEngine::new(
            Arc::new(InMemoryKVStore::new()),
            sink.clone(),
            Arc::new(TracingErrorSink),
            config,
        );
        (engine, sink)
    }

    #[tokio::test]
    async fn flush_emits_full_batches_plus_final_partial() {
        let (engine, sink) = engine_with_batch(2);
        for q in 0..5 {
            engine.claim("player-a", q as f64, 0.0, 0, &no_cancel()).await.unwrap();
        }

        let report = engine.run_snapshot_flush_once().await.unwrap();
        assert_eq!(report.tiles_persisted, 5);
        assert_eq!(report.batches, 3); // 2 + 2 + 1
        assert_eq!(sink.row_count(), 5);
    }

    #[tokio::test]
    async fn flush_of_empty_world_persists_nothing() {
        let (engine, sink) = engine_with_batch(1000);
        let report = engine.run_snapshot_flush_once().await.unwrap();
        assert_eq!(report.tiles_persisted, 0);
        assert_eq!(report.batches, 0);
        assert_eq!(sink.row_count(), 0);
    }
}
