//! The recharge tick (spec.md §4.3): per-tile energy/integrity evolution,
//! run either once (for tests and manual triggers) or as a cancellable
//! background loop.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use territory_protocol::{EngineError, Hex, RechargeReport, Tile};
use tokio::sync::Notify;

use crate::error_sink::LoopKind;
use crate::keys::tiles_index;

use super::{round4, WorldEngine};

impl WorldEngine {
    pub async fn run_recharge_once(&self, now: i64) -> Result<RechargeReport, EngineError> {
        let mut report = RechargeReport::default();
        let mut owner_credits: HashMap<String, f64> = HashMap::new();
        let mut neighbor_cache: HashMap<(i32, i32), Option<Tile>> = HashMap::new();

        let mut cursor = String::from("0");
        loop {
            let page = self.store.set_scan(tiles_index(), &cursor, Some(500)).await?;
            for member in &page.members {
                let Some((q, r)) = crate::keys::parse_coord_member(member) else {
                    continue;
                };
                report.tiles_scanned += 1;
                let coord = Hex::new(q, r);

                let _guard = self.tile_locks.lock(&(q, r)).await;
                let Some(mut tile) = self.load_tile(coord).await? else {
                    continue;
                };

                let elapsed_ms = now.saturating_sub(tile.last_update).max(0);
                if elapsed_ms == 0 {
                    continue;
                }
                let elapsed_ms = elapsed_ms as f64;

                let decay_rate = self.config().integrity_decay_per_minute;
                let integrity_loss = (elapsed_ms / 60_000.0) * decay_rate;
                let next_integrity = (tile.integrity - integrity_loss).clamp(0.0, 100.0);

                let active_seconds = if decay_rate == 0.0 {
                    elapsed_ms / 1000.0
                } else {
                    (elapsed_ms / 1000.0).min((tile.integrity / decay_rate * 60.0).max(0.0))
                };

                let alliance_bonus = self
                    .alliance_neighbor_bonus(&tile, coord, &mut neighbor_cache)
                    .await?;

                let generated_energy =
                    active_seconds * self.config().energy_recharge_per_second * alliance_bonus;
                let next_energy =
                    (tile.energy + generated_energy).clamp(0.0, self.config().max_tile_energy);

                let changed = next_energy != tile.energy || next_integrity != tile.integrity;

                tile.energy = round4(next_energy);
                tile.integrity = round4(next_integrity);
                tile.last_update = now;

                if changed {
                    self.save_tile(&tile).await?;
                    report.tiles_changed += 1;
                }

                if generated_energy > 0.0 {
                    if let Some(owner) = &tile.owner_id {
                        *owner_credits.entry(owner.clone()).or_insert(0.0) += generated_energy;
                    }
                }
            }

            if page.cursor == "0" {
                break;
            }
            cursor = page.cursor;
        }

        for (owner, credit) in owner_credits {
            let _guard = self.player_locks.lock(&owner).await;
            if let Some(mut player) = self.load_player(&owner).await? {
                player.energy =
                    round4((player.energy + credit).clamp(0.0, self.config().max_player_energy));
                player.last_update = now;
                self.save_player(&player).await?;
                report.owners_credited += 1;
            }
        }

        Ok(report)
    }

    async fn alliance_neighbor_bonus(
        &self,
        tile: &Tile,
        coord: Hex,
        cache: &mut HashMap<(i32, i32), Option<Tile>>,
    ) -> Result<f64, EngineError> {
        let (Some(owner), Some(tag)) = (&tile.owner_id, &tile.owner_alliance_tag) else {
            return Ok(1.0);
        };

        for neighbor in coord.neighbors() {
            let key = (neighbor.q, neighbor.r);
            if !cache.contains_key(&key) {
                let loaded = self.load_tile(neighbor).await?;
                cache.insert(key, loaded);
            }
            if let Some(Some(neighbor_tile)) = cache.get(&key) {
                let same_alliance = neighbor_tile.owner_alliance_tag.as_deref() == Some(tag.as_str());
                let different_owner = neighbor_tile.owner_id.as_deref() != Some(owner.as_str());
                if same_alliance && different_owner {
                    return Ok(self.config().alliance_neighbor_bonus_multiplier);
                }
            }
        }
        Ok(1.0)
    }

    pub async fn run_recharge_loop(self: Arc<Self>, cancel: Arc<Notify>) {
        let interval = Duration::from_millis(self.config().recharge_interval_ms);
        loop {
            tokio::select! {
                _ = cancel.notified() => break,
                _ = tokio::time::sleep(interval) => {}
            }
            let now = super::now_ms();
            match self.run_recharge_once(now).await {
                Ok(report) => tracing::debug!(?report, "recharge tick complete"),
                Err(err) => {
                    self.error_sink
                        .report(LoopKind::Recharge, err.to_string())
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
    use territory_protocol::{EngineConfig, Hex};

    fn engine() -> WorldEngine {
        WorldEngine::new(
            Arc::new(InMemoryKVStore::new()),
            Arc::new(InMemorySnapshotSink::new()),
            Arc::new(TracingErrorSink),
            EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn integrity_floor_stops_generation() {
        let engine = engine();
        engine.claim("player-a", 0.0, 0.0, 0, &no_cancel()).await.unwrap();
        {
            let mut tile = engine.load_tile(Hex::new(0, 0)).await.unwrap().unwrap();
            tile.integrity = 1.0;
            tile.energy = 0.0;
            tile.last_update = 0;
            engine.save_tile(&tile).await.unwrap();
        }

        let report = engine.run_recharge_once(60_000).await.unwrap();
        assert_eq!(report.tiles_scanned, 1);
        assert_eq!(report.tiles_changed, 1);

        let tile = engine.load_tile(Hex::new(0, 0)).await.unwrap().unwrap();
        assert_eq!(tile.integrity, 0.0);
        assert_eq!(tile.energy, 60.0);

        let report_again = engine.run_recharge_once(120_000).await.unwrap();
        assert_eq!(report_again.tiles_changed, 0);
        let tile = engine.load_tile(Hex::new(0, 0)).await.unwrap().unwrap();
        assert_eq!(tile.energy, 60.0);
    }

    #[tokio::test]
    async fn alliance_adjacency_bonus_applies_to_both_tiles() {
        let engine = engine();
        engine.claim("player-a", 0.0, 0.0, 0, &no_cancel()).await.unwrap();
        engine.claim("player-b", 1.0, 0.0, 0, &no_cancel()).await.unwrap();
        engine
            .set_alliance_tag("player-a", Some("FOX"), 0, &no_cancel())
            .await
            .unwrap();
        engine
            .set_alliance_tag("player-b", Some("FOX"), 0, &no_cancel())
            .await
            .unwrap();

        for (q, r) in [(0, 0), (1, 0)] {
            let mut tile = engine.load_tile(Hex::new(q, r)).await.unwrap().unwrap();
            tile.energy = 0.0;
            tile.integrity = 100.0;
            tile.last_update = 0;
            engine.save_tile(&tile).await.unwrap();
        }

        engine.run_recharge_once(60_000).await.unwrap();

        // initial 100, minus the 10-energy free claim cost, plus a tick of
        // 60s at the default rate with the 1.05 alliance-adjacency bonus.
        let player_a = engine.load_player("player-a").await.unwrap().unwrap();
        let player_b = engine.load_player("player-b").await.unwrap().unwrap();
        assert_eq!(player_a.energy, 153.0);
        assert_eq!(player_b.energy, 153.0);
    }

    #[tokio::test]
    async fn repeated_tick_at_same_now_is_a_noop() {
        let engine = engine();
        engine.claim("player-a", 0.0, 0.0, 0, &no_cancel()).await.unwrap();
        engine.run_recharge_once(5_000).await.unwrap();
        let first = engine.load_tile(Hex::new(0, 0)).await.unwrap().unwrap();
        let report = engine.run_recharge_once(5_000).await.unwrap();
        assert_eq!(report.tiles_changed, 0);
        let second = engine.load_tile(Hex::new(0, 0)).await.unwrap().unwrap();
        assert_eq!(first, second);
    }
}
