//! `repair` (spec.md §4.2).

use tokio_util::sync::CancellationToken;

use territory_protocol::{ChunkActivityEvent, EngineError, EventKind};

pub use territory_protocol::RepairOutcome;

use crate::keys::{chunk_activity_field, chunk_activity_key};

use super::{check_cancelled, round4, WorldEngine};

impl WorldEngine {
    pub async fn repair(
        &self,
        user_id: &str,
        q: f64,
        r: f64,
        now: i64,
        cancel: &CancellationToken,
    ) -> Result<RepairOutcome, EngineError> {
        check_cancelled(cancel)?;
        let user_id = user_id.trim();
        let coord = Self::validate_coords(q, r)?;

        let _tile_guard = self.tile_locks.lock(&(coord.q, coord.r)).await;
        let Some(mut tile) = self.load_tile(coord).await? else {
            return Ok(RepairOutcome::TileNotFound);
        };
        if tile.owner_id.as_deref() != Some(user_id) {
            return Ok(RepairOutcome::NotOwner);
        }

        let _player_guard = self.player_locks.lock(&user_id.to_string()).await;
        let mut player = self.load_or_create_player(user_id, now).await?;

        let cost = self.config().repair_cost_energy;
        if player.energy < cost {
            return Ok(RepairOutcome::InsufficientEnergy {
                required_energy: cost,
                player_energy: player.energy,
            });
        }

        check_cancelled(cancel)?;
        player.energy = round4(player.energy - cost);
        player.last_update = now;
        self.save_player(&player).await?;

        tile.integrity = round4((tile.integrity + self.config().repair_integrity_gain).min(100.0));
        tile.last_update = now;
        self.save_tile(&tile).await?;

        let (cq, cr) = self.chunk_of(coord);
        self.store
            .hash_incr_by(chunk_activity_key(), &chunk_activity_field(cq, cr), 2)
            .await?;

        self.emit_activity(ChunkActivityEvent {
            chunk: (cq, cr),
            kind: EventKind::Repaired,
            actor: user_id.to_string(),
            coord,
        });

        Ok(RepairOutcome::Ok {
            tile,
            energy_after: player.energy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::RepairOutcome;
    use crate::error_sink::TracingErrorSink;
    use crate::testing::{no_cancel, InMemoryKVStore, InMemorySnapshotSink};
    use crate::WorldEngine;
    use std::sync::Arc;
    use territory_protocol::EngineConfig;

    fn engine() -> WorldEngine {
        WorldEngine::new(
            Arc::new(InMemoryKVStore::new()),
            Arc::new(InMemorySnapshotSink::new()),
            Arc::new(TracingErrorSink),
            EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn repair_heals_integrity_and_spends_energy() {
        let engine = engine();
        engine.claim("player-a", 0.0, 0.0, 0, &no_cancel()).await.unwrap();
        {
            let mut tile = engine.load_tile(territory_protocol::Hex::new(0, 0)).await.unwrap().unwrap();
            tile.integrity = 50.0;
            engine.save_tile(&tile).await.unwrap();
        }

        let outcome = engine.repair("player-a", 0.0, 0.0, 10, &no_cancel()).await.unwrap();
        match outcome {
            RepairOutcome::Ok { tile, energy_after } => {
                assert_eq!(tile.integrity, 70.0);
                assert_eq!(energy_after, 85.0); // 90 after claim - 5 repair cost
            }
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn repair_by_non_owner_is_rejected() {
        let engine = engine();
        engine.claim("player-a", 0.0, 0.0, 0, &no_cancel()).await.unwrap();
        let outcome = engine.repair("player-b", 0.0, 0.0, 0, &no_cancel()).await.unwrap();
        assert!(matches!(outcome, RepairOutcome::NotOwner));
    }

    #[tokio::test]
    async fn repair_missing_tile_is_rejected() {
        let engine = engine();
        let outcome = engine.repair("player-a", 5.0, 5.0, 0, &no_cancel()).await.unwrap();
        assert!(matches!(outcome, RepairOutcome::TileNotFound));
    }

    #[tokio::test]
    async fn integrity_never_exceeds_cap() {
        let engine = engine();
        engine.claim("player-a", 0.0, 0.0, 0, &no_cancel()).await.unwrap();
        let outcome = engine.repair("player-a", 0.0, 0.0, 1, &no_cancel()).await.unwrap();
        match outcome {
            RepairOutcome::Ok { tile, .. } => assert_eq!(tile.integrity, 100.0),
            other => panic!("expected Ok, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn repair_is_rejected_when_already_cancelled() {
        let engine = engine();
        engine.claim("player-a", 0.0, 0.0, 0, &no_cancel()).await.unwrap();
        let cancel = no_cancel();
        cancel.cancel();
        let err = engine
            .repair("player-a", 0.0, 0.0, 10, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, territory_protocol::EngineError::Cancelled));
    }
}
