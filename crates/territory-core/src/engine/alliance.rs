//! `set_alliance_tag` (spec.md §4.2, §9 "Denormalized alliance on tile").

use tokio_util::sync::CancellationToken;

use territory_protocol::player::{alliance_color, normalize_alliance_tag};
use territory_protocol::{EngineError, Hex, Player};

use crate::keys::{owner_tiles_key, parse_coord_member};

use super::{check_cancelled, WorldEngine};

impl WorldEngine {
    pub async fn set_alliance_tag(
        &self,
        user_id: &str,
        tag: Option<&str>,
        now: i64,
        cancel: &CancellationToken,
    ) -> Result<Player, EngineError> {
        check_cancelled(cancel)?;
        let user_id = user_id.trim();
        let normalized = normalize_alliance_tag(tag)?;
        let color = normalized.as_deref().map(alliance_color);

        let _player_guard = self.player_locks.lock(&user_id.to_string()).await;
        let mut player = self.load_or_create_player(user_id, now).await?;
        player.alliance_tag = normalized;
        player.alliance_color = color;
        player.last_update = now;
        self.save_player(&player).await?;

        let members = self.store.set_members(&owner_tiles_key(user_id)).await?;
        for member in members {
            check_cancelled(cancel)?;
            let Some((tq, tr)) = parse_coord_member(&member) else {
                continue;
            };
            let coord = Hex::new(tq, tr);
            let _tile_guard = self.tile_locks.lock(&(tq, tr)).await;
            if let Some(mut tile) = self.load_tile(coord).await? {
                tile.owner_alliance_tag = player.alliance_tag.clone();
                tile.owner_alliance_color = player.alliance_color.clone();
                self.save_tile(&tile).await?;
            }
        }

        Ok(player)
    }
}

#[cfg(test)]
mod tests {
    use crate::error_sink::TracingErrorSink;
    use crate::testing::{no_cancel, InMemoryKVStore, InMemorySnapshotSink};
    use crate::WorldEngine;
    use std::sync::Arc;
    use territory_protocol::{EngineConfig, EngineError, Hex};

    fn engine() -> WorldEngine {
        WorldEngine::new(
            Arc::new(InMemoryKVStore::new()),
            Arc::new(InMemorySnapshotSink::new()),
            Arc::new(TracingErrorSink),
            EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn setting_tag_propagates_to_owned_tiles() {
        let engine = engine();
        engine.claim("player-a", 0.0, 0.0, 0, &no_cancel()).await.unwrap();
        engine.claim("player-a", 1.0, 0.0, 0, &no_cancel()).await.unwrap();

        let player = engine
            .set_alliance_tag("player-a", Some(" fox "), 5, &no_cancel())
            .await
            .unwrap();
        assert_eq!(player.alliance_tag.as_deref(), Some("FOX"));
        assert!(player.alliance_color.is_some());

        let tile = engine.load_tile(Hex::new(0, 0)).await.unwrap().unwrap();
        assert_eq!(tile.owner_alliance_tag.as_deref(), Some("FOX"));
        assert_eq!(tile.owner_alliance_color, player.alliance_color);
    }

    #[tokio::test]
    async fn clearing_tag_sets_tiles_back_to_none() {
        let engine = engine();
        engine.claim("player-a", 0.0, 0.0, 0, &no_cancel()).await.unwrap();
        engine
            .set_alliance_tag("player-a", Some("FOX"), 0, &no_cancel())
            .await
            .unwrap();
        engine
            .set_alliance_tag("player-a", None, 1, &no_cancel())
            .await
            .unwrap();

        let tile = engine.load_tile(Hex::new(0, 0)).await.unwrap().unwrap();
        assert!(tile.owner_alliance_tag.is_none());
        assert!(tile.owner_alliance_color.is_none());
    }

    #[tokio::test]
    async fn invalid_tag_is_rejected() {
        let engine = engine();
        let err = engine
            .set_alliance_tag("player-a", Some("nope!"), 0, &no_cancel())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAllianceTag { .. }));
    }
}
