//! `get_tiles_in_range`, `get_radar_summary`, `get_leaderboard` (spec.md §4.2).

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;

use territory_protocol::{
    EngineError, Hex, Hotspot, LeaderboardEntry, NexusRadarPoint, RadarData, Tile,
};

use crate::keys::{chunk_activity_key, chunk_tiles_key, leaderboard_key, owner_tiles_key, parse_coord_member, poi_index};

use super::{check_cancelled, WorldEngine};

impl WorldEngine {
    pub async fn get_tiles_in_range(
        &self,
        center_q: f64,
        center_r: f64,
        radius: i32,
        cancel: &CancellationToken,
    ) -> Result<Vec<Tile>, EngineError> {
        check_cancelled(cancel)?;
        if radius < 0 {
            return Err(EngineError::InvalidRadius { radius });
        }
        let center = Self::validate_coords(center_q, center_r)?;

        let (cq_min, cr_min) = self.chunk_of(Hex::new(center.q - radius, center.r - radius));
        let (cq_max, cr_max) = self.chunk_of(Hex::new(center.q + radius, center.r + radius));

        let mut candidates: HashSet<(i32, i32)> = HashSet::new();
        for cq in cq_min..=cq_max {
            for cr in cr_min..=cr_max {
                check_cancelled(cancel)?;
                let members = self.store.set_members(&chunk_tiles_key(cq, cr)).await?;
                for member in members {
                    if let Some(coord) = parse_coord_member(&member) {
                        candidates.insert(coord);
                    }
                }
            }
        }

        let mut tiles = Vec::new();
        for (q, r) in candidates {
            let coord = Hex::new(q, r);
            if center.distance(coord) > radius {
                continue;
            }
            if let Some(tile) = self.load_tile(coord).await? {
                tiles.push(tile);
            }
        }

        tiles.sort_by(|a, b| {
            let da = center.distance(a.coord);
            let db = center.distance(b.coord);
            da.cmp(&db)
                .then_with(|| a.coord.q.cmp(&b.coord.q))
                .then_with(|| a.coord.r.cmp(&b.coord.r))
        });

        Ok(tiles)
    }

    pub async fn get_radar_summary(
        &self,
        user_id: &str,
        center_q: f64,
        center_r: f64,
        radius: i32,
        cancel: &CancellationToken,
    ) -> Result<RadarData, EngineError> {
        check_cancelled(cancel)?;
        if radius <= 0 {
            return Err(EngineError::InvalidRadius { radius });
        }
        let center = Self::validate_coords(center_q, center_r)?;
        let user_id = user_id.trim();

        let mut player_bases = Vec::new();
        for member in self.store.set_members(&owner_tiles_key(user_id)).await? {
            let Some((q, r)) = parse_coord_member(&member) else {
                continue;
            };
            let coord = Hex::new(q, r);
            if center.distance(coord) <= radius {
                player_bases.push(coord);
                if player_bases.len() >= self.config().max_radar_base_points {
                    break;
                }
            }
        }

        check_cancelled(cancel)?;
        let mut nexus_cores = Vec::new();
        for member in self.store.set_members(poi_index()).await? {
            let Some((q, r)) = parse_coord_member(&member) else {
                continue;
            };
            let coord = Hex::new(q, r);
            if center.distance(coord) > radius {
                continue;
            }
            let Some(tile) = self.load_tile(coord).await? else {
                continue;
            };
            nexus_cores.push(NexusRadarPoint {
                coord,
                level: tile.level,
            });
            if nexus_cores.len() >= self.config().max_radar_nexus_points {
                break;
            }
        }

        check_cancelled(cancel)?;
        let chunk_size = self.config().chunk_size;
        let activity = self.store.hash_get_all(chunk_activity_key()).await?;
        let mut hotspots: Vec<Hotspot> = Vec::new();
        for (field, count_str) in activity {
            let Some((cq, cr)) = parse_coord_member(&field) else {
                continue;
            };
            let count: i64 = count_str.parse().unwrap_or(0);
            if count <= 0 {
                continue;
            }
            let chunk_center = Hex::new(
                cq * chunk_size + chunk_size / 2,
                cr * chunk_size + chunk_size / 2,
            );
            if center.distance(chunk_center) <= radius + chunk_size {
                hotspots.push(Hotspot {
                    coord: chunk_center,
                    activity: count,
                });
            }
        }
        hotspots.sort_by(|a, b| b.activity.cmp(&a.activity));
        hotspots.truncate(self.config().max_radar_hotspots);

        Ok(RadarData {
            player_bases,
            nexus_cores,
            hotspots,
        })
    }

    pub async fn get_leaderboard(
        &self,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<LeaderboardEntry>, EngineError> {
        check_cancelled(cancel)?;
        let limit = limit.clamp(1, 100);
        let raw = self
            .store
            .zset_range_with_scores(leaderboard_key(), 0, limit as isize - 1, true)
            .await?;

        let mut entries = Vec::new();
        for (user_id, score) in raw {
            check_cancelled(cancel)?;
            if user_id.trim().is_empty() || score <= 0.0 {
                continue;
            }
            let profile = self.load_player(&user_id).await?;
            let (display_name, alliance_tag, alliance_color) = match profile {
                Some(p) => (p.display_name, p.alliance_tag, p.alliance_color),
                None => (user_id.clone(), None, None),
            };
            entries.push(LeaderboardEntry {
                user_id,
                display_name,
                alliance_tag,
                alliance_color,
                score: score.floor() as i64,
            });
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use crate::error_sink::TracingErrorSink;
    use crate::testing::{no_cancel, InMemoryKVStore, InMemorySnapshotSink};
    use crate::WorldEngine;
    use std::sync::Arc;
    use territory_protocol::{EngineConfig, EngineError};

    fn engine() -> WorldEngine {
        WorldEngine::new(
            Arc::new(InMemoryKVStore::new()),
            Arc::new(InMemorySnapshotSink::new()),
            Arc::new(TracingErrorSink),
            EngineConfig::default(),
        )
    }

    #[tokio::test]
    async fn tiles_in_range_are_sorted_by_distance_then_coord() {
        let engine = engine();
        engine.claim("player-a", 2.0, 0.0, 0, &no_cancel()).await.unwrap();
        engine.claim("player-a", 1.0, 0.0, 0, &no_cancel()).await.unwrap();
        engine.claim("player-a", 0.0, 0.0, 0, &no_cancel()).await.unwrap();

        let tiles = engine.get_tiles_in_range(0.0, 0.0, 2, &no_cancel()).await.unwrap();
        let coords: Vec<_> = tiles.iter().map(|t| (t.coord.q, t.coord.r)).collect();
        assert_eq!(coords, vec![(0, 0), (1, 0), (2, 0)]);
    }

    #[tokio::test]
    async fn leaderboard_limit_clamps_to_valid_range() {
        let engine = engine();
        engine.claim("player-a", 0.0, 0.0, 0, &no_cancel()).await.unwrap();
        let board = engine.get_leaderboard(0, &no_cancel()).await.unwrap();
        assert!(board.len() <= 1);
        let board = engine.get_leaderboard(1_000_000, &no_cancel()).await.unwrap();
        assert!(board.len() <= 100);
    }

    #[tokio::test]
    async fn radar_summary_includes_nexus_and_own_bases() {
        let engine = engine();
        engine.claim("player-a", 0.0, 0.0, 0, &no_cancel()).await.unwrap();
        engine.register_nexus(1.0, 0.0, 3, 0, &no_cancel()).await.unwrap();

        let radar = engine
            .get_radar_summary("player-a", 0.0, 0.0, 5, &no_cancel())
            .await
            .unwrap();
        assert_eq!(radar.player_bases, vec![territory_protocol::Hex::new(0, 0)]);
        assert_eq!(radar.nexus_cores.len(), 1);
        assert_eq!(radar.nexus_cores[0].level, 3);
    }

    #[tokio::test]
    async fn leaderboard_is_rejected_when_already_cancelled() {
        let engine = engine();
        engine.claim("player-a", 0.0, 0.0, 0, &no_cancel()).await.unwrap();
        let cancel = no_cancel();
        cancel.cancel();
        let err = engine.get_leaderboard(10, &cancel).await.unwrap_err();
        assert!(matches!(err, EngineError::Cancelled));
    }
}
