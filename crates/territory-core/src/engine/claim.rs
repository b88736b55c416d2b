//! `claim` (spec.md §4.2).

use tokio_util::sync::CancellationToken;

use territory_protocol::{ChunkActivityEvent, EngineError, EventKind, Hex, Tile, TileType};

pub use territory_protocol::ClaimOutcome;

use crate::keys::{chunk_activity_field, chunk_activity_key, chunk_tiles_key, coord_member, owner_tiles_key, tiles_index, leaderboard_key, parse_coord_member};

use super::{check_cancelled, round4, WorldEngine};

impl WorldEngine {
    pub async fn claim(
        &self,
        user_id: &str,
        q: f64,
        r: f64,
        now: i64,
        cancel: &CancellationToken,
    ) -> Result<ClaimOutcome, EngineError> {
        check_cancelled(cancel)?;
        let user_id = user_id.trim();
        let coord = Self::validate_coords(q, r)?;

        let _tile_guard = self.tile_locks.lock(&(coord.q, coord.r)).await;
        let existing = self.load_tile(coord).await?;

        let prior_owner = existing.as_ref().and_then(|t| t.owner_id.clone());
        let mut player_ids = vec![user_id.to_string()];
        if let Some(po) = &prior_owner {
            if po != user_id {
                player_ids.push(po.clone());
            }
        }
        let _player_guards = self.player_locks.lock_many(player_ids).await;

        let claimer = self.load_or_create_player(user_id, now).await?;

        if let Some(tile) = &existing {
            if tile.owner_id.as_deref() == Some(user_id) {
                return Ok(ClaimOutcome::Ok {
                    created: false,
                    captured: false,
                    tile: tile.clone(),
                    energy_after: claimer.energy,
                    energy_cost: 0.0,
                });
            }
        }

        // Range gate: first-ever claim bypasses it.
        let owned_members = self.store.set_members(&owner_tiles_key(user_id)).await?;
        if !owned_members.is_empty() {
            let mut nearest: Option<i32> = None;
            for member in &owned_members {
                if let Some((oq, or_)) = parse_coord_member(member) {
                    let d = coord.distance(Hex::new(oq, or_));
                    nearest = Some(nearest.map_or(d, |best| best.min(d)));
                }
            }
            let max_distance = self.config().max_claim_distance_from_owned;
            if nearest.is_none_or(|d| d > max_distance) {
                return Ok(ClaimOutcome::OutOfRange {
                    max_distance,
                    nearest_distance: nearest,
                });
            }
        }

        let captured = existing.as_ref().is_some_and(|t| t.owner_id.is_some());
        let level = existing.as_ref().map_or(1, |t| t.level);
        let cost = if captured {
            level as f64 * self.config().hostile_claim_cost_multiplier
        } else {
            self.config().free_claim_cost
        };

        if claimer.energy < cost {
            return Ok(ClaimOutcome::InsufficientEnergy {
                required_energy: cost,
                player_energy: claimer.energy,
            });
        }

        check_cancelled(cancel)?;
        let energy_after = round4(claimer.energy - cost);
        let mut updated_claimer = claimer;
        updated_claimer.energy = energy_after;
        updated_claimer.last_update = now;
        self.save_player(&updated_claimer).await?;

        let created = existing.is_none();
        let (energy, integrity, level, tile_type) = match &existing {
            Some(tile) => (tile.energy, tile.integrity, tile.level, tile.tile_type),
            None => (
                self.config().initial_tile_energy,
                self.config().initial_tile_integrity,
                self.config().initial_tile_level,
                TileType::Normal,
            ),
        };

        let new_tile = Tile {
            coord,
            owner_id: Some(user_id.to_string()),
            owner_alliance_tag: updated_claimer.alliance_tag.clone(),
            owner_alliance_color: updated_claimer.alliance_color.clone(),
            energy,
            integrity,
            level,
            tile_type,
            last_update: now,
        };
        self.save_tile(&new_tile).await?;

        let member = coord_member(coord.q, coord.r);
        self.store.set_add(tiles_index(), &[member.clone()]).await?;
        let (cq, cr) = self.chunk_of(coord);
        self.store
            .set_add(&chunk_tiles_key(cq, cr), &[member.clone()])
            .await?;
        self.store
            .set_add(&owner_tiles_key(user_id), &[member.clone()])
            .await?;

        let gained = match &prior_owner {
            Some(prev) if prev != user_id => {
                self.store
                    .set_remove(&owner_tiles_key(prev), &[member.clone()])
                    .await?;
                // Score underflow: clamp to zero (spec.md §9 "Score underflow").
                let decremented = self.store.zset_incr_by(leaderboard_key(), -1.0, prev).await?;
                if decremented < 0.0 {
                    self.store
                        .zset_incr_by(leaderboard_key(), -decremented, prev)
                        .await?;
                }
                true
            }
            None => true,
            _ => false,
        };
        if gained {
            self.store.zset_incr_by(leaderboard_key(), 1.0, user_id).await?;
        }

        let activity_delta = if captured { 3 } else { 1 };
        self.store
            .hash_incr_by(
                chunk_activity_key(),
                &chunk_activity_field(cq, cr),
                activity_delta,
            )
            .await?;

        self.emit_activity(ChunkActivityEvent {
            chunk: (cq, cr),
            kind: if captured {
                EventKind::Captured
            } else {
                EventKind::Claimed
            },
            actor: user_id.to_string(),
            coord,
        });

        Ok(ClaimOutcome::Ok {
            created,
            captured,
            tile: new_tile,
            energy_after,
            energy_cost: cost,
        })
    }
}
