//! `register_nexus` (spec.md §4.2).

use tokio_util::sync::CancellationToken;

use territory_protocol::{EngineError, Tile, TileType};

use crate::keys::{chunk_tiles_key, coord_member, poi_index, tiles_index};

use super::{check_cancelled, WorldEngine};

impl WorldEngine {
    pub async fn register_nexus(
        &self,
        q: f64,
        r: f64,
        level: i32,
        now: i64,
        cancel: &CancellationToken,
    ) -> Result<Tile, EngineError> {
        check_cancelled(cancel)?;
        if level < 1 {
            return Err(EngineError::InvalidLevel { level });
        }
        let coord = Self::validate_coords(q, r)?;

        let _tile_guard = self.tile_locks.lock(&(coord.q, coord.r)).await;
        let existing = self.load_tile(coord).await?;

        let tile = match existing {
            Some(mut tile) => {
                tile.tile_type = TileType::Nexus;
                tile.level = level as u32;
                tile.last_update = now;
                tile
            }
            None => Tile {
                coord,
                owner_id: None,
                owner_alliance_tag: None,
                owner_alliance_color: None,
                energy: self.config().initial_tile_energy,
                integrity: self.config().initial_tile_integrity,
                level: level as u32,
                tile_type: TileType::Nexus,
                last_update: now,
            },
        };
        self.save_tile(&tile).await?;

        let member = coord_member(coord.q, coord.r);
        self.store.set_add(tiles_index(), &[member.clone()]).await?;
        let (cq, cr) = self.chunk_of(coord);
        self.store
            .set_add(&chunk_tiles_key(cq, cr), &[member.clone()])
            .await?;
        self.store.set_add(poi_index(), &[member]).await?;

        Ok(tile)
    }
}
