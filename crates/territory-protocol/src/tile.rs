//! The `Tile` entity (spec.md §3) and the indices derived from it.

use serde::{Deserialize, Serialize};

use crate::hex::Hex;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileType {
    Normal,
    Nexus,
}

impl Default for TileType {
    fn default() -> Self {
        TileType::Normal
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub coord: Hex,
    pub owner_id: Option<String>,
    pub owner_alliance_tag: Option<String>,
    pub owner_alliance_color: Option<String>,
    pub energy: f64,
    pub integrity: f64,
    pub level: u32,
    pub tile_type: TileType,
    pub last_update: i64,
}

impl Tile {
    /// A freshly-created, unowned normal tile at `coord`.
    pub fn new_unowned(coord: Hex, energy: f64, integrity: f64, level: u32, now: i64) -> Self {
        Self {
            coord,
            owner_id: None,
            owner_alliance_tag: None,
            owner_alliance_color: None,
            energy,
            integrity,
            level,
            tile_type: TileType::Normal,
            last_update: now,
        }
    }

    pub fn is_nexus(&self) -> bool {
        self.tile_type == TileType::Nexus
    }
}

/// The bucket a coordinate falls into for spatial indexing (spec.md §3: "A
/// tile belongs to exactly one chunk").
#[inline]
pub fn chunk_index(coord: Hex, chunk_size: i32) -> (i32, i32) {
    (div_floor(coord.q, chunk_size), div_floor(coord.r, chunk_size))
}

#[inline]
fn div_floor(value: i32, divisor: i32) -> i32 {
    value.div_euclid(divisor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_index_floors_negative_coords() {
        assert_eq!(chunk_index(Hex::new(-1, -1), 64), (-1, -1));
        assert_eq!(chunk_index(Hex::new(0, 0), 64), (0, 0));
        assert_eq!(chunk_index(Hex::new(63, -64), 64), (0, -1));
        assert_eq!(chunk_index(Hex::new(64, 0), 64), (1, 0));
    }

    #[test]
    fn nexus_predicate_matches_tile_type() {
        let mut tile = Tile::new_unowned(Hex::new(0, 0), 100.0, 100.0, 1, 0);
        assert!(!tile.is_nexus());
        tile.tile_type = TileType::Nexus;
        assert!(tile.is_nexus());
    }
}
