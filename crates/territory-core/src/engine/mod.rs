//! `WorldEngine` — owns the claim/repair/alliance rules, the recharge tick,
//! spatial queries, the leaderboard, and the snapshot pipeline (spec.md
//! §4.2-§4.4). Talks only to [`crate::kv::KVStore`],
//! [`crate::snapshot::SnapshotSink`] and [`crate::error_sink::ErrorSink`].

mod alliance;
mod claim;
mod nexus;
mod query;
mod recharge;
mod repair;
mod snapshot_flush;

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use territory_protocol::hex::{hex_to_pixel, pixel_to_hex};
use territory_protocol::{ChunkActivityEvent, EngineConfig, EngineError, Hex, Player, Tile, TileType};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error_sink::ErrorSink;
use crate::keys::{player_key, tile_key};
use crate::kv::KVStore;
use crate::locks::KeyedLocks;
use crate::snapshot::SnapshotSink;

const ACTIVITY_CHANNEL_CAPACITY: usize = 4096;

pub struct WorldEngine {
    store: Arc<dyn KVStore>,
    sink: Arc<dyn SnapshotSink>,
    error_sink: Arc<dyn ErrorSink>,
    config: EngineConfig,
    tile_locks: KeyedLocks<(i32, i32)>,
    player_locks: KeyedLocks<String>,
    activity_tx: mpsc::Sender<ChunkActivityEvent>,
    activity_rx: StdMutex<Option<mpsc::Receiver<ChunkActivityEvent>>>,
}

impl WorldEngine {
    pub fn new(
        store: Arc<dyn KVStore>,
        sink: Arc<dyn SnapshotSink>,
        error_sink: Arc<dyn ErrorSink>,
        config: EngineConfig,
    ) -> Self {
        let (activity_tx, activity_rx) = mpsc::channel(ACTIVITY_CHANNEL_CAPACITY);
        Self {
            store,
            sink,
            error_sink,
            config,
            tile_locks: KeyedLocks::new(),
            player_locks: KeyedLocks::new(),
            activity_tx,
            activity_rx: StdMutex::new(Some(activity_rx)),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Takes the chunk-activity event receiver. Returns `None` if already
    /// taken; there is exactly one intended consumer (the transport layer).
    pub fn subscribe(&self) -> Option<mpsc::Receiver<ChunkActivityEvent>> {
        self.activity_rx.lock().unwrap().take()
    }

    fn emit_activity(&self, event: ChunkActivityEvent) {
        // A full channel means no one is listening; dropping the event here
        // is correct since activity events are a fan-out convenience, not
        // part of the authoritative state the caller's result already carries.
        let _ = self.activity_tx.try_send(event);
    }

    /// Validates `(q, r)` are honest integers by round-tripping through
    /// `hex_to_pixel`/`pixel_to_hex` at a fixed canonical size (spec.md §9:
    /// "guards against silent float ingestion; keep it").
    pub(crate) fn validate_coords(q: f64, r: f64) -> Result<Hex, EngineError> {
        if !q.is_finite() || !r.is_finite() || q.fract() != 0.0 || r.fract() != 0.0 {
            return Err(EngineError::InvalidCoordinates { q, r });
        }
        let hex = Hex::new(q as i32, r as i32);
        let (x, y) = hex_to_pixel(hex, 1.0)?;
        let recovered = pixel_to_hex(x, y, 1.0)?;
        if recovered != hex {
            return Err(EngineError::InvalidCoordinates { q, r });
        }
        Ok(hex)
    }

    pub(crate) async fn load_tile(&self, coord: Hex) -> Result<Option<Tile>, EngineError> {
        let fields = self.store.hash_get_all(&tile_key(coord.q, coord.r)).await?;
        Ok(fields_to_tile(coord, &fields))
    }

    pub(crate) async fn save_tile(&self, tile: &Tile) -> Result<(), EngineError> {
        self.store
            .hash_set(&tile_key(tile.coord.q, tile.coord.r), tile_to_fields(tile))
            .await?;
        Ok(())
    }

    pub(crate) async fn load_player(&self, user_id: &str) -> Result<Option<Player>, EngineError> {
        let fields = self.store.hash_get_all(&player_key(user_id)).await?;
        Ok(fields_to_player(user_id, &fields))
    }

    pub(crate) async fn save_player(&self, player: &Player) -> Result<(), EngineError> {
        self.store
            .hash_set(&player_key(&player.user_id), player_to_fields(player))
            .await?;
        Ok(())
    }

    /// Loads a player record, lazily creating one with the configured
    /// initial energy on first observation (spec.md §3: "Players are lazily
    /// created on first observation with initial energy").
    pub(crate) async fn load_or_create_player(
        &self,
        user_id: &str,
        now: i64,
    ) -> Result<Player, EngineError> {
        if let Some(player) = self.load_player(user_id).await? {
            return Ok(player);
        }
        let player = Player::new_lazy(user_id, self.config.initial_player_energy, now);
        self.save_player(&player).await?;
        Ok(player)
    }

    pub(crate) fn chunk_of(&self, coord: Hex) -> (i32, i32) {
        territory_protocol::tile::chunk_index(coord, self.config.chunk_size)
    }
}

/// Checked before issuing further I/O inside a public operation (spec.md
/// §5 "Cancellation and timeouts"): no partial in-memory state is mutated
/// beyond what has already been committed to the store.
pub(crate) fn check_cancelled(cancel: &CancellationToken) -> Result<(), EngineError> {
    if cancel.is_cancelled() {
        return Err(EngineError::Cancelled);
    }
    Ok(())
}

/// Rounds to four decimal places to stabilize round-trip comparisons
/// (spec.md §4.3: "All numeric values written to the store are rounded to
/// four decimal places").
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Current wall-clock time in milliseconds. Background loops call this
/// themselves; engine operations take `now` as a parameter so tests can
/// supply it deterministically (spec.md §4.3).
pub(crate) fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_millis() as i64
}

pub(crate) fn tile_to_fields(tile: &Tile) -> HashMap<String, String> {
    let mut fields = HashMap::with_capacity(9);
    fields.insert("q".to_string(), tile.coord.q.to_string());
    fields.insert("r".to_string(), tile.coord.r.to_string());
    fields.insert(
        "owner_id".to_string(),
        tile.owner_id.clone().unwrap_or_default(),
    );
    fields.insert(
        "owner_alliance_tag".to_string(),
        tile.owner_alliance_tag.clone().unwrap_or_default(),
    );
    fields.insert(
        "owner_alliance_color".to_string(),
        tile.owner_alliance_color.clone().unwrap_or_default(),
    );
    fields.insert("energy".to_string(), round4(tile.energy).to_string());
    fields.insert("integrity".to_string(), round4(tile.integrity).to_string());
    fields.insert("level".to_string(), tile.level.to_string());
    fields.insert(
        "tile_type".to_string(),
        match tile.tile_type {
            TileType::Normal => "normal".to_string(),
            TileType::Nexus => "nexus".to_string(),
        },
    );
    fields.insert("last_update".to_string(), tile.last_update.to_string());
    fields
}

pub(crate) fn fields_to_tile(coord: Hex, fields: &HashMap<String, String>) -> Option<Tile> {
    if fields.is_empty() {
        return None;
    }
    let non_empty = |k: &str| fields.get(k).filter(|v| !v.is_empty()).cloned();
    Some(Tile {
        coord,
        owner_id: non_empty("owner_id"),
        owner_alliance_tag: non_empty("owner_alliance_tag"),
        owner_alliance_color: non_empty("owner_alliance_color"),
        energy: fields.get("energy")?.parse().ok()?,
        integrity: fields.get("integrity")?.parse().ok()?,
        level: fields.get("level")?.parse().ok()?,
        tile_type: match fields.get("tile_type").map(String::as_str) {
            Some("nexus") => TileType::Nexus,
            _ => TileType::Normal,
        },
        last_update: fields.get("last_update")?.parse().ok()?,
    })
}

pub(crate) fn player_to_fields(player: &Player) -> HashMap<String, String> {
    let mut fields = HashMap::with_capacity(6);
    fields.insert("user_id".to_string(), player.user_id.clone());
    fields.insert("display_name".to_string(), player.display_name.clone());
    fields.insert(
        "alliance_tag".to_string(),
        player.alliance_tag.clone().unwrap_or_default(),
    );
    fields.insert(
        "alliance_color".to_string(),
        player.alliance_color.clone().unwrap_or_default(),
    );
    fields.insert("energy".to_string(), round4(player.energy).to_string());
    fields.insert("last_update".to_string(), player.last_update.to_string());
    fields
}

pub(crate) fn fields_to_player(user_id: &str, fields: &HashMap<String, String>) -> Option<Player> {
    if fields.is_empty() {
        return None;
    }
    let non_empty = |k: &str| fields.get(k).filter(|v| !v.is_empty()).cloned();
    Some(Player {
        user_id: user_id.to_string(),
        display_name: fields
            .get("display_name")
            .cloned()
            .unwrap_or_else(|| user_id.to_string()),
        alliance_tag: non_empty("alliance_tag"),
        alliance_color: non_empty("alliance_color"),
        energy: fields.get("energy")?.parse().ok()?,
        last_update: fields.get("last_update")?.parse().ok()?,
    })
}

#[cfg(test)]
impl WorldEngine {
    /// Test-only seam for setting up scenarios that need a player at a
    /// specific energy level before exercising `claim`/`repair`.
    pub(crate) async fn force_player_energy(&self, user_id: &str, energy: f64, now: i64) {
        let mut player = self.load_or_create_player(user_id, now).await.unwrap();
        player.energy = energy;
        self.save_player(&player).await.unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_coords_accepts_integers() {
        assert!(WorldEngine::validate_coords(3.0, -1.0).is_ok());
    }

    #[test]
    fn validate_coords_rejects_fractional() {
        assert!(matches!(
            WorldEngine::validate_coords(3.5, -1.0),
            Err(EngineError::InvalidCoordinates { .. })
        ));
    }

    #[test]
    fn tile_field_round_trip() {
        let tile = Tile {
            coord: Hex::new(2, -3),
            owner_id: Some("p1".to_string()),
            owner_alliance_tag: Some("FOX".to_string()),
            owner_alliance_color: Some("#AABBCC".to_string()),
            energy: 12.34567,
            integrity: 99.0,
            level: 2,
            tile_type: TileType::Nexus,
            last_update: 42,
        };
        let fields = tile_to_fields(&tile);
        let recovered = fields_to_tile(tile.coord, &fields).unwrap();
        assert_eq!(recovered.owner_id, tile.owner_id);
        assert_eq!(recovered.energy, round4(tile.energy));
        assert_eq!(recovered.tile_type, TileType::Nexus);
    }

    #[test]
    fn unowned_tile_fields_round_trip_to_none_owner() {
        let tile = Tile::new_unowned(Hex::new(0, 0), 100.0, 100.0, 1, 0);
        let fields = tile_to_fields(&tile);
        let recovered = fields_to_tile(tile.coord, &fields).unwrap();
        assert_eq!(recovered.owner_id, None);
        assert_eq!(recovered.owner_alliance_tag, None);
    }
}
