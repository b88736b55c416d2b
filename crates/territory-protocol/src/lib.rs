//! Data types shared by the territory world engine and its drivers: hex
//! coordinates, tiles, players, configuration, and operation results.
//!
//! This crate carries no I/O and no business rules; it is the vocabulary
//! `territory-core` and `territory-server` build on.

pub mod config;
pub mod error;
pub mod hex;
pub mod player;
pub mod results;
pub mod tile;

pub use config::EngineConfig;
pub use error::{EngineError, EngineResult, StoreError};
pub use hex::Hex;
pub use player::Player;
pub use results::{
    ChunkActivityEvent, ClaimOutcome, EventKind, Hotspot, LeaderboardEntry, NexusRadarPoint,
    RadarData, RechargeReport, RepairOutcome, SnapshotReport,
};
pub use tile::{Tile, TileType};
