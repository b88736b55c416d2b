//! Result records returned by `WorldEngine` operations (spec.md §4.2, §9:
//! "tagged sum types, each variant carrying only the fields relevant to its
//! case. No exceptions for rule failures.") Mirrors the shape of
//! `backbay_server::game::state::ApplyResult`.

use serde::{Deserialize, Serialize};

use crate::hex::Hex;
use crate::tile::Tile;

/// Outcome of `WorldEngine::claim`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClaimOutcome {
    Ok {
        created: bool,
        captured: bool,
        tile: Tile,
        energy_after: f64,
        energy_cost: f64,
    },
    OutOfRange {
        max_distance: i32,
        nearest_distance: Option<i32>,
    },
    InsufficientEnergy {
        required_energy: f64,
        player_energy: f64,
    },
}

/// Outcome of `WorldEngine::repair`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RepairOutcome {
    Ok { tile: Tile, energy_after: f64 },
    TileNotFound,
    NotOwner,
    InsufficientEnergy {
        required_energy: f64,
        player_energy: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub display_name: String,
    pub alliance_tag: Option<String>,
    pub alliance_color: Option<String>,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NexusRadarPoint {
    pub coord: Hex,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub coord: Hex,
    pub activity: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RadarData {
    pub player_bases: Vec<Hex>,
    pub nexus_cores: Vec<NexusRadarPoint>,
    pub hotspots: Vec<Hotspot>,
}

/// A structured report from one recharge-tick sweep, logged at `info!`
/// level rather than returning `()` — see SPEC_FULL.md §4.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RechargeReport {
    pub tiles_scanned: usize,
    pub tiles_changed: usize,
    pub owners_credited: usize,
}

/// A structured report from one snapshot-flush sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotReport {
    pub tiles_persisted: usize,
    pub batches: usize,
}

/// What kind of mutation produced a `ChunkActivityEvent` (SPEC_FULL.md §4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Claimed,
    Captured,
    Repaired,
}

/// Fan-out event describing a chunk-visible change, for the (out-of-scope)
/// transport layer to forward to subscribed clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkActivityEvent {
    pub chunk: (i32, i32),
    pub kind: EventKind,
    pub actor: String,
    pub coord: Hex,
}
