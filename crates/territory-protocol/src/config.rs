//! Engine-facing configuration (spec.md §6.4), loaded the way
//! `cyntra_core::config::KernelConfig` loads: a `serde`-deserializable
//! struct with per-field defaults and a hand-written `Default` impl, so a
//! partial YAML document still produces a fully-populated config.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: i32,
    #[serde(default = "default_max_tile_energy")]
    pub max_tile_energy: f64,
    #[serde(default = "default_max_player_energy")]
    pub max_player_energy: f64,
    #[serde(default = "default_initial_tile_energy")]
    pub initial_tile_energy: f64,
    #[serde(default = "default_initial_tile_integrity")]
    pub initial_tile_integrity: f64,
    #[serde(default = "default_initial_tile_level")]
    pub initial_tile_level: u32,
    #[serde(default = "default_initial_player_energy")]
    pub initial_player_energy: f64,
    #[serde(default = "default_energy_recharge_per_second")]
    pub energy_recharge_per_second: f64,
    #[serde(default = "default_integrity_decay_per_minute")]
    pub integrity_decay_per_minute: f64,
    #[serde(default = "default_free_claim_cost")]
    pub free_claim_cost: f64,
    #[serde(default = "default_hostile_claim_cost_multiplier")]
    pub hostile_claim_cost_multiplier: f64,
    #[serde(default = "default_repair_cost_energy")]
    pub repair_cost_energy: f64,
    #[serde(default = "default_repair_integrity_gain")]
    pub repair_integrity_gain: f64,
    #[serde(default = "default_max_claim_distance_from_owned")]
    pub max_claim_distance_from_owned: i32,
    #[serde(default = "default_alliance_neighbor_bonus_multiplier")]
    pub alliance_neighbor_bonus_multiplier: f64,
    #[serde(default = "default_max_leaderboard_entries")]
    pub max_leaderboard_entries: usize,
    #[serde(default = "default_max_radar_nexus_points")]
    pub max_radar_nexus_points: usize,
    #[serde(default = "default_max_radar_base_points")]
    pub max_radar_base_points: usize,
    #[serde(default = "default_max_radar_hotspots")]
    pub max_radar_hotspots: usize,
    #[serde(default = "default_recharge_interval_ms")]
    pub recharge_interval_ms: u64,
    #[serde(default = "default_snapshot_interval_ms")]
    pub snapshot_interval_ms: u64,
    #[serde(default = "default_snapshot_batch_size")]
    pub snapshot_batch_size: usize,
}

fn default_chunk_size() -> i32 {
    64
}
fn default_max_tile_energy() -> f64 {
    100.0
}
fn default_max_player_energy() -> f64 {
    1000.0
}
fn default_initial_tile_energy() -> f64 {
    100.0
}
fn default_initial_tile_integrity() -> f64 {
    100.0
}
fn default_initial_tile_level() -> u32 {
    1
}
fn default_initial_player_energy() -> f64 {
    100.0
}
fn default_energy_recharge_per_second() -> f64 {
    1.0
}
fn default_integrity_decay_per_minute() -> f64 {
    1.0
}
fn default_free_claim_cost() -> f64 {
    10.0
}
fn default_hostile_claim_cost_multiplier() -> f64 {
    50.0
}
fn default_repair_cost_energy() -> f64 {
    5.0
}
fn default_repair_integrity_gain() -> f64 {
    20.0
}
fn default_max_claim_distance_from_owned() -> i32 {
    8
}
fn default_alliance_neighbor_bonus_multiplier() -> f64 {
    1.05
}
fn default_max_leaderboard_entries() -> usize {
    10
}
fn default_max_radar_nexus_points() -> usize {
    64
}
fn default_max_radar_base_points() -> usize {
    64
}
fn default_max_radar_hotspots() -> usize {
    32
}
fn default_recharge_interval_ms() -> u64 {
    1000
}
fn default_snapshot_interval_ms() -> u64 {
    300_000
}
fn default_snapshot_batch_size() -> usize {
    1000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_tile_energy: default_max_tile_energy(),
            max_player_energy: default_max_player_energy(),
            initial_tile_energy: default_initial_tile_energy(),
            initial_tile_integrity: default_initial_tile_integrity(),
            initial_tile_level: default_initial_tile_level(),
            initial_player_energy: default_initial_player_energy(),
            energy_recharge_per_second: default_energy_recharge_per_second(),
            integrity_decay_per_minute: default_integrity_decay_per_minute(),
            free_claim_cost: default_free_claim_cost(),
            hostile_claim_cost_multiplier: default_hostile_claim_cost_multiplier(),
            repair_cost_energy: default_repair_cost_energy(),
            repair_integrity_gain: default_repair_integrity_gain(),
            max_claim_distance_from_owned: default_max_claim_distance_from_owned(),
            alliance_neighbor_bonus_multiplier: default_alliance_neighbor_bonus_multiplier(),
            max_leaderboard_entries: default_max_leaderboard_entries(),
            max_radar_nexus_points: default_max_radar_nexus_points(),
            max_radar_base_points: default_max_radar_base_points(),
            max_radar_hotspots: default_max_radar_hotspots(),
            recharge_interval_ms: default_recharge_interval_ms(),
            snapshot_interval_ms: default_snapshot_interval_ms(),
            snapshot_batch_size: default_snapshot_batch_size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let c = EngineConfig::default();
        assert_eq!(c.chunk_size, 64);
        assert_eq!(c.max_tile_energy, 100.0);
        assert_eq!(c.max_player_energy, 1000.0);
        assert_eq!(c.hostile_claim_cost_multiplier, 50.0);
        assert_eq!(c.max_claim_distance_from_owned, 8);
        assert_eq!(c.max_leaderboard_entries, 10);
    }

    #[test]
    fn partial_yaml_fills_remaining_defaults() {
        let c: EngineConfig = serde_yaml::from_str("chunk_size: 32\n").unwrap();
        assert_eq!(c.chunk_size, 32);
        assert_eq!(c.max_tile_energy, 100.0);
    }
}
