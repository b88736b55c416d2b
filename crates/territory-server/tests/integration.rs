//! Black-box tests against `territory-server`'s public API, in the shape of
//! `backbay-server`'s own `tests/integration.rs`: no live Redis/Postgres, no
//! toolchain-dependent assertions, just the pure-logic pieces of the Postgres
//! sink plus config loading exercised from outside the crate.

use territory_server::pg_sink::tile_type_str;
use territory_server::ServerConfig;
use territory_protocol::TileType;

#[test]
fn tile_type_str_matches_the_world_tiles_schema() {
    assert_eq!(tile_type_str(TileType::Normal), "normal");
    assert_eq!(tile_type_str(TileType::Nexus), "nexus");
}

#[test]
fn default_config_points_at_local_dev_services() {
    let config = ServerConfig::default();
    assert_eq!(config.redis_url, "redis://127.0.0.1:6379");
    assert_eq!(config.database_url, "postgres://localhost/territory");
    assert_eq!(config.engine.chunk_size, 64);
}

#[test]
fn yaml_overrides_only_the_fields_it_sets() {
    let config = ServerConfig::from_yaml(
        "redis_url: redis://cache.internal:6379\nengine:\n  chunk_size: 32\n",
    )
    .unwrap();
    assert_eq!(config.redis_url, "redis://cache.internal:6379");
    assert_eq!(config.database_url, ServerConfig::default().database_url);
    assert_eq!(config.engine.chunk_size, 32);
}
