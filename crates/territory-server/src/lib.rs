//! Composition layer for the territory world engine: concrete Redis/Postgres
//! drivers plus the YAML-loaded [`config::ServerConfig`]. No transport,
//! session, or rate-limiting lives here — those are explicitly out of scope
//! (spec.md §1); this crate only wires real I/O behind `territory-core`'s
//! `KVStore`/`SnapshotSink` traits and runs the two background loops.

pub mod config;
pub mod pg_sink;
pub mod redis_store;

pub use config::ServerConfig;
pub use pg_sink::PgSnapshotSink;
pub use redis_store::RedisStore;
