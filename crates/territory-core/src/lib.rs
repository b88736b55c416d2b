//! Business rules for the territory world: claim/repair/alliance, the
//! recharge tick, the snapshot flush, and the spatial/leaderboard queries.
//! Talks to the outside world only through [`kv::KVStore`],
//! [`snapshot::SnapshotSink`] and [`error_sink::ErrorSink`] — no transport,
//! no storage driver, lives here.

pub mod engine;
pub mod error_sink;
pub mod keys;
pub mod kv;
pub mod locks;
pub mod snapshot;
pub mod testing;

pub use engine::WorldEngine;
