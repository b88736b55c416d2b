//! Raised errors. Per spec.md §7, rule violations (range/energy/ownership)
//! are *values* carried on result types, never raised here — `EngineError`
//! is reserved for programmer errors and I/O failures, mirroring
//! `backbay_core::game::GameError` / `backbay_server::player_manager::AddPlayerError`
//! restricted to the subset spec.md actually calls out.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("coordinates ({q}, {r}) are not valid integers")]
    InvalidCoordinates { q: f64, r: f64 },

    #[error("hex size must be finite and positive, got {size}")]
    InvalidHexSize { size: f64 },

    #[error("alliance tag {tag:?} must be null or 3-4 of [A-Z0-9] after trim+upcase")]
    InvalidAllianceTag { tag: String },

    #[error("radius must be non-negative, got {radius}")]
    InvalidRadius { radius: i32 },

    #[error("nexus level must be a positive integer, got {level}")]
    InvalidLevel { level: i32 },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("operation cancelled")]
    Cancelled,
}

/// Opaque transport for whatever the concrete `KVStore`/`SnapshotSink` driver
/// failed with (Redis/Postgres errors in `territory-server`, or a
/// deliberately injected failure in tests).
#[derive(Debug, Error)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
