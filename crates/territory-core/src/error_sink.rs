//! `ErrorSink` — where background-loop failures go instead of terminating
//! the loop (spec.md §4.6, §7: "Background tick and snapshot failures are
//! reported through an injected error sink and do not stop future scheduled
//! runs"). Production wires this to `tracing`; tests use
//! [`crate::testing::InMemoryErrorSink`].

use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopKind {
    Recharge,
    SnapshotFlush,
}

#[async_trait]
pub trait ErrorSink: Send + Sync {
    async fn report(&self, loop_kind: LoopKind, message: String);
}

/// Reports through `tracing::error!`, matching the teacher's `warn!`/`info!`
/// density for lifecycle events rather than per-item logging.
pub struct TracingErrorSink;

#[async_trait]
impl ErrorSink for TracingErrorSink {
    async fn report(&self, loop_kind: LoopKind, message: String) {
        tracing::error!(?loop_kind, %message, "background loop iteration failed");
    }
}
