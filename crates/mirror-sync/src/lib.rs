//! # mirror-sync
//!
//! Sync orchestration: full sweeps with blue-green index rotation,
//! incremental per-entity syncs, and the save-hook entry points that
//! filter out the content changes that should never reach the engine.

pub mod engine;
pub mod error;
pub mod orchestrator;

pub use engine::{ElasticEngine, Engine, StoreIndexSource};
pub use error::SyncError;
pub use orchestrator::{SweepReport, SyncOrchestrator};
