//! # Chunk Streaming
//!
//! Decides which chunks must exist around the viewer, creates them at a
//! bounded rate, dispatches mesh extraction to the task manager and applies
//! finished meshes back onto the chunks.
//!
//! - `view_offsets`: the nearest-first chunk offsets of the view volume
//! - `scheduler`: the per-tick state machine
//! - `stats`: counters for diagnostics and tests

mod scheduler;
mod stats;
pub mod view_offsets;

pub use scheduler::StreamingScheduler;
pub use stats::StreamingStats;
pub use view_offsets::ViewOffsets;
