use serde::Serialize;

/// Counters describing the work done by the streaming scheduler.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StreamingStats {
    /// Scheduler ticks run.
    pub ticks: usize,
    /// Chunks allocated, generated and inserted into the world.
    pub chunks_created: usize,
    /// Chunks whose terrain generation failed and were dropped.
    pub generation_failures: usize,
    /// Mesh requests put back because a face neighbor was missing.
    pub generation_retries: usize,
    /// Mesh tasks handed to the task manager.
    pub meshes_submitted: usize,
    /// Air-only chunks that became ready without a mesh task.
    pub empty_meshes: usize,
    /// Mesh results applied to a chunk.
    pub meshes_applied: usize,
    /// Mesh results dropped because a newer revision exists or the chunk is gone.
    pub stale_results: usize,
    /// Mesh tasks that panicked.
    pub failed_tasks: usize,
    /// Colliders handed to the physics side.
    pub colliders_attached: usize,
    /// Chunks dropped after leaving the view volume.
    pub chunks_evicted: usize,
}
