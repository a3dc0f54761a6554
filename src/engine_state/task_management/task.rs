//! # Task System Core Traits
//!
//! This module defines the two halves of a unit of background work.
//!
//! ## Core Components
//! - `Task`: work that runs on a worker thread and owns all of its input
//! - `TaskResult`: the outcome, applied on the control thread
//! - `TaskContext`: the state a result may mutate while it is applied
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called on the control thread
//! 5. The result can mutate the world and spawn follow-up tasks
//!
//! ## Thread Safety
//! Tasks never hold references into the world. Anything they read is copied
//! in at construction, which is why `process` only needs `&self`.

use cgmath::Point3;

use crate::engine_state::streaming::StreamingStats;
use crate::engine_state::voxels::world::World;

/// Control-thread state handed to `TaskResult::handle_result`.
pub struct TaskContext<'a> {
    /// The world results are applied to
    pub world: &'a mut World,
    /// Counters updated while results are applied
    pub stats: &'a mut StreamingStats,
    /// Chunks whose mesh changed while results were applied
    pub applied: &'a mut Vec<Point3<i32>>,
}

/// A unit of work that can be executed on a worker thread.
///
/// # Implementation Guidelines
/// - Must be `Send` to be transferred between threads
/// - Should be coarse-grained to amortize scheduling overhead
/// - Must own its input; there is no shared access to the world
pub trait Task: Send {
    /// Processes the task and returns a result.
    ///
    /// Runs on a worker thread, or inline on the control thread when the
    /// manager has no workers. A panic is caught by the worker and reported
    /// as a failed task.
    ///
    /// # Returns
    /// A boxed `TaskResult` that will be processed on the control thread.
    fn process(&self) -> Box<dyn TaskResult + Send>;

    /// Short description used in log messages.
    fn describe(&self) -> String {
        String::from("task")
    }
}

/// The result of processing a `Task`.
///
/// Results should be cheap to apply; the expensive part belongs in
/// `Task::process`.
pub trait TaskResult: Send {
    /// Applies the result on the control thread.
    ///
    /// # Arguments
    /// * `context` - The world and counters the result may update
    ///
    /// # Returns
    /// Follow-up tasks to schedule (can be empty).
    fn handle_result(self: Box<Self>, context: &mut TaskContext<'_>) -> Vec<Box<dyn Task + Send>>;
}
