//! # Task Management System
//!
//! This module provides the worker pool that runs chunk meshing off the
//! control thread.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: central coordinator for task distribution and worker management
//! - `Task`: a unit of work that can be executed on a worker
//! - `TaskResult`: the result of a completed task, which can spawn additional tasks
//! - `TaskChannel`: the sending side of one worker
//!
//! Every worker has a dedicated task channel. All workers report through one
//! shared result channel tagged with their index, so the control thread
//! drains a single receiver per tick.
//!
//! ## Task Lifecycle
//! 1. Tasks are created and published via `TaskManager::publish_task()`
//! 2. The manager distributes tasks to available worker channels using round-robin
//! 3. Workers process tasks and send back results
//! 4. Results are applied on the control thread in `process_completed_tasks()`
//! 5. Results can spawn new tasks
//!
//! ## Inline Mode
//!
//! A manager created with zero workers runs every task on the control thread
//! at publish time. Results are still only applied by
//! `process_completed_tasks()`, which keeps the ordering of a threaded run
//! while being fully deterministic.
//!
//! ## Example Usage
//! ```ignore
//! let mut task_manager = TaskManager::new(4)?;
//!
//! task_manager.publish_task(Box::new(MyTask::new(...)));
//!
//! // In the tick:
//! task_manager.process_completed_tasks(&mut context);
//! task_manager.process_queued_tasks();
//! ```

pub mod task;

use std::collections::VecDeque;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, error, info, warn};
use web_time::{Duration, Instant};

use task::{Task, TaskContext, TaskResult};

/// Message sent from a worker back to the control thread.
///
/// `None` marks a task that panicked.
type WorkerReport = (usize, Option<Box<dyn TaskResult + Send>>);

/// The sending side of a worker thread.
///
/// # Fields
/// - `task_sender`: sends tasks from the control thread to the worker
/// - `num_tasks_in_flight`: number of tasks sent and not yet reported
/// - `worker`: handle joined when the manager is dropped
pub struct TaskChannel {
    task_sender: Option<Sender<Box<dyn Task + Send>>>,
    num_tasks_in_flight: usize,
    worker: Option<JoinHandle<()>>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// The `TaskManager` is responsible for:
/// - Creating and joining worker threads
/// - Distributing tasks across available workers
/// - Collecting and applying task results
/// - Queuing tasks while all workers are busy
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    result_receiver: Receiver<WorkerReport>,
    inline_results: VecDeque<Option<Box<dyn TaskResult + Send>>>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    current_channel: usize,
    failed_tasks: usize,
}

/// Maximum number of tasks that can be in flight per worker channel.
///
/// Keeping this at 1 leaves queued work on the control thread, where it is
/// still ordered by priority.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

impl TaskManager {
    /// Creates a new `TaskManager` with the specified number of worker threads.
    ///
    /// # Arguments
    /// * `num_workers` - Number of worker threads to create. Zero selects inline mode.
    ///
    /// # Returns
    /// The manager, or the I/O error of the first thread that failed to spawn.
    pub fn new(num_workers: usize) -> io::Result<Self> {
        let (result_tx, result_rx) = channel::<WorkerReport>();
        let mut channels = Vec::with_capacity(num_workers);

        if num_workers > 0 {
            info!(
                "Starting {} workers, available parallelism: {:?}",
                num_workers,
                thread::available_parallelism()
            );
        } else {
            info!("Running tasks inline on the control thread");
        }

        for worker_idx in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task + Send>>();
            let result_tx = result_tx.clone();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let report = run_task(worker_idx, task.as_ref());
                    if result_tx.send((worker_idx, report)).is_err() {
                        break;
                    }
                }
            };

            let worker = thread::Builder::new()
                .name(format!("voxel-worker-{worker_idx}"))
                .spawn(task_closure)?;

            channels.push(TaskChannel {
                task_sender: Some(task_tx),
                num_tasks_in_flight: 0,
                worker: Some(worker),
            });
        }

        Ok(TaskManager {
            channels,
            result_receiver: result_rx,
            inline_results: VecDeque::new(),
            queued_tasks: VecDeque::new(),
            current_channel: 0,
            failed_tasks: 0,
        })
    }

    /// Number of worker threads (zero in inline mode).
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of tasks sent to workers and not yet applied.
    pub fn in_flight(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum::<usize>()
            + self.inline_results.len()
    }

    /// Number of tasks waiting for a free worker.
    pub fn queued(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Whether no task is queued or in flight.
    pub fn is_idle(&self) -> bool {
        self.queued() == 0 && self.in_flight() == 0
    }

    /// Number of tasks that panicked since the manager was created.
    pub fn failed_tasks(&self) -> usize {
        self.failed_tasks
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the task was sent
    /// - `Err(task)` if the worker is gone, so the task can be requeued
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        let channel = &mut self.channels[channel_idx];
        let Some(sender) = channel.task_sender.as_ref() else {
            return Err(task);
        };
        match sender.send(task) {
            Ok(_) => {
                channel.num_tasks_in_flight += 1;
                Ok(())
            }
            Err(task) => {
                warn!("Worker {} disconnected", channel_idx);
                Err(task.0)
            }
        }
    }

    /// Finds an available worker channel using round-robin from the last
    /// used channel.
    ///
    /// # Returns
    /// - `Some(usize)` index of a channel that can accept a new task
    /// - `None` if all channels are busy or there are no channels
    fn find_available_channel(&self) -> Option<usize> {
        let count = self.channels.len();
        (0..count)
            .map(|offset| (self.current_channel + offset) % count)
            .find(|&idx| self.channels[idx].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT)
    }

    /// Publishes a new task for execution.
    ///
    /// The task is sent to a free worker, queued if all workers are busy, or
    /// run immediately in inline mode.
    ///
    /// # Returns
    /// - `true` if the task was started (sent or run inline)
    /// - `false` if it was queued
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> bool {
        if self.channels.is_empty() {
            let report = run_task(0, task.as_ref());
            self.inline_results.push_back(report);
            return true;
        }

        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Sends queued tasks to free workers, oldest first, until either the
    /// queue is empty or all workers are busy.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                return;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => {
                    // Worker is gone; keep the task and stop for this tick.
                    self.queued_tasks.push_front(task);
                    return;
                }
            }
        }
    }

    /// Applies every result that has arrived, without blocking.
    ///
    /// Follow-up tasks returned by results are published after all results
    /// have been applied.
    ///
    /// # Returns
    /// The number of reports handled, failed tasks included.
    pub fn process_completed_tasks(&mut self, context: &mut TaskContext<'_>) -> usize {
        let mut handled = 0;
        let mut tasks_to_queue = Vec::new();

        while let Some(report) = self.inline_results.pop_front() {
            handled += 1;
            self.apply_report(report, context, &mut tasks_to_queue);
        }

        while let Ok((worker_idx, report)) = self.result_receiver.try_recv() {
            handled += 1;
            self.release_worker(worker_idx);
            self.apply_report(report, context, &mut tasks_to_queue);
        }

        for task in tasks_to_queue {
            self.publish_task(task);
        }
        handled
    }

    /// Blocks until every queued and in-flight task has been applied or
    /// `timeout` has passed.
    ///
    /// # Returns
    /// `true` if the manager became idle.
    pub fn block_until_idle(&mut self, context: &mut TaskContext<'_>, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;

        loop {
            self.process_queued_tasks();
            self.process_completed_tasks(context);
            if self.is_idle() {
                return true;
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(
                    "Gave up waiting with {} queued and {} in flight",
                    self.queued(),
                    self.in_flight()
                );
                return false;
            }

            match self.result_receiver.recv_timeout(deadline - now) {
                Ok((worker_idx, report)) => {
                    let mut tasks_to_queue = Vec::new();
                    self.release_worker(worker_idx);
                    self.apply_report(report, context, &mut tasks_to_queue);
                    for task in tasks_to_queue {
                        self.publish_task(task);
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    error!("All workers are gone");
                    return false;
                }
            }
        }
    }

    fn release_worker(&mut self, worker_idx: usize) {
        if let Some(channel) = self.channels.get_mut(worker_idx) {
            channel.num_tasks_in_flight = channel.num_tasks_in_flight.saturating_sub(1);
        }
    }

    fn apply_report(
        &mut self,
        report: Option<Box<dyn TaskResult + Send>>,
        context: &mut TaskContext<'_>,
        tasks_to_queue: &mut Vec<Box<dyn Task + Send>>,
    ) {
        match report {
            Some(result) => tasks_to_queue.extend(result.handle_result(context)),
            None => self.failed_tasks += 1,
        }
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        for channel in &mut self.channels {
            channel.task_sender.take();
        }
        for (idx, channel) in self.channels.iter_mut().enumerate() {
            if let Some(worker) = channel.worker.take() {
                if worker.join().is_err() {
                    error!("Worker {} terminated abnormally", idx);
                }
            }
        }
    }
}

fn run_task(worker_idx: usize, task: &(dyn Task + Send)) -> Option<Box<dyn TaskResult + Send>> {
    match panic::catch_unwind(AssertUnwindSafe(|| task.process())) {
        Ok(result) => Some(result),
        Err(_) => {
            error!("Worker {} panicked while running {}", worker_idx, task.describe());
            None
        }
    }
}
