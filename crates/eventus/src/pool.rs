//! Fixed-size worker pool backing the threaded and async publish variants.
//!
//! Workers pull boxed tasks from one FIFO queue guarded by a mutex and a
//! condition variable. Each task runs to completion before the worker takes
//! the next one. There is no work stealing and no priority between tasks.
//!
//! Shutdown (on drop) stops the workers without draining the queue: a task
//! already running finishes, tasks still queued are dropped unrun.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, trace, warn};

/// A unit of work for the pool.
pub(crate) type Task = Box<dyn FnOnce() + Send + 'static>;

#[derive(Default)]
struct Queue {
    tasks: VecDeque<Task>,
    stopping: bool,
}

#[derive(Default)]
struct Shared {
    queue: Mutex<Queue>,
    available: Condvar,
}

pub(crate) struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawn `size` workers.
    ///
    /// A worker whose thread cannot be spawned is logged and skipped.
    pub(crate) fn new(size: usize) -> Self {
        let shared = Arc::new(Shared::default());
        let workers = (0..size)
            .filter_map(|index| {
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("eventus-worker-{index}"))
                    .spawn(move || worker_loop(&shared, index))
                    .inspect_err(|e| error!(index, error = %e, "Failed to spawn bus worker"))
                    .ok()
            })
            .collect::<Vec<_>>();

        debug!(workers = workers.len(), "Worker pool started");
        Self { shared, workers }
    }

    /// Append a task to the queue and wake one idle worker.
    ///
    /// Returns `false` (and drops the task) if shutdown has begun.
    pub(crate) fn enqueue(&self, task: Task) -> bool {
        {
            let mut queue = self.shared.queue.lock();
            if queue.stopping {
                warn!("Task submitted after worker pool shutdown, dropping it");
                return false;
            }
            queue.tasks.push_back(task);
        }
        self.shared.available.notify_one();
        true
    }

    /// Number of live worker threads.
    pub(crate) fn size(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        let abandoned = {
            let mut queue = self.shared.queue.lock();
            queue.stopping = true;
            std::mem::take(&mut queue.tasks)
        };
        self.shared.available.notify_all();

        if !abandoned.is_empty() {
            debug!(
                abandoned = abandoned.len(),
                "Worker pool stopping with queued tasks"
            );
        }
        drop(abandoned);

        // The last handle to a bus can be released by one of its own tasks, in
        // which case this runs on a worker that must not join itself.
        let current = thread::current().id();
        for handle in self.workers.drain(..) {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!("Bus worker exited with a panic");
            }
        }
        debug!("Worker pool stopped");
    }
}

fn worker_loop(shared: &Shared, index: usize) {
    trace!(index, "Bus worker started");
    loop {
        let task = {
            let mut queue = shared.queue.lock();
            loop {
                if queue.stopping {
                    trace!(index, "Bus worker exiting");
                    return;
                }
                if let Some(task) = queue.tasks.pop_front() {
                    break task;
                }
                shared.available.wait(&mut queue);
            }
        };

        // Catch panics so one failing subscriber does not take the worker down.
        if let Err(e) = catch_unwind(AssertUnwindSafe(task)) {
            warn!(index, error = ?e, "Bus task panicked");
        }
    }
}
