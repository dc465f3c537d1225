use std::{
    mem,
    num::NonZeroUsize,
    ops::Range,
    sync::Mutex,
    thread,
};

use itertools::Itertools as _;
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WorkerCount {
    Auto,
    Manual(NonZeroUsize),
}

impl WorkerCount {
    pub fn resolve(self) -> usize {
        match self {
            WorkerCount::Auto => num_cpus::get(),
            WorkerCount::Manual(num) => num.get(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("Worker {thread_index} panicked")]
    WorkerPanicked { thread_index: usize },
}

/// Fork-join execution of a worker function.
pub trait TaskScheduler {
    fn thread_count(&self) -> usize;

    /// Calls `worker(thread_index, thread_count)` once for every thread index and returns
    /// after all of the calls finished.
    fn dispatch<F>(&self, worker: F) -> Result<(), DispatchError>
    where
        F: Fn(usize, usize) + Sync;
}

/// Range of items processed by a worker, `[i·N/T, (i+1)·N/T)`.
/// Ranges of all workers are contiguous, disjoint and cover `0..count`.
pub fn partition(count: usize, thread_index: usize, thread_count: usize) -> Range<usize> {
    debug_assert!(thread_index < thread_count);
    (thread_index * count / thread_count)..((thread_index + 1) * count / thread_count)
}

/// Splits the items into per-worker chunks following `partition`.
/// Every worker locks only its own chunk, so the locks are never contended.
pub fn split_for_workers<T>(mut items: &mut [T], thread_count: usize) -> Vec<Mutex<&mut [T]>> {
    let count = items.len();
    (0..=thread_count)
        .map(|i| i * count / thread_count)
        .tuple_windows()
        .map(|(start, end)| {
            let (chunk, rest) = mem::take(&mut items).split_at_mut(end - start);
            items = rest;
            Mutex::new(chunk)
        })
        .collect()
}

/// Runs every worker in its own scoped thread.
#[derive(Clone, Debug)]
pub struct ThreadScheduler {
    thread_count: usize,
    pin_threads: bool,
}

impl ThreadScheduler {
    pub fn new(worker_count: WorkerCount, pin_threads: bool) -> ThreadScheduler {
        ThreadScheduler {
            thread_count: worker_count.resolve(),
            pin_threads,
        }
    }
}

impl TaskScheduler for ThreadScheduler {
    fn thread_count(&self) -> usize {
        self.thread_count
    }

    fn dispatch<F>(&self, worker: F) -> Result<(), DispatchError>
    where
        F: Fn(usize, usize) + Sync,
    {
        let thread_count = self.thread_count;
        let cores = if self.pin_threads {
            core_affinity::get_core_ids().unwrap_or_default()
        } else {
            Vec::new()
        };
        log::trace!("Dispatching {thread_count} workers");

        let worker = &worker;
        let cores = &cores;
        thread::scope(|scope| {
            let handles = (0..thread_count)
                .map(|thread_index| {
                    thread::Builder::new()
                        .name(format!("worker{thread_index}"))
                        .spawn_scoped(scope, move || {
                            if !cores.is_empty() {
                                let core = cores[thread_index % cores.len()];
                                if !core_affinity::set_for_current(core) {
                                    log::debug!("Failed to pin worker{thread_index} to {core:?}");
                                }
                            }
                            worker(thread_index, thread_count);
                        })
                })
                .collect::<Vec<_>>();

            // All threads must be joined before reporting, some of them may still be running.
            let mut result = Ok(());
            for (thread_index, handle) in handles.into_iter().enumerate() {
                let joined = match handle {
                    Ok(handle) => handle
                        .join()
                        .map_err(|_| DispatchError::WorkerPanicked { thread_index }),
                    Err(e) => Err(DispatchError::Spawn(e)),
                };
                if result.is_ok() {
                    result = joined;
                }
            }
            result
        })
    }
}

/// Runs all workers one after another in the calling thread.
/// Panics of the worker propagate to the caller.
#[derive(Copy, Clone, Debug)]
pub struct SequentialScheduler {
    thread_count: usize,
}

impl SequentialScheduler {
    pub fn new(thread_count: usize) -> SequentialScheduler {
        assert!(thread_count > 0, "Need at least one worker");
        SequentialScheduler { thread_count }
    }
}

impl TaskScheduler for SequentialScheduler {
    fn thread_count(&self) -> usize {
        self.thread_count
    }

    fn dispatch<F>(&self, worker: F) -> Result<(), DispatchError>
    where
        F: Fn(usize, usize) + Sync,
    {
        for thread_index in 0..self.thread_count {
            worker(thread_index, self.thread_count);
        }
        Ok(())
    }
}
