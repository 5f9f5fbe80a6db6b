// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Worker pool running calls on `MultiThread` objects.
//!
//! Jobs go through one unbounded crossbeam channel shared by all workers.
//! A panicking job is logged and the worker keeps going.

use crossbeam::channel::{self, Sender};
use parking_lot::Mutex;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size worker pool.
///
/// Dropping the pool lets queued jobs finish, then joins the workers.
pub struct Executor {
    sender: Mutex<Option<Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    threads: usize,
}

impl Executor {
    /// Start `threads` workers (at least one).
    pub fn new(threads: usize) -> io::Result<Self> {
        let threads = threads.max(1);
        let (sender, receiver) = channel::unbounded::<Job>();
        let mut workers = Vec::with_capacity(threads);
        for index in 0..threads {
            let receiver = receiver.clone();
            let worker = std::thread::Builder::new()
                .name(format!("hrpc-worker-{}", index))
                .spawn(move || {
                    log::debug!("[executor] worker {} started", index);
                    for job in receiver.iter() {
                        if catch_unwind(AssertUnwindSafe(job)).is_err() {
                            log::warn!("[executor] job panicked on worker {}", index);
                        }
                    }
                    log::debug!("[executor] worker {} stopped", index);
                })?;
            workers.push(worker);
        }
        Ok(Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            threads,
        })
    }

    #[inline]
    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Queue `job`. Returns false after [`shutdown`](Self::shutdown).
    pub fn spawn<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        match self.sender.lock().as_ref() {
            Some(sender) => sender.send(Box::new(job)).is_ok(),
            None => false,
        }
    }

    /// Stop accepting jobs, drain the queue and join the workers.
    pub fn shutdown(&self) {
        self.sender.lock().take();
        let workers = std::mem::take(&mut *self.workers.lock());
        let current = std::thread::current().id();
        for worker in workers {
            // A job may drop the last reference to the pool from a worker.
            if worker.thread().id() == current {
                continue;
            }
            if worker.join().is_err() {
                log::warn!("[executor] worker exited abnormally");
            }
        }
    }
}

impl Drop for Executor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("threads", &self.threads)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_runs_all_jobs_before_shutdown_returns() {
        let pool = Executor::new(3).expect("pool");
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..50 {
            let done = Arc::clone(&done);
            assert!(pool.spawn(move || {
                done.fetch_add(1, Ordering::SeqCst);
            }));
        }
        pool.shutdown();
        assert_eq!(done.load(Ordering::SeqCst), 50);
        assert!(!pool.spawn(|| {}));
    }

    #[test]
    fn test_panicking_job_does_not_kill_worker() {
        let pool = Executor::new(1).expect("pool");
        let done = Arc::new(AtomicUsize::new(0));
        pool.spawn(|| panic!("job failure"));
        let counter = Arc::clone(&done);
        pool.spawn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        pool.shutdown();
        assert_eq!(done.load(Ordering::SeqCst), 1);
        assert_eq!(pool.threads(), 1);
    }

    #[test]
    fn test_zero_threads_means_one() {
        assert_eq!(Executor::new(0).expect("pool").threads(), 1);
    }
}
