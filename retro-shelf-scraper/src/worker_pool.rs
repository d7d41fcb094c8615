//! Fixed-size pool of OS threads fed from a shared job queue.
//!
//! Workers sleep on a condition variable while the queue is empty and pop
//! one job at a time, so the worker count is the only concurrency limit.
//! Jobs still queued at shutdown are dropped without running.

use std::collections::VecDeque;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

/// Runs jobs on worker threads.
pub trait JobHandler<T>: Send + Sync + 'static {
    fn run_job(&self, job: T);
}

struct Queue<T> {
    jobs: VecDeque<T>,
    shutdown: bool,
}

struct Shared<T> {
    queue: Mutex<Queue<T>>,
    wake: Condvar,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, Queue<T>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct WorkerPool<T: Send + 'static> {
    shared: Arc<Shared<T>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    worker_count: usize,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Spawn `workers` threads named `<name>-<index>` that feed jobs to
    /// `handler`.
    pub fn new<H: JobHandler<T>>(name: &str, workers: usize, handler: Arc<H>) -> std::io::Result<Self> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                jobs: VecDeque::new(),
                shutdown: false,
            }),
            wake: Condvar::new(),
        });

        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let worker_shared = shared.clone();
            let handler = handler.clone();
            let spawned = std::thread::Builder::new()
                .name(format!("{}-{}", name, index))
                .spawn(move || worker_loop(&worker_shared, handler.as_ref()));
            match spawned {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    // Take down the workers that did start.
                    shared.lock().shutdown = true;
                    shared.wake.notify_all();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(e);
                }
            }
        }
        log::debug!("Started {} '{}' workers", workers, name);

        Ok(Self {
            shared,
            workers: Mutex::new(handles),
            worker_count: workers,
        })
    }

    /// Queue a job. Returns false once the pool is shut down.
    pub fn push(&self, job: T) -> bool {
        {
            let mut queue = self.shared.lock();
            if queue.shutdown {
                return false;
            }
            queue.jobs.push_back(job);
        }
        self.shared.wake.notify_one();
        true
    }

    /// Jobs waiting for a worker.
    pub fn queued(&self) -> usize {
        self.shared.lock().jobs.len()
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Drop queued jobs, let running jobs finish, and join every worker.
    /// Calling it again does nothing.
    pub fn shutdown(&self) {
        let abandoned = {
            let mut queue = self.shared.lock();
            queue.shutdown = true;
            std::mem::take(&mut queue.jobs)
        };
        self.shared.wake.notify_all();
        if !abandoned.is_empty() {
            log::debug!("Worker pool shutting down, {} queued jobs dropped", abandoned.len());
        }
        drop(abandoned);

        let handles = std::mem::take(&mut *self.workers.lock().unwrap_or_else(PoisonError::into_inner));
        let current = std::thread::current().id();
        for handle in handles {
            // A handler that shuts down its own pool can't join itself.
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                log::error!("Worker thread exited by panic");
            }
        }
    }
}

impl<T: Send + 'static> Drop for WorkerPool<T> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop<T, H: JobHandler<T> + ?Sized>(shared: &Shared<T>, handler: &H) {
    loop {
        let job = {
            let mut queue = shared.lock();
            loop {
                if queue.shutdown {
                    return;
                }
                if let Some(job) = queue.jobs.pop_front() {
                    break job;
                }
                queue = shared
                    .wake
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };

        if catch_unwind(AssertUnwindSafe(|| handler.run_job(job))).is_err() {
            log::error!(
                "Job panicked on {}",
                std::thread::current().name().unwrap_or("worker")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    struct Echo(Mutex<mpsc::Sender<u32>>);

    impl JobHandler<u32> for Echo {
        fn run_job(&self, job: u32) {
            if job == 13 {
                panic!("unlucky job");
            }
            let _ = self.0.lock().unwrap().send(job);
        }
    }

    /// Blocks every job until the test releases it.
    struct Gate {
        started: Mutex<mpsc::Sender<u32>>,
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl JobHandler<u32> for Gate {
        fn run_job(&self, job: u32) {
            let _ = self.started.lock().unwrap().send(job);
            let _ = self.release.lock().unwrap().recv_timeout(Duration::from_secs(5));
        }
    }

    #[test]
    fn runs_every_job() {
        let (tx, rx) = mpsc::channel();
        let pool = WorkerPool::new("echo", 3, Arc::new(Echo(Mutex::new(tx)))).unwrap();
        assert_eq!(pool.worker_count(), 3);
        // 13 panics; that path has its own test.
        let jobs: Vec<u32> = (0..20).filter(|&i| i != 13).collect();
        for &i in &jobs {
            assert!(pool.push(i));
        }
        let mut got: Vec<u32> = jobs
            .iter()
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        got.sort();
        assert_eq!(got, jobs);
    }

    #[test]
    fn survives_panicking_job() {
        let (tx, rx) = mpsc::channel();
        let pool = WorkerPool::new("echo", 1, Arc::new(Echo(Mutex::new(tx)))).unwrap();
        pool.push(13);
        pool.push(7);
        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 7);
    }

    #[test]
    fn excess_jobs_wait_in_queue() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let gate = Arc::new(Gate {
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        });
        let pool = WorkerPool::new("gate", 1, gate).unwrap();
        pool.push(1);
        pool.push(2);
        assert_eq!(started_rx.recv_timeout(Duration::from_secs(5)).unwrap(), 1);
        assert_eq!(pool.queued(), 1);

        release_tx.send(()).unwrap();
        assert_eq!(started_rx.recv_timeout(Duration::from_secs(5)).unwrap(), 2);
        release_tx.send(()).unwrap();
    }

    #[test]
    fn shutdown_abandons_queue_and_is_idempotent() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let gate = Arc::new(Gate {
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        });
        let pool = Arc::new(WorkerPool::new("gate", 1, gate).unwrap());
        pool.push(1);
        pool.push(2);
        pool.push(3);
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let stopper = {
            let pool = pool.clone();
            std::thread::spawn(move || pool.shutdown())
        };
        while pool.queued() > 0 {
            std::thread::sleep(Duration::from_millis(1));
        }
        // Unblock job 1; the gate sees the closed channel.
        drop(release_tx);
        stopper.join().unwrap();
        pool.shutdown();
        assert!(!pool.push(4));
        // Only the job that was running when shutdown started ever ran.
        assert!(started_rx.try_recv().is_err());
    }
}
