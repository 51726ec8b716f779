//! Deduplicating background job scheduler.
//!
//! Each key moves through `absent -> Running -> {Ready, Error}`. While a job
//! is running, further submissions for the same key are answered with
//! `Running` and dispatch nothing, so at most one execution per key is ever
//! in flight. A finished job stays queryable until the key is submitted
//! again, which starts a fresh run.
//!
//! Work runs on a bounded rayon pool; the registry, not the pool, is the
//! source of truth for job state.

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatus {
    /// The key was never submitted.
    Absent,
    Running,
    Ready,
    Error { message: String },
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Ready | JobStatus::Error { .. })
    }
}

type Registry<K> = Arc<Mutex<HashMap<K, JobStatus>>>;

pub struct JobScheduler<K> {
    jobs: Registry<K>,
    pool: ThreadPool,
}

impl<K> JobScheduler<K>
where
    K: Clone + Eq + Hash + Display + Send + 'static,
{
    pub fn new(worker_threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(worker_threads.max(1))
            .thread_name(|index| format!("route-risk-job-{index}"))
            .build()?;

        Ok(Self {
            jobs: Arc::new(Mutex::new(HashMap::new())),
            pool,
        })
    }

    /// Starts `work` for `key` unless a run for `key` is already in flight.
    ///
    /// Always returns [`JobStatus::Running`] without waiting for the work.
    /// The job's outcome (including a panic inside `work`) is recorded as
    /// `Ready` or `Error` and observed through [`JobScheduler::poll`].
    pub fn submit<F, T, E>(&self, key: K, work: F) -> JobStatus
    where
        F: FnOnce() -> Result<T, E> + Send + 'static,
        E: Display,
    {
        {
            let mut jobs = lock(&self.jobs);
            if jobs.get(&key) == Some(&JobStatus::Running) {
                info!(%key, "job already running, not starting another");
                return JobStatus::Running;
            }
            jobs.insert(key.clone(), JobStatus::Running);
        }

        info!(%key, "job started");
        let jobs = Arc::clone(&self.jobs);
        self.pool.spawn(move || {
            let status = match panic::catch_unwind(AssertUnwindSafe(work)) {
                Ok(Ok(_)) => {
                    info!(%key, "job ready");
                    JobStatus::Ready
                }
                Ok(Err(err)) => {
                    warn!(%key, error = %err, "job failed");
                    JobStatus::Error {
                        message: err.to_string(),
                    }
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    warn!(%key, error = %message, "job panicked");
                    JobStatus::Error { message }
                }
            };
            lock(&jobs).insert(key, status);
        });

        JobStatus::Running
    }

    /// Current status of `key`, without side effects.
    pub fn poll(&self, key: &K) -> JobStatus {
        lock(&self.jobs)
            .get(key)
            .cloned()
            .unwrap_or(JobStatus::Absent)
    }

    /// Number of jobs currently in the `Running` state.
    pub fn running(&self) -> usize {
        lock(&self.jobs)
            .values()
            .filter(|status| **status == JobStatus::Running)
            .count()
    }
}

fn lock<K>(jobs: &Registry<K>) -> MutexGuard<'_, HashMap<K, JobStatus>> {
    jobs.lock().unwrap_or_else(PoisonError::into_inner)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "job panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::{Duration, Instant};

    fn wait_terminal(scheduler: &JobScheduler<String>, key: &String) -> JobStatus {
        let start = Instant::now();
        loop {
            let status = scheduler.poll(key);
            if status.is_terminal() || start.elapsed() > Duration::from_secs(5) {
                return status;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_poll_unknown_is_absent() {
        let scheduler = JobScheduler::<String>::new(1).unwrap();
        assert_eq!(scheduler.poll(&"never".to_string()), JobStatus::Absent);
    }

    #[test]
    fn test_duplicate_submit_runs_once() {
        let scheduler = JobScheduler::new(2).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let (release, gate) = mpsc::channel::<()>();
        let key = "leeds_rotterdam_2026-02-08_18".to_string();

        let counter = Arc::clone(&runs);
        let first = scheduler.submit(key.clone(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            gate.recv().ok();
            Ok::<_, String>(())
        });

        let counter = Arc::clone(&runs);
        let second = scheduler.submit(key.clone(), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<_, String>(())
        });

        assert_eq!(first, JobStatus::Running);
        assert_eq!(second, JobStatus::Running);
        assert_eq!(scheduler.running(), 1);

        release.send(()).unwrap();
        assert_eq!(wait_terminal(&scheduler, &key), JobStatus::Ready);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_error_is_recorded() {
        let scheduler = JobScheduler::new(1).unwrap();
        let key = "failing".to_string();
        scheduler.submit(key.clone(), || Err::<(), _>("routing service unavailable"));
        assert_eq!(
            wait_terminal(&scheduler, &key),
            JobStatus::Error {
                message: "routing service unavailable".to_string()
            }
        );
    }

    #[test]
    fn test_panic_is_recorded_and_pool_survives() {
        let scheduler = JobScheduler::new(1).unwrap();
        let bad = "panics".to_string();
        scheduler.submit(bad.clone(), || -> Result<(), String> { panic!("chart backend crashed") });
        assert_eq!(
            wait_terminal(&scheduler, &bad),
            JobStatus::Error {
                message: "chart backend crashed".to_string()
            }
        );

        let good = "after-panic".to_string();
        scheduler.submit(good.clone(), || Ok::<_, String>(()));
        assert_eq!(wait_terminal(&scheduler, &good), JobStatus::Ready);
    }

    #[test]
    fn test_resubmit_after_terminal_runs_again() {
        let scheduler = JobScheduler::new(1).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let key = "again".to_string();

        for _ in 0..2 {
            let counter = Arc::clone(&runs);
            let status = scheduler.submit(key.clone(), move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(())
            });
            assert_eq!(status, JobStatus::Running);
            assert_eq!(wait_terminal(&scheduler, &key), JobStatus::Ready);
        }

        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }
}
