//! Single-flight FIFO queue for background jobs.
//!
//! Jobs run one at a time, in enqueue order, on a drain task that is
//! spawned on demand and exits once the queue is empty. A failing or
//! panicking job is logged and counted; the queue moves on to the next
//! job and never retries.

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, oneshot};

use tagvault_core::config::WorkerConfig;
use tagvault_core::error::AppError;
use tagvault_core::result::AppResult;

type BoxJob = Pin<Box<dyn Future<Output = AppResult<()>> + Send + 'static>>;

struct PendingJob {
    seq: u64,
    kind: &'static str,
    enqueued_at: Instant,
    future: BoxJob,
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<PendingJob>,
    draining: bool,
    running: Option<&'static str>,
    next_seq: u64,
    enqueued: u64,
    completed: u64,
    failed: u64,
    enqueued_by_kind: BTreeMap<&'static str, u64>,
}

struct Inner {
    state: Mutex<QueueState>,
    idle: Notify,
    slow_job_warn: Duration,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Queue statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Jobs waiting to run
    pub pending: usize,
    /// Kind of the job currently running, if any
    pub running: Option<String>,
    /// Jobs accepted since startup
    pub enqueued: u64,
    /// Jobs that finished with `Ok`
    pub completed: u64,
    /// Jobs that returned an error or panicked
    pub failed: u64,
    /// Jobs accepted since startup, per kind
    pub enqueued_by_kind: BTreeMap<String, u64>,
}

/// Handle for a job whose output the caller wants back.
#[derive(Debug)]
pub struct JobResult<T> {
    rx: oneshot::Receiver<AppResult<T>>,
}

impl<T> JobResult<T> {
    /// Wait for the job to run and return its output.
    pub async fn wait(self) -> AppResult<T> {
        self.rx
            .await
            .map_err(|_| AppError::internal("Background job ended without a result"))?
    }
}

/// In-process background job queue.
///
/// Cloning is cheap and every clone feeds the same queue.
#[derive(Clone)]
pub struct JobQueue {
    inner: Arc<Inner>,
}

impl JobQueue {
    /// Create a queue that warns about jobs running longer than `slow_job_warn`.
    pub fn new(slow_job_warn: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(QueueState::default()),
                idle: Notify::new(),
                slow_job_warn,
            }),
        }
    }

    /// Create a queue from the worker configuration.
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self::new(Duration::from_millis(config.slow_job_warn_ms))
    }

    /// Append a job and start draining if the queue is idle.
    ///
    /// Never blocks and never fails. Must be called from within a Tokio
    /// runtime.
    pub fn enqueue<F>(&self, kind: &'static str, job: F)
    where
        F: Future<Output = AppResult<()>> + Send + 'static,
    {
        let (seq, start_drain) = {
            let mut state = self.inner.lock();
            state.next_seq += 1;
            let seq = state.next_seq;
            state.pending.push_back(PendingJob {
                seq,
                kind,
                enqueued_at: Instant::now(),
                future: Box::pin(job),
            });
            state.enqueued += 1;
            *state.enqueued_by_kind.entry(kind).or_insert(0) += 1;

            let start_drain = !state.draining;
            state.draining = true;
            (seq, start_drain)
        };

        tracing::debug!(job = kind, seq, "Enqueued background job");

        if start_drain {
            tokio::spawn(drain(Arc::clone(&self.inner)));
        }
    }

    /// Enqueue a job whose output is handed back through [`JobResult`].
    ///
    /// The job still runs in its FIFO slot; the caller only waits for it.
    pub fn enqueue_with_result<F, T>(&self, kind: &'static str, job: F) -> JobResult<T>
    where
        F: Future<Output = AppResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        self.enqueue(kind, async move {
            let result = job.await;
            let status = match &result {
                Ok(_) => Ok(()),
                Err(e) => Err(e.clone()),
            };
            let _ = tx.send(result);
            status
        });
        JobResult { rx }
    }

    /// Whether nothing is pending or running.
    pub fn is_idle(&self) -> bool {
        let state = self.inner.lock();
        !state.draining && state.pending.is_empty()
    }

    /// Resolve once the queue has drained completely.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }

    /// Snapshot of the queue counters.
    pub fn stats(&self) -> QueueStats {
        let state = self.inner.lock();
        QueueStats {
            pending: state.pending.len(),
            running: state.running.map(str::to_string),
            enqueued: state.enqueued,
            completed: state.completed,
            failed: state.failed,
            enqueued_by_kind: state
                .enqueued_by_kind
                .iter()
                .map(|(kind, count)| (kind.to_string(), *count))
                .collect(),
        }
    }
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::from_config(&WorkerConfig::default())
    }
}

impl fmt::Debug for JobQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobQueue")
            .field("stats", &self.stats())
            .field("slow_job_warn", &self.inner.slow_job_warn)
            .finish()
    }
}

/// Run jobs until the queue is empty, then clear the draining flag.
async fn drain(inner: Arc<Inner>) {
    loop {
        let job = {
            let mut state = inner.lock();
            match state.pending.pop_front() {
                Some(job) => {
                    state.running = Some(job.kind);
                    job
                }
                None => {
                    state.draining = false;
                    state.running = None;
                    drop(state);
                    inner.idle.notify_waiters();
                    return;
                }
            }
        };

        let PendingJob {
            seq,
            kind,
            enqueued_at,
            future,
        } = job;
        let waited_ms = enqueued_at.elapsed().as_millis() as u64;
        tracing::debug!(job = kind, seq, waited_ms, "Starting background job");

        let started = Instant::now();
        let outcome = AssertUnwindSafe(future).catch_unwind().await;
        let elapsed = started.elapsed();
        let duration_ms = elapsed.as_millis() as u64;

        let succeeded = match outcome {
            Ok(Ok(())) => {
                tracing::debug!(job = kind, seq, duration_ms, "Background job finished");
                true
            }
            Ok(Err(e)) => {
                tracing::error!(job = kind, seq, duration_ms, error = %e, "Background job failed");
                false
            }
            Err(panic) => {
                tracing::error!(
                    job = kind,
                    seq,
                    duration_ms,
                    panic = panic_message(panic.as_ref()),
                    "Background job panicked"
                );
                false
            }
        };

        if elapsed > inner.slow_job_warn {
            tracing::warn!(job = kind, seq, duration_ms, "Slow background job");
        }

        let mut state = inner.lock();
        state.running = None;
        if succeeded {
            state.completed += 1;
        } else {
            state.failed += 1;
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn queue() -> JobQueue {
        JobQueue::new(Duration::from_secs(60))
    }

    async fn explode<T>() -> AppResult<T> {
        panic!("boom")
    }

    #[tokio::test]
    async fn test_jobs_run_in_fifo_order() {
        let queue = queue();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for i in 0..5 {
            let seen = Arc::clone(&seen);
            queue.enqueue("record", async move {
                tokio::task::yield_now().await;
                seen.lock().unwrap().push(i);
                Ok(())
            });
        }
        queue.wait_idle().await;
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_at_most_one_job_runs_at_a_time() {
        let queue = queue();
        let active = Arc::new(AtomicUsize::new(0));
        let max_seen = Arc::new(AtomicUsize::new(0));
        for _ in 0..8 {
            let active = Arc::clone(&active);
            let max_seen = Arc::clone(&max_seen);
            queue.enqueue("overlap", async move {
                let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                max_seen.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                active.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            });
        }
        queue.wait_idle().await;
        assert_eq!(max_seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_and_panics_do_not_stop_the_queue() {
        let queue = queue();
        let ran = Arc::new(AtomicUsize::new(0));

        queue.enqueue("fails", async { Err(AppError::storage("disk unplugged")) });
        queue.enqueue("panics", explode::<()>());
        let counter = Arc::clone(&ran);
        queue.enqueue("after", async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        queue.wait_idle().await;
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        let stats = queue.stats();
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.pending, 0);
        assert!(stats.running.is_none());
    }

    #[tokio::test]
    async fn test_enqueue_during_drain_runs_after_current_job() {
        let queue = queue();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let inner_queue = queue.clone();
        let outer_seen = Arc::clone(&seen);
        queue.enqueue("outer", async move {
            let inner_seen = Arc::clone(&outer_seen);
            inner_queue.enqueue("inner", async move {
                inner_seen.lock().unwrap().push("inner");
                Ok(())
            });
            outer_seen.lock().unwrap().push("outer");
            Ok(())
        });
        let tail_seen = Arc::clone(&seen);
        queue.enqueue("tail", async move {
            tail_seen.lock().unwrap().push("tail");
            Ok(())
        });

        queue.wait_idle().await;
        assert_eq!(*seen.lock().unwrap(), vec!["outer", "tail", "inner"]);
    }

    #[tokio::test]
    async fn test_drain_restarts_after_idle() {
        let queue = queue();
        let ran = Arc::new(AtomicUsize::new(0));

        for _ in 0..2 {
            let counter = Arc::clone(&ran);
            queue.enqueue("tick", async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
            queue.wait_idle().await;
            assert!(queue.is_idle());
        }

        assert_eq!(ran.load(Ordering::SeqCst), 2);
        assert_eq!(queue.stats().enqueued_by_kind.get("tick"), Some(&2));
    }

    #[tokio::test]
    async fn test_enqueue_does_not_wait_for_the_job() {
        let queue = queue();
        let (release_tx, release_rx) = oneshot::channel::<()>();
        queue.enqueue("blocked", async move {
            let _ = release_rx.await;
            Ok(())
        });
        queue.enqueue("queued", async { Ok(()) });

        assert!(!queue.is_idle());
        assert_eq!(queue.stats().enqueued, 2);

        release_tx.send(()).unwrap();
        queue.wait_idle().await;
        assert_eq!(queue.stats().completed, 2);
    }

    #[tokio::test]
    async fn test_enqueue_with_result_hands_back_output() {
        let queue = queue();
        let answer = queue.enqueue_with_result("answer", async { Ok(42) });
        assert_eq!(answer.wait().await.unwrap(), 42);

        let failed = queue.enqueue_with_result::<_, ()>("fails", async {
            Err(AppError::not_found("gone"))
        });
        assert!(failed.wait().await.unwrap_err().is_not_found());

        let panicked = queue.enqueue_with_result("panics", explode::<()>());
        assert_eq!(
            panicked.wait().await.unwrap_err().kind,
            tagvault_core::error::ErrorKind::Internal
        );
    }
}
