//! In-process job queue.
//!
//! Jobs live in a bounded channel and are drained by a fixed set of tokio
//! workers. Queued jobs are lost on restart.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use inkpost_core::ports::{Job, JobQueue, JobQueueError, JobResult, QueueStats};

/// Channel capacity used when no `max_size` is configured.
pub const FALLBACK_CAPACITY: usize = 1024;

type Handler = dyn Fn(Job) -> Pin<Box<dyn Future<Output = JobResult> + Send>> + Send + Sync;

/// In-memory job queue configuration.
#[derive(Debug, Clone)]
pub struct InMemoryJobQueueConfig {
    /// Maximum number of pending jobs. 0 means the default channel
    /// capacity of [`FALLBACK_CAPACITY`].
    pub max_size: usize,
    /// Number of worker tasks.
    pub workers: usize,
    /// Base delay before a retried job is queued again; multiplied by the
    /// attempt number.
    pub retry_backoff: Duration,
}

impl Default for InMemoryJobQueueConfig {
    fn default() -> Self {
        Self {
            max_size: 1000,
            workers: 2,
            retry_backoff: Duration::from_millis(100),
        }
    }
}

#[derive(Default)]
struct Counters {
    pending: AtomicUsize,
    processing: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

/// Job queue backed by a tokio channel.
pub struct InMemoryJobQueue {
    config: InMemoryJobQueueConfig,
    counters: Arc<Counters>,
    sender: mpsc::Sender<Job>,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
}

impl InMemoryJobQueue {
    pub fn new(config: InMemoryJobQueueConfig) -> Self {
        let capacity = if config.max_size == 0 {
            FALLBACK_CAPACITY
        } else {
            config.max_size
        };
        let (sender, receiver) = mpsc::channel(capacity);

        Self {
            config,
            counters: Arc::new(Counters::default()),
            sender,
            receiver: Arc::new(Mutex::new(receiver)),
        }
    }
}

impl Default for InMemoryJobQueue {
    fn default() -> Self {
        Self::new(InMemoryJobQueueConfig::default())
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError> {
        let max = self.config.max_size;
        if max > 0 && self.counters.pending.load(Ordering::Relaxed) >= max {
            return Err(JobQueueError::QueueFull);
        }

        self.counters.pending.fetch_add(1, Ordering::Relaxed);
        if let Err(e) = self.sender.try_send(job) {
            self.counters.pending.fetch_sub(1, Ordering::Relaxed);
            return Err(match e {
                mpsc::error::TrySendError::Full(_) => JobQueueError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => {
                    JobQueueError::EnqueueError("queue closed".to_string())
                }
            });
        }

        tracing::debug!(
            pending = self.counters.pending.load(Ordering::Relaxed),
            "Job enqueued"
        );
        Ok(())
    }

    async fn start_worker<F>(&self, handler: F) -> Result<(), JobQueueError>
    where
        F: Fn(Job) -> Pin<Box<dyn Future<Output = JobResult> + Send>> + Send + Sync + 'static,
    {
        let handler: Arc<Handler> = Arc::new(handler);

        for worker_id in 0..self.config.workers.max(1) {
            let worker = Worker {
                id: worker_id,
                handler: handler.clone(),
                receiver: self.receiver.clone(),
                sender: self.sender.clone(),
                counters: self.counters.clone(),
                retry_backoff: self.config.retry_backoff,
            };
            tokio::spawn(worker.run());
        }

        Ok(())
    }

    async fn stats(&self) -> Result<QueueStats, JobQueueError> {
        Ok(QueueStats {
            pending: self.counters.pending.load(Ordering::Relaxed),
            processing: self.counters.processing.load(Ordering::Relaxed),
            completed: self.counters.completed.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
        })
    }
}

struct Worker {
    id: usize,
    handler: Arc<Handler>,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    sender: mpsc::Sender<Job>,
    counters: Arc<Counters>,
    retry_backoff: Duration,
}

impl Worker {
    async fn run(self) {
        tracing::info!(worker = self.id, "Job worker started");

        loop {
            let next = {
                let mut receiver = self.receiver.lock().await;
                receiver.recv().await
            };
            let Some(job) = next else {
                break;
            };
            self.process(job).await;
        }

        tracing::info!(worker = self.id, "Job worker shutting down");
    }

    async fn process(&self, mut job: Job) {
        self.counters.pending.fetch_sub(1, Ordering::Relaxed);
        self.counters.processing.fetch_add(1, Ordering::Relaxed);
        job.attempts += 1;

        tracing::debug!(
            worker = self.id,
            job_id = %job.id,
            job_type = %job.job_type,
            attempt = job.attempts,
            "Processing job"
        );
        let result = (self.handler)(job.clone()).await;
        self.counters.processing.fetch_sub(1, Ordering::Relaxed);

        match result {
            JobResult::Success => {
                self.counters.completed.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(job_id = %job.id, "Job completed");
            }
            JobResult::Retry(reason) if job.attempts < job.max_attempts => {
                tracing::warn!(
                    job_id = %job.id,
                    attempt = job.attempts,
                    max_attempts = job.max_attempts,
                    %reason,
                    "Job failed, will retry"
                );
                self.schedule_retry(job);
            }
            JobResult::Retry(reason) | JobResult::Failed(reason) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(
                    job_id = %job.id,
                    job_type = %job.job_type,
                    attempts = job.attempts,
                    %reason,
                    "Job failed permanently"
                );
            }
        }
    }

    fn schedule_retry(&self, job: Job) {
        let delay = self.retry_backoff * job.attempts;
        let sender = self.sender.clone();
        let counters = self.counters.clone();
        counters.pending.fetch_add(1, Ordering::Relaxed);

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let job_id = job.id.clone();
            if let Err(e) = sender.send(job).await {
                counters.pending.fetch_sub(1, Ordering::Relaxed);
                counters.failed.fetch_add(1, Ordering::Relaxed);
                tracing::error!(%job_id, error = %e, "Failed to re-enqueue job for retry");
            }
        });
    }
}
