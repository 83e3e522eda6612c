//! Job queue port - deferred work such as outbound notifications.

use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// A unit of deferred work.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    /// Routes the job to its handler.
    pub job_type: String,
    pub payload: serde_json::Value,
    pub attempts: u32,
    pub max_attempts: u32,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn new(job_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            job_type: job_type.into(),
            payload,
            attempts: 0,
            max_attempts: 3,
            created_at: Utc::now(),
        }
    }

    /// Build a job from any serializable payload.
    pub fn from_payload<T: Serialize>(
        job_type: impl Into<String>,
        payload: &T,
    ) -> Result<Self, JobQueueError> {
        let payload =
            serde_json::to_value(payload).map_err(|e| JobQueueError::Payload(e.to_string()))?;
        Ok(Self::new(job_type, payload))
    }

    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }

    pub fn with_max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }
}

/// Outcome of running a job.
#[derive(Debug)]
pub enum JobResult {
    Success,
    /// Transient failure; the job goes back on the queue while attempts remain.
    Retry(String),
    /// Permanent failure.
    Failed(String),
}

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Put a job on the queue.
    async fn enqueue(&self, job: Job) -> Result<(), JobQueueError>;

    /// Spawn workers that feed queued jobs to `handler`.
    async fn start_worker<F>(&self, handler: F) -> Result<(), JobQueueError>
    where
        F: Fn(Job) -> Pin<Box<dyn Future<Output = JobResult> + Send>> + Send + Sync + 'static;

    async fn stats(&self) -> Result<QueueStats, JobQueueError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum JobQueueError {
    #[error("Failed to enqueue job: {0}")]
    EnqueueError(String),

    #[error("Queue is full")]
    QueueFull,

    #[error("Invalid job payload: {0}")]
    Payload(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_job_defaults() {
        let job = Job::new("comment_notification", serde_json::json!({})).with_max_attempts(1);
        assert_eq!(job.attempts, 0);
        assert_eq!(job.max_attempts, 1);
        assert!(!job.id.is_empty());
    }

    #[test]
    fn test_unserializable_payload_is_rejected() {
        struct Unencodable;

        impl Serialize for Unencodable {
            fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
                Err(serde::ser::Error::custom("no wire form"))
            }
        }

        let result = Job::from_payload("comment_notification", &Unencodable);
        assert!(matches!(result, Err(JobQueueError::Payload(msg)) if msg.contains("no wire form")));
    }

    #[test]
    fn test_payload_type_mismatch_is_an_error() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Expected {
            post_id: uuid::Uuid,
        }

        let job = Job::new("comment_notification", serde_json::json!({ "post_id": 7 }));
        assert!(job.payload_as::<Expected>().is_err());
    }
}
