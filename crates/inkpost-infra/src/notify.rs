//! Comment notifications delivered through the job queue.
//!
//! [`QueuedNotifier`] turns each notice into a `comment_notification` job;
//! [`start_notification_worker`] drains those jobs and mails the post
//! author. Nothing on this path reports back to the commenter.

use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use inkpost_core::ports::{
    CommentNotice, Job, JobQueue, JobQueueError, JobResult, MailError, MailMessage, Mailer,
    Notifier,
};

pub const COMMENT_NOTIFICATION_JOB: &str = "comment_notification";

/// Values needed to render outgoing mail.
#[derive(Debug, Clone)]
pub struct MailSettings {
    /// Absolute base URL, without a trailing slash.
    pub site_url: String,
    pub from: String,
}

impl Default for MailSettings {
    fn default() -> Self {
        Self {
            site_url: "http://127.0.0.1:8080".to_string(),
            from: "from@example.com".to_string(),
        }
    }
}

/// Notifier that defers delivery to the job queue.
pub struct QueuedNotifier<Q> {
    queue: Arc<Q>,
}

impl<Q: JobQueue> QueuedNotifier<Q> {
    pub fn new(queue: Arc<Q>) -> Self {
        Self { queue }
    }
}

#[async_trait]
impl<Q: JobQueue + 'static> Notifier for QueuedNotifier<Q> {
    async fn comment_added(&self, notice: CommentNotice) {
        let queued = match Job::from_payload(COMMENT_NOTIFICATION_JOB, &notice) {
            Ok(job) => self.queue.enqueue(job).await,
            Err(e) => Err(e),
        };

        match queued {
            Ok(()) => {
                tracing::debug!(post_id = %notice.post_id, comment_id = %notice.comment_id, "Comment notification queued");
            }
            Err(JobQueueError::QueueFull) => {
                tracing::warn!(post_id = %notice.post_id, "Notification queue full, dropping comment notification");
            }
            Err(e) => {
                tracing::warn!(post_id = %notice.post_id, error = %e, "Could not queue comment notification");
            }
        }
    }
}

/// The mail sent to a post author about a new comment.
pub fn render_comment_mail(notice: &CommentNotice, settings: &MailSettings) -> MailMessage {
    let post_url = format!(
        "{}/posts/{}/",
        settings.site_url.trim_end_matches('/'),
        notice.post_id
    );
    MailMessage {
        from: settings.from.clone(),
        to: vec![notice.recipient_email.clone()],
        subject: "New comment".to_string(),
        body: format!(
            "{} left a comment on your post \"{}\".\n\nRead it at {}",
            notice.commenter_username, notice.post_title, post_url
        ),
    }
}

/// Spawn the workers that deliver queued notifications through `mailer`.
pub async fn start_notification_worker<Q: JobQueue>(
    queue: &Q,
    mailer: Arc<dyn Mailer>,
    settings: MailSettings,
) -> Result<(), JobQueueError> {
    let settings = Arc::new(settings);

    queue
        .start_worker(move |job| {
            let mailer = mailer.clone();
            let settings = settings.clone();
            async move { deliver(job, mailer.as_ref(), &settings).await }.boxed()
        })
        .await
}

async fn deliver(job: Job, mailer: &dyn Mailer, settings: &MailSettings) -> JobResult {
    if job.job_type != COMMENT_NOTIFICATION_JOB {
        return JobResult::Failed(format!("unknown job type '{}'", job.job_type));
    }

    let notice: CommentNotice = match job.payload_as() {
        Ok(notice) => notice,
        Err(e) => return JobResult::Failed(format!("malformed payload: {e}")),
    };

    match mailer.send(render_comment_mail(&notice, settings)).await {
        Ok(()) => {
            tracing::info!(post_id = %notice.post_id, comment_id = %notice.comment_id, "Comment notification sent");
            JobResult::Success
        }
        Err(MailError::Transport(reason)) => JobResult::Retry(reason),
        Err(e @ MailError::Rejected(_)) => {
            tracing::warn!(post_id = %notice.post_id, error = %e, "Comment notification rejected");
            JobResult::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::Mutex;
    use uuid::Uuid;

    use crate::jobs::{InMemoryJobQueue, InMemoryJobQueueConfig};

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<MailMessage>>,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: MailMessage) -> Result<(), MailError> {
            self.sent.lock().await.push(message);
            Ok(())
        }
    }

    struct RejectingMailer;

    #[async_trait]
    impl Mailer for RejectingMailer {
        async fn send(&self, _message: MailMessage) -> Result<(), MailError> {
            Err(MailError::Rejected("mailbox unavailable".to_string()))
        }
    }

    fn notice() -> CommentNotice {
        CommentNotice {
            post_id: Uuid::new_v4(),
            post_title: "Spring in Kazan".to_string(),
            comment_id: Uuid::new_v4(),
            commenter_username: "bob".to_string(),
            recipient_email: "alice@example.com".to_string(),
        }
    }

    fn settings() -> MailSettings {
        MailSettings {
            site_url: "https://blog.example.com/".to_string(),
            from: "noreply@example.com".to_string(),
        }
    }

    fn queue() -> Arc<InMemoryJobQueue> {
        Arc::new(InMemoryJobQueue::new(InMemoryJobQueueConfig {
            max_size: 10,
            workers: 1,
            retry_backoff: Duration::from_millis(1),
        }))
    }

    #[test]
    fn test_render_comment_mail() {
        let notice = notice();

        let mail = render_comment_mail(&notice, &settings());

        assert_eq!(mail.subject, "New comment");
        assert_eq!(mail.from, "noreply@example.com");
        assert_eq!(mail.to, vec!["alice@example.com".to_string()]);
        assert!(mail.body.contains("bob"));
        assert!(mail.body.contains("Spring in Kazan"));
        assert!(mail.body.contains(&format!("https://blog.example.com/posts/{}/", notice.post_id)));
    }

    #[tokio::test]
    async fn test_queued_notice_is_mailed() {
        let queue = queue();
        let mailer = Arc::new(RecordingMailer::default());
        start_notification_worker(queue.as_ref(), mailer.clone(), settings())
            .await
            .unwrap();

        QueuedNotifier::new(queue.clone()).comment_added(notice()).await;

        for _ in 0..200 {
            if !mailer.sent.lock().await.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let sent = mailer.sent.lock().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["alice@example.com".to_string()]);
    }

    #[tokio::test]
    async fn test_rejected_mail_fails_job() {
        let queue = queue();
        start_notification_worker(queue.as_ref(), Arc::new(RejectingMailer), settings())
            .await
            .unwrap();

        QueuedNotifier::new(queue.clone()).comment_added(notice()).await;

        let mut failed = 0;
        for _ in 0..200 {
            failed = queue.stats().await.unwrap().failed;
            if failed > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(failed, 1);
    }

    #[tokio::test]
    async fn test_full_queue_is_swallowed() {
        let queue = Arc::new(InMemoryJobQueue::new(InMemoryJobQueueConfig {
            max_size: 1,
            workers: 1,
            retry_backoff: Duration::from_millis(1),
        }));
        let notifier = QueuedNotifier::new(queue.clone());

        notifier.comment_added(notice()).await;
        notifier.comment_added(notice()).await;

        assert_eq!(queue.stats().await.unwrap().pending, 1);
    }
}
