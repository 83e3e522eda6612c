//! Ports - trait definitions for external dependencies.
//! Infrastructure provides the implementations.

mod auth;
mod job_queue;
mod mail;
mod notifier;
mod repository;

pub use auth::{AuthError, PasswordService, ROLE_STAFF, ROLE_USER, TokenClaims, TokenService};
pub use job_queue::{Job, JobQueue, JobQueueError, JobResult, QueueStats};
pub use mail::{MailError, MailMessage, Mailer};
pub use notifier::{CommentNotice, Notifier};
pub use repository::{
    BaseRepository, CategoryRepository, CommentRepository, LocationRepository, PostRepository,
    UserRepository,
};
