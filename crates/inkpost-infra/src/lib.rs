//! # Inkpost Infrastructure
//!
//! Concrete implementations of the ports defined in `inkpost-core`:
//! storage, authentication, the job queue, mail transports and the
//! notification pipeline.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - In-memory store only
//! - `postgres` - PostgreSQL storage via SeaORM
//! - `auth` - JWT + Argon2 authentication

pub mod database;
pub mod jobs;
pub mod mail;
pub mod notify;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use database::{DatabaseConfig, InMemoryStore};
pub use jobs::{InMemoryJobQueue, InMemoryJobQueueConfig};
pub use mail::{LogMailer, WebhookMailer};
pub use notify::{MailSettings, QueuedNotifier, start_notification_worker};

#[cfg(feature = "postgres")]
pub use database::DatabaseConnections;

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};
