//! Application state - shared across all handlers.

use std::sync::Arc;

use inkpost_core::ports::{Mailer, Notifier, PasswordService, TokenService, UserRepository};
use inkpost_core::services::{CommentService, PostService, ProfileService, Repositories};
use inkpost_infra::{
    Argon2PasswordService, InMemoryJobQueue, InMemoryStore, JwtTokenService, LogMailer,
    QueuedNotifier, WebhookMailer, start_notification_worker,
};

#[cfg(feature = "postgres")]
use inkpost_infra::DatabaseConnections;

use crate::config::AppConfig;

/// Which storage backs the repositories.
#[derive(Clone)]
pub enum Storage {
    Memory,
    #[cfg(feature = "postgres")]
    Postgres(DatabaseConnections),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub posts: PostService,
    pub comments: CommentService,
    pub profiles: ProfileService,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub notify_queue: Arc<InMemoryJobQueue>,
    pub storage: Storage,
    pub login_url: String,
}

impl AppState {
    /// Build the application state and start the notification workers.
    pub async fn new(config: &AppConfig) -> Self {
        let (repos, storage) = Self::storage(config).await;

        let notify_queue = Arc::new(InMemoryJobQueue::new(config.notify_queue.clone()));
        let mailer: Arc<dyn Mailer> = match &config.mail_webhook_url {
            Some(url) => {
                tracing::info!("Mail relay configured");
                Arc::new(WebhookMailer::new(url.clone()))
            }
            None => {
                tracing::info!("MAIL_WEBHOOK_URL not set. Mail will only be logged.");
                Arc::new(LogMailer)
            }
        };
        if let Err(e) =
            start_notification_worker(notify_queue.as_ref(), mailer, config.mail.clone()).await
        {
            tracing::error!(error = %e, "Failed to start notification workers");
        }

        let state = Self::build(
            repos,
            storage,
            notify_queue,
            Arc::new(JwtTokenService::new(config.jwt.clone())),
            config.login_url.clone(),
        );
        tracing::info!("Application state initialized");
        state
    }

    /// Wire services over the given repositories.
    pub fn build(
        repos: Repositories,
        storage: Storage,
        notify_queue: Arc<InMemoryJobQueue>,
        tokens: Arc<dyn TokenService>,
        login_url: String,
    ) -> Self {
        let notifier: Arc<dyn Notifier> = Arc::new(QueuedNotifier::new(notify_queue.clone()));

        Self {
            posts: PostService::new(repos.clone()),
            comments: CommentService::new(repos.clone(), notifier),
            profiles: ProfileService::new(repos.clone()),
            users: repos.users,
            tokens,
            passwords: Arc::new(Argon2PasswordService::new()),
            notify_queue,
            storage,
            login_url,
        }
    }

    #[cfg(feature = "postgres")]
    async fn storage(config: &AppConfig) -> (Repositories, Storage) {
        let Some(db_config) = &config.database else {
            tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
            return (InMemoryStore::new().repositories(), Storage::Memory);
        };

        match DatabaseConnections::init(db_config).await {
            Ok(connections) => (connections.repositories(), Storage::Postgres(connections)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to connect to database. Using in-memory fallback.");
                (InMemoryStore::new().repositories(), Storage::Memory)
            }
        }
    }

    #[cfg(not(feature = "postgres"))]
    async fn storage(_config: &AppConfig) -> (Repositories, Storage) {
        tracing::info!("Running without postgres feature - using in-memory repositories");
        (InMemoryStore::new().repositories(), Storage::Memory)
    }

    /// Human-readable storage status for the health check.
    pub async fn storage_status(&self) -> &'static str {
        match &self.storage {
            Storage::Memory => "in-memory",
            #[cfg(feature = "postgres")]
            Storage::Postgres(connections) => {
                if connections.ping().await {
                    "connected"
                } else {
                    "unreachable"
                }
            }
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use inkpost_infra::{InMemoryJobQueueConfig, JwtConfig};

    /// State over `store` with a fixed token secret and no notification
    /// workers, so queued jobs stay observable.
    pub fn in_memory(store: &InMemoryStore) -> AppState {
        let queue = Arc::new(InMemoryJobQueue::new(InMemoryJobQueueConfig {
            max_size: 100,
            workers: 1,
            ..InMemoryJobQueueConfig::default()
        }));
        let tokens = Arc::new(JwtTokenService::new(JwtConfig {
            secret: "test-secret".to_string(),
            expiration_hours: 1,
            issuer: "inkpost-test".to_string(),
        }));
        AppState::build(
            store.repositories(),
            Storage::Memory,
            queue,
            tokens,
            "/auth/login/".to_string(),
        )
    }
}
