use std::time::Duration;

#[cfg(feature = "postgres")]
use std::sync::Arc;

#[cfg(feature = "postgres")]
use inkpost_core::services::Repositories;
#[cfg(feature = "postgres")]
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DbConn, DbErr};

#[cfg(feature = "postgres")]
use super::postgres_repo::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresLocationRepository,
    PostgresPostRepository, PostgresUserRepository,
};

/// Connection settings for the blog database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
}

impl DatabaseConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 100,
            min_connections: 10,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Pooled connection to the blog database.
#[cfg(feature = "postgres")]
#[derive(Clone)]
pub struct DatabaseConnections {
    pub main: DbConn,
}

#[cfg(feature = "postgres")]
impl DatabaseConnections {
    /// Open the connection pool described by `config`.
    pub async fn init(config: &DatabaseConfig) -> Result<Self, DbErr> {
        tracing::info!("Initializing database connection pool...");

        let opts = ConnectOptions::new(&config.url)
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .connect_timeout(config.connect_timeout)
            .idle_timeout(Duration::from_secs(300))
            .sqlx_logging(true)
            .to_owned();

        let main = Database::connect(opts).await?;
        tracing::info!(
            max_connections = config.max_connections,
            "Database connected"
        );

        Ok(Self { main })
    }

    /// SeaORM-backed repositories sharing this pool.
    pub fn repositories(&self) -> Repositories {
        Repositories {
            users: Arc::new(PostgresUserRepository::new(self.main.clone())),
            categories: Arc::new(PostgresCategoryRepository::new(self.main.clone())),
            locations: Arc::new(PostgresLocationRepository::new(self.main.clone())),
            posts: Arc::new(PostgresPostRepository::new(self.main.clone())),
            comments: Arc::new(PostgresCommentRepository::new(self.main.clone())),
        }
    }

    /// Round-trip a trivial statement; used by the health check.
    pub async fn ping(&self) -> bool {
        self.main.execute_unprepared("SELECT 1").await.is_ok()
    }
}
