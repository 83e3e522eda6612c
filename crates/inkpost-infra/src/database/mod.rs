//! Storage: SeaORM repositories over PostgreSQL and an in-memory store with
//! the same foreign-key behaviour.

mod connections;
mod memory;

#[cfg(feature = "postgres")]
mod postgres_base;
#[cfg(feature = "postgres")]
pub mod postgres_repo;
#[cfg(feature = "postgres")]
pub mod post_query;

#[cfg(feature = "postgres")]
pub mod entity;

pub use memory::{InMemoryRepository, InMemoryStore};

pub use connections::DatabaseConfig;

#[cfg(feature = "postgres")]
pub use connections::DatabaseConnections;

#[cfg(feature = "postgres")]
pub use postgres_repo::{
    PostgresCategoryRepository, PostgresCommentRepository, PostgresLocationRepository,
    PostgresPostRepository, PostgresUserRepository,
};

#[cfg(feature = "postgres")]
#[cfg(test)]
mod tests;
