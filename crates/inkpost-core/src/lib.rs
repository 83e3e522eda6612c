//! # Inkpost Core
//!
//! The domain layer of the Inkpost blog.
//! Entities, the publication-visibility rules, pagination, form validation,
//! ports and the services that enforce authorship. No infrastructure
//! dependencies live here.

pub mod domain;
pub mod error;
pub mod pagination;
pub mod ports;
pub mod services;

pub use error::{DomainError, FieldErrors, RepoError};
