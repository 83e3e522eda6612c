//! # Inkpost Shared
//!
//! Wire types of the HTTP API. Kept free of server crates so that clients
//! can depend on it directly.

pub mod dto;
pub mod response;

pub use response::ErrorResponse;
