//! # Taskman Shared Library
//!
//! Domain model and use cases of the task manager, independent of HTTP.
//!
//! ## Module Organization
//!
//! - `models`: plain entity structs and typed task relations
//! - `validation`: field-level validation errors
//! - `filter`: the task filter composer
//! - `repository`: persistence ports with PostgreSQL and in-memory adapters
//! - `services`: use cases, authorization rules and deletion guards
//! - `auth`: password hashing and session tokens
//! - `db`: connection pool and migrations
//! - `error`: the use-case error taxonomy

pub mod auth;
pub mod db;
pub mod error;
pub mod filter;
pub mod models;
pub mod repository;
pub mod services;
pub mod validation;

pub use error::{ServiceError, ServiceResult};

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
