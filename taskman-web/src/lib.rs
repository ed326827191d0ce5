//! # Taskman Web Server Library
//!
//! The HTTP face of the task manager: server-rendered pages over the use
//! cases in `taskman-shared`.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration from the environment
//! - `error`: error pages and service error translation
//! - `flash`: signed one-shot messages
//! - `forms`: submitted form parsing
//! - `i18n`: message catalogue
//! - `middleware`: security headers and method override
//! - `routes`: route handlers
//! - `session`: session cookie and request extractors
//! - `views`: minijinja templates

pub mod app;
pub mod config;
pub mod error;
pub mod flash;
pub mod forms;
pub mod i18n;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod views;
