//! Shared configuration, database setup, and error handling for Doctor AI
//!
//! This crate provides common functionality used across the service:
//! - Configuration management following 12-factor principles
//! - Error types and their HTTP mapping
//! - SQLite pool construction and the chat log schema
//! - Request body extractors

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::Config;
pub use db::{connect, init_schema};
pub use error::{Error, Result};
pub use extractors::ValidatedJson;
pub use state::StateError;
