//! Configuration management for punchline
//!
//! This module handles configuration loading from environment variables and
//! TOML files, validation, and default values for the engine and ledger.

pub mod app;
pub mod rating;

// Re-export commonly used types
pub use app::{validate_config, AppConfig, LedgerSettings, ServiceSettings};
pub use rating::EloConfig;
