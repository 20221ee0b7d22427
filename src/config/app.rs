//! Main application configuration
//!
//! This module defines the top-level configuration for the punchline binary
//! and ledger, including environment variable loading, TOML files and validation.

use crate::config::rating::EloConfig;
use crate::types::DEFAULT_FORM_WINDOW;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub engine: EloConfig,
    pub ledger: LedgerSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Settings for the rating ledger that sits in front of the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// Rating given to a joke on its first comparison
    pub initial_rating: f64,
    /// Population mean that idle ratings are pulled toward
    pub mean_rating: f64,
    /// Number of recent outcomes remembered per joke
    pub form_window: usize,
    /// Maximum number of jokes kept in memory
    pub max_entries: usize,
    /// Compress long-idle ratings before they take part in a comparison
    pub compress_idle_before_compare: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "punchline".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            initial_rating: 1500.0,
            mean_rating: 1500.0,
            form_window: DEFAULT_FORM_WINDOW,
            max_entries: 10_000,
            compress_idle_before_compare: true,
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("Invalid {} value: {}", name, value))
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            config.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            config.service.log_level = log_level;
        }

        // Engine settings
        if let Ok(base_k) = env::var("ELO_BASE_K") {
            config.engine.base_k = parse_env("ELO_BASE_K", &base_k)?;
        }
        if let Ok(decay) = env::var("ELO_VOLATILITY_DECAY") {
            config.engine.volatility_decay = parse_env("ELO_VOLATILITY_DECAY", &decay)?;
        }
        if let Ok(min_games) = env::var("ELO_MIN_GAMES") {
            config.engine.min_games = parse_env("ELO_MIN_GAMES", &min_games)?;
        }
        if let Ok(threshold) = env::var("ELO_CONFIDENCE_THRESHOLD") {
            config.engine.confidence_threshold =
                parse_env("ELO_CONFIDENCE_THRESHOLD", &threshold)?;
        }

        // Ledger settings
        if let Ok(initial) = env::var("LEDGER_INITIAL_RATING") {
            config.ledger.initial_rating = parse_env("LEDGER_INITIAL_RATING", &initial)?;
        }
        if let Ok(mean) = env::var("LEDGER_MEAN_RATING") {
            config.ledger.mean_rating = parse_env("LEDGER_MEAN_RATING", &mean)?;
        }
        if let Ok(window) = env::var("LEDGER_FORM_WINDOW") {
            config.ledger.form_window = parse_env("LEDGER_FORM_WINDOW", &window)?;
        }
        if let Ok(max_entries) = env::var("LEDGER_MAX_ENTRIES") {
            config.ledger.max_entries = parse_env("LEDGER_MAX_ENTRIES", &max_entries)?;
        }
        if let Ok(compress) = env::var("LEDGER_COMPRESS_IDLE") {
            config.ledger.compress_idle_before_compare =
                parse_env("LEDGER_COMPRESS_IDLE", &compress)?;
        }

        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to load config file {}", path.display()))
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        validate_config(&config)?;
        Ok(config)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    config.engine.validate()?;

    // Validate ledger settings
    if !config.ledger.initial_rating.is_finite() {
        return Err(anyhow!("Initial rating must be finite"));
    }
    if !config.ledger.mean_rating.is_finite() {
        return Err(anyhow!("Mean rating must be finite"));
    }
    if config.ledger.form_window == 0 {
        return Err(anyhow!("Form window must be greater than 0"));
    }
    if config.ledger.max_entries < 2 {
        return Err(anyhow!("Max entries must allow at least two jokes"));
    }

    Ok(())
}
