//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Secrets (promo tokens) are referenced by env-var name in the config
//! and resolved at runtime via `std::env::var`.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub game: GameConfig,
    pub auth: AuthConfig,
    pub promo: PromoConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// sqlx connection string, e.g. `sqlite://goldflip.db`.
    pub database_url: String,
}

/// Gameplay knobs. Delays belong to the presentation adapter, not to
/// settlement semantics — tests run them at zero.
#[derive(Debug, Deserialize, Clone)]
pub struct GameConfig {
    #[serde(default = "default_starting_balance")]
    pub starting_balance: u64,
    #[serde(default = "default_flip_delay_ms")]
    pub flip_delay_ms: u64,
    #[serde(default = "default_reset_delay_ms")]
    pub reset_delay_ms: u64,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
    #[serde(default = "default_leaderboard_threshold")]
    pub leaderboard_threshold: u64,
}

fn default_starting_balance() -> u64 {
    100
}

fn default_flip_delay_ms() -> u64 {
    2000
}

fn default_reset_delay_ms() -> u64 {
    3000
}

fn default_history_limit() -> usize {
    50
}

fn default_leaderboard_threshold() -> u64 {
    1000
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            starting_balance: default_starting_balance(),
            flip_delay_ms: default_flip_delay_ms(),
            reset_delay_ms: default_reset_delay_ms(),
            history_limit: default_history_limit(),
            leaderboard_threshold: default_leaderboard_threshold(),
        }
    }
}

/// Static bearer-token table, standing in for the external identity
/// provider: token → stable user id.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub tokens: HashMap<String, String>,
}

/// Server-verified promotional redemption.
#[derive(Debug, Deserialize, Clone)]
pub struct PromoConfig {
    /// Balance granted on a successful redemption.
    #[serde(default = "default_grant_balance")]
    pub grant_balance: u64,
    /// Inline one-time token values (development only).
    #[serde(default)]
    pub tokens: Vec<String>,
    /// Env var holding comma-separated one-time token values.
    #[serde(default)]
    pub tokens_env: Option<String>,
}

fn default_grant_balance() -> u64 {
    500
}

impl Default for PromoConfig {
    fn default() -> Self {
        PromoConfig {
            grant_balance: default_grant_balance(),
            tokens: Vec::new(),
            tokens_env: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}
