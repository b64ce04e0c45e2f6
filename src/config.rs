//! config.rs — TOML configuration with env overrides.
//!
//! Lookup order:
//! 1) $COACH_CONFIG_PATH
//! 2) config/coach.toml
//! 3) built-in defaults
//!
//! Secrets can always be overridden from the environment (COACH_JWT_SECRET),
//! which together with `.env` support keeps them out of the config file.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::recommend::{FeatureDefaults, Weights};

pub const ENV_CONFIG_PATH: &str = "COACH_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/coach.toml";
pub const ENV_JWT_SECRET: &str = "COACH_JWT_SECRET";
pub const ENV_BIND: &str = "COACH_BIND";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub recommender: RecommenderConfig,
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub secret: String,
    pub access_ttl_mins: i64,
    pub refresh_ttl_days: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // Dev fallback only; override via COACH_JWT_SECRET in deployments.
            secret: "dev-secret-change-me".to_string(),
            access_ttl_mins: 60,
            refresh_ttl_days: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct RecommenderConfig {
    pub weights: Weights,
    pub features: FeatureDefaults,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub seed: bool,
}

impl AppConfig {
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).context("parsing app config")
    }
}

/// Load config using env var + fallbacks, then apply env overrides.
pub fn load() -> Result<AppConfig> {
    let path = std::env::var(ENV_CONFIG_PATH)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    let mut config = if path.exists() {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        AppConfig::from_toml_str(&content)?
    } else {
        AppConfig::default()
    };

    if let Ok(secret) = std::env::var(ENV_JWT_SECRET) {
        config.auth.secret = secret;
    }
    if let Ok(bind) = std::env::var(ENV_BIND) {
        config.server.bind = bind;
    }
    Ok(config)
}
