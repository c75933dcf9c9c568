use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::{AuthMode, Config};

/// Project config file, read from the working directory.
pub const CONFIG_FILE: &str = "planner-janitor.yaml";
/// Optional local overrides, typically kept out of version control.
pub const LOCAL_CONFIG_FILE: &str = "planner-janitor.local.yaml";
/// Prefix of environment overrides; nesting uses `__`.
pub const ENV_PREFIX: &str = "JANITOR_";

/// Configuration error types
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("auth.tenant_id cannot be empty")]
    MissingTenantId,

    #[error("auth.client_id cannot be empty")]
    MissingClientId,

    #[error("auth.client_secret is required when auth.mode is 'app'")]
    MissingClientSecret,

    #[error("auth.delegated_scopes cannot be empty when auth.mode is 'delegated'")]
    MissingDelegatedScopes,

    #[error("mailbox.user_email cannot be empty")]
    MissingUserEmail,

    #[error("planner.plan_title cannot be empty")]
    MissingPlanTitle,

    #[error("Invalid max_delete_per_run: {0}. Must be at least 1")]
    InvalidMaxDelete(usize),

    #[error("Invalid request_timeout_secs: {0}. Must be positive")]
    InvalidRequestTimeout(f64),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. planner-janitor.yaml in the working directory (optional)
    /// 3. planner-janitor.local.yaml (optional)
    /// 4. Environment variables (JANITOR_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(CONFIG_FILE))
            .merge(Yaml::file(LOCAL_CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring environment
    /// overrides.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let auth = &config.auth;
        if auth.tenant_id.trim().is_empty() {
            return Err(ConfigError::MissingTenantId);
        }
        if auth.client_id.trim().is_empty() {
            return Err(ConfigError::MissingClientId);
        }
        match auth.mode {
            AuthMode::App => {
                if auth.client_secret.as_deref().is_none_or(|s| s.is_empty()) {
                    return Err(ConfigError::MissingClientSecret);
                }
            }
            AuthMode::Delegated => {
                if auth.delegated_scopes.iter().all(|s| s.trim().is_empty()) {
                    return Err(ConfigError::MissingDelegatedScopes);
                }
            }
        }

        if config.mailbox.user_email.trim().is_empty() {
            return Err(ConfigError::MissingUserEmail);
        }
        if config.planner.plan_title.trim().is_empty() {
            return Err(ConfigError::MissingPlanTitle);
        }

        if config.cleanup.max_delete_per_run == 0 {
            return Err(ConfigError::InvalidMaxDelete(0));
        }
        if config.graph.request_timeout_secs <= 0.0 || !config.graph.request_timeout_secs.is_finite() {
            return Err(ConfigError::InvalidRequestTimeout(
                config.graph.request_timeout_secs,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        Ok(())
    }
}
