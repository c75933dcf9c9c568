//! Shared command bootstrap: configuration, logging and the Graph client.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::clock::SystemClock;
use crate::adapters::graph::GraphClient;
use crate::domain::models::Config;
use crate::domain::ports::Clock;
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging::{LogConfig, LoggerImpl};

/// Everything a command needs to talk to Graph.
pub struct CommandContext {
    pub config: Config,
    pub graph: Arc<GraphClient>,
    pub clock: Arc<dyn Clock>,
    _logger: LoggerImpl,
}

impl CommandContext {
    /// Load configuration (from `config_path` when given), install logging and
    /// build the Graph client.
    pub fn bootstrap(config_path: Option<&Path>) -> Result<Self> {
        let config = load_config(config_path)?;

        let log_config = LogConfig::try_from(&config.logging)?;
        let logger = LoggerImpl::init(&log_config)?;

        let graph = GraphClient::from_config(&config).context("Failed to build Graph client")?;
        tracing::debug!(base_url = %config.graph.base_url, mode = ?config.auth.mode, "graph client ready");

        Ok(Self {
            config,
            graph: Arc::new(graph),
            clock: Arc::new(SystemClock),
            _logger: logger,
        })
    }
}

impl std::fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandContext")
            .field("graph", &self.graph)
            .finish_non_exhaustive()
    }
}

pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    match config_path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}
