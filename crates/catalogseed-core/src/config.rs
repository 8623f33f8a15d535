//! # Configuration File Parser
//!
//! Reads `catalogseed.toml`, the optional configuration file that sets
//! defaults for connection, concurrency and batch sizes. CLI flags always
//! win over anything set here.
//!
//! Example `catalogseed.toml`:
//!
//! ```toml
//! [database]
//! url = "postgres://localhost/catalog"
//! username = "loader"
//! schema = "staging"
//!
//! [run]
//! workers = 20
//! queue_capacity = 100
//! seed = 42
//! max_connections = 50
//!
//! [batch]
//! tags = 10000
//! products = 4000
//! relations = 10000
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::dispatch::DispatchConfig;
use crate::error::{CatalogSeedError, Result};
use crate::import::BatchSizes;

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "catalogseed.toml";

/// Top-level catalogseed.toml structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogSeedConfig {
    pub database: DatabaseConfig,
    pub run: RunConfig,
    pub batch: BatchConfig,

    /// Directory the file was read from.
    #[serde(skip)]
    pub config_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Target schema, `public` when unset.
    pub schema: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub workers: Option<usize>,
    pub queue_capacity: Option<usize>,
    /// Base seed for the worker streams.
    pub seed: Option<u64>,
    pub max_connections: Option<u32>,
}

/// Per-entity batch size overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub categories: Option<usize>,
    pub tags: Option<usize>,
    pub products: Option<usize>,
    pub promos: Option<usize>,
    pub downloads: Option<usize>,
    pub relations: Option<usize>,
}

/// Read and parse catalogseed.toml from the given directory.
///
/// Returns `None` if the file doesn't exist.
pub fn read_config(dir: &Path) -> Result<Option<CatalogSeedConfig>> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| CatalogSeedError::Config {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;

    let mut config: CatalogSeedConfig =
        toml::from_str(&content).map_err(|e| CatalogSeedError::Config {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;
    config.config_dir = Some(dir.to_path_buf());

    config.validate()?;
    tracing::debug!("Loaded {}", path.display());
    Ok(Some(config))
}

impl CatalogSeedConfig {
    /// Batch sizes with the file's overrides applied over the defaults.
    pub fn batch_sizes(&self) -> BatchSizes {
        let defaults = BatchSizes::default();
        BatchSizes {
            categories: self.batch.categories.unwrap_or(defaults.categories),
            tags: self.batch.tags.unwrap_or(defaults.tags),
            products: self.batch.products.unwrap_or(defaults.products),
            promos: self.batch.promos.unwrap_or(defaults.promos),
            downloads: self.batch.downloads.unwrap_or(defaults.downloads),
            relations: self.batch.relations.unwrap_or(defaults.relations),
        }
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        let defaults = DispatchConfig::default();
        DispatchConfig {
            workers: self.run.workers.unwrap_or(defaults.workers),
            queue_capacity: self.run.queue_capacity.unwrap_or(defaults.queue_capacity),
            seed: self.run.seed,
        }
    }

    /// Validate what serde cannot: zero counts and batch sizes that would
    /// exceed the statement parameter limit.
    pub fn validate(&self) -> Result<()> {
        if self.run.workers == Some(0) {
            return Err(CatalogSeedError::config(
                "[run] workers must be > 0 in catalogseed.toml",
            ));
        }
        if self.run.queue_capacity == Some(0) {
            return Err(CatalogSeedError::config(
                "[run] queue_capacity must be > 0 in catalogseed.toml",
            ));
        }
        if self.run.max_connections == Some(0) {
            return Err(CatalogSeedError::config(
                "[run] max_connections must be > 0 in catalogseed.toml",
            ));
        }
        self.batch_sizes().validate().map_err(|e| match e {
            CatalogSeedError::Config { message } => CatalogSeedError::Config {
                message: format!("[batch] {}", message),
            },
            other => other,
        })
    }
}
