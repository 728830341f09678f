//! Startup configuration
//!
//! Values are layered, later sources winning: built-in defaults, an optional
//! YAML file, environment variables (`LISTEN`, `WORKERS`, `DOCROOT`), then
//! command-line flags. Nothing is reloaded at runtime.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use serde::Deserialize;

use crate::fs::ServingRoot;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind, e.g. "0.0.0.0:8000"
    pub listen_addr: String,
    /// Number of worker slots, i.e. the maximum number of connections
    /// handled at once
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            workers: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory request paths are appended to
    pub root: String,
    /// File served when a request names a directory
    pub index_file: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: "/var/www".to_string(),
            index_file: "index.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            static_files: StaticFilesConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Defaults overridden by the environment.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        if let Ok(listen) = std::env::var("LISTEN") {
            self.server.listen_addr = listen;
        }
        if let Ok(workers) = std::env::var("WORKERS") {
            self.server.workers = workers
                .parse()
                .with_context(|| format!("WORKERS must be a positive integer, got {:?}", workers))?;
        }
        if let Ok(root) = std::env::var("DOCROOT") {
            self.static_files.root = root;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.workers == 0 {
            bail!("workers must be at least 1");
        }
        if self.static_files.root.is_empty() {
            bail!("serving root must not be empty");
        }
        if self.static_files.index_file.is_empty() || self.static_files.index_file.contains('/') {
            bail!(
                "index file must be a plain file name, got {:?}",
                self.static_files.index_file
            );
        }
        Ok(())
    }

    pub fn serving_root(&self) -> ServingRoot {
        ServingRoot::new(self.static_files.root.clone())
    }
}

/// Command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "docroot", version, about = "Serve a directory over HTTP")]
pub struct Args {
    /// Directory to serve
    pub root: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long)]
    pub listen: Option<String>,

    /// Number of workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Log level used when RUST_LOG is unset
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Builds the final configuration: file, then environment, then flags.
    pub fn into_config(self) -> anyhow::Result<Config> {
        let mut cfg = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::default(),
        };
        cfg.apply_env()?;

        if let Some(root) = self.root {
            cfg.static_files.root = root;
        }
        if let Some(listen) = self.listen {
            cfg.server.listen_addr = listen;
        }
        if let Some(workers) = self.workers {
            cfg.server.workers = workers;
        }
        if let Some(level) = self.log_level {
            cfg.log_level = level;
        }

        cfg.validate()?;
        Ok(cfg)
    }
}
