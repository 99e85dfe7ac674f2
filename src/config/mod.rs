//! Wiki configuration management for `wiki.toml`.
//!
//! The file is optional: with no `wiki.toml` the server listens on
//! `0.0.0.0:8080`, stores pages under `data/` and serves `public/`.
//!
//! # Sections
//!
//! | Section   | Purpose                                        |
//! |-----------|------------------------------------------------|
//! | `[serve]` | HTTP server (interface, port, workers)         |
//! | `[wiki]`  | Page, static and template dirs, front page     |
//!
//! # Example
//!
//! ```toml
//! [serve]
//! port = 8080
//!
//! [wiki]
//! data = "data"
//! front_page = "Home"
//! ```

pub mod defaults;
mod error;
mod serve;
mod wiki;

use error::ConfigError;
use serve::ServeConfig;
use wiki::WikiConfig;

use crate::{cli::Cli, page::is_valid_title};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing wiki.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Absolute path to the config file (set after loading, may not exist)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// HTTP server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Storage and page settings
    #[serde(default)]
    pub wiki: WikiConfig,
}

impl Config {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Load `wiki.toml` (if present) under the CLI root, apply CLI
    /// overrides and validate.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = cli.root.as_deref().unwrap_or(Path::new("./"));
        let config_path = root.join(&cli.config);

        let mut config = if config_path.exists() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.config_path = Self::normalize_path(&config_path);
        config.update_with_cli(cli);
        config.update_path_with_root(root);
        config.validate()?;

        Ok(config)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        Self::update_option(&mut self.serve.interface, cli.interface.as_ref());
        Self::update_option(&mut self.serve.port, cli.port.as_ref());
        Self::update_option(&mut self.serve.workers, cli.workers.as_ref());
        Self::update_option(&mut self.wiki.data, cli.data.as_ref());
        Self::update_option(&mut self.wiki.public, cli.public.as_ref());
        Self::update_option(&mut self.wiki.templates, cli.templates.as_ref());
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve all directory paths against the root and normalize them
    fn update_path_with_root(&mut self, root: &Path) {
        self.wiki.data = Self::normalize_path(&root.join(&self.wiki.data));
        self.wiki.public = Self::normalize_path(&root.join(&self.wiki.public));
        self.wiki.templates = Self::normalize_path(&root.join(&self.wiki.templates));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !is_valid_title(&self.wiki.front_page) {
            bail!(ConfigError::Validation(format!(
                "[wiki.front_page] `{}` is not a valid title (use A-Z, a-z, 0-9)",
                self.wiki.front_page
            )));
        }

        if self.serve.workers == 0 {
            bail!(ConfigError::Validation(
                "[serve.workers] must be at least 1".into()
            ));
        }

        if self.serve.interface.parse::<std::net::IpAddr>().is_err() {
            bail!(ConfigError::Validation(format!(
                "[serve.interface] `{}` is not an IP address",
                self.serve.interface
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
