//! Configuration handling for Organizer
//!
//! Parses and manages organizer.toml configuration files.

mod schema;

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::bundler::BundleKind;

pub use schema::*;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// URL under which cached bundles are served
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Prepend a provenance banner to every bundle
    #[serde(default)]
    pub signature: bool,

    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Stylesheet settings
    #[serde(default = "BundleSettings::style_defaults")]
    pub style: BundleSettings,

    /// Script settings
    #[serde(default = "BundleSettings::script_defaults")]
    pub script: BundleSettings,

    /// Bundles declared for the command line
    #[serde(default, rename = "bundle")]
    pub bundles: Vec<BundleDecl>,

    /// Root directory (computed from config file location)
    #[serde(skip)]
    pub root: PathBuf,
}

fn default_server_url() -> String {
    "/organizer".to_string()
}

impl Config {
    /// Load configuration from a file path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canonical_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let content = fs::read_to_string(&canonical_path)
            .with_context(|| format!("Failed to read config file: {}", canonical_path.display()))?;

        let mut config = Self::parse(&content)?;

        // Set root directory to the directory containing the config file
        config.root = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(content).with_context(|| "Failed to parse organizer.toml")?;
        config.root = PathBuf::from(".");

        config.validate()?;

        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            server_url: default_server_url(),
            signature: false,
            cache: CacheConfig::default(),
            style: BundleSettings::style_defaults(),
            script: BundleSettings::script_defaults(),
            bundles: Vec::new(),
            root: PathBuf::from("."),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            anyhow::bail!("server_url must not be empty");
        }

        for kind in BundleKind::ALL {
            let parameter = &self.settings(kind).parameter;
            if parameter.trim().is_empty() {
                anyhow::bail!("[{}] parameter must not be empty", kind);
            }
            if parameter == "ver" {
                anyhow::bail!(
                    "[{}] parameter 'ver' collides with the version query parameter",
                    kind
                );
            }
        }

        let mut seen = HashSet::new();
        for bundle in &self.bundles {
            if bundle.name.trim().is_empty() {
                anyhow::bail!("Declared bundles must have a name");
            }
            if !seen.insert(bundle.name.as_str()) {
                anyhow::bail!("Bundle '{}' is declared more than once", bundle.name);
            }
        }

        Ok(())
    }

    /// Settings for a bundle kind
    pub fn settings(&self, kind: BundleKind) -> &BundleSettings {
        match kind {
            BundleKind::Style => &self.style,
            BundleKind::Script => &self.script,
        }
    }

    /// Absolute base path fragments of `kind` are resolved against
    pub fn base_path(&self, kind: BundleKind) -> PathBuf {
        self.root.join(&self.settings(kind).base_path)
    }

    /// Absolute directory of the file cache
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join(&self.cache.dir)
    }

    /// Cache entry lifetime, `None` when entries never expire
    pub fn cache_expiry(&self) -> Option<Duration> {
        (self.cache.expiry > 0).then(|| Duration::from_secs(self.cache.expiry))
    }

    /// Look up a declared bundle by name
    pub fn bundle(&self, name: &str) -> Option<&BundleDecl> {
        self.bundles.iter().find(|b| b.name == name)
    }
}
