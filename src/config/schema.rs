//! Configuration schema definitions

use serde::{Deserialize, Serialize};

use crate::bundler::BundleKind;

/// Per-kind bundling settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleSettings {
    /// Directory fragments are resolved against
    #[serde(default)]
    pub base_path: String,

    /// Reuse cached bundles while they are usable
    #[serde(default = "default_true")]
    pub cache: bool,

    /// Minify built bundles
    #[serde(default = "default_true")]
    pub minify: bool,

    /// Query parameter carrying the cache key in bundle URLs
    #[serde(default = "default_parameter")]
    pub parameter: String,

    /// Public URL prefix of `base_path`, used to rewrite relative stylesheet references
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_path: Option<String>,
}

impl BundleSettings {
    pub fn style_defaults() -> Self {
        Self {
            base_path: "assets/css/".to_string(),
            ..Self::defaults()
        }
    }

    pub fn script_defaults() -> Self {
        Self {
            base_path: "assets/js/".to_string(),
            ..Self::defaults()
        }
    }

    fn defaults() -> Self {
        Self {
            base_path: String::new(),
            cache: true,
            minify: true,
            parameter: default_parameter(),
            public_path: None,
        }
    }
}

fn default_parameter() -> String {
    "file".to_string()
}

fn default_true() -> bool {
    true
}

/// Storage used for built bundles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    File,
    Memory,
}

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_backend")]
    pub backend: CacheBackend,

    /// Directory holding file cache entries
    #[serde(default = "default_cache_dir")]
    pub dir: String,

    /// Seconds an entry stays usable; 0 keeps entries until cleared
    #[serde(default)]
    pub expiry: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            dir: default_cache_dir(),
            expiry: 0,
        }
    }
}

fn default_backend() -> CacheBackend {
    CacheBackend::File
}

fn default_cache_dir() -> String {
    ".organizer/cache".to_string()
}

/// A bundle declared in the configuration file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleDecl {
    /// Bundle name
    pub name: String,

    /// Bundle kind; inferred from the first file's extension when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<BundleKind>,

    /// Bundle version, appended to the URL for client-side cache busting
    #[serde(default = "default_version")]
    pub version: String,

    /// File names or patterns, in output order
    #[serde(default)]
    pub files: Vec<toml::Value>,

    /// Code appended after the files
    #[serde(default)]
    pub inline: Vec<String>,
}

fn default_version() -> String {
    "1.0".to_string()
}
