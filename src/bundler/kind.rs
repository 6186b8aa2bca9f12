//! Bundle kinds

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kinds of bundles the organizer can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleKind {
    Style,
    Script,
}

impl BundleKind {
    pub const ALL: [BundleKind; 2] = [BundleKind::Style, BundleKind::Script];

    /// Name used for configuration lookup and cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleKind::Style => "style",
            BundleKind::Script => "script",
        }
    }

    /// Determine bundle kind from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "css" => Some(BundleKind::Style),
            "js" | "mjs" | "cjs" => Some(BundleKind::Script),
            _ => None,
        }
    }
}

impl fmt::Display for BundleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BundleKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "style" => Ok(BundleKind::Style),
            "script" => Ok(BundleKind::Script),
            other => Err(format!("unknown bundle kind '{}'", other)),
        }
    }
}
