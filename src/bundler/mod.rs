//! Core bundler implementation
//!
//! A [`Bundler`] collects fragments for one named, versioned bundle, merges
//! and minifies them on demand, and hands out the URL the cached result is
//! served from.

mod flavor;
mod fragment;
mod kind;
mod merge;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{debug, info};

use crate::cache::{BuildOutcome, Cache, CacheGate, CacheKey};
use crate::config::Config;
use crate::error::Result;
use crate::resolver::{FsResolver, SourceResolver};

pub use flavor::{flavor_for, CommentDelimiters, Flavor, Script, Stylesheet};
pub use fragment::{Fragment, FragmentList, IntoFragments};
pub use kind::BundleKind;
pub use merge::{signature, Merger, PROJECT_URL};

/// Lifecycle of a bundler instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleState {
    /// No fragments yet
    Empty,
    /// Fragments added, nothing built
    FragmentsAdded,
    /// The last build produced fresh content
    Built,
    /// The last build reused a cached entry
    Cached,
}

/// Bundles an ordered list of fragments into one cached artifact
pub struct Bundler {
    name: String,
    version: String,
    kind: BundleKind,
    fragments: FragmentList,
    flavor: Box<dyn Flavor>,
    resolver: Box<dyn SourceResolver>,
    gate: CacheGate,
    minify: bool,
    parameter: String,
    server_url: String,
    signature: bool,
    state: BundleState,
}

impl Bundler {
    /// Create a bundler using the settings `config` holds for `kind`
    pub fn new(
        kind: BundleKind,
        name: impl Into<String>,
        version: impl Into<String>,
        config: &Config,
        cache: Arc<dyn Cache>,
    ) -> Self {
        let settings = config.settings(kind);

        Self {
            name: name.into(),
            version: version.into(),
            kind,
            fragments: FragmentList::new(),
            flavor: flavor_for(kind, config),
            resolver: Box::new(FsResolver::new(config.base_path(kind))),
            gate: CacheGate::new(cache, settings.cache),
            minify: settings.minify,
            parameter: settings.parameter.clone(),
            server_url: config.server_url.clone(),
            signature: config.signature,
            state: BundleState::Empty,
        }
    }

    /// Replace the file system resolver
    pub fn with_resolver(mut self, resolver: impl SourceResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// Include one or more files or patterns, skipping ones already included
    pub fn add<I: IntoFragments>(&mut self, items: I) -> Result<&mut Self> {
        self.fragments.add(items)?;
        self.touch();
        Ok(self)
    }

    /// Include a string or a list of strings from a dynamic value
    pub fn add_value(&mut self, value: &toml::Value) -> Result<&mut Self> {
        self.fragments.add_value(value)?;
        self.touch();
        Ok(self)
    }

    /// Include a file or pattern ahead of everything else
    pub fn add_before(&mut self, item: impl Into<String>) -> Result<&mut Self> {
        self.fragments.add_before(item)?;
        self.touch();
        Ok(self)
    }

    /// Append code directly
    pub fn add_inline(&mut self, code: impl Into<String>) -> Result<()> {
        self.fragments.add_inline(code)?;
        self.touch();
        Ok(())
    }

    fn touch(&mut self) {
        if self.state == BundleState::Empty && !self.fragments.is_empty() {
            self.state = BundleState::FragmentsAdded;
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn kind(&self) -> BundleKind {
        self.kind
    }

    pub fn state(&self) -> BundleState {
        self.state
    }

    pub fn fragments(&self) -> &FragmentList {
        &self.fragments
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey::derive(self.kind, &self.name)
    }

    /// URL the cached bundle is served from.
    ///
    /// Depends only on the server URL, query parameter, kind, name and version.
    pub fn url(&self) -> String {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair(&self.parameter, self.cache_key().as_str())
            .append_pair("ver", &self.version)
            .finish();

        format!("{}?{}", self.server_url, query)
    }

    /// Resolve and concatenate every fragment
    pub fn merge(&self) -> Result<String> {
        Merger::new(self.resolver.as_ref(), self.flavor.as_ref()).merge(&self.fragments)
    }

    /// Build the bundle unless a usable cached copy exists, then return its URL
    pub fn build(&mut self) -> Result<String> {
        let start = Instant::now();
        let key = self.cache_key();

        let outcome = self.gate.build_or_reuse(&key, || self.produce())?;

        self.state = match outcome {
            BuildOutcome::Fresh(artifact) => {
                info!(
                    "Built {} bundle '{}' ({} bytes{}) in {:?}",
                    self.kind,
                    self.name,
                    artifact.content.len(),
                    if artifact.is_minified { ", minified" } else { "" },
                    start.elapsed()
                );
                BundleState::Built
            }
            BuildOutcome::Reused(_) => {
                debug!("Using cached {} bundle '{}'", self.kind, self.name);
                BundleState::Cached
            }
        };

        Ok(self.url())
    }

    /// Literal bundle content for inline embedding
    pub fn embed_here(&mut self) -> Result<String> {
        let key = self.cache_key();
        let mut rebuilt = false;

        let content = self.gate.retrieve(&key, || {
            rebuilt = true;
            self.produce()
        })?;

        self.state = if rebuilt {
            BundleState::Built
        } else {
            BundleState::Cached
        };

        Ok(content)
    }

    /// Bundle content wrapped in an inline style or script element
    pub fn embed_tag(&mut self) -> Result<String> {
        let content = self.embed_here()?;
        Ok(self.flavor.render_inline(&content))
    }

    /// Markup referencing the built bundle
    pub fn include_here(&mut self) -> Result<String> {
        let url = self.build()?;
        Ok(self.flavor.render_tag(&url))
    }

    /// Merge, minify when configured, and prepend the signature banner
    fn produce(&self) -> Result<(String, bool)> {
        let merged = self.merge()?;

        let body = if self.minify {
            self.flavor.minify(&merged)?
        } else {
            merged
        };

        let content = if self.signature {
            let banner = signature(
                &self.name,
                &self.version,
                self.flavor.comment_delimiters(),
                Utc::now(),
            );
            banner + &body
        } else {
            body
        };

        Ok((content, self.minify))
    }
}

impl std::fmt::Debug for Bundler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bundler")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("kind", &self.kind)
            .field("fragments", &self.fragments)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
