//! Kind-specific bundle behaviour
//!
//! A [`Flavor`] supplies what differs between stylesheets and scripts:
//! comment syntax for the signature banner, the minifier, markup tags and the
//! hook applied to each source before it is merged.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::resolver::ResolvedSource;
use crate::transform::{minify_script, minify_style, rewrite_css_urls};
use crate::utils::escape_attribute;

use super::BundleKind;

/// Comment syntax used for the signature banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentDelimiters {
    pub open: &'static str,
    pub close: &'static str,
    /// Prefix of every line inside the comment
    pub line: &'static str,
}

impl CommentDelimiters {
    pub const BLOCK: Self = Self {
        open: "/*",
        close: "*/",
        line: "*",
    };
}

/// Behaviour specific to one bundle kind
pub trait Flavor: Send + Sync {
    fn kind(&self) -> BundleKind;

    fn comment_delimiters(&self) -> CommentDelimiters {
        CommentDelimiters::BLOCK
    }

    fn minify(&self, code: &str) -> Result<String>;

    /// Markup referencing a bundle URL
    fn render_tag(&self, url: &str) -> String;

    /// Markup embedding bundle content directly
    fn render_inline(&self, content: &str) -> String;

    /// Rewrite a resolved source before it joins the bundle
    fn pre_merge(&self, source: ResolvedSource) -> String {
        source.text
    }
}

/// Stylesheet bundles
#[derive(Debug, Clone)]
pub struct Stylesheet {
    base_path: PathBuf,
    public_path: Option<String>,
}

impl Stylesheet {
    pub fn new(base_path: impl Into<PathBuf>, public_path: Option<String>) -> Self {
        Self {
            base_path: base_path.into(),
            public_path,
        }
    }
}

impl Flavor for Stylesheet {
    fn kind(&self) -> BundleKind {
        BundleKind::Style
    }

    fn minify(&self, code: &str) -> Result<String> {
        minify_style(code)
    }

    fn render_tag(&self, url: &str) -> String {
        format!(
            r#"<link rel="stylesheet" type="text/css" href="{}">"#,
            escape_attribute(url)
        )
    }

    fn render_inline(&self, content: &str) -> String {
        format!("<style type=\"text/css\">{}</style>", content)
    }

    fn pre_merge(&self, source: ResolvedSource) -> String {
        match &self.public_path {
            Some(public_path) => {
                rewrite_css_urls(&source.text, &source.base_path, &self.base_path, public_path)
            }
            None => source.text,
        }
    }
}

/// Script bundles
#[derive(Debug, Clone, Copy, Default)]
pub struct Script;

impl Flavor for Script {
    fn kind(&self) -> BundleKind {
        BundleKind::Script
    }

    fn minify(&self, code: &str) -> Result<String> {
        minify_script(code)
    }

    fn render_tag(&self, url: &str) -> String {
        format!(
            r#"<script type="text/javascript" src="{}"></script>"#,
            escape_attribute(url)
        )
    }

    fn render_inline(&self, content: &str) -> String {
        format!("<script type=\"text/javascript\">{}</script>", content)
    }
}

/// Create the flavor for a bundle kind
pub fn flavor_for(kind: BundleKind, config: &Config) -> Box<dyn Flavor> {
    match kind {
        BundleKind::Style => Box::new(Stylesheet::new(
            config.base_path(kind),
            config.style.public_path.clone(),
        )),
        BundleKind::Script => Box::new(Script),
    }
}
