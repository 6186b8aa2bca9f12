//! Merging resolved fragments into one bundle body

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::resolver::SourceResolver;

use super::flavor::{CommentDelimiters, Flavor};
use super::fragment::FragmentList;

/// Project URL written into signature banners
pub const PROJECT_URL: &str = env!("CARGO_PKG_REPOSITORY");

/// Concatenates fragments in list order
pub struct Merger<'a> {
    resolver: &'a dyn SourceResolver,
    flavor: &'a dyn Flavor,
}

impl<'a> Merger<'a> {
    pub fn new(resolver: &'a dyn SourceResolver, flavor: &'a dyn Flavor) -> Self {
        Self { resolver, flavor }
    }

    /// Resolve every fragment and join them, each preceded by a newline.
    ///
    /// Stops at the first fragment that fails to resolve.
    pub fn merge(&self, fragments: &FragmentList) -> Result<String> {
        let mut merged = String::new();

        for fragment in fragments {
            let source = self.resolver.resolve(fragment)?;
            merged.push('\n');
            merged.push_str(&self.flavor.pre_merge(source));
        }

        Ok(merged)
    }
}

/// Provenance banner placed ahead of a bundle
pub fn signature(
    name: &str,
    version: &str,
    delimiters: CommentDelimiters,
    built_at: DateTime<Utc>,
) -> String {
    let line = format!(" {} ", delimiters.line);

    format!(
        "{open} \n{line}{name} v{version} | {stamp} UTC\n{line}Organized by Organizer\n{line}{url}\n {close}\n",
        open = delimiters.open,
        close = delimiters.close,
        stamp = built_at.format("%b %d %Y %H:%M:%S"),
        url = PROJECT_URL,
    )
}
