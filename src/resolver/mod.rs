//! Fragment resolution
//!
//! Turns fragment references into literal source text: an exact file is read
//! as-is, otherwise the reference is expanded as a pattern and every matching
//! file is concatenated.

use std::fs;
use std::path::{Component, Path, PathBuf};

use globset::GlobBuilder;
use tracing::debug;
use walkdir::WalkDir;

use crate::bundler::Fragment;
use crate::error::{OrganizerError, Result};

/// Source text of one fragment together with the directory it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    /// Directory relative references inside `text` are anchored to
    pub base_path: PathBuf,

    /// Literal source text
    pub text: String,
}

/// Turns a fragment into literal code text
pub trait SourceResolver: Send + Sync {
    fn resolve(&self, fragment: &Fragment) -> Result<ResolvedSource>;
}

/// Resolver reading fragments from the file system below a base path
#[derive(Debug, Clone)]
pub struct FsResolver {
    base_path: PathBuf,
}

impl FsResolver {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn resolve_reference(&self, reference: &str) -> Result<ResolvedSource> {
        let path = join_under(&self.base_path, reference);

        // Exact file first
        if path.is_file() {
            debug!("Resolved file: {}", path.display());
            let text = read_source(&path)?;
            let base_path = path
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| self.base_path.clone());
            return Ok(ResolvedSource { base_path, text });
        }

        // Then pattern expansion
        let matches = expand_pattern(&path)?;
        if matches.is_empty() {
            return Err(OrganizerError::FileNotFound { path });
        }

        debug!(
            "Pattern {} matched {} file(s)",
            path.display(),
            matches.len()
        );

        let mut text = String::new();
        for file in &matches {
            text.push('\n');
            text.push_str(&read_source(file)?);
        }

        Ok(ResolvedSource {
            base_path: literal_prefix(&path),
            text,
        })
    }
}

impl SourceResolver for FsResolver {
    fn resolve(&self, fragment: &Fragment) -> Result<ResolvedSource> {
        match fragment {
            Fragment::InlineCode(code) => Ok(ResolvedSource {
                base_path: self.base_path.clone(),
                text: code.clone(),
            }),
            Fragment::FilePath(reference) | Fragment::GlobPattern(reference) => {
                self.resolve_reference(reference)
            }
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|source| OrganizerError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Append `reference` to `base`, dropping any root so the result stays below `base`
fn join_under(base: &Path, reference: &str) -> PathBuf {
    let mut path = base.to_path_buf();
    for component in Path::new(reference).components() {
        match component {
            Component::Prefix(_) | Component::RootDir => {}
            other => path.push(other),
        }
    }
    path
}

fn has_glob_meta(s: &str) -> bool {
    s.contains(['*', '?', '[', '{'])
}

/// Longest leading run of path components free of pattern syntax
fn literal_prefix(pattern: &Path) -> PathBuf {
    let mut prefix = PathBuf::new();
    for component in pattern.components() {
        if let Component::Normal(part) = component {
            if has_glob_meta(&part.to_string_lossy()) {
                break;
            }
        }
        prefix.push(component);
    }

    // The last literal component may itself be a file name
    if prefix == pattern {
        return pattern
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
    }
    prefix
}

/// Expand a pattern into the sorted list of regular files it matches
fn expand_pattern(pattern: &Path) -> Result<Vec<PathBuf>> {
    let pattern_str = pattern.to_string_lossy();
    if !has_glob_meta(&pattern_str) {
        return Ok(Vec::new());
    }

    let matcher = GlobBuilder::new(&pattern_str)
        .literal_separator(true)
        .build()
        .map_err(|source| OrganizerError::Pattern {
            pattern: pattern_str.to_string(),
            source,
        })?
        .compile_matcher();

    let root = literal_prefix(pattern);
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let segments: Vec<String> = pattern
        .strip_prefix(&root)
        .unwrap_or(pattern)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();

    let mut matches: Vec<PathBuf> = WalkDir::new(&root)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_name().to_string_lossy().starts_with('.')
                || allows_hidden(&segments, entry.depth())
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| matcher.is_match(path))
        .collect();

    matches.sort();
    Ok(matches)
}

/// Whether a hidden entry `depth` levels below the pattern root may match.
///
/// Only a pattern segment that itself starts with `.` reaches hidden entries.
fn allows_hidden(segments: &[String], depth: usize) -> bool {
    for (i, segment) in segments.iter().enumerate() {
        if segment == "**" {
            return segments[i + 1..].iter().any(|s| s.starts_with('.'));
        }
        if i + 1 == depth {
            return segment.starts_with('.');
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("lib/nested")).unwrap();
        fs::write(dir.path().join("a.js"), "var a = 1;").unwrap();
        fs::write(dir.path().join("lib/two.js"), "two();").unwrap();
        fs::write(dir.path().join("lib/one.js"), "one();").unwrap();
        fs::write(dir.path().join("lib/skip.css"), "p {}").unwrap();
        fs::write(dir.path().join("lib/nested/deep.js"), "deep();").unwrap();
        fs::write(dir.path().join("lib/.local.js"), "local();").unwrap();
        fs::create_dir_all(dir.path().join("lib/.cache")).unwrap();
        fs::write(dir.path().join("lib/.cache/stale.js"), "stale();").unwrap();
        dir
    }

    #[test]
    fn test_resolve_exact_file() {
        let dir = fixture();
        let resolver = FsResolver::new(dir.path());

        let source = resolver.resolve(&Fragment::reference("a.js")).unwrap();
        assert_eq!(source.text, "var a = 1;");
        assert_eq!(source.base_path, dir.path());
    }

    #[test]
    fn test_resolve_pattern_in_sorted_order() {
        let dir = fixture();
        let resolver = FsResolver::new(dir.path());

        let source = resolver.resolve(&Fragment::reference("lib/*.js")).unwrap();
        assert_eq!(source.text, "\none();\ntwo();");
        assert_eq!(source.base_path, dir.path().join("lib"));
    }

    #[test]
    fn test_resolve_recursive_pattern() {
        let dir = fixture();
        let resolver = FsResolver::new(dir.path());

        let source = resolver.resolve(&Fragment::reference("lib/**/*.js")).unwrap();
        assert!(source.text.contains("deep();"));
        assert!(source.text.contains("one();"));
        assert!(!source.text.contains("p {}"));
        assert!(!source.text.contains("local();"));
        assert!(!source.text.contains("stale();"));
    }

    #[test]
    fn test_hidden_files_need_a_dotted_pattern() {
        let dir = fixture();
        let resolver = FsResolver::new(dir.path());

        let source = resolver.resolve(&Fragment::reference("lib/.*.js")).unwrap();
        assert_eq!(source.text, "\nlocal();");

        let source = resolver
            .resolve(&Fragment::reference("lib/.cache/*.js"))
            .unwrap();
        assert_eq!(source.text, "\nstale();");
    }

    #[test]
    fn test_absolute_reference_stays_below_base() {
        let dir = fixture();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret.js"), "SECRET").unwrap();
        let resolver = FsResolver::new(dir.path());

        let reference = outside.path().join("secret.js");
        let err = resolver
            .resolve(&Fragment::reference(reference.to_string_lossy().as_ref()))
            .unwrap_err();
        match err {
            OrganizerError::FileNotFound { path } => assert!(path.starts_with(dir.path())),
            other => panic!("unexpected error: {other}"),
        }

        let source = resolver.resolve(&Fragment::reference("/a.js")).unwrap();
        assert_eq!(source.text, "var a = 1;");
    }

    #[test]
    fn test_allows_hidden() {
        let segments = |p: &str| p.split('/').map(String::from).collect::<Vec<_>>();

        assert!(!allows_hidden(&segments("*.js"), 1));
        assert!(allows_hidden(&segments(".*.js"), 1));
        assert!(!allows_hidden(&segments("*/.x.js"), 1));
        assert!(allows_hidden(&segments("*/.x.js"), 2));
        assert!(allows_hidden(&segments("**/.x.js"), 3));
        assert!(!allows_hidden(&segments("**/*.js"), 2));
    }

    #[test]
    fn test_inline_passthrough() {
        let resolver = FsResolver::new("/assets/");
        let source = resolver
            .resolve(&Fragment::InlineCode("alert(1);".into()))
            .unwrap();

        assert_eq!(source.text, "alert(1);");
        assert_eq!(source.base_path, PathBuf::from("/assets/"));
    }

    #[test]
    fn test_missing_file_reports_resolved_path() {
        let dir = fixture();
        let resolver = FsResolver::new(dir.path());

        let err = resolver
            .resolve(&Fragment::reference("missing.js"))
            .unwrap_err();
        match err {
            OrganizerError::FileNotFound { path } => {
                assert_eq!(path, dir.path().join("missing.js"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_pattern_without_matches_is_not_found() {
        let dir = fixture();
        let resolver = FsResolver::new(dir.path());

        let err = resolver
            .resolve(&Fragment::reference("vendor/*.js"))
            .unwrap_err();
        assert!(matches!(err, OrganizerError::FileNotFound { .. }));
    }

    #[test]
    fn test_literal_prefix() {
        assert_eq!(
            literal_prefix(Path::new("/assets/lib/*.js")),
            PathBuf::from("/assets/lib")
        );
        assert_eq!(
            literal_prefix(Path::new("/assets/a.js")),
            PathBuf::from("/assets")
        );
    }
}
