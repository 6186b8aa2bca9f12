//! Error types for Organizer
//!
//! Library operations return [`OrganizerError`]. Failures raised by a
//! [`Cache`](crate::cache::Cache) backend are carried as [`CacheError`] and
//! pass through `OrganizerError` untouched.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::bundler::BundleKind;

/// Main error type for bundling operations
#[derive(Error, Debug)]
pub enum OrganizerError {
    /// A fragment passed to `add`, `add_before` or `add_inline` has the wrong shape
    #[error("Invalid fragment provided for {operation}(): {reason}")]
    InvalidFragment {
        operation: &'static str,
        reason: String,
    },

    /// A fragment matched neither a file nor any file through pattern expansion
    #[error("{} not found", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid file pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("Failed to minify {kind} bundle: {message}")]
    Minify { kind: BundleKind, message: String },

    #[error("Bundle '{0}' is not declared in the configuration")]
    UnknownBundle(String),

    #[error("Cannot tell whether bundle '{0}' is a style or a script bundle; set its kind")]
    UnresolvedKind(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Errors raised by cache backends
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to read cache entry {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write cache entry {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to clear cache directory {}: {source}", .path.display())]
    Clear {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl OrganizerError {
    pub(crate) fn invalid_fragment(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidFragment {
            operation,
            reason: reason.into(),
        }
    }
}

pub type Result<T, E = OrganizerError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_not_found_names_path() {
        let err = OrganizerError::FileNotFound {
            path: PathBuf::from("/assets/missing.js"),
        };
        assert_eq!(err.to_string(), "/assets/missing.js not found");
    }

    #[test]
    fn test_cache_error_is_transparent() {
        let cache_err = CacheError::Write {
            path: PathBuf::from("/tmp/entry.cache"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        let expected = cache_err.to_string();
        let err: OrganizerError = cache_err.into();
        assert_eq!(err.to_string(), expected);
    }
}
