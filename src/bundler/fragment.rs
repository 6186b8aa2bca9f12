//! Fragments and the ordered fragment list of a bundle

use std::fmt;

use crate::error::{OrganizerError, Result};

/// One unit of input source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// Path relative to the configured base path
    FilePath(String),
    /// Pattern expanded against the configured base path
    GlobPattern(String),
    /// Code embedded directly into the bundle
    InlineCode(String),
}

impl Fragment {
    /// Classify a literal reference as a file path or a glob pattern
    pub fn reference(literal: impl Into<String>) -> Self {
        let literal = literal.into();
        if literal.contains(['*', '?', '[', '{']) {
            Fragment::GlobPattern(literal)
        } else {
            Fragment::FilePath(literal)
        }
    }

    /// The literal reference, or `None` for inline code
    pub fn literal(&self) -> Option<&str> {
        match self {
            Fragment::FilePath(p) | Fragment::GlobPattern(p) => Some(p),
            Fragment::InlineCode(_) => None,
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Fragment::InlineCode(_))
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::FilePath(p) | Fragment::GlobPattern(p) => f.write_str(p),
            Fragment::InlineCode(code) => write!(f, "<inline {} bytes>", code.len()),
        }
    }
}

/// Values that can be added as one or more file/pattern fragments
pub trait IntoFragments {
    fn into_fragments(self) -> Vec<String>;
}

impl IntoFragments for &str {
    fn into_fragments(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoFragments for String {
    fn into_fragments(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoFragments for &String {
    fn into_fragments(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl<S: Into<String>> IntoFragments for Vec<S> {
    fn into_fragments(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<S: AsRef<str>> IntoFragments for &[S] {
    fn into_fragments(self) -> Vec<String> {
        self.iter().map(|s| s.as_ref().to_string()).collect()
    }
}

impl<S: Into<String>, const N: usize> IntoFragments for [S; N] {
    fn into_fragments(self) -> Vec<String> {
        self.into_iter().map(Into::into).collect()
    }
}

/// Ordered collection of fragment references.
///
/// Insertion order is output order. File and pattern literals are unique by
/// value; inline code is never deduplicated.
#[derive(Debug, Clone, Default)]
pub struct FragmentList {
    items: Vec<Fragment>,
}

impl FragmentList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append each literal that is not already present.
    ///
    /// Every literal is validated before the list is touched.
    pub fn add<I: IntoFragments>(&mut self, items: I) -> Result<()> {
        let literals = items.into_fragments();
        for literal in &literals {
            validate_literal("add", literal)?;
        }

        for literal in literals {
            if !self.contains(&literal) {
                self.items.push(Fragment::reference(literal));
            }
        }

        Ok(())
    }

    /// Append a string or an array of strings taken from a dynamic value
    pub fn add_value(&mut self, value: &toml::Value) -> Result<()> {
        match value {
            toml::Value::String(s) => self.add(s),
            toml::Value::Array(values) => {
                let literals = values
                    .iter()
                    .map(|v| match v {
                        toml::Value::String(s) => Ok(s.clone()),
                        other => Err(OrganizerError::invalid_fragment(
                            "add",
                            format!("expected a file name, found {}", other.type_str()),
                        )),
                    })
                    .collect::<Result<Vec<_>>>()?;
                self.add(literals)
            }
            other => Err(OrganizerError::invalid_fragment(
                "add",
                format!(
                    "expected a file name or a list of file names, found {}",
                    other.type_str()
                ),
            )),
        }
    }

    /// Insert a literal ahead of every other fragment
    pub fn add_before(&mut self, literal: impl Into<String>) -> Result<()> {
        let literal = literal.into();
        validate_literal("add_before", &literal)?;

        if self.contains(&literal) {
            return Err(OrganizerError::invalid_fragment(
                "add_before",
                format!("'{}' is already included", literal),
            ));
        }

        self.items.insert(0, Fragment::reference(literal));
        Ok(())
    }

    /// Append inline code
    pub fn add_inline(&mut self, code: impl Into<String>) -> Result<()> {
        let code = code.into();
        if code.contains('\0') {
            return Err(OrganizerError::invalid_fragment(
                "add_inline",
                "code contains a NUL byte",
            ));
        }

        self.items.push(Fragment::InlineCode(code));
        Ok(())
    }

    /// Whether a file or pattern literal is already included
    pub fn contains(&self, literal: &str) -> bool {
        self.items.iter().any(|f| f.literal() == Some(literal))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fragment> {
        self.items.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }
}

impl<'a> IntoIterator for &'a FragmentList {
    type Item = &'a Fragment;
    type IntoIter = std::slice::Iter<'a, Fragment>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

fn validate_literal(operation: &'static str, literal: &str) -> Result<()> {
    if literal.trim().is_empty() {
        return Err(OrganizerError::invalid_fragment(
            operation,
            "file name is empty",
        ));
    }
    if literal.contains('\0') {
        return Err(OrganizerError::invalid_fragment(
            operation,
            format!("file name {:?} contains a NUL byte", literal),
        ));
    }
    Ok(())
}
