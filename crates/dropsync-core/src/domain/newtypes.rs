//! Newtype wrappers and path normalization
//!
//! This module provides:
//! - [`RemotePath`], a canonical remote store path
//! - [`normalize_path`], the segment joiner every remote path goes through
//! - [`normalize_filename`] and [`fold_filename`] for listing membership checks
//!
//! ## Canonical form
//!
//! A canonical remote path is either the empty string (the store root) or a
//! string starting with `/`. It never contains `//` and never ends in `/`.

use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use unicode_normalization::{is_nfc, UnicodeNormalization};

use super::errors::DomainError;

// ============================================================================
// Path Normalizer
// ============================================================================

/// Joins path segments into a canonical remote path string
///
/// Segments are joined with `/` after a leading `/`, platform separators are
/// rewritten to `/`, runs of `/` collapse to one and the trailing `/` is
/// dropped. The store root normalizes to the empty string.
///
/// This is a total function: every input produces a canonical path.
pub fn normalize_path<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::from("/");
    for segment in segments {
        joined.push_str(segment.as_ref());
        joined.push('/');
    }

    let mut out = String::with_capacity(joined.len());
    for ch in joined.chars() {
        let ch = if ch == std::path::MAIN_SEPARATOR { '/' } else { ch };
        if ch == '/' && out.ends_with('/') {
            continue;
        }
        out.push(ch);
    }

    while out.ends_with('/') {
        out.pop();
    }
    out
}

/// Returns the NFC form of a filename
///
/// Idempotent: normalizing an already normalized name returns it unchanged.
pub fn normalize_filename(name: &str) -> String {
    if is_nfc(name) {
        name.to_string()
    } else {
        name.nfc().collect()
    }
}

/// Returns the case-folded NFC form used to detect names that differ only by case
pub fn fold_filename(name: &str) -> String {
    normalize_filename(name).to_lowercase()
}

/// Checks that a single entry name can be used as a local or remote path component
///
/// # Errors
/// Returns [`DomainError::UnsafeName`] for empty names, `.`, `..`, or names
/// containing `/` or NUL.
pub fn validate_entry_name(name: &str) -> Result<&str, DomainError> {
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
        return Err(DomainError::UnsafeName(name.to_string()));
    }
    Ok(name)
}

// ============================================================================
// RemotePath
// ============================================================================

/// A canonical remote store path
///
/// Represents paths like `/Downloads/photos/a.jpg`; the store root is `""`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemotePath(String);

impl RemotePath {
    /// Create a RemotePath from a string that is already canonical
    ///
    /// # Errors
    /// Returns error if the path is non-empty and doesn't start with `/`,
    /// contains `//`, ends with `/`, or contains a `..` segment
    pub fn new(path: String) -> Result<Self, DomainError> {
        if path.is_empty() {
            return Ok(Self(path));
        }

        if !path.starts_with('/') {
            return Err(DomainError::InvalidRemotePath(format!(
                "Remote path must start with '/': {path}"
            )));
        }

        if path.contains("//") || path.ends_with('/') {
            return Err(DomainError::InvalidRemotePath(format!(
                "Remote path is not normalized: {path}"
            )));
        }

        if path.split('/').any(|segment| segment == "..") {
            return Err(DomainError::InvalidRemotePath(format!(
                "Remote path contains invalid traversal: {path}"
            )));
        }

        Ok(Self(path))
    }

    /// Build a RemotePath from arbitrary segments through [`normalize_path`]
    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(normalize_path(segments))
    }

    /// Map a user-supplied remote folder to a canonical path
    ///
    /// `~` characters are dropped and `/` means the store root.
    pub fn from_user_folder(folder: &str) -> Self {
        let cleaned = folder.replace('~', "");
        Self::from_segments([cleaned])
    }

    /// The store root (empty path)
    #[must_use]
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Whether this is the store root
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join one or more path components
    #[must_use]
    pub fn join(&self, component: &str) -> Self {
        Self::from_segments([self.0.as_str(), component])
    }

    /// Get the parent path
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }

        self.0.rfind('/').map(|idx| Self(self.0[..idx].to_string()))
    }

    /// Get the last path component
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }

        self.0.rsplit('/').next()
    }
}

impl Display for RemotePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "/")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for RemotePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for RemotePath {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RemotePath> for String {
    fn from(path: RemotePath) -> Self {
        path.0
    }
}
