use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::StorageError;
use crate::slug::validate_slug;

/// Kind of record that owns an uploaded image. Used as the top-level media namespace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Category,
    Item,
    Product,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Item => "item",
            Self::Product => "product",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "category" => Ok(Self::Category),
            "item" => Ok(Self::Item),
            "product" => Ok(Self::Product),
            other => Err(StorageError::InvalidPath(format!(
                "unknown media kind '{other}'"
            ))),
        }
    }
}

/// Result of validating a flat filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameError {
    /// Filename is empty or whitespace-only.
    Empty,
    /// Filename contains path separators (`/` or `\`).
    ContainsPathSeparator,
    /// Filename is `..`.
    PathTraversal,
    /// Filename starts with a dot (hidden file).
    Hidden,
    /// Filename contains control characters (CR, LF, NUL, etc.).
    ControlCharacter,
    TooLong,
}

/// Upper bound on a stored filename, in bytes.
pub const MAX_FILENAME_LENGTH: usize = 100;

impl FilenameError {
    /// Returns a human-readable error message.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Empty => "Filename cannot be empty",
            Self::ContainsPathSeparator => "Invalid filename: path separators are not allowed",
            Self::PathTraversal => "Invalid filename: '..' is not allowed",
            Self::Hidden => "Invalid filename: hidden files (starting with '.') are not allowed",
            Self::ControlCharacter => "Invalid filename: control characters are not allowed",
            Self::TooLong => "Invalid filename: at most 100 bytes are allowed",
        }
    }
}

/// Validates a flat filename (no directory components allowed) and returns it trimmed.
pub fn validate_flat_filename(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    // Control characters would allow header injection via Content-Disposition.
    if trimmed.chars().any(|c| c.is_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    if trimmed.len() > MAX_FILENAME_LENGTH {
        return Err(FilenameError::TooLong);
    }

    Ok(trimmed)
}

/// A validated location inside the media store: `<kind>/<slug>/<filename>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MediaPath {
    kind: MediaKind,
    slug: String,
    filename: String,
}

impl MediaPath {
    /// Build the path for an image uploaded to the record identified by `slug`.
    pub fn new(kind: MediaKind, slug: &str, filename: &str) -> Result<Self, StorageError> {
        let slug = validate_slug(slug).map_err(|e| StorageError::InvalidPath(e.message()))?;
        let filename = validate_flat_filename(filename)?;
        Ok(Self {
            kind,
            slug: slug.to_string(),
            filename: filename.to_string(),
        })
    }

    /// Parse a relative path previously produced by [`MediaPath::as_relative`].
    pub fn parse(path: &str) -> Result<Self, StorageError> {
        let mut parts = path.split('/');
        let (Some(kind), Some(slug), Some(filename), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(StorageError::InvalidPath(format!(
                "expected <kind>/<slug>/<filename>, got '{path}'"
            )));
        };
        if filename != filename.trim() {
            return Err(StorageError::InvalidPath(format!(
                "filename has surrounding whitespace in '{path}'"
            )));
        }
        Self::new(kind.parse()?, slug, filename)
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// The `/`-separated relative form stored in the database.
    pub fn as_relative(&self) -> String {
        format!("{}/{}/{}", self.kind, self.slug, self.filename)
    }
}

impl fmt::Display for MediaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_relative())
    }
}
