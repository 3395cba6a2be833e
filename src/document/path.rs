//! Slash-separated paths addressing nodes in a document.
//!
//! A [`NodePath`] is validated at construction, so traversal never has to
//! report a malformed path: `ensure_path` is infallible and `peek_path`
//! only answers "not there".

use std::{fmt, str::FromStr};

use nonempty::NonEmpty;

/// A validated path from the document root to a node.
///
/// Paths are written `"segment/segment/..."` relative to the root; the
/// root itself is not a segment. Segments must be non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    segments: NonEmpty<String>,
}

impl NodePath {
    /// Builds a path from pre-validated segments.
    #[must_use]
    pub const fn new(segments: NonEmpty<String>) -> Self {
        Self { segments }
    }

    /// Returns the path segments in root-to-leaf order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Returns the final segment of the path.
    #[must_use]
    pub fn leaf(&self) -> &str {
        self.segments.last()
    }
}

impl FromStr for NodePath {
    type Err = ParsePathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParsePathError::Empty);
        }
        let mut segments = Vec::new();
        for segment in s.split('/') {
            if segment.is_empty() {
                return Err(ParsePathError::EmptySegment {
                    path: s.to_string(),
                });
            }
            segments.push(segment.to_string());
        }
        NonEmpty::from_vec(segments)
            .map(|segments| Self { segments })
            .ok_or(ParsePathError::Empty)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

/// Error returned when a path string cannot be parsed.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParsePathError {
    /// The path string was empty.
    #[error("node path must contain at least one segment")]
    Empty,
    /// The path contained an empty segment (`"a//b"`, leading or trailing
    /// slash).
    #[error("node path '{path}' contains an empty segment")]
    EmptySegment {
        /// The offending path string.
        path: String,
    },
}
