//! Dotted store paths.

use crate::StoreError;
use std::fmt;

/// Address of a value inside the store document.
///
/// Parsed from dotted text (`"profiles.work"`) or built from raw segments.
/// Building from segments keeps caller-supplied keys intact even when they
/// contain a `.` themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    /// Parse a dotted path. Empty paths and empty segments are rejected.
    pub fn parse(dotted: &str) -> Result<Self, StoreError> {
        Self::from_segments(dotted.split('.'))
            .map_err(|_| StoreError::InvalidPath(dotted.to_string()))
    }

    /// Build a path from raw segments, without splitting on `.`.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || segments.iter().any(|s| s.is_empty()) {
            return Err(StoreError::InvalidPath(segments.join(".")));
        }
        Ok(Self { segments })
    }

    /// Extend this path by one raw segment.
    pub fn child(&self, segment: impl Into<String>) -> Result<Self, StoreError> {
        let segment = segment.into();
        if segment.is_empty() {
            return Err(StoreError::InvalidPath(format!("{self}.")));
        }
        let mut segments = self.segments.clone();
        segments.push(segment);
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Split into (parent segments, last segment).
    pub(crate) fn split_last(&self) -> (&[String], &str) {
        // Construction guarantees at least one segment.
        let (last, parent) = self
            .segments
            .split_last()
            .map(|(l, p)| (l.as_str(), p))
            .unwrap_or(("", &[]));
        (parent, last)
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dotted() {
        let path = StorePath::parse("profiles.work").unwrap();
        assert_eq!(path.segments(), &["profiles", "work"]);
        assert_eq!(path.to_string(), "profiles.work");
    }

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(StorePath::parse("").is_err());
        assert!(StorePath::parse("profiles.").is_err());
        assert!(StorePath::parse(".profiles").is_err());
        assert!(StorePath::parse("a..b").is_err());
    }

    #[test]
    fn test_child_keeps_dots_in_segment() {
        let root = StorePath::parse("profiles").unwrap();
        let path = root.child("jane.doe").unwrap();
        assert_eq!(path.segments(), &["profiles", "jane.doe"]);
        assert!(root.child("").is_err());
    }
}
