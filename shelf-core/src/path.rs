//! Root-relative path handling
//!
//! Every driver addresses nodes by a forward-slash path relative to the
//! account root. Parsing normalizes the path lexically, so a parsed
//! [`RelativePath`] can never point above the root it is resolved against.

use crate::error::{ShelfError, ShelfResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Normalized path relative to an account root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelativePath {
    segments: Vec<String>,
}

impl RelativePath {
    /// Parse a caller-supplied path.
    ///
    /// Empty segments and `.` are dropped, `..` removes the previous segment.
    /// A `..` with nothing left to remove would escape the root and is
    /// rejected, as are segments containing a backslash or NUL.
    pub fn parse(path: impl AsRef<str>) -> ShelfResult<Self> {
        let raw = path.as_ref();
        let mut segments: Vec<String> = Vec::new();
        for part in raw.split('/').filter(|s| !s.is_empty()) {
            match part {
                "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(ShelfError::InvalidPath(format!(
                            "{raw} escapes the root folder"
                        )));
                    }
                }
                _ if part.contains('\\') || part.contains('\0') => {
                    return Err(ShelfError::InvalidPath(raw.to_string()));
                }
                _ => segments.push(part.to_string()),
            }
        }
        Ok(Self { segments })
    }

    pub fn root() -> Self {
        Self::default()
    }

    /// Append a path, normalizing it the same way [`RelativePath::parse`] does.
    pub fn join(&self, other: impl AsRef<str>) -> ShelfResult<Self> {
        let joined = format!("{}/{}", self.to_path_string(), other.as_ref());
        Self::parse(joined)
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            let mut segments = self.segments.clone();
            segments.pop();
            Some(Self { segments })
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    pub fn extension(&self) -> Option<&str> {
        self.name().and_then(extension_of)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// True if `self` is `other` or lies beneath it.
    pub fn starts_with(&self, other: &RelativePath) -> bool {
        self.segments.starts_with(&other.segments)
    }

    /// Root-relative form without a leading slash; the root is `""`.
    pub fn to_path_string(&self) -> String {
        self.segments.join("/")
    }

    /// Full path of this node under `root`.
    pub fn within(&self, root: impl AsRef<Path>) -> PathBuf {
        let mut full = root.as_ref().to_path_buf();
        for seg in &self.segments {
            full.push(seg);
        }
        full
    }
}

/// Text after the last dot of a file name. A dotfile such as `.gitignore`
/// is its own extension.
pub fn extension_of(name: &str) -> Option<&str> {
    match name.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => Some(ext),
        _ => None,
    }
}

impl fmt::Display for RelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.to_path_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let path = RelativePath::parse("/docs/reports/q1.pdf").unwrap();
        assert_eq!(path.segments(), &["docs", "reports", "q1.pdf"]);
    }

    #[test]
    fn test_parse_handles_empty_segments() {
        let path = RelativePath::parse("//docs//reports//").unwrap();
        assert_eq!(path.segments(), &["docs", "reports"]);
    }

    #[test]
    fn test_root_forms() {
        for raw in ["", "/", ".", "./", "a/.."] {
            assert!(RelativePath::parse(raw).unwrap().is_root(), "{raw:?}");
        }
        assert!(RelativePath::root().is_root());
    }

    #[test]
    fn test_parse_with_dotdot() {
        let path = RelativePath::parse("docs/reports/../photos").unwrap();
        assert_eq!(path.segments(), &["docs", "photos"]);
    }

    #[test]
    fn test_parse_rejects_escape() {
        assert!(matches!(RelativePath::parse(".."), Err(ShelfError::InvalidPath(_))));
        assert!(matches!(
            RelativePath::parse("docs/../../etc/passwd"),
            Err(ShelfError::InvalidPath(_))
        ));
        assert!(matches!(RelativePath::parse("/../x"), Err(ShelfError::InvalidPath(_))));
    }

    #[test]
    fn test_parse_rejects_bad_characters() {
        assert!(RelativePath::parse("a\\..\\b").is_err());
        assert!(RelativePath::parse("a\0b").is_err());
    }

    #[test]
    fn test_join() {
        let base = RelativePath::parse("docs").unwrap();
        let path = base.join("reports/q1.pdf").unwrap();
        assert_eq!(path.to_path_string(), "docs/reports/q1.pdf");
        assert!(base.join("../..").is_err());
    }

    #[test]
    fn test_parent() {
        let path = RelativePath::parse("docs/reports").unwrap();
        assert_eq!(path.parent().unwrap().segments(), &["docs"]);
        assert!(RelativePath::root().parent().is_none());
    }

    #[test]
    fn test_name_and_extension() {
        let path = RelativePath::parse("docs/archive.tar.gz").unwrap();
        assert_eq!(path.name(), Some("archive.tar.gz"));
        assert_eq!(path.extension(), Some("gz"));

        assert_eq!(RelativePath::parse("Makefile").unwrap().extension(), None);
        assert_eq!(extension_of(".gitignore"), Some("gitignore"));
        assert_eq!(extension_of(".config.json"), Some("json"));
        assert_eq!(extension_of("trailing."), None);
        assert!(RelativePath::root().name().is_none());
    }

    #[test]
    fn test_starts_with() {
        let outer = RelativePath::parse("a/b").unwrap();
        let inner = RelativePath::parse("a/b/c").unwrap();
        let sibling = RelativePath::parse("a/bc").unwrap();
        assert!(inner.starts_with(&outer));
        assert!(outer.starts_with(&outer));
        assert!(!sibling.starts_with(&outer));
        assert!(inner.starts_with(&RelativePath::root()));
    }

    #[test]
    fn test_within_root() {
        let path = RelativePath::parse("x/../y/z.txt").unwrap();
        assert_eq!(path.within("/data"), PathBuf::from("/data/y/z.txt"));
        assert_eq!(RelativePath::root().within("/data"), PathBuf::from("/data"));
    }

    #[test]
    fn test_display_and_equality() {
        let a = RelativePath::parse("/docs/a.txt").unwrap();
        let b = RelativePath::parse("docs/a.txt").unwrap();
        assert_eq!(a, b);
        assert_eq!(format!("{}", a), "/docs/a.txt");
        assert_eq!(format!("{}", RelativePath::root()), "/");
    }
}
