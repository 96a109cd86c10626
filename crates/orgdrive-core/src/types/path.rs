//! Canonical storage-relative paths.
//!
//! A [`CanonicalPath`] is the single comparison key used throughout the
//! authorization and storage layers: slash-joined, NFC-normalized, with no
//! leading or trailing slash. The empty path denotes the storage root.

use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

/// A normalized, slash-joined, storage-root-relative path.
///
/// Construction via [`CanonicalPath::parse`] folds backslashes, applies
/// Unicode NFC (so visually identical paths from different client input
/// methods compare equal), and drops empty and `.` segments. Segment
/// *casing* is preserved; alias resolution and case folding of the first
/// segment are the path normalizer's job, not this type's.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalPath(String);

impl CanonicalPath {
    /// The root path (empty).
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Parse a raw path into canonical form.
    ///
    /// Never fails: malformed input degrades to whatever segments survive.
    /// `..` segments are passed through literally; rejecting them is the
    /// storage gateway's responsibility.
    pub fn parse(raw: &str) -> Self {
        let folded: String = raw.replace('\\', "/").nfc().collect();
        let segments: Vec<&str> = folded
            .split('/')
            .filter(|s| !s.is_empty() && *s != ".")
            .collect();
        Self(segments.join("/"))
    }

    /// Build a path from pre-normalized segments.
    pub fn from_segments<'a>(segments: impl IntoIterator<Item = &'a str>) -> Self {
        let joined: Vec<&str> = segments.into_iter().filter(|s| !s.is_empty()).collect();
        Self(joined.join("/"))
    }

    /// The underlying string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this is the storage root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the `/`-separated segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// The final segment, if any.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            self.0.rsplit('/').next()
        }
    }

    /// The parent path; `None` for the root.
    pub fn parent(&self) -> Option<CanonicalPath> {
        if self.is_root() {
            return None;
        }
        match self.0.rfind('/') {
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => Some(Self::root()),
        }
    }

    /// Append a single name, normalizing it as a path fragment.
    pub fn join(&self, name: &str) -> CanonicalPath {
        let tail = Self::parse(name);
        if self.is_root() {
            return tail;
        }
        if tail.is_root() {
            return self.clone();
        }
        Self(format!("{}/{}", self.0, tail.0))
    }

    /// Whether this path equals `prefix` or is nested under it.
    ///
    /// The comparison is segment-boundary-safe: `Foo2/x` is *not* within
    /// `Foo`. The root is a prefix of everything.
    pub fn is_within(&self, prefix: &CanonicalPath) -> bool {
        self.is_within_str(prefix.as_str())
    }

    /// Boundary-safe containment against a raw prefix string.
    pub fn is_within_str(&self, prefix: &str) -> bool {
        segments_within(self.segments(), prefix, false)
    }

    /// Case-insensitive boundary-safe containment.
    ///
    /// Segment comparison uses full Unicode lowercasing, matching how
    /// department names and usernames are compared during authorization.
    pub fn is_within_ci(&self, prefix: &str) -> bool {
        segments_within(self.segments(), prefix, true)
    }
}

fn segments_within<'a>(
    mut path: impl Iterator<Item = &'a str>,
    prefix: &str,
    case_insensitive: bool,
) -> bool {
    for want in prefix.split('/').filter(|s| !s.is_empty()) {
        let Some(have) = path.next() else {
            return false;
        };
        let matches = if case_insensitive {
            have.to_lowercase() == want.to_lowercase()
        } else {
            have == want
        };
        if !matches {
            return false;
        }
    }
    true
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
