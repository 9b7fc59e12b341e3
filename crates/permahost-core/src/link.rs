//! Tracking links and the working-area slugs derived from them.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CoreError, Result};

/// Maximum accepted link length, in bytes.
pub const MAX_LINK_LEN: usize = 2048;

/// Number of hash hex digits appended to every slug.
const SLUG_HASH_LEN: usize = 12;

/// Maximum length of the readable part of a slug.
const SLUG_BASE_MAX: usize = 64;

/// The user-supplied key of a tracked repository.
///
/// A link is either a repository URL or a local path. It is kept verbatim
/// (slashes included) once trimmed, since it doubles as the store key and is
/// matched against a wildcard path segment by the HTTP API.
///
/// # Example
///
/// ```
/// use permahost_core::Link;
///
/// let link = Link::parse("  https://example.com/a.git ").unwrap();
/// assert_eq!(link.as_str(), "https://example.com/a.git");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Link(String);

impl Link {
    /// Validates raw input and builds a link from it.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidLink`] when the trimmed input is empty,
    /// longer than [`MAX_LINK_LEN`], contains control characters or starts
    /// with `-`, which the external programs would read as an option.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();

        if trimmed.is_empty() {
            return Err(CoreError::invalid_link(input, "link cannot be empty"));
        }
        if trimmed.len() > MAX_LINK_LEN {
            return Err(CoreError::invalid_link(
                input,
                format!("link cannot be longer than {} bytes", MAX_LINK_LEN),
            ));
        }
        if trimmed.chars().any(char::is_control) {
            return Err(CoreError::invalid_link(
                input,
                "link cannot contain control characters",
            ));
        }
        if trimmed.starts_with('-') {
            return Err(CoreError::invalid_link(input, "link cannot start with '-'"));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Returns the link as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the working-area slug of this link.
    pub fn slug(&self) -> String {
        slug(&self.0)
    }

    /// Consumes the link and returns the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Link {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for Link {
    type Error = CoreError;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Derives the stable directory name used for a link's working area.
///
/// The readable part is built from the last two path segments of the link,
/// the suffix is the start of the BLAKE3 hash of the whole link, so two
/// links never share a slug and a link always gets the same one.
///
/// # Example
///
/// ```
/// use permahost_core::link::slug;
///
/// let s = slug("https://example.com/a.git");
/// assert!(s.starts_with("example.com-a-"));
/// assert_eq!(s, slug("https://example.com/a.git"));
/// ```
pub fn slug(link: &str) -> String {
    let segments: Vec<&str> = link
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .collect();

    let tail = &segments[segments.len().saturating_sub(2)..];
    let mut parts: Vec<String> = tail.iter().map(|s| sanitize_segment(s)).collect();

    if let Some(last) = parts.last_mut()
        && let Some(stripped) = last.strip_suffix(".git")
    {
        *last = stripped.to_string();
    }

    let joined = parts.join("-");
    let mut base: String = joined
        .trim_matches(|c| c == '-' || c == '.')
        .chars()
        .take(SLUG_BASE_MAX)
        .collect();

    if base.is_empty() {
        base.push_str("repo");
    }

    let hash = blake3::hash(link.as_bytes()).to_hex();
    format!("{}-{}", base, &hash.as_str()[..SLUG_HASH_LEN])
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '-',
        })
        .collect()
}
