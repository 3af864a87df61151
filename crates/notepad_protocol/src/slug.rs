//! Note identifiers derived from URL path segments.

use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Slug used when the path is empty or does not hold a valid slug.
pub const DEFAULT_SLUG: &str = "default";

/// Maximum slug length in characters.
pub const MAX_SLUG_LEN: usize = 100;

/// Prefix of local cache keys (`"note:" + slug`).
pub const CACHE_KEY_PREFIX: &str = "note:";

/// Returns true if `candidate` matches `^[A-Za-z0-9-_]{1,100}$`.
///
/// This is the one predicate used by both the client resolver and the
/// server boundary.
pub fn is_valid_slug(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate.len() <= MAX_SLUG_LEN
        && candidate
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

/// A validated note identifier.
///
/// A `Slug` can only be built through [`Slug::parse`] (strict) or
/// [`Slug::resolve`] (fail-open), so holding one means the value is valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Validates `candidate` as-is, without decoding.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidSlug`] if the value fails the pattern.
    pub fn parse(candidate: &str) -> ProtocolResult<Self> {
        if is_valid_slug(candidate) {
            Ok(Self(candidate.to_string()))
        } else {
            Err(ProtocolError::invalid_slug(candidate))
        }
    }

    /// Derives a slug from a raw URL path such as `/my-note`.
    ///
    /// Strips one leading `/`, decodes percent-encoding and validates the
    /// result. Never fails: an empty path, the root path, a value that does
    /// not decode, or one that fails the pattern all yield [`DEFAULT_SLUG`].
    pub fn resolve(raw_path: &str) -> Self {
        if raw_path.is_empty() || raw_path == "/" {
            return Self::default_slug();
        }

        let trimmed = raw_path.strip_prefix('/').unwrap_or(raw_path);
        match urlencoding::decode(trimmed) {
            Ok(decoded) if is_valid_slug(&decoded) => Self(decoded.into_owned()),
            _ => Self::default_slug(),
        }
    }

    /// The `"default"` slug.
    pub fn default_slug() -> Self {
        Self(DEFAULT_SLUG.to_string())
    }

    /// Returns true for the `"default"` slug.
    pub fn is_default(&self) -> bool {
        self.0 == DEFAULT_SLUG
    }

    /// Returns the slug as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Key of this note in a client-side fallback cache.
    pub fn cache_key(&self) -> String {
        format!("{CACHE_KEY_PREFIX}{}", self.0)
    }

    /// Path of the note endpoint, relative to the server root.
    ///
    /// Valid slug characters are all unreserved, so no encoding is needed.
    pub fn api_path(&self) -> String {
        format!("/api/note/{}", self.0)
    }

    /// Document title shown by clients.
    pub fn title(&self) -> String {
        if self.is_default() {
            "Notepad".to_string()
        } else {
            format!("{} — Notepad", self.0)
        }
    }
}

impl Default for Slug {
    fn default() -> Self {
        Self::default_slug()
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Slug {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Slug {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_valid_slug(&value) {
            Ok(Self(value))
        } else {
            Err(ProtocolError::invalid_slug(value))
        }
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn parse_accepts_pattern() {
        assert_eq!(Slug::parse("my-note").unwrap().as_str(), "my-note");
        assert_eq!(Slug::parse("A_b-9").unwrap().as_str(), "A_b-9");
        assert!(Slug::parse(&"x".repeat(MAX_SLUG_LEN)).is_ok());
    }

    #[test]
    fn parse_rejects_outside_pattern() {
        for bad in ["", "bad slug!", "a?b", "a/b", "ünïcode", "a.b", "%20"] {
            assert!(
                matches!(Slug::parse(bad), Err(ProtocolError::InvalidSlug { .. })),
                "{bad:?} should be rejected"
            );
        }
        assert!(Slug::parse(&"x".repeat(MAX_SLUG_LEN + 1)).is_err());
    }

    #[test]
    fn resolve_root_paths() {
        assert_eq!(Slug::resolve(""), Slug::default_slug());
        assert_eq!(Slug::resolve("/"), Slug::default_slug());
    }

    #[test]
    fn resolve_decodes_percent_encoding() {
        assert_eq!(Slug::resolve("/my%2Dnote").as_str(), "my-note");
        assert_eq!(Slug::resolve("plain").as_str(), "plain");
    }

    #[test]
    fn resolve_fails_open() {
        assert!(Slug::resolve("/bad%20slug").is_default());
        assert!(Slug::resolve("/what?x=1").is_default());
        assert!(Slug::resolve("/a/b").is_default());
        assert!(Slug::resolve("/%E0%A4%A").is_default());
        assert!(Slug::resolve("/%zz").is_default());
        assert!(Slug::resolve("//").is_default());
    }

    #[test]
    fn helpers() {
        let slug = Slug::parse("my-note").unwrap();
        assert_eq!(slug.cache_key(), "note:my-note");
        assert_eq!(slug.api_path(), "/api/note/my-note");
        assert_eq!(slug.title(), "my-note — Notepad");
        assert_eq!(Slug::default().title(), "Notepad");
        assert_eq!(slug.to_string(), "my-note");
        assert_eq!("my-note".parse::<Slug>().unwrap(), slug);
    }

    #[test]
    fn serde_validates() {
        let slug: Slug = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(slug.as_str(), "abc");
        assert_eq!(serde_json::to_string(&slug).unwrap(), "\"abc\"");
        assert!(serde_json::from_str::<Slug>("\"a b\"").is_err());
    }

    proptest! {
        #[test]
        fn valid_slugs_resolve_to_themselves(s in "[A-Za-z0-9_-]{1,100}") {
            let resolved = Slug::resolve(&format!("/{s}"));
            prop_assert_eq!(resolved.as_str(), s.as_str());
            prop_assert!(Slug::parse(&s).is_ok());
        }

        #[test]
        fn overlong_slugs_resolve_to_default(s in "[A-Za-z0-9_-]{101,140}") {
            let resolved = Slug::resolve(&format!("/{s}"));
            prop_assert!(resolved.is_default());
        }

        #[test]
        fn slugs_with_forbidden_chars_resolve_to_default(
            prefix in "[a-z]{0,10}",
            bad in prop::sample::select(vec![' ', '?', '!', '.', '#', '/']),
            suffix in "[a-z]{0,10}",
        ) {
            let raw = format!("/{prefix}{bad}{suffix}");
            prop_assert!(Slug::resolve(&raw).is_default());
        }
    }
}
