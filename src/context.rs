//! Content identifiers and navigation tokens.
//!
//! A [`ContentId`] names the note list a video maps to. It is taken from
//! the `v` query parameter of a watch page URL; any other page has no
//! identifier, even if it carries a `v` parameter. A [`Navigator`] tracks which
//! video is in view and hands out [`ContextToken`]s; results produced for
//! an older token are stale and must be dropped.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::DEFAULT_WATCH_URL;
use crate::error::{NoteError, NoteResult};

/// Query parameter holding the video ID in a watch URL.
pub const VIDEO_ID_PARAM: &str = "v";

fn bare_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("valid regex"))
}

fn default_watch_page() -> &'static Url {
    static PAGE: OnceLock<Url> = OnceLock::new();
    PAGE.get_or_init(|| Url::parse(DEFAULT_WATCH_URL).expect("valid default watch URL"))
}

/// Host without a leading `www.` or `m.`.
fn site(url: &Url) -> Option<&str> {
    let host = url.host_str()?;
    Some(
        host.strip_prefix("www.")
            .or_else(|| host.strip_prefix("m."))
            .unwrap_or(host),
    )
}

/// True if `url` is on the same site and path as `watch_page`.
fn is_watch_page(url: &Url, watch_page: &Url) -> bool {
    site(url).is_some()
        && site(url) == site(watch_page)
        && url.path().trim_end_matches('/') == watch_page.path().trim_end_matches('/')
}

/// Opaque key identifying which note list applies to a video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentId(String);

impl ContentId {
    /// Extracts the identifier from a URL on the default watch page.
    pub fn from_url(url: &str) -> NoteResult<Self> {
        Self::from_watch_url(url, default_watch_page())
    }

    /// Extracts the identifier from a URL on `watch_page`.
    ///
    /// Returns `InvalidContext` if the URL cannot be parsed, points at any
    /// other page, or has no non-empty `v` parameter.
    pub fn from_watch_url(url: &str, watch_page: &Url) -> NoteResult<Self> {
        let invalid = || NoteError::InvalidContext(url.to_string());
        let parsed = Url::parse(url).map_err(|_| invalid())?;
        if !is_watch_page(&parsed, watch_page) {
            return Err(invalid());
        }
        parsed
            .query_pairs()
            .find(|(key, _)| key == VIDEO_ID_PARAM)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(ContentId)
            .ok_or_else(invalid)
    }

    /// Resolves command-line input that is either a watch URL or a bare ID.
    pub fn resolve(input: &str) -> NoteResult<Self> {
        Self::resolve_on(input, default_watch_page())
    }

    /// [`resolve`](ContentId::resolve) against a configured watch page.
    pub fn resolve_on(input: &str, watch_page: &Url) -> NoteResult<Self> {
        let input = input.trim();
        if bare_id_pattern().is_match(input) {
            return Ok(ContentId(input.to_string()));
        }
        Self::from_watch_url(input, watch_page)
    }

    /// Rebuilds an identifier from a key the store wrote earlier.
    pub(crate) fn from_key(key: String) -> Self {
        ContentId(key)
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The video in view at the moment a token was issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextToken {
    /// Identifier of the note list in view.
    pub content_id: ContentId,
    generation: u64,
}

impl ContextToken {
    /// Generation counter value this token was issued at.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Tracks navigation between videos.
///
/// Cloning shares the same counter, so a token checked against any clone
/// sees every navigation.
#[derive(Debug, Clone)]
pub struct Navigator {
    generation: Arc<AtomicU64>,
    watch_page: Arc<Url>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::for_watch_page(default_watch_page().clone())
    }
}

impl Navigator {
    /// Creates a navigator with nothing in view.
    pub fn new() -> Self {
        Self::default()
    }

    /// A navigator that only finds videos on `watch_page`.
    pub fn for_watch_page(watch_page: Url) -> Self {
        Self {
            generation: Arc::new(AtomicU64::new(0)),
            watch_page: Arc::new(watch_page),
        }
    }

    /// Moves to the video at `url` and returns its token.
    ///
    /// The generation advances even when the URL is invalid, so work for
    /// the previous video is invalidated either way.
    pub fn navigate(&self, url: &str) -> NoteResult<ContextToken> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let content_id = ContentId::resolve_on(url, &self.watch_page)?;
        tracing::debug!(%content_id, generation, "Navigated");
        Ok(ContextToken {
            content_id,
            generation,
        })
    }

    /// True if no navigation happened since `token` was issued.
    pub fn is_current(&self, token: &ContextToken) -> bool {
        self.generation.load(Ordering::SeqCst) == token.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_url_extracts_v_param() {
        let id = ContentId::from_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42s")
            .expect("Should parse watch URL");
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_from_url_without_v_param() {
        let err = ContentId::from_url("https://www.youtube.com/feed/subscriptions").unwrap_err();
        assert!(matches!(err, NoteError::InvalidContext(_)));
    }

    #[test]
    fn test_from_url_empty_v_param() {
        assert!(ContentId::from_url("https://www.youtube.com/watch?v=").is_err());
    }

    #[test]
    fn test_from_url_rejects_garbage() {
        assert!(ContentId::from_url("not a url").is_err());
    }

    #[test]
    fn test_from_url_rejects_other_sites() {
        let err = ContentId::from_url("https://evil.example.com/search?v=abc123").unwrap_err();
        assert!(matches!(err, NoteError::InvalidContext(_)));
        assert!(ContentId::from_url("https://www.youtube.com/results?v=abc123").is_err());
    }

    #[test]
    fn test_from_url_accepts_site_variants() {
        for url in [
            "https://youtube.com/watch?v=abc123",
            "https://m.youtube.com/watch?v=abc123",
            "https://WWW.YOUTUBE.COM/watch/?v=abc123",
        ] {
            assert_eq!(ContentId::from_url(url).unwrap().as_str(), "abc123", "{url}");
        }
    }

    #[test]
    fn test_from_watch_url_uses_configured_page() {
        let page = Url::parse("https://tube.example.org/videos/watch").unwrap();
        let id = ContentId::from_watch_url("https://tube.example.org/videos/watch?v=xyz", &page)
            .unwrap();
        assert_eq!(id.as_str(), "xyz");
        assert!(ContentId::from_watch_url("https://www.youtube.com/watch?v=xyz", &page).is_err());
    }

    #[test]
    fn test_resolve_accepts_bare_id() {
        let id = ContentId::resolve("abc123").expect("Bare ID should resolve");
        assert_eq!(id.as_str(), "abc123");
    }

    #[test]
    fn test_resolve_falls_back_to_url() {
        let id = ContentId::resolve("https://youtube.com/watch?v=xyz").unwrap();
        assert_eq!(id.to_string(), "xyz");
    }

    #[test]
    fn test_navigation_invalidates_old_tokens() {
        let nav = Navigator::new();
        let first = nav.navigate("abc123").unwrap();
        assert!(nav.is_current(&first));

        let second = nav.navigate("def456").unwrap();
        assert!(!nav.is_current(&first), "Old token should be stale");
        assert!(nav.is_current(&second));
    }

    #[test]
    fn test_failed_navigation_still_invalidates() {
        let nav = Navigator::new();
        let token = nav.navigate("abc123").unwrap();
        assert!(nav.navigate("https://example.com/").is_err());
        assert!(!nav.is_current(&token));
    }

    #[test]
    fn test_navigator_respects_watch_page() {
        let page = Url::parse("https://tube.example.org/watch").unwrap();
        let nav = Navigator::for_watch_page(page);
        assert!(nav.navigate("https://tube.example.org/watch?v=abc").is_ok());
        assert!(matches!(
            nav.navigate("https://www.youtube.com/watch?v=abc"),
            Err(NoteError::InvalidContext(_))
        ));
    }

    #[test]
    fn test_clones_share_generation() {
        let nav = Navigator::new();
        let clone = nav.clone();
        let token = nav.navigate("abc123").unwrap();
        clone.navigate("abc123").unwrap();
        assert!(!nav.is_current(&token));
    }
}
