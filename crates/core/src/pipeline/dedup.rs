//! Deduplication of search hits by profile link.

use once_cell::sync::Lazy;
use regex_lite::Regex;
use std::collections::HashSet;

/// Public profile URLs, with optional country subdomain.
static PROFILE_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:https?://)?(?:[a-z]{2,3}\.)?(?:www\.)?linkedin\.com/in/([^/?#\s]+)")
        .unwrap()
});

/// Canonical form of a profile link, or `None` if the link is not a
/// profile page.
///
/// Scheme, `www.`/country subdomain, query string, fragment and trailing
/// slash are dropped and the slug lowercased, so the same person reached
/// through different URLs compares equal.
pub fn normalize_profile_link(link: &str) -> Option<String> {
    let caps = PROFILE_LINK.captures(link.trim())?;
    let slug = caps.get(1)?.as_str().to_lowercase();
    Some(format!("linkedin.com/in/{}", slug))
}

/// Tracks which profiles an organization's run has already retained.
///
/// One instance per organization; it is never shared between concurrent
/// organization workers.
#[derive(Debug, Default)]
pub struct ProfileDeduplicator {
    seen: HashSet<String>,
}

impl ProfileDeduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the profile behind `link` was already retained.
    pub fn contains(&self, link: &str) -> bool {
        normalize_profile_link(link).is_some_and(|key| self.seen.contains(&key))
    }

    /// Mark the profile as retained. Returns `false` if it already was, or
    /// if `link` is not a profile page.
    pub fn insert(&mut self, link: &str) -> bool {
        match normalize_profile_link(link) {
            Some(key) => self.seen.insert(key),
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_profile_link() {
        assert_eq!(
            normalize_profile_link("https://www.linkedin.com/in/jane-doe"),
            Some("linkedin.com/in/jane-doe".to_string())
        );
        assert_eq!(
            normalize_profile_link("https://uk.linkedin.com/in/Jane-Doe/?originalSubdomain=uk"),
            Some("linkedin.com/in/jane-doe".to_string())
        );
        assert_eq!(
            normalize_profile_link("linkedin.com/in/jane-doe#about"),
            Some("linkedin.com/in/jane-doe".to_string())
        );
    }

    #[test]
    fn test_non_profile_links() {
        assert_eq!(
            normalize_profile_link("https://www.linkedin.com/company/acme"),
            None
        );
        assert_eq!(normalize_profile_link("https://www.linkedin.com/in/"), None);
        assert_eq!(normalize_profile_link("https://example.com/in/jane"), None);
        assert_eq!(
            normalize_profile_link("https://notlinkedin.com/in/jane"),
            None
        );
        assert_eq!(normalize_profile_link(""), None);
    }

    #[test]
    fn test_dedup_across_url_variants() {
        let mut dedup = ProfileDeduplicator::new();
        assert!(dedup.insert("https://www.linkedin.com/in/jane-doe"));
        assert!(!dedup.insert("https://uk.linkedin.com/in/JANE-DOE/"));
        assert!(dedup.contains("http://linkedin.com/in/jane-doe?trk=x"));
        assert!(dedup.insert("https://www.linkedin.com/in/john-roe"));
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn test_non_profile_link_is_never_inserted() {
        let mut dedup = ProfileDeduplicator::new();
        assert!(!dedup.insert("https://www.linkedin.com/company/acme"));
        assert!(dedup.is_empty());
    }
}
