//! Result parser and attributor.
//!
//! Turns one raw search hit into a `(name, role, organization)` triple. The
//! title is run through an ordered list of [`TitlePattern`]s (first match
//! wins); when the title carries no organization the snippet is consulted,
//! and finally the organization that was searched for is used.

mod patterns;

pub use patterns::{
    default_patterns, BareNamePattern, DashPattern, PipePattern, TitleParts, TitlePattern,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::query::normalize_organization;
use crate::searcher::SearchHit;

/// Network branding appended to profile titles by search engines.
const BRANDING_SUFFIXES: &[&str] = &["| LinkedIn", "- LinkedIn", "· LinkedIn", "– LinkedIn"];

/// Longest organization accepted from a snippet, in characters.
const MAX_SNIPPET_ORGANIZATION_CHARS: usize = 60;

/// Where the attributed organization came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizationSource {
    Title,
    Snippet,
    Query,
}

/// A search hit attributed to a person.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedProfile {
    pub name: String,
    pub role: String,
    pub organization: String,
    pub organization_source: OrganizationSource,
}

/// Why a hit was dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseRejection {
    #[error("no person name in title")]
    EmptyName,
    #[error("result mentions neither the organization nor the role")]
    Irrelevant,
}

/// Ordered cascade of title patterns plus snippet fallback and relevance gate.
pub struct ResultParser {
    patterns: Vec<Box<dyn TitlePattern>>,
}

impl Default for ResultParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultParser {
    pub fn new() -> Self {
        Self {
            patterns: default_patterns(),
        }
    }

    /// Use a custom pattern cascade.
    pub fn with_patterns(patterns: Vec<Box<dyn TitlePattern>>) -> Self {
        Self { patterns }
    }

    /// Parse the title alone, without snippet or query fallback.
    pub fn parse_title(&self, title: &str) -> Option<TitleParts> {
        let cleaned = strip_branding(title);
        self.patterns.iter().find_map(|pattern| {
            let parts = pattern.parse(cleaned)?;
            trace!(pattern = pattern.name(), title = cleaned, "Title pattern matched");
            Some(parts)
        })
    }

    /// Attribute a hit returned for `role` at `organization`.
    ///
    /// Fails with [`ParseRejection::EmptyName`] when no name can be read and
    /// with [`ParseRejection::Irrelevant`] when neither the organization nor
    /// the role appears in the hit's text.
    pub fn attribute(
        &self,
        hit: &SearchHit,
        organization: &str,
        role: &str,
    ) -> Result<ParsedProfile, ParseRejection> {
        let parts = self
            .parse_title(&hit.title)
            .ok_or(ParseRejection::EmptyName)?;
        if parts.name.is_empty() {
            return Err(ParseRejection::EmptyName);
        }

        if !is_relevant(hit, organization, role) {
            return Err(ParseRejection::Irrelevant);
        }

        let (organization, organization_source) = match parts.organization {
            Some(org) => (org, OrganizationSource::Title),
            None => match organization_from_snippet(&hit.snippet) {
                Some(org) => (org, OrganizationSource::Snippet),
                None => (organization.trim().to_string(), OrganizationSource::Query),
            },
        };

        Ok(ParsedProfile {
            name: parts.name,
            role: strip_branding(&parts.role).to_string(),
            organization: strip_branding(&organization).to_string(),
            organization_source,
        })
    }
}

/// Remove trailing network branding and truncation marks.
pub fn strip_branding(title: &str) -> &str {
    let mut current = title.trim();
    loop {
        let before = current;
        current = current
            .trim_end_matches("...")
            .trim_end_matches('…')
            .trim_end();
        for suffix in BRANDING_SUFFIXES {
            if current.len() >= suffix.len() {
                let split = current.len() - suffix.len();
                if current.is_char_boundary(split)
                    && current[split..].eq_ignore_ascii_case(suffix)
                {
                    current = current[..split].trim_end();
                }
            }
        }
        if current == before {
            return current;
        }
    }
}

/// Recover an organization from snippet text such as
/// "HR Director at Acme Partners. Experience: ...".
///
/// Takes the clause after the first " at " up to a sentence or field
/// break; clauses longer than 60 characters are not trusted.
pub fn organization_from_snippet(snippet: &str) -> Option<String> {
    let lower = snippet.to_ascii_lowercase();
    let idx = lower.find(" at ")?;
    let tail = &snippet[idx + 4..];

    let end = tail
        .find(|c: char| matches!(c, '.' | '·' | '|' | '\n' | ';'))
        .unwrap_or(tail.len());
    let candidate = tail[..end].trim();

    if candidate.is_empty() || candidate.chars().count() > MAX_SNIPPET_ORGANIZATION_CHARS {
        return None;
    }
    Some(candidate.to_string())
}

/// The hit must mention the searched organization (raw or normalized) or
/// the searched role.
pub fn is_relevant(hit: &SearchHit, organization: &str, role: &str) -> bool {
    let text = format!("{} {}", hit.title, hit.snippet).to_lowercase();
    let organization = organization.trim();
    [
        organization.to_string(),
        normalize_organization(organization),
        role.trim().to_string(),
    ]
    .iter()
    .map(|needle| needle.to_lowercase())
    .any(|needle| !needle.is_empty() && text.contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn test_strip_branding() {
        assert_eq!(strip_branding("Jane Doe - HR | LinkedIn"), "Jane Doe - HR");
        assert_eq!(strip_branding("Jane Doe - HR - LinkedIn"), "Jane Doe - HR");
        assert_eq!(strip_branding("Jane Doe - HR Director at Acme ..."), "Jane Doe - HR Director at Acme");
        assert_eq!(strip_branding("Jane Doe | linkedin"), "Jane Doe");
        assert_eq!(strip_branding("Jane Doe"), "Jane Doe");
    }

    #[test]
    fn test_attribute_happy_path() {
        let parser = ResultParser::new();
        let hit = SearchHit::new(
            "Jane Doe - HR Director | Acme Partners",
            "https://uk.linkedin.com/in/janedoe",
            "Jane Doe. HR Director at Acme Partners.",
        );
        let parsed = parser.attribute(&hit, "Acme Partners", "HR Director").unwrap();
        assert_eq!(parsed.name, "Jane Doe");
        assert_eq!(parsed.role, "HR Director");
        assert_eq!(parsed.organization, "Acme Partners");
        assert_eq!(parsed.organization_source, OrganizationSource::Title);
    }

    #[test]
    fn test_attribute_snippet_fallback() {
        let parser = ResultParser::new();
        let hit = SearchHit::new(
            "Sam Patel | Talent Partner",
            "https://www.linkedin.com/in/sampatel",
            "Talent Partner at Acme Partners LLP. London, England.",
        );
        let parsed = parser.attribute(&hit, "Acme Partners", "HR Director").unwrap();
        assert_eq!(parsed.organization, "Acme Partners LLP");
        assert_eq!(parsed.organization_source, OrganizationSource::Snippet);
    }

    #[test]
    fn test_attribute_long_snippet_clause_falls_back_to_query() {
        let parser = ResultParser::new();
        let hit = SearchHit::new(
            "Sam Patel",
            "https://www.linkedin.com/in/sampatel",
            "Working at the intersection of people strategy, analytics and organisational design for Acme Partners",
        );
        let parsed = parser.attribute(&hit, "Acme Partners", "HR Director").unwrap();
        assert_eq!(parsed.organization, "Acme Partners");
        assert_eq!(parsed.organization_source, OrganizationSource::Query);
        assert_eq!(parsed.role, "");
    }

    #[test]
    fn test_attribute_empty_name_rejected() {
        let parser = ResultParser::new();
        let hit = SearchHit::new("...", "https://www.linkedin.com/in/x", "HR Director at Acme");
        assert_eq!(
            parser.attribute(&hit, "Acme", "HR Director"),
            Err(ParseRejection::EmptyName)
        );

        let hit = SearchHit::new("| LinkedIn", "https://www.linkedin.com/in/x", "Acme");
        assert_eq!(
            parser.attribute(&hit, "Acme", "HR Director"),
            Err(ParseRejection::EmptyName)
        );
    }

    #[test]
    fn test_attribute_irrelevant_rejected() {
        let parser = ResultParser::new();
        let hit = SearchHit::new(
            "Bob Jones - Chef | The Restaurant",
            "https://www.linkedin.com/in/bobjones",
            "Head chef in Leeds.",
        );
        assert_eq!(
            parser.attribute(&hit, "Acme Partners", "HR Director"),
            Err(ParseRejection::Irrelevant)
        );
    }

    #[test]
    fn test_relevance_uses_normalized_organization() {
        let hit = SearchHit::new("Ann Lee - CFO | Acme", "https://x", "");
        assert!(is_relevant(&hit, "Acme Holdings", "Partner"));
        assert!(!is_relevant(&hit, "Beta Holdings", "Partner"));
    }

    #[test]
    fn test_relevance_ignores_empty_needles() {
        let hit = SearchHit::new("Ann Lee", "https://x", "");
        assert!(!is_relevant(&hit, "", ""));
    }

    #[test]
    fn test_snippet_extraction() {
        assert_eq!(
            organization_from_snippet("Partner at Widget Co · Experience: 10 years"),
            Some("Widget Co".to_string())
        );
        assert_eq!(
            organization_from_snippet("CEO AT Gamma Ltd"),
            Some("Gamma Ltd".to_string())
        );
        assert_eq!(organization_from_snippet("No clause here."), None);
        assert_eq!(organization_from_snippet("Lead at ."), None);
    }

    #[test]
    fn test_custom_cascade() {
        let parser = ResultParser::with_patterns(vec![Box::new(PipePattern)]);
        assert!(parser.parse_title("Jane Doe - HR").is_none());
        assert_eq!(
            parser.parse_title("Jane Doe | HR").map(|p| p.role),
            Some("HR".to_string())
        );
    }

    #[test]
    fn test_title_corpus() {
        let parser = ResultParser::new();
        for case in fixtures::title_corpus() {
            let hit = SearchHit::new(case.title, "https://www.linkedin.com/in/x", case.snippet);
            let parsed = parser
                .attribute(&hit, case.query_organization, case.query_role)
                .unwrap_or_else(|e| panic!("{:?} rejected: {}", case.title, e));
            assert_eq!(parsed.name, case.name, "name for {:?}", case.title);
            assert_eq!(parsed.role, case.role, "role for {:?}", case.title);
            assert_eq!(
                parsed.organization, case.organization,
                "organization for {:?}",
                case.title
            );
        }
    }
}
