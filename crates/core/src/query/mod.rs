//! Search query construction for profile discovery.
//!
//! Queries combine a quoted role (or person name), a quoted organization
//! name with its legal-entity suffix removed, and a site restriction to
//! public profile pages.

/// Legal-entity suffixes removed from organization names before searching.
pub const LEGAL_SUFFIXES: &[&str] = &[
    "PLC", "Ltd", "Limited", "LLC", "Inc", "Corp", "Group", "Holdings",
];

/// Default site restriction: public profile pages of the professional network.
pub const DEFAULT_PROFILE_SITE: &str = "linkedin.com/in";

/// Strip legal-entity suffixes and surrounding whitespace from an
/// organization name.
///
/// Suffixes are matched case-insensitively as whole trailing words and
/// removed repeatedly ("Acme Holdings Ltd." becomes "Acme"). If nothing is
/// left, the original name is returned unmodified.
pub fn normalize_organization(name: &str) -> String {
    let original = name.trim();
    let mut current = original;

    loop {
        let trimmed = current.trim_end_matches(|c: char| c == '.' || c == ',' || c.is_whitespace());
        match strip_legal_suffix(trimmed) {
            Some(rest) => current = rest,
            None => {
                current = trimmed;
                break;
            }
        }
    }

    if current.is_empty() {
        original.to_string()
    } else {
        current.to_string()
    }
}

fn strip_legal_suffix(name: &str) -> Option<&str> {
    for suffix in LEGAL_SUFFIXES {
        if name.len() <= suffix.len() {
            continue;
        }
        let split = name.len() - suffix.len();
        if !name.is_char_boundary(split) {
            continue;
        }
        let (head, tail) = name.split_at(split);
        if tail.eq_ignore_ascii_case(suffix) && head.ends_with(char::is_whitespace) {
            return Some(head.trim_end());
        }
    }
    None
}

/// Remove characters that would break a quoted search phrase.
fn phrase(text: &str) -> String {
    text.replace('"', "").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Builds search-engine queries targeting profile pages.
#[derive(Debug, Clone)]
pub struct ProfileQueryBuilder {
    site: String,
}

impl Default for ProfileQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileQueryBuilder {
    /// Create a builder restricted to the default profile site.
    pub fn new() -> Self {
        Self {
            site: DEFAULT_PROFILE_SITE.to_string(),
        }
    }

    /// Create a builder restricted to a custom site path.
    pub fn with_site(site: impl Into<String>) -> Self {
        Self { site: site.into() }
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    /// `"<role>" "<organization>" site:<profile site>`
    pub fn role_at_organization(&self, role: &str, organization: &str) -> String {
        format!(
            "\"{}\" \"{}\" site:{}",
            phrase(role),
            phrase(&normalize_organization(organization)),
            self.site
        )
    }

    /// `"<full name>" "<organization>" site:<profile site>`
    pub fn person_at_organization(&self, full_name: &str, organization: &str) -> String {
        self.role_at_organization(full_name, organization)
    }

    /// Query used to discover an organization's website when no curated
    /// domain is known.
    pub fn official_website(&self, organization: &str) -> String {
        format!("{} official website", normalize_organization(organization))
    }

    /// Query that surfaces the search listing of one profile URL.
    pub fn profile_lookup(&self, profile_url: &str) -> String {
        format!("site:{} \"{}\"", self.site, phrase(profile_url.trim()))
    }
}
