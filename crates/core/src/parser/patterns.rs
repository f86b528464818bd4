//! Title patterns, tried in order until one matches.

/// Structured fields recovered from a result title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleParts {
    pub name: String,
    pub role: String,
    /// Organization, when the title carries one.
    pub organization: Option<String>,
}

/// One title shape the parser understands.
pub trait TitlePattern: Send + Sync {
    /// Pattern name for debug logging.
    fn name(&self) -> &str;

    /// Parse a title with branding already removed, or `None` if the title
    /// does not have this shape.
    fn parse(&self, title: &str) -> Option<TitleParts>;
}

const DASHES: &[&str] = &[" - ", " – ", " — "];
const PIPE: &str = " | ";
const AT: &str = " at ";

/// Split at the first occurrence of any separator.
fn split_first<'a>(text: &'a str, separators: &[&str]) -> Option<(&'a str, &'a str)> {
    separators
        .iter()
        .filter_map(|sep| text.find(sep).map(|idx| (idx, sep.len())))
        .min_by_key(|(idx, _)| *idx)
        .map(|(idx, len)| (&text[..idx], &text[idx + len..]))
}

/// Case-insensitive split on the word "at".
fn split_at_word(text: &str) -> Option<(&str, &str)> {
    // ASCII lowercasing keeps byte offsets aligned with `text`.
    let lower = text.to_ascii_lowercase();
    lower
        .find(AT)
        .map(|idx| (&text[..idx], &text[idx + AT.len()..]))
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `Name - Role | Organization`, `Name - Role at Organization`,
/// `Name - Role - Organization` and `Name - Role`.
pub struct DashPattern;

impl TitlePattern for DashPattern {
    fn name(&self) -> &str {
        "dash"
    }

    fn parse(&self, title: &str) -> Option<TitleParts> {
        let (name, rest) = split_first(title, DASHES)?;
        let rest = rest.trim();

        let (role, organization) = if let Some((role, org)) = split_first(rest, &[PIPE]) {
            (role, non_empty(org))
        } else if let Some((role, org)) = split_at_word(rest) {
            (role, non_empty(org))
        } else if let Some((role, org)) = split_first(rest, DASHES) {
            (role, non_empty(org))
        } else {
            (rest, None)
        };

        Some(TitleParts {
            name: name.trim().to_string(),
            role: role.trim().to_string(),
            organization,
        })
    }
}

/// `Name | Role`
pub struct PipePattern;

impl TitlePattern for PipePattern {
    fn name(&self) -> &str {
        "pipe"
    }

    fn parse(&self, title: &str) -> Option<TitleParts> {
        let (name, role) = split_first(title, &[PIPE])?;
        Some(TitleParts {
            name: name.trim().to_string(),
            role: role.trim().to_string(),
            organization: None,
        })
    }
}

/// The whole title is the person's name.
pub struct BareNamePattern;

impl TitlePattern for BareNamePattern {
    fn name(&self) -> &str {
        "bare_name"
    }

    fn parse(&self, title: &str) -> Option<TitleParts> {
        Some(TitleParts {
            name: title.trim().to_string(),
            role: String::new(),
            organization: None,
        })
    }
}

/// The default cascade, most specific first.
pub fn default_patterns() -> Vec<Box<dyn TitlePattern>> {
    vec![
        Box::new(DashPattern),
        Box::new(PipePattern),
        Box::new(BareNamePattern),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(name: &str, role: &str, org: Option<&str>) -> TitleParts {
        TitleParts {
            name: name.to_string(),
            role: role.to_string(),
            organization: org.map(String::from),
        }
    }

    #[test]
    fn test_dash_with_pipe() {
        assert_eq!(
            DashPattern.parse("Jane Doe - HR Director | Acme Partners"),
            Some(parts("Jane Doe", "HR Director", Some("Acme Partners")))
        );
    }

    #[test]
    fn test_dash_with_at() {
        assert_eq!(
            DashPattern.parse("John Smith - Chief Executive Officer at Widget Co"),
            Some(parts("John Smith", "Chief Executive Officer", Some("Widget Co")))
        );
        assert_eq!(
            DashPattern.parse("John Smith - Partner AT Widget Co"),
            Some(parts("John Smith", "Partner", Some("Widget Co")))
        );
    }

    #[test]
    fn test_dash_with_second_dash() {
        assert_eq!(
            DashPattern.parse("Ann Lee - Head of Early Careers - Beta Bank"),
            Some(parts("Ann Lee", "Head of Early Careers", Some("Beta Bank")))
        );
    }

    #[test]
    fn test_dash_pipe_wins_over_at() {
        // The pipe is checked first, so "at" stays inside the role.
        assert_eq!(
            DashPattern.parse("Ann Lee - Director at Large | Beta Bank"),
            Some(parts("Ann Lee", "Director at Large", Some("Beta Bank")))
        );
    }

    #[test]
    fn test_dash_role_only() {
        assert_eq!(
            DashPattern.parse("Ann Lee - Recruiter"),
            Some(parts("Ann Lee", "Recruiter", None))
        );
    }

    #[test]
    fn test_dash_unicode_separator() {
        assert_eq!(
            DashPattern.parse("Zoë Müller – CIO | Gamma AG"),
            Some(parts("Zoë Müller", "CIO", Some("Gamma AG")))
        );
    }

    #[test]
    fn test_dash_requires_spaced_separator() {
        assert_eq!(DashPattern.parse("Mary-Jane Watson"), None);
    }

    #[test]
    fn test_pipe() {
        assert_eq!(
            PipePattern.parse("Jane Doe | HR Director"),
            Some(parts("Jane Doe", "HR Director", None))
        );
        assert_eq!(PipePattern.parse("Jane Doe"), None);
    }

    #[test]
    fn test_bare_name() {
        assert_eq!(
            BareNamePattern.parse("  Jane Doe "),
            Some(parts("Jane Doe", "", None))
        );
    }
}
