//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external service traits
//! (search backend and email providers), allowing the pipeline and the
//! waterfall to be exercised without network access or paid credits.
//!
//! # Example
//!
//! ```rust,ignore
//! use scout_core::testing::{fixtures, MockEmailProvider, MockSearcher};
//!
//! let searcher = MockSearcher::new();
//! let primary = MockEmailProvider::new("primary");
//!
//! // Configure mock responses
//! primary.set_person_response(Ok(fixtures::verified("jane.doe@acme.com", 0.92))).await;
//!
//! // Use in a Pipeline or EmailWaterfall...
//! ```

mod mock_email_provider;
mod mock_searcher;

pub use mock_email_provider::{MockEmailProvider, RecordedLookup};
pub use mock_searcher::{MockSearcher, RecordedSearch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::email::{EmailMatch, VerificationStatus};
    use crate::searcher::SearchHit;

    /// Profile link for a slug.
    pub fn profile_link(slug: &str) -> String {
        format!("https://www.linkedin.com/in/{}", slug)
    }

    /// A profile search hit titled `"<name> - <role> | <organization>"`.
    pub fn profile_hit(name: &str, role: &str, organization: &str, slug: &str) -> SearchHit {
        SearchHit::new(
            format!("{} - {} | {}", name, role, organization),
            profile_link(slug),
            format!("{} at {}. Experience and education.", role, organization),
        )
    }

    /// A hit that does not point at a profile page.
    pub fn company_page_hit(organization: &str) -> SearchHit {
        SearchHit::new(
            format!("{} | LinkedIn", organization),
            format!(
                "https://www.linkedin.com/company/{}",
                organization.to_lowercase().replace(' ', "-")
            ),
            format!("{} is a company.", organization),
        )
    }

    /// A verified address with the given confidence.
    pub fn verified(email: &str, confidence: f64) -> EmailMatch {
        EmailMatch::new(email, confidence, VerificationStatus::Verified)
    }

    /// An address with an explicit status.
    pub fn with_status(email: &str, confidence: f64, status: VerificationStatus) -> EmailMatch {
        EmailMatch::new(email, confidence, status)
    }

    /// One real-world title/snippet shape and its expected attribution.
    #[derive(Debug, Clone, Copy)]
    pub struct TitleCase {
        pub title: &'static str,
        pub snippet: &'static str,
        pub query_organization: &'static str,
        pub query_role: &'static str,
        pub name: &'static str,
        pub role: &'static str,
        pub organization: &'static str,
    }

    /// Fixed corpus of profile search results seen in the wild.
    pub fn title_corpus() -> Vec<TitleCase> {
        vec![
            TitleCase {
                title: "Jane Doe - HR Director | Acme Partners",
                snippet: "",
                query_organization: "Acme Partners",
                query_role: "HR Director",
                name: "Jane Doe",
                role: "HR Director",
                organization: "Acme Partners",
            },
            TitleCase {
                title: "John Smith - Chief Executive Officer at Widget Co | LinkedIn",
                snippet: "Location: Leeds. 500+ connections.",
                query_organization: "Widget Co Ltd",
                query_role: "CEO",
                name: "John Smith",
                role: "Chief Executive Officer",
                organization: "Widget Co",
            },
            TitleCase {
                title: "Ann Lee - Head of Early Careers - Beta Bank - LinkedIn",
                snippet: "Graduate programmes and internships.",
                query_organization: "Beta Bank PLC",
                query_role: "Early Careers Head",
                name: "Ann Lee",
                role: "Head of Early Careers",
                organization: "Beta Bank",
            },
            TitleCase {
                title: "Zoë Müller – CIO | Gamma AG",
                snippet: "",
                query_organization: "Gamma AG",
                query_role: "CIO",
                name: "Zoë Müller",
                role: "CIO",
                organization: "Gamma AG",
            },
            TitleCase {
                title: "Priya Patel - Talent Acquisition Lead | LinkedIn",
                snippet: "Talent Acquisition Lead at Delta Logistics. Location: London",
                query_organization: "Delta Logistics Limited",
                query_role: "HR Director",
                name: "Priya Patel",
                role: "Talent Acquisition Lead",
                organization: "Delta Logistics",
            },
            TitleCase {
                title: "Tom Brown | Partner",
                snippet: "Experienced partner in corporate law.",
                query_organization: "Epsilon Law LLP",
                query_role: "Partner",
                name: "Tom Brown",
                role: "Partner",
                organization: "Epsilon Law LLP",
            },
            TitleCase {
                title: "Maria Garcia - HR Director at Zeta Health ...",
                snippet: "",
                query_organization: "Zeta Health Group",
                query_role: "HR Director",
                name: "Maria Garcia",
                role: "HR Director",
                organization: "Zeta Health",
            },
            TitleCase {
                title: "Li Wei | LinkedIn",
                snippet: "Founder at Eta Robotics · Experience: Eta Robotics",
                query_organization: "Eta Robotics",
                query_role: "Founder",
                name: "Li Wei",
                role: "",
                organization: "Eta Robotics",
            },
        ]
    }
}
