//! Email finding and verification providers.
//!
//! Two independent services are used in waterfall order: Anymail Finder
//! (primary) and Hunter (secondary). Both adapters normalize their replies
//! into [`EmailMatch`] so no provider-specific field reaches the waterfall.

mod anymail;
mod hunter;
mod types;

pub use anymail::{AnymailConfig, AnymailProvider};
pub use hunter::{HunterConfig, HunterProvider};
pub use types::{
    normalize_email, split_full_name, DecisionMakerCategory, EmailMatch, EmailProvider,
    EmailProviderError, MissReason, RoleQuery, VerificationStatus,
};
