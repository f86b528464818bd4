//! Discovery-and-resolution pipeline.
//!
//! Per organization: targeting band, one search per role, profile-link
//! filter, dedup, parse and attribute, per-organization cap, then email
//! resolution one candidate at a time. Organizations run through a bounded
//! buffer so results come back in input order whatever the concurrency.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::metrics;
use crate::parser::{ParseRejection, ResultParser};
use crate::query::ProfileQueryBuilder;
use crate::rate_limiter::RateLimiterPool;
use crate::searcher::{paced_search, SearchHit, Searcher};
use crate::targeting::{HeadcountBand, TargetingPolicy};
use crate::waterfall::EmailWaterfall;

use super::config::PipelineConfig;
use super::dedup::{normalize_profile_link, ProfileDeduplicator};
use super::types::{
    Candidate, DiscoveryReport, DiscoveryStats, OrganizationResult, OrganizationTarget,
    PipelineError, Provenance, ResolvedContact,
};

/// The discovery-and-resolution orchestrator.
pub struct Pipeline {
    searcher: Arc<dyn Searcher>,
    waterfall: Arc<EmailWaterfall>,
    policy: TargetingPolicy,
    queries: ProfileQueryBuilder,
    parser: ResultParser,
    limiter: Arc<RateLimiterPool>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(
        searcher: Arc<dyn Searcher>,
        waterfall: Arc<EmailWaterfall>,
        policy: TargetingPolicy,
        config: PipelineConfig,
    ) -> Self {
        Self {
            searcher,
            waterfall,
            policy,
            queries: ProfileQueryBuilder::new(),
            parser: ResultParser::new(),
            limiter: Arc::new(RateLimiterPool::empty()),
            config,
        }
    }

    /// Share provider pacing with the rest of the process.
    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiterPool>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn policy(&self) -> &TargetingPolicy {
        &self.policy
    }

    pub fn waterfall(&self) -> &Arc<EmailWaterfall> {
        &self.waterfall
    }

    fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.waterfall.config().call_timeout_secs)
    }

    /// Find people at each organization and resolve their addresses.
    ///
    /// `max_per_organization == 0` means the configured default. Every
    /// organization name is validated before any provider call.
    pub async fn discover_and_resolve(
        &self,
        organizations: &[OrganizationTarget],
        max_per_organization: usize,
    ) -> Result<DiscoveryReport, PipelineError> {
        if let Some(index) = organizations
            .iter()
            .position(|org| org.name.trim().is_empty())
        {
            return Err(PipelineError::InvalidOrganization { index });
        }

        let max = if max_per_organization == 0 {
            self.config.max_per_organization
        } else {
            max_per_organization
        };

        let run_id = Uuid::new_v4().to_string();
        let span = info_span!("discovery_run", run_id = %run_id, organizations = organizations.len());

        async move {
            let mut skipped = Vec::new();
            let mut in_scope = Vec::new();
            for org in organizations {
                match self.policy.band_for(org.headcount) {
                    Some(band) => in_scope.push((org.clone(), band)),
                    None => {
                        info!(
                            organization = org.name.trim(),
                            headcount = org.headcount,
                            "Organization out of scope, skipping"
                        );
                        metrics::ORGANIZATIONS_SKIPPED.inc();
                        skipped.push(org.name.trim().to_string());
                    }
                }
            }

            let outcomes: Vec<(OrganizationResult, DiscoveryStats)> = stream::iter(in_scope)
                .map(|(org, band)| async move { self.process_organization(&org, band, max).await })
                .buffered(self.config.concurrency.max(1))
                .collect()
                .await;

            let mut stats = DiscoveryStats::default();
            let mut results = Vec::with_capacity(outcomes.len());
            for (result, org_stats) in outcomes {
                stats.merge(&org_stats);
                results.push(result);
            }

            info!(
                organizations = results.len(),
                skipped = skipped.len(),
                queries = stats.queries_issued,
                emails = stats.emails_resolved,
                "Discovery run complete"
            );

            Ok(DiscoveryReport {
                run_id,
                results,
                skipped,
                stats,
            })
        }
        .instrument(span)
        .await
    }

    /// Resolve one person supplied directly by a caller.
    pub async fn resolve_one(
        &self,
        full_name: &str,
        organization: &str,
    ) -> Result<ResolvedContact, PipelineError> {
        let full_name = full_name.trim();
        let organization = organization.trim();
        if full_name.is_empty() || organization.is_empty() {
            return Err(PipelineError::InvalidInput(
                "full name and organization are required".to_string(),
            ));
        }

        let resolution = self
            .waterfall
            .resolve_person(full_name, organization)
            .await
            .map_err(|e| PipelineError::InvalidInput(e.to_string()))?;

        Ok(ResolvedContact {
            candidate: Candidate {
                name: full_name.to_string(),
                role: String::new(),
                organization: organization.to_string(),
                profile_link: String::new(),
                provenance: Provenance::Direct,
            },
            email: resolution.email,
            confidence: resolution.confidence,
            provider: resolution.provider,
        })
    }

    async fn process_organization(
        &self,
        org: &OrganizationTarget,
        band: HeadcountBand,
        max: usize,
    ) -> (OrganizationResult, DiscoveryStats) {
        let name = org.name.trim();
        let mut stats = DiscoveryStats::default();

        let candidates = self.discover(name, &band, max, &mut stats).await;
        metrics::CANDIDATES_RETAINED.observe(candidates.len() as f64);

        let mut contacts = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let contact = self.resolve_candidate(candidate, name).await;
            if contact.email.is_some() {
                stats.emails_resolved += 1;
            }
            contacts.push(contact);
        }

        info!(
            organization = name,
            band = %band.label,
            candidates = contacts.len(),
            resolved = stats.emails_resolved,
            "Organization processed"
        );

        (
            OrganizationResult {
                organization: name.to_string(),
                band: band.label,
                roles: band.roles,
                candidates: contacts,
            },
            stats,
        )
    }

    /// Search every role in band order and keep distinct, attributable
    /// profiles until `max` are found.
    async fn discover(
        &self,
        organization: &str,
        band: &HeadcountBand,
        max: usize,
        stats: &mut DiscoveryStats,
    ) -> Vec<Candidate> {
        let mut dedup = ProfileDeduplicator::new();
        let mut candidates = Vec::new();

        for role in &band.roles {
            if candidates.len() >= max {
                break;
            }

            let query = self.queries.role_at_organization(role, organization);
            stats.queries_issued += 1;
            debug!(organization, role = %role, query = %query, "Searching for profiles");

            let hits = match paced_search(
                self.searcher.as_ref(),
                &self.limiter,
                &query,
                self.config.results_per_query,
                self.call_timeout(),
            )
            .await
            {
                Ok(hits) => hits,
                Err(e) => {
                    stats.search_failures += 1;
                    warn!(organization, role = %role, error = %e, "Profile search failed");
                    continue;
                }
            };
            stats.raw_results += hits.len();

            for hit in hits {
                if candidates.len() >= max {
                    break;
                }
                if let Some(candidate) = self.screen(&hit, organization, role, &mut dedup, stats) {
                    candidates.push(candidate);
                }
            }
        }

        candidates
    }

    /// Turn one hit into a candidate, or count why it was dropped.
    fn screen(
        &self,
        hit: &SearchHit,
        organization: &str,
        role: &str,
        dedup: &mut ProfileDeduplicator,
        stats: &mut DiscoveryStats,
    ) -> Option<Candidate> {
        if normalize_profile_link(&hit.link).is_none() {
            stats.rejected_not_profile += 1;
            reject("not_profile", hit);
            return None;
        }
        if dedup.contains(&hit.link) {
            stats.rejected_duplicate += 1;
            reject("duplicate", hit);
            return None;
        }

        let parsed = match self.parser.attribute(hit, organization, role) {
            Ok(parsed) => parsed,
            Err(ParseRejection::EmptyName) => {
                stats.rejected_empty_name += 1;
                reject("empty_name", hit);
                return None;
            }
            Err(ParseRejection::Irrelevant) => {
                stats.rejected_irrelevant += 1;
                reject("irrelevant", hit);
                return None;
            }
        };

        dedup.insert(&hit.link);
        Some(Candidate {
            name: parsed.name,
            role: if parsed.role.is_empty() {
                role.to_string()
            } else {
                parsed.role
            },
            organization: parsed.organization,
            profile_link: hit.link.trim().to_string(),
            provenance: Provenance::Search,
        })
    }

    /// Resolve against the organization that was searched, which is the
    /// name the caller and the domain directory know.
    async fn resolve_candidate(&self, candidate: Candidate, organization: &str) -> ResolvedContact {
        match self
            .waterfall
            .resolve_person(&candidate.name, organization)
            .await
        {
            Ok(resolution) => ResolvedContact {
                candidate,
                email: resolution.email,
                confidence: resolution.confidence,
                provider: resolution.provider,
            },
            Err(e) => {
                warn!(person = %candidate.name, organization, error = %e, "Resolution rejected input");
                ResolvedContact {
                    candidate,
                    email: None,
                    confidence: 0.0,
                    provider: None,
                }
            }
        }
    }
}

fn reject(reason: &str, hit: &SearchHit) {
    metrics::HITS_REJECTED.with_label_values(&[reason]).inc();
    debug!(reason, title = %hit.title, link = %hit.link, "Search hit rejected");
}
