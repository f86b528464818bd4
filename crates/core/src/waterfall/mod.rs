//! Email resolution waterfall.
//!
//! Resolves addresses through an ordered, short-circuiting sequence:
//! resolution cache, primary provider, then secondary provider. Every
//! provider call is paced by the shared rate limiter and bounded by a
//! timeout; a failed or slow provider is recorded as a miss and the next
//! source is tried.
//!
//! The cache is written once, after the last provider call, so a caller
//! that drops the future mid-resolution never leaves a partial entry.

mod config;
mod directory;
mod domain;

pub use config::{DirectoryEntry, WaterfallConfig};
pub use directory::{DirectoryMatch, DomainDirectory, MatchKind};
pub use domain::{
    apex_domain, literal_domain, pick_domain, DomainResolver, DomainSource, ResolvedDomain,
};

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheKey, CachedResolution, ResolutionCache};
use crate::email::{
    EmailMatch, EmailProvider, EmailProviderError, MissReason, RoleQuery, VerificationStatus,
};
use crate::metrics;
use crate::parser::{organization_from_snippet, ResultParser};
use crate::query::ProfileQueryBuilder;
use crate::rate_limiter::RateLimiterPool;
use crate::searcher::{paced_search, Searcher};

/// Most addresses returned by a bulk or role lookup.
pub const MAX_BULK_RESULTS: usize = 20;

/// Hits inspected when recovering a person from a profile URL.
const PROFILE_SEARCH_RESULTS: u32 = 3;

/// Lookup mode of a waterfall run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupMode {
    Person,
    Company,
    Role,
    Profile,
}

impl LookupMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LookupMode::Person => "person",
            LookupMode::Company => "company",
            LookupMode::Role => "role",
            LookupMode::Profile => "profile",
        }
    }
}

/// One step of a waterfall run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attempt {
    /// `cache`, a provider name, or the search backend name.
    pub source: String,
    pub mode: LookupMode,
    /// `None` when this step produced the result.
    pub miss: Option<MissReason>,
    pub detail: String,
}

impl Attempt {
    fn hit(source: &str, mode: LookupMode, detail: String) -> Self {
        Self {
            source: source.to_string(),
            mode,
            miss: None,
            detail,
        }
    }

    fn missed(source: &str, mode: LookupMode, reason: MissReason, detail: String) -> Self {
        Self {
            source: source.to_string(),
            mode,
            miss: Some(reason),
            detail,
        }
    }
}

impl fmt::Display for Attempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.miss {
            None => write!(f, "{} ({}): {}", self.source, self.mode.as_str(), self.detail),
            Some(reason) => write!(
                f,
                "{} ({}): {}, {}",
                self.source,
                self.mode.as_str(),
                reason.as_str(),
                self.detail
            ),
        }
    }
}

/// Outcome of a single-person lookup.
///
/// Either carries an accepted address with its confidence, or no address
/// and zero confidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersonResolution {
    pub email: Option<String>,
    pub confidence: f64,
    pub provider: Option<String>,
    pub from_cache: bool,
    pub attempts: Vec<Attempt>,
}

impl PersonResolution {
    fn unresolved(attempts: Vec<Attempt>) -> Self {
        Self {
            email: None,
            confidence: 0.0,
            provider: None,
            from_cache: false,
            attempts,
        }
    }

    fn from_cached(cached: CachedResolution) -> Self {
        let detail = match &cached.email {
            Some(email) => format!("{} cached at {}", email, cached.cached_at.to_rfc3339()),
            None => format!(
                "miss cached at {}: {}",
                cached.cached_at.to_rfc3339(),
                cached.error.as_deref().unwrap_or("unresolved")
            ),
        };
        Self {
            attempts: vec![Attempt::hit("cache", LookupMode::Person, detail)],
            confidence: if cached.email.is_some() {
                cached.confidence
            } else {
                0.0
            },
            email: cached.email,
            provider: cached.provider,
            from_cache: true,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.email.is_some()
    }
}

/// Outcome of a bulk (organization) or role lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BulkResolution {
    /// The domain the providers were asked about.
    pub domain: String,
    /// Verified addresses only, at most [`MAX_BULK_RESULTS`].
    pub emails: Vec<EmailMatch>,
    pub provider: String,
    pub attempts: Vec<Attempt>,
}

/// Outcome of a reverse lookup from a profile URL.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileResolution {
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub organization: Option<String>,
    #[serde(flatten)]
    pub resolution: PersonResolution,
}

/// Errors from waterfall entry points.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no provider returned a verified address")]
    Exhausted { attempts: Vec<Attempt> },
}

/// The email resolution waterfall.
///
/// Dependencies are injected; a waterfall without providers answers every
/// person lookup as unresolved without touching the cache.
pub struct EmailWaterfall {
    cache: Arc<dyn ResolutionCache>,
    primary: Option<Arc<dyn EmailProvider>>,
    secondary: Option<Arc<dyn EmailProvider>>,
    searcher: Option<Arc<dyn Searcher>>,
    limiter: Arc<RateLimiterPool>,
    domains: DomainResolver,
    parser: ResultParser,
    queries: ProfileQueryBuilder,
    config: WaterfallConfig,
}

impl EmailWaterfall {
    pub fn new(cache: Arc<dyn ResolutionCache>, config: WaterfallConfig) -> Self {
        let domains = DomainResolver::new(DomainDirectory::with_entries(&config.directory))
            .with_call_timeout(Duration::from_secs(config.call_timeout_secs));
        Self {
            cache,
            primary: None,
            secondary: None,
            searcher: None,
            limiter: Arc::new(RateLimiterPool::empty()),
            domains,
            parser: ResultParser::new(),
            queries: ProfileQueryBuilder::new(),
            config,
        }
    }

    pub fn with_primary(mut self, provider: Arc<dyn EmailProvider>) -> Self {
        self.primary = Some(provider);
        self
    }

    pub fn with_secondary(mut self, provider: Arc<dyn EmailProvider>) -> Self {
        self.secondary = Some(provider);
        self
    }

    /// Search backend for domain discovery and profile lookups.
    pub fn with_searcher(mut self, searcher: Arc<dyn Searcher>) -> Self {
        self.domains = self.domains.with_searcher(searcher.clone());
        self.searcher = Some(searcher);
        self
    }

    /// How long a domain found by website search is reused.
    pub fn with_domain_ttl(mut self, ttl: Duration) -> Self {
        self.domains = self.domains.with_memo_ttl(ttl);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiterPool>) -> Self {
        self.domains = self.domains.with_rate_limiter(limiter.clone());
        self.limiter = limiter;
        self
    }

    pub fn config(&self) -> &WaterfallConfig {
        &self.config
    }

    /// Configured providers in waterfall order.
    pub fn provider_names(&self) -> Vec<String> {
        self.providers().map(|p| p.name().to_string()).collect()
    }

    fn providers(&self) -> impl Iterator<Item = &Arc<dyn EmailProvider>> {
        self.primary.iter().chain(self.secondary.iter())
    }

    fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.config.call_timeout_secs)
    }

    /// Resolve one person's address at an organization.
    pub async fn resolve_person(
        &self,
        full_name: &str,
        organization: &str,
    ) -> Result<PersonResolution, ResolveError> {
        let full_name = full_name.trim();
        let organization = organization.trim();
        if full_name.is_empty() {
            return Err(ResolveError::InvalidInput("full name is required".to_string()));
        }
        if organization.is_empty() {
            return Err(ResolveError::InvalidInput("organization is required".to_string()));
        }

        let key = CacheKey::new(full_name, organization);
        if let Some(cached) = self.cache.get(&key).await {
            metrics::CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
            debug!(key = %key, found = cached.is_found(), "Resolution cache hit");
            return Ok(PersonResolution::from_cached(cached));
        }
        metrics::CACHE_LOOKUPS.with_label_values(&["miss"]).inc();

        let mut attempts = Vec::new();
        let mut domain: Option<ResolvedDomain> = None;

        for provider in self.providers() {
            let target = if provider.requires_domain() {
                if domain.is_none() {
                    domain = Some(self.domains.resolve(organization).await);
                }
                domain
                    .as_ref()
                    .map_or(organization, |d| d.domain.as_str())
                    .to_string()
            } else {
                organization.to_string()
            };

            let result = self
                .call(
                    provider.as_ref(),
                    LookupMode::Person,
                    provider.find_person(full_name, &target),
                )
                .await;

            match self.accept(result) {
                Ok(found) => {
                    let attempt = self.record_hit(
                        provider.name(),
                        LookupMode::Person,
                        format!("found {} ({:.2})", found.email, found.confidence),
                    );
                    attempts.push(attempt);

                    self.cache
                        .set(
                            key,
                            CachedResolution::found(&found.email, found.confidence, provider.name()),
                        )
                        .await;
                    info!(
                        person = full_name,
                        organization,
                        provider = provider.name(),
                        confidence = found.confidence,
                        "Email resolved"
                    );
                    return Ok(PersonResolution {
                        email: Some(found.email),
                        confidence: found.confidence,
                        provider: Some(provider.name().to_string()),
                        from_cache: false,
                        attempts,
                    });
                }
                Err(e) => {
                    attempts.push(self.record_miss(provider.name(), LookupMode::Person, &e));
                }
            }
        }

        // Only remember misses that cost a provider call.
        if let Some(last) = attempts.last() {
            self.cache
                .set(key, CachedResolution::missed(last.detail.clone()))
                .await;
        }
        debug!(person = full_name, organization, "Email unresolved");
        Ok(PersonResolution::unresolved(attempts))
    }

    /// Verified addresses at an organization.
    pub async fn resolve_company(&self, organization: &str) -> Result<BulkResolution, ResolveError> {
        self.resolve_bulk(organization, None).await
    }

    /// Verified addresses of people in a role or decision-maker category.
    pub async fn resolve_role(
        &self,
        organization: &str,
        role: &str,
    ) -> Result<BulkResolution, ResolveError> {
        let role = role.trim();
        if role.is_empty() {
            return Err(ResolveError::InvalidInput("role is required".to_string()));
        }
        self.resolve_bulk(organization, Some(&RoleQuery::new(role)))
            .await
    }

    async fn resolve_bulk(
        &self,
        organization: &str,
        role: Option<&RoleQuery>,
    ) -> Result<BulkResolution, ResolveError> {
        let organization = organization.trim();
        if organization.is_empty() {
            return Err(ResolveError::InvalidInput(
                "company or domain is required".to_string(),
            ));
        }
        let mode = if role.is_some() {
            LookupMode::Role
        } else {
            LookupMode::Company
        };

        let domain = self.domains.resolve(organization).await.domain;
        let mut attempts = Vec::new();

        for provider in self.providers() {
            let result = match role {
                Some(query) => {
                    self.call(provider.as_ref(), mode, provider.find_by_role(&domain, query))
                        .await
                }
                None => {
                    self.call(provider.as_ref(), mode, provider.find_at_organization(&domain))
                        .await
                }
            };

            match result.and_then(verified_only) {
                Ok(emails) => {
                    attempts.push(self.record_hit(
                        provider.name(),
                        mode,
                        format!("{} verified addresses at {}", emails.len(), domain),
                    ));
                    return Ok(BulkResolution {
                        domain,
                        emails,
                        provider: provider.name().to_string(),
                        attempts,
                    });
                }
                Err(e) => attempts.push(self.record_miss(provider.name(), mode, &e)),
            }
        }

        Err(ResolveError::Exhausted { attempts })
    }

    /// Reverse lookup from a public profile URL.
    ///
    /// Tries the primary provider's profile endpoint, then recovers the
    /// person from the profile's search listing and runs the person
    /// waterfall for them.
    pub async fn resolve_profile(&self, profile_url: &str) -> Result<ProfileResolution, ResolveError> {
        let profile_url = profile_url.trim();
        if profile_url.is_empty() {
            return Err(ResolveError::InvalidInput("profile URL is required".to_string()));
        }

        let mut attempts = Vec::new();

        if let Some(primary) = &self.primary {
            let result = self
                .call(
                    primary.as_ref(),
                    LookupMode::Profile,
                    primary.find_by_profile(profile_url),
                )
                .await;
            match self.accept(result) {
                Ok(found) => {
                    attempts.push(self.record_hit(
                        primary.name(),
                        LookupMode::Profile,
                        format!("found {} ({:.2})", found.email, found.confidence),
                    ));
                    return Ok(ProfileResolution {
                        full_name: found.full_name,
                        role: found.role,
                        organization: found.organization,
                        resolution: PersonResolution {
                            email: Some(found.email),
                            confidence: found.confidence,
                            provider: Some(primary.name().to_string()),
                            from_cache: false,
                            attempts,
                        },
                    });
                }
                Err(e) => attempts.push(self.record_miss(primary.name(), LookupMode::Profile, &e)),
            }
        }

        let Some(searcher) = &self.searcher else {
            attempts.push(Attempt::missed(
                "search",
                LookupMode::Profile,
                MissReason::ProviderUnavailable,
                "no search backend configured".to_string(),
            ));
            return Ok(unresolved_profile(attempts));
        };

        let query = self.queries.profile_lookup(profile_url);
        let hits = match paced_search(
            searcher.as_ref(),
            &self.limiter,
            &query,
            PROFILE_SEARCH_RESULTS,
            self.call_timeout(),
        )
        .await
        {
            Ok(hits) => hits,
            Err(e) => {
                warn!(profile_url, error = %e, "Profile search failed");
                attempts.push(Attempt::missed(
                    searcher.name(),
                    LookupMode::Profile,
                    MissReason::ProviderUnavailable,
                    e.to_string(),
                ));
                return Ok(unresolved_profile(attempts));
            }
        };

        let person = hits.iter().find_map(|hit| {
            let parts = self.parser.parse_title(&hit.title)?;
            if parts.name.is_empty() {
                return None;
            }
            let organization = parts
                .organization
                .or_else(|| organization_from_snippet(&hit.snippet))?;
            Some((parts.name, parts.role, organization))
        });

        let Some((name, role, organization)) = person else {
            attempts.push(Attempt::missed(
                searcher.name(),
                LookupMode::Profile,
                MissReason::NoMatch,
                "no result named a person and organization".to_string(),
            ));
            return Ok(unresolved_profile(attempts));
        };

        attempts.push(Attempt::hit(
            searcher.name(),
            LookupMode::Profile,
            format!("profile belongs to {} at {}", name, organization),
        ));

        let mut resolution = self.resolve_person(&name, &organization).await?;
        attempts.append(&mut resolution.attempts);
        resolution.attempts = attempts;

        Ok(ProfileResolution {
            full_name: Some(name),
            role: Some(role).filter(|r| !r.is_empty()),
            organization: Some(organization),
            resolution,
        })
    }

    /// Pace and time-bound one provider call.
    async fn call<T, F>(
        &self,
        provider: &dyn EmailProvider,
        mode: LookupMode,
        request: F,
    ) -> Result<T, EmailProviderError>
    where
        F: Future<Output = Result<T, EmailProviderError>>,
    {
        self.limiter.acquire(provider.name()).await;

        debug!(provider = provider.name(), mode = mode.as_str(), "Calling email provider");
        let start = Instant::now();
        let result = match tokio::time::timeout(self.call_timeout(), request).await {
            Ok(result) => result,
            Err(_) => Err(EmailProviderError::Timeout),
        };
        metrics::PROVIDER_LATENCY
            .with_label_values(&[provider.name()])
            .observe(start.elapsed().as_secs_f64());

        result
    }

    /// Single-address acceptance: not flagged, and confident enough.
    fn accept(
        &self,
        result: Result<EmailMatch, EmailProviderError>,
    ) -> Result<EmailMatch, EmailProviderError> {
        let found = result?;
        if found.status == VerificationStatus::NotFound {
            return Err(EmailProviderError::NotFound);
        }
        if found.status.is_rejected() {
            return Err(EmailProviderError::Rejected {
                status: found.status,
            });
        }
        if found.confidence < self.config.confidence_threshold {
            return Err(EmailProviderError::LowConfidence(found.confidence));
        }
        Ok(found)
    }

    fn record_hit(&self, provider: &str, mode: LookupMode, detail: String) -> Attempt {
        metrics::PROVIDER_ATTEMPTS
            .with_label_values(&[provider, mode.as_str(), "success"])
            .inc();
        Attempt::hit(provider, mode, detail)
    }

    fn record_miss(&self, provider: &str, mode: LookupMode, error: &EmailProviderError) -> Attempt {
        let reason = error.miss_reason();
        metrics::PROVIDER_ATTEMPTS
            .with_label_values(&[provider, mode.as_str(), reason.as_str()])
            .inc();

        match reason {
            MissReason::ProviderUnavailable => {
                warn!(provider, mode = mode.as_str(), error = %error, "Email provider unavailable")
            }
            _ => debug!(
                provider,
                mode = mode.as_str(),
                reason = reason.as_str(),
                error = %error,
                "Email provider missed"
            ),
        }

        Attempt::missed(provider, mode, reason, error.to_string())
    }
}

fn unresolved_profile(attempts: Vec<Attempt>) -> ProfileResolution {
    ProfileResolution {
        full_name: None,
        role: None,
        organization: None,
        resolution: PersonResolution::unresolved(attempts),
    }
}

/// Keep positively verified, distinct addresses, capped at
/// [`MAX_BULK_RESULTS`].
fn verified_only(emails: Vec<EmailMatch>) -> Result<Vec<EmailMatch>, EmailProviderError> {
    let returned = emails.len();
    let mut kept: Vec<EmailMatch> = Vec::new();
    for found in emails {
        if found.status != VerificationStatus::Verified
            || kept.iter().any(|k| k.email == found.email)
        {
            continue;
        }
        kept.push(found);
        if kept.len() == MAX_BULK_RESULTS {
            break;
        }
    }

    if !kept.is_empty() {
        Ok(kept)
    } else if returned > 0 {
        Err(EmailProviderError::Rejected {
            status: VerificationStatus::Unverified,
        })
    } else {
        Err(EmailProviderError::NotFound)
    }
}
