//! Organization to apex-domain resolution.
//!
//! Order: literal domain, curated directory, then a website search scored
//! by hostname. When everything fails the organization string itself is
//! handed to the provider.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};
use tracing::{debug, warn};
use url::{Host, Url};

use super::directory::{DomainDirectory, MatchKind};
use crate::query::{normalize_organization, ProfileQueryBuilder};
use crate::rate_limiter::RateLimiterPool;
use crate::searcher::{paced_search, SearchHit, Searcher};

/// Aggregator, social and directory hosts never taken as an organization's
/// own site.
const EXCLUDED_HOSTS: &[&str] = &[
    "linkedin.com",
    "google.com",
    "facebook.com",
    "twitter.com",
    "x.com",
    "instagram.com",
    "youtube.com",
    "wikipedia.org",
    "crunchbase.com",
    "bloomberg.com",
    "glassdoor.com",
    "indeed.com",
    "zoominfo.com",
    "dnb.com",
    "yelp.com",
];

/// Public suffixes with a second level, where the apex keeps three labels.
const SECOND_LEVEL_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "ltd.uk", "plc.uk", "com.au", "net.au", "org.au",
    "co.nz", "co.jp", "co.za", "co.in", "com.br", "com.sg", "com.hk", "com.cn", "com.mx",
];

/// Hits requested for a website search.
const WEBSITE_SEARCH_RESULTS: u32 = 5;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(10);

/// Same freshness window as the resolution cache default.
const DEFAULT_MEMO_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Where a resolved domain came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainSource {
    /// The input already was a domain or URL.
    Literal,
    Directory(MatchKind),
    Search,
    /// Nothing matched; `domain` holds the organization string as given.
    Unresolved,
}

/// Result of resolving an organization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDomain {
    pub domain: String,
    pub source: DomainSource,
}

impl ResolvedDomain {
    pub fn is_resolved(&self) -> bool {
        self.source != DomainSource::Unresolved
    }
}

struct MemoEntry {
    domain: String,
    stored_at: Instant,
}

/// Resolves organization names to apex domains.
///
/// Domains found by website search are memoized for `memo_ttl` so a run
/// with many candidates at one organization pays for one search. Searches
/// that find nothing are not memoized.
pub struct DomainResolver {
    directory: DomainDirectory,
    searcher: Option<Arc<dyn Searcher>>,
    limiter: Arc<RateLimiterPool>,
    queries: ProfileQueryBuilder,
    call_timeout: Duration,
    memo_ttl: Duration,
    memo: RwLock<HashMap<String, MemoEntry>>,
}

impl DomainResolver {
    pub fn new(directory: DomainDirectory) -> Self {
        Self {
            directory,
            searcher: None,
            limiter: Arc::new(RateLimiterPool::empty()),
            queries: ProfileQueryBuilder::new(),
            call_timeout: DEFAULT_CALL_TIMEOUT,
            memo_ttl: DEFAULT_MEMO_TTL,
            memo: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_searcher(mut self, searcher: Arc<dyn Searcher>) -> Self {
        self.searcher = Some(searcher);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiterPool>) -> Self {
        self.limiter = limiter;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_memo_ttl(mut self, ttl: Duration) -> Self {
        self.memo_ttl = ttl;
        self
    }

    /// Number of memoized domains, expired ones included.
    pub async fn memo_len(&self) -> usize {
        self.memo.read().await.len()
    }

    pub async fn resolve(&self, organization: &str) -> ResolvedDomain {
        let organization = organization.trim();

        if let Some(domain) = literal_domain(organization) {
            return ResolvedDomain {
                domain,
                source: DomainSource::Literal,
            };
        }

        if let Some(found) = self.directory.lookup(organization) {
            debug!(organization, domain = %found.domain, kind = ?found.kind, "Directory match");
            return ResolvedDomain {
                domain: found.domain,
                source: DomainSource::Directory(found.kind),
            };
        }

        match self.search_domain(organization).await {
            Some(domain) => ResolvedDomain {
                domain,
                source: DomainSource::Search,
            },
            None => {
                debug!(organization, "Domain unresolved, using organization name");
                ResolvedDomain {
                    domain: organization.to_string(),
                    source: DomainSource::Unresolved,
                }
            }
        }
    }

    async fn search_domain(&self, organization: &str) -> Option<String> {
        let searcher = self.searcher.as_ref()?;
        let key = organization.to_lowercase();

        if let Some(known) = self
            .memo
            .read()
            .await
            .get(&key)
            .filter(|e| e.stored_at.elapsed() <= self.memo_ttl)
        {
            return Some(known.domain.clone());
        }

        let query = self.queries.official_website(organization);
        let hits = match paced_search(
            searcher.as_ref(),
            &self.limiter,
            &query,
            WEBSITE_SEARCH_RESULTS,
            self.call_timeout,
        )
        .await
        {
            Ok(hits) => hits,
            Err(e) => {
                // Not memoized: the next caller may get through.
                warn!(organization, error = %e, "Website search failed");
                return None;
            }
        };

        let best = pick_domain(&hits, organization);
        debug!(organization, domain = ?best, candidates = hits.len(), "Website search scored");
        if let Some(domain) = &best {
            let mut memo = self.memo.write().await;
            let ttl = self.memo_ttl;
            memo.retain(|_, e| e.stored_at.elapsed() <= ttl);
            memo.insert(
                key,
                MemoEntry {
                    domain: domain.clone(),
                    stored_at: Instant::now(),
                },
            );
        }
        best
    }
}

/// Pick the best-scoring hostname among website search hits.
///
/// Ties keep the earliest hit in ranking order; a candidate must score
/// above zero.
pub fn pick_domain(hits: &[SearchHit], organization: &str) -> Option<String> {
    let tokens = organization_tokens(organization);
    let mut best: Option<(u32, String)> = None;

    for hit in hits {
        let Some(host) = link_host(&hit.link) else {
            continue;
        };
        if is_excluded(&host) {
            continue;
        }
        let score = score_host(&host, &tokens);
        if score == 0 {
            continue;
        }
        if best.as_ref().map_or(true, |(top, _)| score > *top) {
            best = Some((score, apex_domain(&host)));
        }
    }

    best.map(|(_, domain)| domain)
}

/// +10 for a `.com` host, +5 per organization token found in it.
fn score_host(host: &str, tokens: &[String]) -> u32 {
    let mut score = 0;
    if host.ends_with(".com") {
        score += 10;
    }
    for token in tokens {
        if host.contains(token.as_str()) {
            score += 5;
        }
    }
    score
}

fn organization_tokens(organization: &str) -> Vec<String> {
    normalize_organization(organization)
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 2)
        .map(str::to_string)
        .collect()
}

fn is_excluded(host: &str) -> bool {
    EXCLUDED_HOSTS
        .iter()
        .any(|excluded| host == *excluded || host.ends_with(&format!(".{excluded}")))
}

fn link_host(link: &str) -> Option<String> {
    let url = Url::parse(link.trim()).ok()?;
    match url.host()? {
        Host::Domain(domain) => Some(domain.trim_end_matches('.').to_lowercase()),
        _ => None,
    }
}

/// Treat input containing a dot (and no spaces) as a domain or URL.
///
/// Scheme, credentials, port and path are dropped and the host reduced to
/// its apex.
pub fn literal_domain(input: &str) -> Option<String> {
    let input = input.trim();
    if !input.contains('.') || input.contains(char::is_whitespace) {
        return None;
    }
    let candidate = if input.contains("://") {
        input.to_string()
    } else {
        format!("http://{input}")
    };
    link_host(&candidate).map(|host| apex_domain(&host))
}

/// Reduce a hostname to its registrable root (`careers.acme.co.uk` becomes
/// `acme.co.uk`).
pub fn apex_domain(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_lowercase();
    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() <= 2 {
        return labels.join(".");
    }

    let last_two = labels[labels.len() - 2..].join(".");
    let keep = if SECOND_LEVEL_SUFFIXES.contains(&last_two.as_str()) {
        3
    } else {
        2
    };
    labels[labels.len() - keep..].join(".")
}
