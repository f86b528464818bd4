pub mod cache;
pub mod config;
pub mod email;
pub mod metrics;
pub mod parser;
pub mod pipeline;
pub mod query;
pub mod rate_limiter;
pub mod searcher;
pub mod targeting;
pub mod testing;
pub mod waterfall;

pub use cache::{CacheConfig, CacheKey, CachedResolution, MemoryResolutionCache, ResolutionCache};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use email::{
    AnymailProvider, EmailMatch, EmailProvider, EmailProviderError, HunterProvider, MissReason,
    VerificationStatus,
};
pub use pipeline::{
    DiscoveryReport, OrganizationTarget, Pipeline, PipelineError, ResolvedContact,
};
pub use rate_limiter::{ProviderRateLimit, RateLimiterPool};
pub use searcher::{SearchError, SearchHit, SerpApiSearcher, Searcher};
pub use targeting::{HeadcountBand, TargetingPolicy};
pub use waterfall::{EmailWaterfall, ResolveError};
