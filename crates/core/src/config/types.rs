use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};

use crate::cache::CacheConfig;
use crate::email::{AnymailConfig, HunterConfig};
use crate::pipeline::PipelineConfig;
use crate::targeting::TargetingConfig;
use crate::waterfall::WaterfallConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub searcher: Option<SearcherConfig>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub waterfall: WaterfallConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub targeting: TargetingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Searcher configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearcherConfig {
    /// Search backend type
    pub backend: SearcherBackend,
    /// SerpAPI-specific configuration (required when backend = "serpapi")
    #[serde(default)]
    pub serpapi: Option<SerpApiConfig>,
}

/// Available search backends
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SearcherBackend {
    #[serde(rename = "serpapi")]
    SerpApi,
}

/// SerpAPI search backend configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SerpApiConfig {
    /// SerpAPI key
    pub api_key: String,
    /// Base URL (default: https://serpapi.com)
    #[serde(default = "default_serpapi_url")]
    pub base_url: String,
    /// Search engine to query (default: google)
    #[serde(default = "default_engine")]
    pub engine: String,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
    /// Max requests per minute across all workers (default: 60)
    #[serde(default = "default_rate_limit")]
    pub rate_limit_rpm: u32,
}

fn default_serpapi_url() -> String {
    "https://serpapi.com".to_string()
}

fn default_engine() -> String {
    "google".to_string()
}

pub(crate) fn default_timeout() -> u32 {
    10
}

pub(crate) fn default_rate_limit() -> u32 {
    60
}

/// Email verification providers, in waterfall order.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProvidersConfig {
    /// Primary provider.
    #[serde(default)]
    pub anymail: Option<AnymailConfig>,
    /// Secondary provider.
    #[serde(default)]
    pub hunter: Option<HunterConfig>,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub searcher: Option<SanitizedSearcherConfig>,
    pub providers: SanitizedProvidersConfig,
    pub cache: CacheConfig,
    pub waterfall: SanitizedWaterfallConfig,
    pub pipeline: PipelineConfig,
    pub targeting: TargetingConfig,
}

/// Sanitized searcher config (API key redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedSearcherConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serpapi: Option<SanitizedProviderConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProvidersConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anymail: Option<SanitizedProviderConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hunter: Option<SanitizedProviderConfig>,
}

/// Any external service config with the API key hidden.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedProviderConfig {
    pub base_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
    pub rate_limit_rpm: u32,
}

/// Waterfall config with the directory overrides reduced to a count.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedWaterfallConfig {
    pub confidence_threshold: f64,
    pub call_timeout_secs: u64,
    pub directory_overrides: usize,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            searcher: config.searcher.as_ref().map(|s| SanitizedSearcherConfig {
                backend: match s.backend {
                    SearcherBackend::SerpApi => "serpapi".to_string(),
                },
                serpapi: s.serpapi.as_ref().map(|c| SanitizedProviderConfig {
                    base_url: c.base_url.clone(),
                    api_key_configured: !c.api_key.is_empty(),
                    timeout_secs: c.timeout_secs,
                    rate_limit_rpm: c.rate_limit_rpm,
                }),
            }),
            providers: SanitizedProvidersConfig {
                anymail: config.providers.anymail.as_ref().map(|c| SanitizedProviderConfig {
                    base_url: c.base_url.clone(),
                    api_key_configured: !c.api_key.is_empty(),
                    timeout_secs: c.timeout_secs,
                    rate_limit_rpm: c.rate_limit_rpm,
                }),
                hunter: config.providers.hunter.as_ref().map(|c| SanitizedProviderConfig {
                    base_url: c.base_url.clone(),
                    api_key_configured: !c.api_key.is_empty(),
                    timeout_secs: c.timeout_secs,
                    rate_limit_rpm: c.rate_limit_rpm,
                }),
            },
            cache: config.cache.clone(),
            waterfall: SanitizedWaterfallConfig {
                confidence_threshold: config.waterfall.confidence_threshold,
                call_timeout_secs: config.waterfall.call_timeout_secs,
                directory_overrides: config.waterfall.directory.len(),
            },
            pipeline: config.pipeline.clone(),
            targeting: config.targeting.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_with_default_server() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert!(config.providers.anymail.is_none());
        assert!(config.providers.hunter.is_none());
    }

    #[test]
    fn test_deserialize_with_searcher_config() {
        let toml = r#"
[searcher]
backend = "serpapi"

[searcher.serpapi]
api_key = "test-api-key"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let searcher = config.searcher.as_ref().unwrap();
        assert_eq!(searcher.backend, SearcherBackend::SerpApi);

        let serpapi = searcher.serpapi.as_ref().unwrap();
        assert_eq!(serpapi.api_key, "test-api-key");
        assert_eq!(serpapi.base_url, "https://serpapi.com");
        assert_eq!(serpapi.engine, "google");
        assert_eq!(serpapi.timeout_secs, 10);
        assert_eq!(serpapi.rate_limit_rpm, 60);
    }

    #[test]
    fn test_deserialize_with_providers() {
        let toml = r#"
[providers.anymail]
api_key = "anymail-key"
rate_limit_rpm = 30

[providers.hunter]
api_key = "hunter-key"
timeout_secs = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let anymail = config.providers.anymail.as_ref().unwrap();
        assert_eq!(anymail.api_key, "anymail-key");
        assert_eq!(anymail.rate_limit_rpm, 30);
        assert_eq!(anymail.base_url, "https://api.anymailfinder.com");

        let hunter = config.providers.hunter.as_ref().unwrap();
        assert_eq!(hunter.timeout_secs, 5);
        assert_eq!(hunter.base_url, "https://api.hunter.io");
    }

    #[test]
    fn test_sanitized_config_hides_keys() {
        let toml = r#"
[searcher]
backend = "serpapi"

[searcher.serpapi]
api_key = "secret-serp"

[providers.anymail]
api_key = "secret-anymail"

[providers.hunter]
api_key = ""
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);

        let searcher = sanitized.searcher.as_ref().unwrap();
        assert_eq!(searcher.backend, "serpapi");
        assert!(searcher.serpapi.as_ref().unwrap().api_key_configured);
        assert!(sanitized.providers.anymail.as_ref().unwrap().api_key_configured);
        assert!(!sanitized.providers.hunter.as_ref().unwrap().api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret-serp"));
        assert!(!json.contains("secret-anymail"));
    }
}
