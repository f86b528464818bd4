use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scout_core::{
    load_config, validate_config, AnymailProvider, Config, EmailProvider, EmailWaterfall,
    HunterProvider, MemoryResolutionCache, Pipeline, ProviderRateLimit, RateLimiterPool,
    Searcher, SerpApiSearcher, TargetingPolicy,
};
use scout_core::config::SearcherBackend;

use scout_server::api::create_router;
use scout_server::state::AppState;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("SCOUT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    // Fingerprint for the health endpoint, so deployments can tell configs apart
    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    let config_hash = config_hash[..16].to_string();
    info!(config_hash = %config_hash, "Configuration loaded successfully");

    // One bucket per external service, shared by every worker
    let limiter = Arc::new(RateLimiterPool::new(&rate_limits(&config)));

    let searcher = create_searcher(&config);

    // Email providers, in waterfall order
    let primary: Option<Arc<dyn EmailProvider>> = match &config.providers.anymail {
        Some(anymail_config) => {
            info!("Initializing Anymail Finder (primary) at {}", anymail_config.base_url);
            Some(Arc::new(
                AnymailProvider::new(anymail_config.clone())
                    .context("Failed to create Anymail Finder client")?,
            ))
        }
        None => None,
    };
    let secondary: Option<Arc<dyn EmailProvider>> = match &config.providers.hunter {
        Some(hunter_config) => {
            info!("Initializing Hunter (secondary) at {}", hunter_config.base_url);
            Some(Arc::new(
                HunterProvider::new(hunter_config.clone())
                    .context("Failed to create Hunter client")?,
            ))
        }
        None => None,
    };
    if primary.is_none() && secondary.is_none() {
        warn!("No email provider configured; email lookups are disabled");
    }

    let cache = Arc::new(MemoryResolutionCache::new(config.cache.clone()));
    info!(ttl_secs = config.cache.ttl_secs, "Resolution cache initialized");

    let mut waterfall = EmailWaterfall::new(cache, config.waterfall.clone())
        .with_domain_ttl(Duration::from_secs(config.cache.ttl_secs))
        .with_rate_limiter(Arc::clone(&limiter));
    if let Some(provider) = primary {
        waterfall = waterfall.with_primary(provider);
    }
    if let Some(provider) = secondary {
        waterfall = waterfall.with_secondary(provider);
    }
    if let Some(searcher) = &searcher {
        waterfall = waterfall.with_searcher(Arc::clone(searcher));
    }
    let waterfall = Arc::new(waterfall);

    // The pipeline needs a search backend; email lookups do not
    let pipeline = searcher.map(|searcher| {
        Arc::new(
            Pipeline::new(
                searcher,
                Arc::clone(&waterfall),
                TargetingPolicy::new(config.targeting.clone()),
                config.pipeline.clone(),
            )
            .with_rate_limiter(Arc::clone(&limiter)),
        )
    });
    if pipeline.is_none() {
        warn!("No searcher configured; pipeline runs are disabled");
    }

    // Create app state
    let state = Arc::new(AppState::new(
        config.clone(),
        config_hash,
        waterfall,
        pipeline,
    ));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Rate limits of every configured external service, keyed by client name.
fn rate_limits(config: &Config) -> Vec<ProviderRateLimit> {
    let mut limits = Vec::new();
    if let Some(serpapi) = config.searcher.as_ref().and_then(|s| s.serpapi.as_ref()) {
        limits.push(ProviderRateLimit {
            name: "serpapi".to_string(),
            rate_limit_rpm: serpapi.rate_limit_rpm,
        });
    }
    if let Some(anymail) = &config.providers.anymail {
        limits.push(ProviderRateLimit {
            name: "anymail".to_string(),
            rate_limit_rpm: anymail.rate_limit_rpm,
        });
    }
    if let Some(hunter) = &config.providers.hunter {
        limits.push(ProviderRateLimit {
            name: "hunter".to_string(),
            rate_limit_rpm: hunter.rate_limit_rpm,
        });
    }
    limits
}

/// Create the search backend if configured.
fn create_searcher(config: &Config) -> Option<Arc<dyn Searcher>> {
    let searcher_config = match &config.searcher {
        Some(c) => c,
        None => {
            info!("No searcher configured");
            return None;
        }
    };

    match searcher_config.backend {
        SearcherBackend::SerpApi => {
            let Some(serpapi_config) = &searcher_config.serpapi else {
                error!("SerpAPI backend selected but no serpapi config provided");
                return None;
            };
            info!("Initializing SerpAPI searcher (engine: {})", serpapi_config.engine);
            match SerpApiSearcher::new(serpapi_config.clone()) {
                Ok(searcher) => Some(Arc::new(searcher)),
                Err(e) => {
                    error!("Failed to initialize SerpAPI searcher: {}", e);
                    None
                }
            }
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
