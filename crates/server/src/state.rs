use std::sync::Arc;
use scout_core::{Config, EmailWaterfall, Pipeline, SanitizedConfig, TargetingPolicy};

/// Shared application state
pub struct AppState {
    config: Config,
    config_hash: String,
    policy: TargetingPolicy,
    waterfall: Arc<EmailWaterfall>,
    pipeline: Option<Arc<Pipeline>>,
}

impl AppState {
    pub fn new(
        config: Config,
        config_hash: String,
        waterfall: Arc<EmailWaterfall>,
        pipeline: Option<Arc<Pipeline>>,
    ) -> Self {
        let policy = TargetingPolicy::new(config.targeting.clone());
        Self {
            config,
            config_hash,
            policy,
            waterfall,
            pipeline,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    /// Short fingerprint of the loaded configuration.
    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn policy(&self) -> &TargetingPolicy {
        &self.policy
    }

    /// The email waterfall, if at least one provider is configured.
    pub fn waterfall(&self) -> Option<&Arc<EmailWaterfall>> {
        if self.waterfall.provider_names().is_empty() {
            None
        } else {
            Some(&self.waterfall)
        }
    }

    /// The discovery pipeline; requires a search backend.
    pub fn pipeline(&self) -> Option<&Arc<Pipeline>> {
        self.pipeline.as_ref()
    }
}
