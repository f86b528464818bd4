use super::{types::Config, ConfigError};

const MAX_TIMEOUT_SECS: u64 = 60;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Confidence threshold lies in [0, 1]
/// - Pipeline limits are non-zero
/// - External call timeouts are within 1..=60 seconds
/// - Targeting bands are well-formed and disjoint
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let threshold = config.waterfall.confidence_threshold;
    if !(0.0..=1.0).contains(&threshold) {
        return Err(ConfigError::ValidationError(format!(
            "waterfall.confidence_threshold must be between 0 and 1, got {}",
            threshold
        )));
    }
    check_timeout("waterfall.call_timeout_secs", config.waterfall.call_timeout_secs)?;

    for entry in &config.waterfall.directory {
        if entry.name.trim().is_empty() || entry.domain.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "waterfall.directory entries need a name and a domain".to_string(),
            ));
        }
    }

    if config.pipeline.max_per_organization == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.max_per_organization cannot be 0".to_string(),
        ));
    }
    if config.pipeline.results_per_query == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.results_per_query cannot be 0".to_string(),
        ));
    }
    if config.pipeline.concurrency == 0 {
        return Err(ConfigError::ValidationError(
            "pipeline.concurrency cannot be 0".to_string(),
        ));
    }

    if let Some(serpapi) = config.searcher.as_ref().and_then(|s| s.serpapi.as_ref()) {
        check_timeout("searcher.serpapi.timeout_secs", serpapi.timeout_secs as u64)?;
    }
    if let Some(anymail) = &config.providers.anymail {
        check_timeout("providers.anymail.timeout_secs", anymail.timeout_secs as u64)?;
    }
    if let Some(hunter) = &config.providers.hunter {
        check_timeout("providers.hunter.timeout_secs", hunter.timeout_secs as u64)?;
    }

    validate_bands(config)
}

fn check_timeout(field: &str, secs: u64) -> Result<(), ConfigError> {
    if secs == 0 || secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::ValidationError(format!(
            "{} must be between 1 and {}, got {}",
            field, MAX_TIMEOUT_SECS, secs
        )));
    }
    Ok(())
}

fn validate_bands(config: &Config) -> Result<(), ConfigError> {
    let bands = &config.targeting.bands;

    for band in bands {
        if band.label.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "targeting.bands entries need a label".to_string(),
            ));
        }
        if band.min > band.max {
            return Err(ConfigError::ValidationError(format!(
                "targeting band '{}' has min {} greater than max {}",
                band.label, band.min, band.max
            )));
        }
    }

    let mut sorted: Vec<_> = bands.iter().collect();
    sorted.sort_by_key(|b| b.min);
    for pair in sorted.windows(2) {
        if pair[1].min <= pair[0].max {
            return Err(ConfigError::ValidationError(format!(
                "targeting bands '{}' and '{}' overlap",
                pair[0].label, pair[1].label
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::email::HunterConfig;
    use crate::targeting::BandRule;
    use crate::waterfall::DirectoryEntry;
    use std::net::IpAddr;

    fn band(label: &str, min: u32, max: u32) -> BandRule {
        BandRule {
            label: label.to_string(),
            min,
            max,
            roles: vec!["CEO".to_string()],
        }
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let config = Config {
            server: ServerConfig {
                host: "0.0.0.0".parse::<IpAddr>().unwrap(),
                port: 0,
            },
            ..Default::default()
        };
        let result = validate_config(&config);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_threshold_out_of_range() {
        let mut config = Config::default();
        config.waterfall.confidence_threshold = 1.5;
        assert!(validate_config(&config).is_err());

        config.waterfall.confidence_threshold = -0.1;
        assert!(validate_config(&config).is_err());

        config.waterfall.confidence_threshold = 1.0;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_pipeline_limits() {
        let mut config = Config::default();
        config.pipeline.max_per_organization = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.pipeline.results_per_query = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.pipeline.concurrency = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_provider_timeout() {
        let mut config = Config::default();
        config.providers.hunter = Some(HunterConfig {
            api_key: "key".to_string(),
            base_url: "https://api.hunter.io".to_string(),
            timeout_secs: 120,
            rate_limit_rpm: 60,
        });
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("providers.hunter.timeout_secs"));

        let mut config = Config::default();
        config.waterfall.call_timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_directory_entry_needs_domain() {
        let mut config = Config::default();
        config.waterfall.directory.push(DirectoryEntry {
            name: "example bank".to_string(),
            domain: "  ".to_string(),
        });
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_band_min_greater_than_max() {
        let mut config = Config::default();
        config.targeting.bands = vec![band("broken", 100, 50)];
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn test_validate_overlapping_bands() {
        let mut config = Config::default();
        config.targeting.bands = vec![band("b", 40, 80), band("a", 10, 40)];
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("overlap"));

        config.targeting.bands = vec![band("b", 41, 80), band("a", 10, 40)];
        assert!(validate_config(&config).is_ok());
    }
}
