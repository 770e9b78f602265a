use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - TMDB and AllDebrid keys are present
/// - The default output cap is positive
/// - No default preference list is empty
/// - Quota thresholds are coherent when the quota manager is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.tmdb.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "tmdb.api_key cannot be empty".to_string(),
        ));
    }

    if config.alldebrid.api_key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "alldebrid.api_key cannot be empty".to_string(),
        ));
    }

    if config.defaults.output_cap == 0 {
        return Err(ConfigError::ValidationError(
            "defaults.output_cap must be at least 1".to_string(),
        ));
    }

    for (name, list) in [
        ("resolutions", &config.defaults.resolutions),
        ("languages", &config.defaults.languages),
        ("codecs", &config.defaults.codecs),
    ] {
        if list.is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "defaults.{} cannot be empty",
                name
            )));
        }
    }

    if config.quota.enabled {
        if config.quota.delete_count == 0 {
            return Err(ConfigError::ValidationError(
                "quota.delete_count must be at least 1".to_string(),
            ));
        }
        if config.quota.delete_count > config.quota.max_magnets {
            return Err(ConfigError::ValidationError(format!(
                "quota.delete_count ({}) cannot exceed quota.max_magnets ({})",
                config.quota.delete_count, config.quota.max_magnets
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn base_config() -> Config {
        load_config_from_str(
            r#"
[tmdb]
api_key = "tmdb-key"

[alldebrid]
api_key = "ad-key"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = base_config();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_blank_debrid_key_fails() {
        let mut config = base_config();
        config.alldebrid.api_key = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_output_cap_fails() {
        let mut config = base_config();
        config.defaults.output_cap = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_empty_default_list_fails() {
        let mut config = base_config();
        config.defaults.codecs.clear();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("defaults.codecs"));
    }

    #[test]
    fn test_validate_quota_delete_count() {
        let mut config = base_config();
        config.quota.delete_count = 0;
        assert!(validate_config(&config).is_err());

        config.quota.delete_count = config.quota.max_magnets + 1;
        assert!(validate_config(&config).is_err());

        config.quota.enabled = false;
        assert!(validate_config(&config).is_ok());
    }
}
