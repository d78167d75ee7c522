//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if !self.local.enabled && !self.mymemory.enabled && !self.google.enabled {
            return Err(ConfigError::ValidationError(
                "at least one translation provider must be enabled".into(),
            ));
        }
        if self.local.max_new_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "local.max_new_tokens must be > 0".into(),
            ));
        }
        if !self.local.repo_template.contains("{lang}") {
            return Err(ConfigError::ValidationError(
                "local.repo_template must contain {lang}".into(),
            ));
        }
        if self.mymemory.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "mymemory.timeout_ms must be > 0".into(),
            ));
        }
        if self.google.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "google.timeout_ms must be > 0".into(),
            ));
        }
        if self.caption.timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "caption.timeout_ms must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_chain() {
        let mut config = Config::default();
        config.local.enabled = false;
        config.mymemory.enabled = false;
        config.google.enabled = false;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("at least one"));
    }

    #[test]
    fn test_validate_rejects_zero_max_tokens() {
        let mut config = Config::default();
        config.local.max_new_tokens = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_new_tokens"));
    }

    #[test]
    fn test_validate_rejects_template_without_placeholder() {
        let mut config = Config::default();
        config.local.repo_template = "Xenova/opus-mt-en-fr".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("repo_template"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = Config::default();
        config.mymemory.timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("mymemory.timeout_ms"));
    }
}
