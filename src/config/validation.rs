//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, interval > 0)
//! - Check addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AgentConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::AgentConfig;

/// A single semantic problem with a config.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed config.
pub fn validate_config(config: &AgentConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.account.name.trim().is_empty() {
        errors.push(ValidationError::new("account.name", "must not be empty"));
    }
    if config.account.region.trim().is_empty() {
        errors.push(ValidationError::new("account.region", "must not be empty"));
    }

    if config.snapshot.path.trim().is_empty() {
        errors.push(ValidationError::new("snapshot.path", "must not be empty"));
    }

    match url::Url::parse(&config.target_health.endpoint) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            "target_health.endpoint",
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(
            "target_health.endpoint",
            format!("invalid URL: {}", e),
        )),
    }
    if config.target_health.timeout_secs == 0 {
        errors.push(ValidationError::new("target_health.timeout_secs", "must be greater than 0"));
    }

    if config.resolver.max_concurrent_tasks == 0 {
        errors.push(ValidationError::new(
            "resolver.max_concurrent_tasks",
            "must be greater than 0",
        ));
    }

    if config.schedule.interval_secs == 0 {
        errors.push(ValidationError::new("schedule.interval_secs", "must be greater than 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("invalid socket address '{}'", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AgentConfig {
        let mut config = AgentConfig::default();
        config.account.name = "prod".into();
        config.account.region = "us-west-2".into();
        config
    }

    #[test]
    fn test_valid_config() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_default_config_needs_account() {
        let errors = validate_config(&AgentConfig::default()).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["account.name", "account.region"]);
    }

    #[test]
    fn test_endpoint_checks() {
        let mut config = valid();
        config.target_health.endpoint = "ftp://gateway/describe".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].field, "target_health.endpoint");
        assert!(errors[0].message.contains("ftp"));

        config.target_health.endpoint = "not a url".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = valid();
        config.observability.metrics_address = "nowhere".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors[0].to_string(), "observability.metrics_address: invalid socket address 'nowhere'");
    }

    #[test]
    fn test_zero_values_rejected() {
        let mut config = valid();
        config.target_health.timeout_secs = 0;
        config.resolver.max_concurrent_tasks = 0;
        config.schedule.interval_secs = 0;
        assert_eq!(validate_config(&config).unwrap_err().len(), 3);
    }
}
