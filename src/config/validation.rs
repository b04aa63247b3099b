//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (deadlines > 0, addresses parseable)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// One semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn error(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate a configuration, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(error(
            "listener.bind_address",
            format!("{:?} is not a socket address", config.listener.bind_address),
        ));
    }
    if config.listener.max_connections == 0 {
        errors.push(error("listener.max_connections", "must be greater than 0"));
    }

    if !config.upstream.base_url.starts_with("http://")
        && !config.upstream.base_url.starts_with("https://")
    {
        errors.push(error(
            "upstream.base_url",
            "must start with http:// or https://",
        ));
    }

    if config.gate.topic_filter.is_empty() {
        errors.push(error("gate.topic_filter", "must not be empty"));
    }
    if config.gate.container.is_empty() {
        errors.push(error("gate.container", "must not be empty"));
    }
    if config.gate.deadline_secs == 0 {
        errors.push(error("gate.deadline_secs", "must be greater than 0"));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(error("timeouts.request_secs", "must be greater than 0"));
    }

    if let Some(addr) = &config.observability.metrics_bind_address {
        if addr.parse::<SocketAddr>().is_err() {
            errors.push(error(
                "observability.metrics_bind_address",
                format!("{addr:?} is not a socket address"),
            ));
        }
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

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GatewayConfig::default()).is_ok());
    }

    #[test]
    fn all_errors_are_collected() {
        let mut config = GatewayConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.upstream.base_url = "ftp://nope".into();
        config.gate.deadline_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "listener.bind_address",
                "upstream.base_url",
                "gate.deadline_secs"
            ]
        );
    }

    #[test]
    fn bad_metrics_address_is_rejected() {
        let mut config = GatewayConfig::default();
        config.observability.metrics_bind_address = Some("nope".into());
        assert!(validate_config(&config).is_err());
    }
}
