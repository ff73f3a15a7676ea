//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, capture limit > 0)
//! - Check the bind address and log filter parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::AppConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("timeouts.request_secs must be greater than 0")]
    ZeroRequestTimeout,

    #[error("capture.max_body_bytes must be greater than 0")]
    ZeroCaptureLimit,

    #[error("logging.level '{0}' is not a valid filter")]
    LogLevel(String),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }
    if config.capture.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroCaptureLimit);
    }
    if EnvFilter::try_new(&config.logging.level).is_err() {
        errors.push(ValidationError::LogLevel(config.logging.level.clone()));
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
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&AppConfig::default()), Ok(()));
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.listener.bind_address = "localhost".into();
        config.timeouts.request_secs = 0;
        config.capture.max_body_bytes = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::BindAddress("localhost".into()),
                ValidationError::ZeroRequestTimeout,
                ValidationError::ZeroCaptureLimit,
            ]
        );
    }

    #[test]
    fn test_rejects_bad_log_level() {
        let mut config = AppConfig::default();
        config.logging.level = "request_logger=loud".into();
        assert_eq!(
            validate_config(&config),
            Err(vec![ValidationError::LogLevel("request_logger=loud".into())])
        );
    }
}
