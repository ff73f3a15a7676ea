//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Application identity.
    pub app: ApplicationConfig,

    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Log output settings.
    pub logging: LoggingConfig,

    /// Request/response body capture settings.
    pub capture: CaptureConfig,
}

/// Application identity reported at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub title: String,

    /// Debug mode: enables the `/fail` demonstration route.
    pub debug: bool,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            title: "request-logger".to_string(),
            debug: true,
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Line format for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Timestamp, level, target, file and line, then the message.
    Detailed,
    /// One JSON object per line.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (trace, debug, info, warn, error, or `EnvFilter` syntax).
    /// `RUST_LOG` takes precedence when set.
    pub level: String,

    pub format: LogFormat,

    /// ANSI colors in detailed output.
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Detailed,
            ansi: false,
        }
    }
}

/// Body capture configuration for the request logger.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Copy the request body as the handler reads it.
    pub request_body: bool,

    /// Copy the response body as it streams to the client.
    pub response_body: bool,

    /// Upper bound on each copy, in bytes. Delivery is never limited.
    pub max_body_bytes: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            request_body: true,
            response_body: true,
            max_body_bytes: 64 * 1024, // 64KB
        }
    }
}
