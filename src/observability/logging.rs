//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the logging subsystem from `LoggingConfig`
//! - Select the line format (detailed or JSON)
//! - Provide scoped installation with teardown on drop
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - Console output goes to stderr
//! - Log level from config, overridden by `RUST_LOG`

use std::io;

use thiserror::Error;
use tracing::subscriber::DefaultGuard;
use tracing::Subscriber;
use tracing_subscriber::{
    filter::ParseError, fmt, fmt::MakeWriter, layer::SubscriberExt, EnvFilter,
};

use crate::config::{LogFormat, LoggingConfig};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] ParseError),

    #[error("a global logger is already installed")]
    AlreadyInitialized,
}

type BoxSubscriber = Box<dyn Subscriber + Send + Sync + 'static>;

/// Install the process-wide subscriber. Fails if one is already installed.
pub fn init(config: &LoggingConfig) -> Result<(), LoggingError> {
    let subscriber = build_subscriber(config, io::stderr)?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|_| LoggingError::AlreadyInitialized)
}

/// Install a subscriber for the current thread until the guard is dropped.
pub fn init_scoped(config: &LoggingConfig) -> Result<DefaultGuard, LoggingError> {
    let subscriber = build_subscriber(config, io::stderr)?;
    Ok(tracing::subscriber::set_default(subscriber))
}

fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&config.level)?),
    }
}

/// Build a subscriber for `config` writing to `writer`.
pub fn build_subscriber<W>(config: &LoggingConfig, writer: W) -> Result<BoxSubscriber, LoggingError>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(env_filter(config)?);

    let subscriber: BoxSubscriber = match config.format {
        LogFormat::Detailed => Box::new(
            registry.with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(config.ansi)
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            ),
        ),
        LogFormat::Json => Box::new(
            registry.with(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            ),
        ),
    };

    Ok(subscriber)
}
