//! Tracing subscriber initialization with configurable logging formats.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LogLevel, LoggingConfig};

/// Initialize the global tracing subscriber.
///
/// Events are written to stderr so stdout carries only listings.
pub fn init_tracing(logging: &LoggingConfig) -> Result<(), TracingError> {
    let filter = build_env_filter(logging);

    let result = match (logging.format, logging.timestamps) {
        (LogFormat::Pretty, true) => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(logging.file_line)
                .with_line_number(logging.file_line);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        (LogFormat::Pretty, false) => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .pretty()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(logging.file_line)
                .with_line_number(logging.file_line)
                .without_time();
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        (LogFormat::Compact, true) => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(logging.file_line)
                .with_line_number(logging.file_line);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        (LogFormat::Compact, false) => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(logging.file_line)
                .with_line_number(logging.file_line)
                .without_time();
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        (LogFormat::Json, true) => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_file(logging.file_line)
                .with_line_number(logging.file_line)
                .with_current_span(true);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
        (LogFormat::Json, false) => {
            let fmt_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_file(logging.file_line)
                .with_line_number(logging.file_line)
                .with_current_span(true)
                .without_time();
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .try_init()
        }
    };

    result.map_err(|e| TracingError::Init(e.to_string()))
}

fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    let directives = filter_directives(config, std::env::var("RUST_LOG").ok());
    EnvFilter::try_new(&directives)
        .unwrap_or_else(|_| EnvFilter::new(level_directive(config.level)))
}

/// `RUST_LOG` wins, then the configured filter on top of the base level,
/// then the base level alone.
fn filter_directives(config: &LoggingConfig, rust_log: Option<String>) -> String {
    let base_level = level_directive(config.level);
    match (rust_log, &config.filter) {
        (Some(env_filter), _) => env_filter,
        (None, Some(filter)) => format!("{base_level},{filter}"),
        (None, None) => base_level,
    }
}

fn level_directive(level: LogLevel) -> String {
    level.to_tracing_level().as_str().to_ascii_lowercase()
}

/// Tracing initialization errors.
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    #[error("Failed to initialize tracing: {0}")]
    Init(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_warn() {
        assert_eq!(filter_directives(&LoggingConfig::default(), None), "warn");
    }

    #[test]
    fn test_level_directive_is_lowercase() {
        assert_eq!(level_directive(LogLevel::Trace), "trace");
        assert_eq!(level_directive(LogLevel::Error), "error");
    }

    #[test]
    fn test_config_filter_extends_level() {
        let config = LoggingConfig {
            level: LogLevel::Info,
            filter: Some("prunedir=trace".into()),
            ..Default::default()
        };
        assert_eq!(filter_directives(&config, None), "info,prunedir=trace");
    }

    #[test]
    fn test_rust_log_wins() {
        let config = LoggingConfig {
            filter: Some("prunedir=trace".into()),
            ..Default::default()
        };
        assert_eq!(
            filter_directives(&config, Some("prunedir=debug".into())),
            "prunedir=debug"
        );
    }
}
