//! Logging initialization and configuration.

use tracing::warn;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Log output shape. Deployments feed `Json` to log aggregation; `Pretty` is
/// for a local shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    /// Resolves the configured format string, ignoring case. `None` means
    /// the value names no known format.
    fn resolve(value: &str) -> Option<LogFormat> {
        match value.to_ascii_lowercase().as_str() {
            "json" => Some(LogFormat::Json),
            "pretty" => Some(LogFormat::Pretty),
            _ => None,
        }
    }
}

/// Initializes the logging subsystem based on configuration.
///
/// `RUST_LOG` wins over the configured level when set, so one-off debugging
/// does not require a config edit. An unrecognized format falls back to
/// pretty output and logs what it saw.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let format = LogFormat::resolve(&config.format);

    match format.unwrap_or(LogFormat::Pretty) {
        LogFormat::Json => {
            let json_layer = fmt::layer()
                .json()
                .with_span_events(FmtSpan::CLOSE)
                .with_current_span(true)
                .with_target(true);
            subscriber.with(json_layer).init();
        }
        LogFormat::Pretty => {
            let pretty_layer = fmt::layer()
                .pretty()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true);
            subscriber.with(pretty_layer).init();
        }
    }

    if format.is_none() {
        warn!(configured = %config.format, "Unrecognized log format, using pretty output");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_formats() {
        assert_eq!(LogFormat::resolve("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::resolve("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::resolve("JSON"), Some(LogFormat::Json));
    }

    #[test]
    fn test_resolve_unknown_format() {
        assert_eq!(LogFormat::resolve("yaml"), None);
        assert_eq!(LogFormat::resolve(""), None);
    }
}
