//! # Logging
//!
//! Installs the global `tracing` subscriber for a mirror run. Output goes to
//! stderr so stdout stays free for the event stream and the run summary.
//!
//! Workspace crates log at the configured level; HTTP and TLS dependencies
//! are held at `warn` unless a custom filter overrides everything.
//!
//! ```ignore
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use bridge_traits::time::LogLevel;
//!
//! init_logging(
//!     LoggingConfig::default()
//!         .with_format(LogFormat::Json)
//!         .with_level(LogLevel::Debug),
//! )?;
//! tracing::info!("Mirror starting");
//! ```

use crate::error::{Error, Result};

use bridge_traits::time::LogLevel;

use std::io;

use tracing_subscriber::{
    filter::EnvFilter,
    fmt::format::FmtSpan,
    layer::{Layered, SubscriberExt},
    util::SubscriberInitExt,
    Layer, Registry,
};

/// Workspace crates that log at the configured level by default.
const WORKSPACE_TARGETS: &[&str] = &[
    "drive_mirror",
    "core_runtime",
    "core_auth",
    "core_sync",
    "core_service",
    "provider_google_drive",
    "bridge_desktop",
];

/// Noisy dependencies kept quiet unless asked for.
const DEPENDENCY_DIRECTIVES: &[&str] = &["h2=warn", "hyper=warn", "reqwest=warn", "rustls=warn"];

/// Field names whose values never reach the log.
const SENSITIVE_FIELDS: &[&str] = &[
    "token",
    "secret",
    "password",
    "client_id",
    "authorization",
    "api_key",
];

const REDACTED: &str = "[REDACTED]";

type FilteredRegistry = Layered<EnvFilter, Registry>;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human-readable
    Pretty,
    /// One JSON object per line
    Json,
    /// Single-line, human-readable
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Compact
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(Error::Config(format!("Unknown log format: {}", other))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level for workspace crates
    pub level: LogLevel,
    /// Full filter directive string; replaces the level-based default
    pub filter: Option<String>,
    /// Log span enter/exit
    pub enable_spans: bool,
    pub display_target: bool,
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            filter: None,
            enable_spans: false,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    /// e.g. `"core_sync=trace,provider_google_drive=debug"`
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns `Error::Config` when the filter does not parse or a global
/// subscriber is already installed.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer(&config))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = match &config.filter {
        Some(custom) => custom.clone(),
        None => WORKSPACE_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, config.level.as_str()))
            .chain(DEPENDENCY_DIRECTIVES.iter().map(|d| d.to_string()))
            .collect::<Vec<_>>()
            .join(","),
    };

    EnvFilter::try_new(directives).map_err(|e| Error::Config(format!("Invalid log filter: {}", e)))
}

fn fmt_layer(config: &LoggingConfig) -> Box<dyn Layer<FilteredRegistry> + Send + Sync> {
    let span_events = if config.enable_spans {
        FmtSpan::ACTIVE
    } else {
        FmtSpan::NONE
    };
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(config.display_target)
        .with_thread_ids(config.display_thread_info)
        .with_thread_names(config.display_thread_info)
        .with_span_events(span_events);

    match config.format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
        LogFormat::Json => layer
            .json()
            .flatten_event(true)
            .with_current_span(config.enable_spans)
            .with_span_list(config.enable_spans)
            .boxed(),
    }
}

/// Mask a value before logging it under `field_name`.
///
/// Values of credential-like fields are replaced entirely; anything shaped
/// like an email address keeps only its first character.
///
/// ```ignore
/// info!(client_id = %redact_if_sensitive("client_id", &account.client_id), "Loaded account");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    let field = field_name.to_ascii_lowercase();
    if SENSITIVE_FIELDS.iter().any(|s| field.contains(s)) {
        return REDACTED.to_string();
    }

    match value.split_once('@') {
        Some((local, domain)) if domain.contains('.') => {
            let first: String = local.chars().take(1).collect();
            format!("{}***@{}", first, REDACTED)
        }
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_config_builder() {
        let config = LoggingConfig::default()
            .with_format(LogFormat::Json)
            .with_level(LogLevel::Debug)
            .with_filter("core_sync=trace")
            .with_spans(true)
            .with_target(false)
            .with_thread_info(true);

        assert_eq!(config.format, LogFormat::Json);
        assert_eq!(config.level, LogLevel::Debug);
        assert_eq!(config.filter.as_deref(), Some("core_sync=trace"));
        assert!(config.enable_spans);
        assert!(!config.display_target);
        assert!(config.display_thread_info);
    }

    #[test]
    fn test_log_format_from_str() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_credential_fields_are_redacted() {
        assert_eq!(redact_if_sensitive("access_token", "ya29.abc"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("refresh_token", "1//0g"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("client_secret", "abc"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("Client_ID", "123.apps"), "[REDACTED]");
        assert_eq!(redact_if_sensitive("collection", "Reports"), "Reports");
    }

    #[test]
    fn test_email_keeps_first_character() {
        assert_eq!(
            redact_if_sensitive("owner", "user@example.com"),
            "u***@[REDACTED]"
        );
        assert_eq!(
            redact_if_sensitive("owner", "élodie@example.com"),
            "é***@[REDACTED]"
        );
        assert_eq!(redact_if_sensitive("owner", "@example.com"), "***@[REDACTED]");
        assert_eq!(redact_if_sensitive("title", "notes@home"), "notes@home");
    }

    #[test]
    fn test_default_format() {
        if cfg!(debug_assertions) {
            assert_eq!(LogFormat::default(), LogFormat::Pretty);
        } else {
            assert_eq!(LogFormat::default(), LogFormat::Compact);
        }
    }

    #[test]
    fn test_build_filter() {
        let config = LoggingConfig::default().with_level(LogLevel::Debug);
        let rendered = build_filter(&config).unwrap().to_string();
        assert!(rendered.contains("core_sync=debug"));
        assert!(rendered.contains("reqwest=warn"));
    }

    #[test]
    fn test_custom_filter_replaces_default() {
        let config = LoggingConfig::default().with_filter("core_auth=trace");
        let rendered = build_filter(&config).unwrap().to_string();
        assert!(rendered.contains("core_auth=trace"));
        assert!(!rendered.contains("reqwest=warn"));
    }

    #[test]
    fn test_invalid_filter_is_config_error() {
        let config = LoggingConfig::default().with_filter("core_sync=loud");
        assert!(matches!(build_filter(&config), Err(Error::Config(_))));
    }
}
