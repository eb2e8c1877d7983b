//! Structured logging with an explicit dispatch.

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use tracing::instrument::{Instrument, WithSubscriber};
use tracing::{Dispatch, Span};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;

/// Environment variable overriding the configured filter.
pub const LOG_ENV_VAR: &str = "CART_LOG";

/// Log level for structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Filter directive for this level.
    pub fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_directive().to_uppercase())
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (for production/log aggregation).
    Json,
    /// Human-readable format (for development).
    #[default]
    Human,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum level when no filter is given.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Full `EnvFilter` directive, e.g. `"cart_cache=debug,info"`.
    pub filter: Option<String>,
    /// Colorize human output.
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Human,
            filter: None,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Directive used when `CART_LOG` is not set.
    pub fn directive(&self) -> String {
        self.filter
            .clone()
            .unwrap_or_else(|| self.level.as_directive().to_string())
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new(self.directive()))
    }
}

/// An owned logging pipeline.
///
/// Built once at startup and handed out as [`Logger`]s.
#[derive(Debug, Clone)]
pub struct Telemetry {
    dispatch: Dispatch,
}

impl Telemetry {
    /// Build a pipeline writing to stderr.
    pub fn new(config: &LogConfig) -> Self {
        Self::with_writer(config, std::io::stderr)
    }

    /// Build a pipeline writing to `make_writer`.
    pub fn with_writer<W>(config: &LogConfig, make_writer: W) -> Self
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let registry = tracing_subscriber::registry().with(config.env_filter());
        let dispatch = match config.format {
            LogFormat::Json => Dispatch::new(
                registry.with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_current_span(true)
                        .with_writer(make_writer),
                ),
            ),
            LogFormat::Human => Dispatch::new(
                registry.with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(config.ansi)
                        .with_writer(make_writer),
                ),
            ),
        };
        Self { dispatch }
    }

    /// A pipeline that drops everything.
    pub fn disabled() -> Self {
        Self {
            dispatch: Dispatch::none(),
        }
    }

    /// Logger for a named component.
    pub fn logger(&self, component: &'static str) -> Logger {
        Logger {
            dispatch: self.dispatch.clone(),
            component,
        }
    }

    /// Underlying dispatch.
    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }
}

/// Per-component logging handle.
///
/// Cheap to clone. Operations run through [`Logger::scope`] log into this
/// logger's dispatch inside a span carrying `component` and `action`.
#[derive(Debug, Clone)]
pub struct Logger {
    dispatch: Dispatch,
    component: &'static str,
}

impl Logger {
    /// A logger that drops everything.
    pub fn disabled() -> Self {
        Telemetry::disabled().logger("disabled")
    }

    /// Component name.
    pub fn component(&self) -> &'static str {
        self.component
    }

    /// Same sink, different component name.
    pub fn child(&self, component: &'static str) -> Logger {
        Logger {
            dispatch: self.dispatch.clone(),
            component,
        }
    }

    /// Run a synchronous closure with this logger's dispatch as default.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Span for one operation of this component.
    pub fn span(&self, action: &'static str) -> Span {
        self.in_scope(|| tracing::info_span!("cart", component = self.component, action))
    }

    /// Drive `fut` inside this logger's dispatch and an `action` span.
    pub async fn scope<F>(&self, action: &'static str, fut: F) -> F::Output
    where
        F: Future,
    {
        let span = self.span(action);
        fut.instrument(span)
            .with_subscriber(self.dispatch.clone())
            .await
    }
}
