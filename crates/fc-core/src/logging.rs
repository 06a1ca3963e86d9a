//! Structured logging for the engine.
//!
//! Dual-mode output on stderr: human-readable console lines for
//! interactive use, JSONL for harness/CI consumption. Stdout stays free
//! for result payloads. Initialization is idempotent; the first caller
//! wins.

use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

static INITIALIZED: OnceLock<()> = OnceLock::new();

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Human,
    Jsonl,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Default filter directive when `FLUENTCHECK_LOG`/`RUST_LOG` are
    /// unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Human,
            level: "warn".to_string(),
        }
    }
}

impl LogConfig {
    /// Read format and level from `FLUENTCHECK_LOG` /
    /// `FLUENTCHECK_LOG_FORMAT`.
    pub fn from_env() -> Self {
        let format = match std::env::var("FLUENTCHECK_LOG_FORMAT").as_deref() {
            Ok("jsonl" | "json") => LogFormat::Jsonl,
            _ => LogFormat::Human,
        };
        let level = std::env::var("FLUENTCHECK_LOG").unwrap_or_else(|_| "warn".to_string());
        Self { format, level }
    }
}

/// Initialize the logging subsystem. Safe to call more than once; later
/// calls are no-ops.
pub fn init_logging(config: &LogConfig) {
    if INITIALIZED.set(()).is_err() {
        return;
    }
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fc_core={}", config.level)));

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .init();
        }
        LogFormat::Jsonl => {
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .json();
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt_layer)
                .init();
        }
    }
}
