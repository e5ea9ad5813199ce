// Logging module, powered by tracing-subscriber
//
// Library code logs through the `log` facade. `tracing_log::LogTracer`
// forwards those records into the tracing subscriber installed here. Console
// output goes to stderr so query results on stdout stay clean.

use std::fs::{self, OpenOptions};
use std::io::IsTerminal;
use std::path::Path;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::error::{CLIError, Result};

/// Log format type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact text format: timestamp LEVEL target - message
    Compact,
    /// JSON Lines format for structured logging
    Json,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" | "jsonl" => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Build the `EnvFilter` from the base level plus caps for noisy crates.
fn build_env_filter(level: &str) -> Result<EnvFilter> {
    let mut directives = vec![level.to_string()];

    let noisy: &[(&str, &str)] = &[
        ("hyper", "warn"),
        ("hyper_util", "warn"),
        ("reqwest", "warn"),
        ("rustls", "warn"),
        ("rustyline", "warn"),
        ("sqlparser", "warn"),
    ];
    for (target, lvl) in noisy {
        directives.push(format!("{}={}", target, lvl));
    }

    let filter_str = directives.join(",");
    EnvFilter::try_new(&filter_str).map_err(|e| {
        CLIError::ConfigurationError(format!("Invalid log filter '{}': {}", filter_str, e))
    })
}

/// Initialize logging.
///
/// Installs a stderr layer and, when `file_path` is given, a second layer
/// appending to that file. Both use `format` and the same filter.
pub fn init_logging(level: &str, file_path: Option<&Path>, format: &str) -> Result<()> {
    let log_format = LogFormat::parse(format);

    // Bridge `log` records into tracing. Must be the only logger installed.
    tracing_log::LogTracer::init().map_err(|e| {
        CLIError::ConfigurationError(format!("Failed to initialize logging: {}", e))
    })?;

    let mut layers: Vec<BoxedLayer> = Vec::new();

    let console = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);
    layers.push(match log_format {
        LogFormat::Json => console
            .json()
            .with_filter(build_env_filter(level)?)
            .boxed(),
        LogFormat::Compact => console
            .compact()
            .with_ansi(std::io::stderr().is_terminal())
            .with_filter(build_env_filter(level)?)
            .boxed(),
    });

    if let Some(path) = file_path {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let log_file = OpenOptions::new().create(true).append(true).open(path)?;

        let file_layer = tracing_subscriber::fmt::layer()
            .with_writer(log_file)
            .with_target(true)
            .with_thread_names(true);
        layers.push(match log_format {
            LogFormat::Json => file_layer
                .json()
                .with_filter(build_env_filter(level)?)
                .boxed(),
            LogFormat::Compact => file_layer
                .with_ansi(false)
                .with_filter(build_env_filter(level)?)
                .boxed(),
        });
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|e| CLIError::ConfigurationError(format!("Failed to initialize logging: {}", e)))?;

    tracing::trace!(
        "Logging initialized: level={}, file={:?}",
        level,
        file_path.map(|p| p.display().to_string())
    );

    Ok(())
}
