//! Configuration file management
//!
//! CLIConfiguration with TOML parsing for ~/.influx/config.toml. Command-line
//! flags override anything set here.
//!
//! # Configuration Format
//!
//! ```toml
//! [server]
//! host = "localhost"
//! port = 8086
//! path_prefix = ""
//! ssl = false
//! unsafe_ssl = false
//! timeout = 0                    # request timeout in seconds, 0 = none
//!
//! [ui]
//! format = "column"              # json, csv, column
//! pretty = false
//! precision = "ns"               # rfc3339, h, m, s, ms, u, ns
//! consistency = "all"            # any, one, quorum, all
//! chunked = true
//! chunk_size = 0
//! history_file = "~/.influx_history"
//!
//! [logging]
//! level = "warn"
//! file = "~/.influx/influx.log"
//! format = "compact"             # compact, json
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{CLIError, Result};

pub const DEFAULT_CONFIG_PATH: &str = "~/.influx/config.toml";

/// CLI configuration loaded from TOML file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CLIConfiguration {
    /// Server connection settings
    pub server: Option<ServerConfig>,

    /// Shell defaults
    pub ui: Option<UIConfig>,

    /// Diagnostic logging
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Prefix prepended to every endpoint path
    #[serde(default)]
    pub path_prefix: String,

    #[serde(default)]
    pub ssl: bool,

    /// Skip certificate verification
    #[serde(default)]
    pub unsafe_ssl: bool,

    /// Request timeout in seconds, 0 for none
    #[serde(default)]
    pub timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UIConfig {
    /// Output format: json, csv, column
    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default)]
    pub pretty: bool,

    #[serde(default = "default_precision")]
    pub precision: String,

    #[serde(default = "default_consistency")]
    pub consistency: String,

    #[serde(default = "default_chunked")]
    pub chunked: bool,

    /// 0 lets the server pick
    #[serde(default)]
    pub chunk_size: usize,

    /// History file, `~/` is expanded
    #[serde(default)]
    pub history_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// trace, debug, info, warn, error or an env-filter directive
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Append logs to this file in addition to stderr
    #[serde(default)]
    pub file: Option<String>,

    /// compact or json
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_host() -> String {
    influx_link::DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    influx_link::DEFAULT_PORT
}

fn default_format() -> String {
    "column".to_string()
}

fn default_precision() -> String {
    "ns".to_string()
}

fn default_consistency() -> String {
    "all".to_string()
}

fn default_chunked() -> bool {
    true
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            path_prefix: String::new(),
            ssl: false,
            unsafe_ssl: false,
            timeout: 0,
        }
    }
}

impl ServerConfig {
    /// `host:port[/prefix]` as accepted by the connection-string parser
    pub fn address(&self) -> String {
        let prefix = self.path_prefix.trim_matches('/');
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        if prefix.is_empty() {
            format!("{}:{}", host, self.port)
        } else {
            format!("{}:{}/{}", host, self.port, prefix)
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout > 0).then(|| Duration::from_secs(self.timeout))
    }
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            pretty: false,
            precision: default_precision(),
            consistency: default_consistency(),
            chunked: default_chunked(),
            chunk_size: 0,
            history_file: None,
        }
    }
}

impl UIConfig {
    /// Configured history file, falling back to `~/.influx_history`
    pub fn history_path(&self) -> Option<PathBuf> {
        match self.history_file.as_deref() {
            Some(file) if !file.is_empty() => Some(expand_config_path(Path::new(file))),
            _ => crate::history::CommandHistory::default_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
            format: default_log_format(),
        }
    }
}

impl Default for CLIConfiguration {
    fn default() -> Self {
        Self {
            server: Some(ServerConfig::default()),
            ui: Some(UIConfig::default()),
            logging: Some(LoggingConfig::default()),
        }
    }
}

pub fn expand_config_path(path: &Path) -> PathBuf {
    let path_str = path.to_str().unwrap_or(DEFAULT_CONFIG_PATH);
    if let Some(rest) = path_str.strip_prefix("~/") {
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(rest);
        }
    }
    path.to_path_buf()
}

pub fn default_config_path() -> PathBuf {
    expand_config_path(Path::new(DEFAULT_CONFIG_PATH))
}

impl CLIConfiguration {
    /// Load configuration from file
    ///
    /// Returns default configuration if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self> {
        let expanded_path = expand_config_path(path);
        let path = &expanded_path;

        if !path.exists() {
            log::debug!("[SHELL] No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            CLIError::ConfigurationError(format!("Failed to read config file: {}", e))
        })?;

        let config: CLIConfiguration = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let expanded_path = expand_config_path(path);
        let path = &expanded_path;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn resolved_server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    pub fn resolved_ui(&self) -> UIConfig {
        self.ui.clone().unwrap_or_default()
    }

    pub fn resolved_logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}
