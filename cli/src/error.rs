//! Error types for influx-cli
//!
//! Provides user-facing messages for shell failures, including the
//! distinguished outcomes the shell loop reacts to (blank line, user abort,
//! empty reply).

use influx_link::LinkError;
use std::fmt;

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CLIError>;

/// Errors that can occur in the CLI
#[derive(Debug)]
pub enum CLIError {
    /// Error from influx-link library
    LinkError(LinkError),

    /// Could not reach the server during startup or `connect`
    ConnectionError {
        addr: String,
        message: String,
        hint: String,
    },

    /// Configuration file error
    ConfigurationError(String),

    /// File I/O error
    FileError(String),

    /// Malformed statement or meta-command arguments
    ParseError(String),

    /// The line held nothing but whitespace
    BlankCommand,

    /// The in-flight request was cancelled by a signal
    Aborted,

    /// The server closed the exchange without a reply
    NoData,

    /// Error reported by the server inside an otherwise successful reply
    QueryError(String),

    /// Readline error
    ReadlineError(String),

    /// History file error
    HistoryError(String),

    /// Format error
    FormatError(String),

    /// Import finished with failures
    ImportError(String),
}

impl CLIError {
    pub fn parse_error(msg: impl Into<String>) -> Self {
        CLIError::ParseError(msg.into())
    }

    /// True when the error came from the server or the network rather than
    /// from local parsing or cancellation.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            CLIError::LinkError(_) | CLIError::QueryError(_) | CLIError::ConnectionError { .. }
        )
    }

    fn format_link_error(err: &LinkError) -> String {
        match err {
            LinkError::NetworkError(msg) => Self::clean_nested_message(msg),
            LinkError::ServerError {
                status_code,
                message,
            } if message.is_empty() => format!("received status code {} from server", status_code),
            other => other.to_string(),
        }
    }

    fn clean_nested_message(message: &str) -> String {
        let mut cleaned = message.trim();
        let prefixes = ["error sending request for url", "Network error:", "network error:"];

        loop {
            let mut stripped = false;
            for prefix in &prefixes {
                if let Some(rest) = cleaned.strip_prefix(prefix) {
                    cleaned = rest.trim_start();
                    stripped = true;
                    break;
                }
            }

            if !stripped {
                break;
            }
        }

        cleaned.to_string()
    }
}

impl fmt::Display for CLIError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CLIError::LinkError(e) => write!(f, "{}", Self::format_link_error(e)),
            CLIError::ConnectionError {
                addr,
                message,
                hint,
            } => write!(f, "Failed to connect to {}: {}\n{}", addr, message, hint),
            CLIError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            CLIError::FileError(msg) => write!(f, "File error: {}", msg),
            CLIError::ParseError(msg) => write!(f, "{}", msg),
            CLIError::BlankCommand => write!(f, "empty command"),
            CLIError::Aborted => write!(f, "aborted by user"),
            CLIError::NoData => write!(f, "no data received"),
            CLIError::QueryError(msg) => write!(f, "{}", msg),
            CLIError::ReadlineError(msg) => write!(f, "Input error: {}", msg),
            CLIError::HistoryError(msg) => write!(f, "History error: {}", msg),
            CLIError::FormatError(msg) => write!(f, "Format error: {}", msg),
            CLIError::ImportError(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CLIError {}

impl From<LinkError> for CLIError {
    fn from(err: LinkError) -> Self {
        CLIError::LinkError(err)
    }
}

impl From<rustyline::error::ReadlineError> for CLIError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        CLIError::ReadlineError(err.to_string())
    }
}

impl From<std::io::Error> for CLIError {
    fn from(err: std::io::Error) -> Self {
        CLIError::FileError(err.to_string())
    }
}

impl From<toml::de::Error> for CLIError {
    fn from(err: toml::de::Error) -> Self {
        CLIError::ConfigurationError(format!("TOML parse error: {}", err))
    }
}

impl From<toml::ser::Error> for CLIError {
    fn from(err: toml::ser::Error) -> Self {
        CLIError::ConfigurationError(format!("TOML write error: {}", err))
    }
}

impl From<serde_json::Error> for CLIError {
    fn from(err: serde_json::Error) -> Self {
        CLIError::FormatError(err.to_string())
    }
}
