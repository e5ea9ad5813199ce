//! Mutable shell settings.
//!
//! Only meta-command handlers write these; the query path and the renderer
//! read them.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Timestamp precisions accepted by `precision`. `rfc3339` is stored as "".
pub const PRECISIONS: [&str; 6] = ["h", "m", "s", "ms", "u", "ns"];

/// Write consistency levels accepted by `consistency`.
pub const CONSISTENCY_LEVELS: [&str; 4] = ["any", "one", "quorum", "all"];

/// Output format for query results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Json,
    Csv,
    #[default]
    Column,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Csv => "csv",
            OutputFormat::Column => "column",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "column" => Ok(OutputFormat::Column),
            other => Err(format!(
                "Unknown format {:?}. Please use json, csv, or column.",
                other
            )),
        }
    }
}

/// Language lines are interpreted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryLanguage {
    #[default]
    Influxql,
    Flux,
}

impl fmt::Display for QueryLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryLanguage::Influxql => f.write_str("influxql"),
            QueryLanguage::Flux => f.write_str("flux"),
        }
    }
}

/// Normalize a precision argument. `rfc3339` maps to the empty string.
pub fn parse_precision(value: &str) -> Result<String, String> {
    match value {
        "rfc3339" => Ok(String::new()),
        v if PRECISIONS.contains(&v) => Ok(v.to_string()),
        other => Err(format!(
            "Unknown precision {:?}. Please use rfc3339, h, m, s, ms, u or ns.",
            other
        )),
    }
}

pub fn parse_consistency(value: &str) -> Result<String, String> {
    if CONSISTENCY_LEVELS.contains(&value) {
        Ok(value.to_string())
    } else {
        Err(format!(
            "Unknown consistency level {:?}. Please use any, one, quorum, or all.",
            value
        ))
    }
}

/// Everything the shell remembers between lines.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Server the current client talks to
    pub url: Option<Url>,
    pub ssl: bool,
    pub unsafe_ssl: bool,
    pub timeout: Option<Duration>,

    pub username: String,
    pub password: String,

    pub database: String,
    pub retention_policy: String,

    pub format: OutputFormat,
    pub pretty: bool,

    pub chunked: bool,
    /// 0 lets the server pick
    pub chunk_size: usize,

    /// One of [`PRECISIONS`] or "" for RFC3339
    pub precision: String,
    pub write_consistency: String,

    /// 0 means any node
    pub node_id: i64,

    pub language: QueryLanguage,

    /// `None` keeps history in memory only
    pub history_path: Option<PathBuf>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            url: None,
            ssl: false,
            unsafe_ssl: false,
            timeout: None,
            username: String::new(),
            password: String::new(),
            database: String::new(),
            retention_policy: String::new(),
            format: OutputFormat::Column,
            pretty: false,
            chunked: true,
            chunk_size: 0,
            precision: "ns".to_string(),
            write_consistency: "all".to_string(),
            node_id: 0,
            language: QueryLanguage::Influxql,
            history_path: None,
        }
    }
}

impl SessionState {
    /// Address shown by `settings`, without a trailing slash.
    pub fn url_display(&self) -> String {
        self.url
            .as_ref()
            .map(|u| u.as_str().trim_end_matches('/').to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = SessionState::default();
        assert_eq!(state.format, OutputFormat::Column);
        assert!(state.chunked);
        assert_eq!(state.precision, "ns");
        assert_eq!(state.write_consistency, "all");
        assert!(state.history_path.is_none());
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("csv".parse::<OutputFormat>(), Ok(OutputFormat::Csv));
        assert_eq!(OutputFormat::Json.to_string(), "json");
        let err = "xml".parse::<OutputFormat>().unwrap_err();
        assert_eq!(err, "Unknown format \"xml\". Please use json, csv, or column.");
    }

    #[test]
    fn test_precision_parse() {
        assert_eq!(parse_precision("rfc3339").unwrap(), "");
        assert_eq!(parse_precision("ms").unwrap(), "ms");
        assert!(parse_precision("us").is_err());
    }

    #[test]
    fn test_consistency_parse() {
        assert_eq!(parse_consistency("quorum").unwrap(), "quorum");
        assert_eq!(
            parse_consistency("most").unwrap_err(),
            "Unknown consistency level \"most\". Please use any, one, quorum, or all."
        );
    }
}
