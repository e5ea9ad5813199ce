use clap::Parser;
use influx_cli::{OutputFormat, QueryLanguage};
use std::path::PathBuf;

// Macro to create the version string at compile time
macro_rules! version_string {
    () => {
        concat!(
            env!("CARGO_PKG_VERSION"),
            "\nCommit: ",
            env!("GIT_COMMIT_HASH"),
            " (",
            env!("GIT_BRANCH"),
            ")\nBuilt: ",
            env!("BUILD_DATE")
        )
    };
}

/// influx - Interactive shell for InfluxDB
///
/// Settings left unset fall back to the configuration file, then to the
/// built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "influx")]
#[command(version = version_string!())]
#[command(about = "Interactive command shell for InfluxDB", long_about = None)]
pub struct Cli {
    /// Host of the server to connect to (default: localhost)
    #[arg(long = "host")]
    pub host: Option<String>,

    /// Port of the server to connect to (default: 8086)
    #[arg(long = "port")]
    pub port: Option<u16>,

    /// Path prefix of the server's HTTP endpoints
    #[arg(long = "path-prefix")]
    pub path_prefix: Option<String>,

    /// Username to connect to the server (env: INFLUX_USERNAME)
    #[arg(long = "username")]
    pub username: Option<String>,

    /// Password to connect to the server (if flag is present without value, prompts interactively)
    #[arg(long = "password", num_args = 0..=1, default_missing_value = "")]
    pub password: Option<String>,

    /// Database to connect to the server
    #[arg(long = "database")]
    pub database: Option<String>,

    /// Retention policy to use
    #[arg(long = "retention-policy")]
    pub retention_policy: Option<String>,

    /// Use https for connecting to the cluster
    #[arg(long = "ssl")]
    pub ssl: bool,

    /// Set this when connecting to the cluster using https and not use SSL verification
    #[arg(long = "unsafe-ssl")]
    pub unsafe_ssl: bool,

    /// Turns on pretty print for the json format
    #[arg(long = "pretty")]
    pub pretty: bool,

    /// Format specifies the format of the server responses
    #[arg(long = "format", value_enum)]
    pub format: Option<OutputFormat>,

    /// Precision specifies the format of the timestamp: rfc3339, h, m, s, ms, u or ns
    #[arg(long = "precision")]
    pub precision: Option<String>,

    /// Set write consistency level: any, one, quorum, or all
    #[arg(long = "consistency")]
    pub consistency: Option<String>,

    /// Execute command and quit
    #[arg(long = "execute")]
    pub execute: Option<String>,

    /// Import a previous database export from file
    #[arg(long = "import", requires = "path")]
    pub import: bool,

    /// Path to the file to import
    #[arg(long = "path")]
    pub path: Option<PathBuf>,

    /// How many points per second the import will allow. 0 is unlimited
    #[arg(long = "pps", default_value_t = 0)]
    pub pps: u64,

    /// Specify the node that data should be retrieved from (enterprise only)
    #[arg(long = "node", default_value_t = 0)]
    pub node: i64,

    /// Size of each chunk when chunked responses are enabled
    #[arg(long = "chunk-size")]
    pub chunk_size: Option<usize>,

    /// Disable chunked responses from the server
    #[arg(long = "no-chunked")]
    pub no_chunked: bool,

    /// Query language for executing commands or invoking the REPL
    #[arg(long = "type", value_enum, default_value_t = QueryLanguage::Influxql)]
    pub language: QueryLanguage,

    /// Configuration file path
    #[arg(long = "config", default_value = influx_cli::config::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_password_without_value_requests_prompt() {
        let cli = Cli::try_parse_from(["influx", "--username", "admin", "--password"]).unwrap();
        assert_eq!(cli.username.as_deref(), Some("admin"));
        assert_eq!(cli.password.as_deref(), Some(""));

        let cli = Cli::try_parse_from(["influx", "--password", "secret"]).unwrap();
        assert_eq!(cli.password.as_deref(), Some("secret"));

        let cli = Cli::try_parse_from(["influx"]).unwrap();
        assert!(cli.password.is_none());
    }

    #[test]
    fn test_modes_and_enums() {
        let cli = Cli::try_parse_from([
            "influx",
            "--format",
            "csv",
            "--type",
            "flux",
            "--execute",
            "SHOW DATABASES",
            "--no-chunked",
        ])
        .unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Csv));
        assert_eq!(cli.language, QueryLanguage::Flux);
        assert_eq!(cli.execute.as_deref(), Some("SHOW DATABASES"));
        assert!(cli.no_chunked);

        assert!(Cli::try_parse_from(["influx", "--format", "xml"]).is_err());
    }

    #[test]
    fn test_import_requires_path() {
        assert!(Cli::try_parse_from(["influx", "--import"]).is_err());
        let cli =
            Cli::try_parse_from(["influx", "--import", "--path", "dump.txt", "--pps", "100"])
                .unwrap();
        assert!(cli.import);
        assert_eq!(cli.pps, 100);
    }
}
