use crate::args::Cli;
use influx_cli::config::{CLIConfiguration, ServerConfig};
use influx_cli::state::{parse_consistency, parse_precision};
use influx_cli::{CLIError, CLISession, HttpConnector, ImportConfig, Result, SessionState};
use std::io::IsTerminal;

/// Server address from the flags, falling back to the `[server]` section
fn server_address(cli: &Cli, server: &ServerConfig) -> String {
    let merged = ServerConfig {
        host: cli.host.clone().unwrap_or_else(|| server.host.clone()),
        port: cli.port.unwrap_or(server.port),
        path_prefix: cli
            .path_prefix
            .clone()
            .unwrap_or_else(|| server.path_prefix.clone()),
        ..server.clone()
    };
    merged.address()
}

/// Password from the flag, prompting when it was given without a value.
fn resolve_password(cli: &Cli, stdin_is_tty: bool) -> Result<Option<String>> {
    match cli.password.as_deref() {
        Some("") => {
            if !stdin_is_tty {
                return Err(CLIError::ConfigurationError(
                    "unable to prompt for a password with no TTY".into(),
                ));
            }
            let password = rpassword::prompt_password("password: ")
                .map_err(|e| CLIError::ReadlineError(e.to_string()))?;
            Ok(Some(password))
        },
        Some(password) => Ok(Some(password.to_string())),
        None => Ok(None),
    }
}

/// Build the session settings from flags, the config file and the
/// environment, in that order of precedence.
pub fn build_state(cli: &Cli, config: &CLIConfiguration, stdin_is_tty: bool) -> Result<SessionState> {
    let server = config.resolved_server();
    let ui = config.resolved_ui();

    let ssl = cli.ssl || server.ssl;
    let url = influx_link::parse_connection_string(&server_address(cli, &server), ssl)?;

    let username = cli
        .username
        .clone()
        .or_else(|| std::env::var("INFLUX_USERNAME").ok())
        .unwrap_or_default();
    let password = match resolve_password(cli, stdin_is_tty)? {
        Some(password) => password,
        None => std::env::var("INFLUX_PASSWORD").unwrap_or_default(),
    };

    let format = match cli.format {
        Some(format) => format,
        None => ui.format.parse().map_err(CLIError::ConfigurationError)?,
    };
    let precision = cli.precision.as_deref().unwrap_or(&ui.precision);
    let precision = parse_precision(precision).map_err(CLIError::ConfigurationError)?;
    let consistency = cli.consistency.as_deref().unwrap_or(&ui.consistency);
    let write_consistency = parse_consistency(consistency).map_err(CLIError::ConfigurationError)?;

    Ok(SessionState {
        url: Some(url),
        ssl,
        unsafe_ssl: cli.unsafe_ssl || server.unsafe_ssl,
        timeout: server.timeout(),
        username,
        password,
        database: cli.database.clone().unwrap_or_default(),
        retention_policy: cli.retention_policy.clone().unwrap_or_default(),
        format,
        pretty: cli.pretty || ui.pretty,
        chunked: ui.chunked && !cli.no_chunked,
        chunk_size: cli.chunk_size.unwrap_or(ui.chunk_size),
        precision,
        write_consistency,
        node_id: cli.node,
        language: cli.language,
        history_path: ui.history_path(),
    })
}

pub fn import_config(cli: &Cli, state: &SessionState) -> Option<ImportConfig> {
    let path = cli.path.clone().filter(|_| cli.import)?;
    let mut config = ImportConfig::new(path);
    config.points_per_second = cli.pps;
    config.database = state.database.clone();
    config.retention_policy = state.retention_policy.clone();
    config.precision = state.precision.clone();
    config.write_consistency = state.write_consistency.clone();
    Some(config)
}

/// Create the session and make the first connection.
pub async fn create_session(cli: &Cli, config: &CLIConfiguration) -> Result<CLISession> {
    let stdin_is_tty = std::io::stdin().is_terminal();
    let state = build_state(cli, config, stdin_is_tty)?;
    let precision = state.precision.clone();

    let mut session = CLISession::new(state, Box::new(HttpConnector))
        .with_color(std::io::stdout().is_terminal());
    session.open().await?;
    session.set_precision(&precision);

    Ok(session)
}
