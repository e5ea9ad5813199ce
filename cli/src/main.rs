//! influx - Interactive shell for InfluxDB
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode
//! influx --host localhost --port 8086
//!
//! # Execute statements and exit
//! influx --database mydb --execute 'SELECT * FROM cpu LIMIT 5'
//!
//! # Import an exported dump
//! influx --import --path export.txt --pps 5000
//! ```

use clap::Parser;
use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use influx_cli::config::expand_config_path;
use influx_cli::logging::init_logging;
use influx_cli::{CLIConfiguration, CLIError, Result, RustylineEditor};

mod args;
mod connect;

use args::Cli;
use connect::{create_session, import_config};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = CLIConfiguration::load(&cli.config)?;

    let logging = config.resolved_logging();
    let level = if cli.verbose { "debug" } else { logging.level.as_str() };
    let log_file = logging
        .file
        .as_deref()
        .map(|file| expand_config_path(&PathBuf::from(file)));
    init_logging(level, log_file.as_deref(), &logging.format)?;

    let mut session = create_session(&cli, &config).await?;

    if let Some(execute) = cli.execute.as_deref() {
        return session.execute_lines(execute).await;
    }

    if let Some(import) = import_config(&cli, session.state()) {
        return session
            .import(import)
            .await
            .map_err(|e| CLIError::ImportError(format!("ERROR: {}", e)));
    }

    if !std::io::stdin().is_terminal() {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        return session.execute_script(&input).await;
    }

    let editor = RustylineEditor::new()?;
    session = session.with_editor(Box::new(editor));
    session.run_interactive().await
}
