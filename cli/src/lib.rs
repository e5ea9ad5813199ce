//! Library entry point for the influx shell.
//!
//! Exposes the shell core (parser, session, renderer, execution controller)
//! so integration tests can drive it without going through the binary.

pub mod align;
pub mod config;
pub mod error;
pub mod executor;
pub mod formatter;
pub mod history;
pub mod identifier;
pub mod import;
pub mod line_editor;
pub mod logging;
pub mod parser;
pub mod rewrite;
pub mod session;
pub mod state;
pub mod statement;
pub mod transport;

/// Version reported in the banner and the user agent
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

pub use config::CLIConfiguration;
pub use error::{CLIError, Result};
pub use executor::{ExecutionController, ManualSignals};
pub use formatter::OutputFormatter;
pub use import::{ImportConfig, ImportStats};
pub use line_editor::{LineEditor, ReadOutcome, RustylineEditor, ScriptedEditor};
pub use session::CLISession;
pub use state::{OutputFormat, QueryLanguage, SessionState};
pub use transport::{ConnectionSettings, Connector, HttpConnector, Transport};
