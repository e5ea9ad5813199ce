//! CLI session state management
//!
//! Owns the connection, the shell settings and the read-parse-execute-render
//! loop. Meta-command handlers live in `session/commands.rs`; help, banner
//! and settings output in `session/info.rs`.

use influx_link::{parse_connection_string, BatchPoints, Query, Response};
use std::io::Write;
use std::time::Instant;

use crate::error::{CLIError, Result};
use crate::executor::ExecutionController;
use crate::formatter::OutputFormatter;
use crate::history::CommandHistory;
use crate::import::{ImportConfig, Importer};
use crate::line_editor::{LineEditor, ReadOutcome};
use crate::parser::{Command, CommandParser};
use crate::rewrite::rewrite_query;
use crate::state::{QueryLanguage, SessionState};
use crate::transport::{ConnectionSettings, Connector, Transport};
use crate::CLI_VERSION;

mod commands;
mod info;

const PROMPT: &str = "> ";

const QUERY_DATABASE_HINT: [&str; 2] = [
    "Warning: It is possible this error is due to not setting a database.",
    "Please set a database with the command \"use <database>\".",
];

const CONNECT_HINT: &str = "Please check your connection settings and ensure 'influxd' is running.";
const USE_SSL_HINT: &str = "Please use the --ssl flag to connect using SSL.";
const UNSAFE_SSL_HINT: &str =
    "You may use --unsafe-ssl to connect anyway, but the SSL connection will not be secure.";

fn is_malformed_response(message: &str) -> bool {
    ["malformed HTTP response", "invalid HTTP version", "HTTP/0.9"]
        .iter()
        .any(|needle| message.contains(needle))
}

fn is_certificate_error(message: &str) -> bool {
    message.to_lowercase().contains("certificate")
}

/// Interactive shell session
pub struct CLISession {
    state: SessionState,
    connector: Box<dyn Connector>,
    transport: Option<Box<dyn Transport>>,
    controller: ExecutionController,
    parser: CommandParser,
    editor: Option<Box<dyn LineEditor>>,
    history: CommandHistory,
    out: Box<dyn Write + Send>,

    /// Version reported by the last successful ping
    server_version: String,
    client_version: String,

    color: bool,
    quit: bool,
}

impl CLISession {
    /// Create a session that is not connected yet. Output goes to stdout.
    pub fn new(state: SessionState, connector: Box<dyn Connector>) -> Self {
        let history = CommandHistory::new(state.history_path.clone());
        Self {
            state,
            connector,
            transport: None,
            controller: ExecutionController::os(),
            parser: CommandParser::new(),
            editor: None,
            history,
            out: Box::new(std::io::stdout()),
            server_version: String::new(),
            client_version: CLI_VERSION.to_string(),
            color: false,
            quit: false,
        }
    }

    pub fn with_controller(mut self, controller: ExecutionController) -> Self {
        self.controller = controller;
        self
    }

    pub fn with_editor(mut self, editor: Box<dyn LineEditor>) -> Self {
        self.editor = Some(editor);
        self
    }

    pub fn with_output(mut self, out: Box<dyn Write + Send>) -> Self {
        self.out = out;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_client_version(mut self, version: impl Into<String>) -> Self {
        self.client_version = version.into();
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    /// Address of the current client, without a trailing slash
    pub fn addr(&self) -> String {
        match self.transport.as_ref() {
            Some(transport) => transport.addr(),
            None => self.state.url_display(),
        }
    }

    /// Whether `exit` was requested
    pub fn is_quitting(&self) -> bool {
        self.quit
    }

    /// Create a client for `addr` (empty for the current URL) and ping it.
    ///
    /// The session switches to the new client only when the ping succeeds.
    pub async fn connect(&mut self, addr: &str) -> Result<()> {
        let addr = addr.trim().to_lowercase();
        let url = if addr.is_empty() {
            self.state.url.clone().ok_or_else(|| {
                CLIError::ConfigurationError("No server address to connect to".into())
            })?
        } else {
            parse_connection_string(&addr, self.state.ssl)?
        };

        let settings = ConnectionSettings {
            url: url.clone(),
            username: self.state.username.clone(),
            password: self.state.password.clone(),
            unsafe_ssl: self.state.unsafe_ssl,
            timeout: self.state.timeout,
            user_agent: format!("InfluxDBShell/{}", self.client_version),
            precision: self.state.precision.clone(),
        };

        let transport = self.connector.connect(&settings)?;

        log::debug!("[SHELL] Pinging {}", transport.addr());
        let ping = transport.ping().await?;
        log::debug!(
            "[SHELL] Ping ok in {:?}, server version {:?}",
            ping.round_trip,
            ping.version
        );

        self.server_version = ping.version;
        self.state.url = Some(url);
        self.transport = Some(transport);
        Ok(())
    }

    /// First connection of the process.
    ///
    /// Failures become [`CLIError::ConnectionError`] with a remediation hint.
    /// A plain-HTTP attempt answered with garbage is retried over TLS, and a
    /// TLS attempt rejected for its certificate is retried without
    /// verification, only to pick the hint.
    pub async fn open(&mut self) -> Result<()> {
        let err = match self.connect("").await {
            Ok(()) => return Ok(()),
            Err(e) => e,
        };

        let message = err.to_string();
        let mut hint = CONNECT_HINT;
        if !self.state.ssl && is_malformed_response(&message) {
            if self.probe(true).await {
                hint = USE_SSL_HINT;
            }
        } else if self.state.ssl && !self.state.unsafe_ssl && is_certificate_error(&message) {
            if self.probe(false).await {
                hint = UNSAFE_SSL_HINT;
            }
        }

        Err(CLIError::ConnectionError {
            addr: self.addr(),
            message,
            hint: hint.to_string(),
        })
    }

    /// Ping the current URL with certificate checks off, optionally over TLS.
    async fn probe(&self, force_tls: bool) -> bool {
        let Some(mut url) = self.state.url.clone() else {
            return false;
        };
        if force_tls && url.set_scheme("https").is_err() {
            return false;
        }

        let settings = ConnectionSettings {
            url,
            username: self.state.username.clone(),
            password: self.state.password.clone(),
            unsafe_ssl: true,
            timeout: self.state.timeout,
            user_agent: format!("InfluxDBShell/{}", self.client_version),
            precision: self.state.precision.clone(),
        };
        match self.connector.connect(&settings) {
            Ok(transport) => {
                let reachable = transport.ping().await.is_ok();
                log::debug!("[SHELL] Probe of {} reachable={}", transport.addr(), reachable);
                reachable
            },
            Err(_) => false,
        }
    }

    /// Apply a precision to the session and the client
    pub fn set_precision(&mut self, precision: &str) {
        self.state.precision = precision.to_string();
        if let Some(transport) = self.transport.as_mut() {
            transport.set_precision(precision);
        }
    }

    /// Classify and run one line.
    ///
    /// Returns [`CLIError::BlankCommand`] for blank lines. Errors are already
    /// reported on the output when this returns.
    pub async fn execute(&mut self, line: &str) -> Result<()> {
        if self.state.language == QueryLanguage::Flux {
            return self.execute_flux_line(line).await;
        }

        let command = self.parser.parse(line)?;
        log::debug!("[SHELL] Dispatching {:?}", command);

        match command {
            Command::Exit => self.quit = true,
            Command::Gopher => self.gopher(),
            Command::Connect(addr) => {
                if let Err(e) = self.connect(&addr).await {
                    self.println(format!("ERR: {}", e));
                    return Err(e);
                }
            },
            Command::Auth(credentials) => self.set_auth(credentials),
            Command::Help => self.help(),
            Command::History => {
                let rendered = self.history.render();
                self.print(&rendered);
            },
            Command::Format(arg) => self.set_format(&arg),
            Command::Precision(arg) => self.set_precision_command(&arg),
            Command::Consistency(arg) => self.set_write_consistency(&arg),
            Command::Settings => self.settings(),
            Command::Chunked => self.toggle_chunked(),
            Command::ChunkSize(arg) => self.set_chunk_size(&arg),
            Command::Pretty => self.toggle_pretty(),
            Command::Use(arg) => self.use_database(&arg).await,
            Command::Node(args) => self.set_node(&args),
            Command::Insert(stmt) => return self.insert(&stmt).await,
            Command::Clear(arg) => self.clear(&arg),
            Command::Query(query) => return self.execute_query(&query).await,
        }

        Ok(())
    }

    /// Run every line of `text` through the dispatcher, stopping at the
    /// first failure or at `exit`. Flux scripts run as one unit.
    pub async fn execute_lines(&mut self, text: &str) -> Result<()> {
        if self.state.language == QueryLanguage::Flux {
            return self.execute_flux(text).await;
        }

        for line in text.split('\n') {
            match self.execute(line).await {
                Ok(()) | Err(CLIError::BlankCommand) => {},
                Err(e) => return Err(e),
            }
            if self.quit {
                break;
            }
        }
        Ok(())
    }

    /// Run `text` as a single query, bypassing the meta-commands.
    pub async fn execute_script(&mut self, text: &str) -> Result<()> {
        match self.state.language {
            QueryLanguage::Flux => self.execute_flux(text).await,
            QueryLanguage::Influxql => self.execute_query(text).await,
        }
    }

    /// Send a query, render the reply and report the time taken.
    pub async fn execute_query(&mut self, query: &str) -> Result<()> {
        let mut command = query.to_string();
        if !self.state.retention_policy.is_empty() {
            match rewrite_query(query, &self.state.database, &self.state.retention_policy) {
                Ok(rewritten) => {
                    log::debug!("[SHELL] Rewrote query to {:?}", rewritten);
                    command = rewritten;
                },
                Err(e) => {
                    self.println(format!("ERR: {}", e));
                    return Err(e);
                },
            }
        }

        let query = Query::new(command)
            .with_database(self.state.database.clone())
            .with_retention_policy(self.state.retention_policy.clone())
            .with_chunking(self.state.chunked, self.state.chunk_size)
            .with_node_id(self.state.node_id);

        let start = Instant::now();
        let result = match self.run_query(&query).await {
            Ok(response) => self.report_response(&response),
            Err(e) => {
                self.println(format!("ERR: {}", e));
                if self.state.database.is_empty() && e.is_remote() {
                    for hint in QUERY_DATABASE_HINT {
                        self.println(hint);
                    }
                }
                Err(e)
            },
        };
        self.print(&format!("\nelapsed:{:?}\n", start.elapsed()));

        result
    }

    fn report_response(&mut self, response: &Response) -> Result<()> {
        match OutputFormatter::new(self.state.format, self.state.pretty).format_response(response) {
            Ok(text) => self.print(&text),
            Err(e) => self.println(format!("Unable to parse json: {}", e)),
        }

        let Some(err) = response.error().map(str::to_string) else {
            return Ok(());
        };
        self.println(format!("ERR: {}", err));
        if self.state.database.is_empty() {
            for hint in QUERY_DATABASE_HINT {
                self.println(hint);
            }
        }
        Err(CLIError::QueryError(err))
    }

    /// Run an `insert` statement. Failures are reported, never returned.
    async fn insert(&mut self, statement: &str) -> Result<()> {
        let target = match crate::statement::parse_insert(statement, &self.state) {
            Ok(target) => target,
            Err(e) => {
                self.println(format!("ERR: {}", e));
                return Ok(());
            },
        };

        let batch = target.into_batch();
        let start = Instant::now();
        if let Err(e) = self.run_write(&batch).await {
            self.println(format!("ERR: {}", e));
            if self.state.database.is_empty() {
                self.println("Note: error may be due to not setting a database or retention policy.");
                self.println("Please set a database with the command \"use <database>\" or");
                self.println("INSERT INTO <database>.<retention-policy> <point>");
            }
        }
        self.print(&format!("\nelapsed:{:?}\n", start.elapsed()));

        Ok(())
    }

    /// In Flux mode only `exit`/`quit` are meta-commands.
    async fn execute_flux_line(&mut self, line: &str) -> Result<()> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(CLIError::BlankCommand);
        }
        if matches!(trimmed.to_lowercase().as_str(), "exit" | "quit") {
            self.quit = true;
            return Ok(());
        }
        self.execute_flux(trimmed).await
    }

    /// Send a Flux script and print the annotated CSV reply as-is.
    pub async fn execute_flux(&mut self, script: &str) -> Result<()> {
        let transport = self.transport()?;
        let controller = self.controller.clone();
        let script = script.to_string();

        let result = controller
            .run(|token| async move { transport.query_flux(&script, &token).await })
            .await;

        match result {
            Ok(text) => {
                self.print(&text);
                if !text.is_empty() && !text.ends_with('\n') {
                    self.print("\n");
                }
                Ok(())
            },
            Err(e) => {
                self.println(format!("ERR: {}", e));
                Err(e)
            },
        }
    }

    /// Import a dump file and print the summary counts.
    pub async fn import(&mut self, config: ImportConfig) -> Result<()> {
        let file = tokio::fs::File::open(&config.path)
            .await
            .map_err(|e| CLIError::FileError(format!("{}: {}", config.path.display(), e)))?;
        log::info!("[IMPORT] Importing {}", config.path.display());

        let transport = self.transport()?;
        let stats = Importer::new(config, transport, &self.controller)
            .run(tokio::io::BufReader::new(file))
            .await?;

        for line in stats.summary() {
            self.println(line);
        }
        stats.into_result()
    }

    /// Prompt loop. Ends on `exit`, end of input, an interrupt at the
    /// prompt, or a line-reader failure.
    pub async fn run_interactive(&mut self) -> Result<()> {
        self.print_banner();

        if let Err(e) = self.history.load() {
            log::warn!("[SHELL] {}", e);
        }
        if let Some(editor) = self.editor.as_mut() {
            for entry in self.history.entries() {
                editor.add_history(entry);
            }
        }

        while !self.quit {
            let outcome = match self.editor.as_mut() {
                Some(editor) => editor.readline(PROMPT),
                None => Err(CLIError::ReadlineError("no line editor attached".into())),
            };

            let line = match outcome {
                Ok(ReadOutcome::Line(line)) => line,
                Ok(ReadOutcome::Eof) => "exit".to_string(),
                Ok(ReadOutcome::Interrupted) => {
                    self.quit = true;
                    break;
                },
                Err(e) => {
                    self.exit();
                    return Err(e);
                },
            };

            let result = self.execute(&line).await;
            if !matches!(result, Err(CLIError::BlankCommand)) {
                self.record_history(&line);
            }
        }

        self.exit();
        Ok(())
    }

    fn record_history(&mut self, line: &str) {
        match self.history.record(line) {
            Ok(Some(entry)) => {
                if let Some(editor) = self.editor.as_mut() {
                    editor.add_history(&entry);
                }
            },
            Ok(None) => {},
            Err(e) => self.println(format!("There was an error writing history file: {}", e)),
        }
    }

    fn exit(&mut self) {
        if let Err(e) = self.history.save() {
            self.println(format!("There was an error writing history file: {}", e));
        }
    }

    fn transport(&self) -> Result<&dyn Transport> {
        self.transport.as_deref().ok_or_else(|| {
            CLIError::ConfigurationError(
                "Not connected. Use 'connect <host:port>' first.".to_string(),
            )
        })
    }

    /// Run a query under the execution controller.
    pub(crate) async fn run_query(&self, query: &Query) -> Result<Response> {
        let transport = self.transport()?;
        self.controller
            .run(|token| async move { transport.query(query, &token).await })
            .await
    }

    async fn run_write(&self, batch: &BatchPoints) -> Result<()> {
        let transport = self.transport()?;
        self.controller
            .run(|token| async move { transport.write(batch, &token).await })
            .await
    }

    pub(crate) fn print(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Err(e) = self.out.write_all(text.as_bytes()).and_then(|_| self.out.flush()) {
            log::debug!("[SHELL] Failed to write output: {}", e);
        }
    }

    pub(crate) fn println(&mut self, text: impl AsRef<str>) {
        let mut line = text.as_ref().to_string();
        line.push('\n');
        self.print(&line);
    }
}
