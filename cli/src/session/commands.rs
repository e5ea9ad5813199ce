//! Meta-command handlers.
//!
//! Each handler reports on the session output and leaves the settings
//! untouched when its argument is rejected.

use influx_link::{Query, Response};

use super::CLISession;
use crate::line_editor::ReadOutcome;
use crate::state::{parse_consistency, parse_precision, OutputFormat};
use crate::statement::parse_database_and_retention_policy;

const CLEAR_USAGE: &str = "Possible commands for 'clear' are:
    # Clear the database context
    clear database
    clear db

    # Clear the retention policy context
    clear retention policy
    clear rp
";

/// Outcome of checking a name against a server listing
enum Lookup {
    Found,
    Missing,
    /// The listing failed; the message has been printed
    Failed,
}

impl CLISession {
    pub(super) fn set_auth(&mut self, credentials: Option<(String, String)>) {
        let (username, password) = match credentials {
            Some(pair) => pair,
            None => match self.prompt_credentials() {
                Ok(pair) => pair,
                Err(e) => {
                    self.println(format!("Unable to process input: {}", e));
                    return;
                },
            },
        };

        self.state.username = username;
        self.state.password = password;
        if let Some(transport) = self.transport.as_mut() {
            transport.set_auth(&self.state.username, &self.state.password);
        }
    }

    fn prompt_credentials(&mut self) -> crate::error::Result<(String, String)> {
        let editor = self.editor.as_mut().ok_or_else(|| {
            crate::error::CLIError::ReadlineError("no terminal to prompt on".into())
        })?;

        let username = match editor.readline("username: ")? {
            ReadOutcome::Line(line) => line.trim().to_string(),
            ReadOutcome::Interrupted | ReadOutcome::Eof => {
                return Err(crate::error::CLIError::Aborted);
            },
        };
        let password = editor.read_password("password: ")?;
        Ok((username, password))
    }

    pub(super) fn set_format(&mut self, arg: &str) {
        match arg.parse::<OutputFormat>() {
            Ok(format) => self.state.format = format,
            Err(msg) => self.println(msg),
        }
    }

    pub(super) fn set_precision_command(&mut self, arg: &str) {
        match parse_precision(arg) {
            Ok(precision) => self.set_precision(&precision),
            Err(msg) => self.println(msg),
        }
    }

    pub(super) fn set_write_consistency(&mut self, arg: &str) {
        match parse_consistency(arg) {
            Ok(level) => self.state.write_consistency = level,
            Err(msg) => self.println(msg),
        }
    }

    pub(super) fn toggle_chunked(&mut self) {
        self.state.chunked = !self.state.chunked;
        if self.state.chunked {
            self.println("chunked responses enabled");
        } else {
            self.println("chunked reponses disabled");
        }
    }

    pub(super) fn toggle_pretty(&mut self) {
        self.state.pretty = !self.state.pretty;
        if self.state.pretty {
            self.println("Pretty print enabled");
        } else {
            self.println("Pretty print disabled");
        }
    }

    pub(super) fn set_chunk_size(&mut self, arg: &str) {
        match arg.parse::<i64>() {
            Ok(n) => {
                self.state.chunk_size = usize::try_from(n).unwrap_or(0);
                let size = self.state.chunk_size;
                self.println(format!("chunk size set to {}", size));
            },
            Err(_) => self.println(format!("unable to parse chunk size from {:?}", arg)),
        }
    }

    pub(super) fn set_node(&mut self, args: &[String]) {
        let [arg] = args else {
            self.println("Improper number of arguments for 'node' command, requires exactly one.");
            return;
        };

        if arg == "clear" {
            self.state.node_id = 0;
            return;
        }

        match arg.parse::<i64>() {
            Ok(id) => self.state.node_id = id,
            Err(_) => self.println(format!(
                "Unable to parse node id from {}. Must be an integer or 'clear'.",
                arg
            )),
        }
    }

    pub(super) fn clear(&mut self, arg: &str) {
        match arg {
            "database" | "db" => {
                self.state.database.clear();
                self.println("database context cleared");
            },
            "retention policy" | "rp" => {
                self.state.retention_policy.clear();
                self.println("retention policy context cleared");
            },
            other => {
                if !other.is_empty() {
                    self.println(format!("invalid command {:?}.", other));
                }
                self.print(CLEAR_USAGE);
            },
        }
    }

    /// `use <db>[.<rp>]`, checked against the server's listings.
    pub(super) async fn use_database(&mut self, arg: &str) {
        if arg.is_empty() {
            self.println("Could not parse database name from \"use\".");
            return;
        }

        let (database, retention_policy) = match parse_database_and_retention_policy(arg) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::debug!("[SHELL] use {:?}: {}", arg, e);
                self.println(format!(
                    "Unable to parse database or retention policy from {}",
                    arg
                ));
                return;
            },
        };

        if !self.database_exists(&database).await {
            self.println("DB does not exist!");
            return;
        }

        self.println(format!("Using database {}", database));
        self.state.database = database;

        if retention_policy.is_empty() {
            return;
        }
        let database = self.state.database.clone();
        if !self.retention_policy_exists(&database, &retention_policy).await {
            return;
        }
        self.println(format!("Using retention policy {}", retention_policy));
        self.state.retention_policy = retention_policy;
    }

    async fn database_exists(&mut self, database: &str) -> bool {
        let lookup = self
            .lookup(Query::new("SHOW DATABASES"), |response| {
                response
                    .results
                    .iter()
                    .flat_map(|result| &result.series)
                    .filter(|series| series.name == "databases")
                    .flat_map(|series| &series.values)
                    .flatten()
                    .any(|value| value.as_str() == Some(database))
            })
            .await;

        match lookup {
            Lookup::Found => true,
            Lookup::Missing => {
                self.println(format!(
                    "ERR: Database {} doesn't exist. Run SHOW DATABASES for a list of existing databases.",
                    database
                ));
                false
            },
            Lookup::Failed => false,
        }
    }

    async fn retention_policy_exists(&mut self, database: &str, retention_policy: &str) -> bool {
        let lookup = self
            .lookup(
                Query::new(format!("SHOW RETENTION POLICIES ON {:?}", database)),
                |response| {
                    response
                        .results
                        .iter()
                        .flat_map(|result| &result.series)
                        .flat_map(|series| &series.values)
                        .filter_map(|row| row.first())
                        .any(|value| value.as_str() == Some(retention_policy))
                },
            )
            .await;

        match lookup {
            Lookup::Found => true,
            Lookup::Missing => {
                self.println(format!(
                    "ERR: RETENTION POLICY {} doesn't exist. Run SHOW RETENTION POLICIES ON {:?} for a list of existing retention polices.",
                    retention_policy, database
                ));
                false
            },
            Lookup::Failed => false,
        }
    }

    /// Run a listing query and search it with `contains`.
    ///
    /// A listing the server refuses counts as found when a username is set,
    /// since the user may be allowed to use what they cannot list.
    async fn lookup<F>(&mut self, query: Query, contains: F) -> Lookup
    where
        F: FnOnce(&Response) -> bool,
    {
        let response = match self.run_query(&query).await {
            Ok(response) => response,
            Err(e) => {
                self.println(format!("ERR: {}", e));
                return Lookup::Failed;
            },
        };

        if let Some(err) = response.error() {
            let err = err.to_string();
            if self.state.username.is_empty() {
                self.println(format!("ERR: {}", err));
                return Lookup::Failed;
            }
            self.println(format!("WARN: {}", err));
            return Lookup::Found;
        }

        if contains(&response) {
            Lookup::Found
        } else {
            Lookup::Missing
        }
    }
}
