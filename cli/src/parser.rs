//! Command parser for shell meta-commands
//!
//! Classifies a raw line as a local meta-command, an `insert`, or a query to
//! forward. Only the first token is normalized for dispatch; payloads that
//! reach the server keep their original case.

use crate::error::{CLIError, Result};

/// Parsed command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Anything that is not a meta-command, forwarded verbatim
    Query(String),

    Exit,
    Gopher,
    /// Address to connect to; empty reconnects to the current server
    Connect(String),
    /// `auth <user> <pass>`; `None` prompts for both
    Auth(Option<(String, String)>),
    Help,
    History,
    Format(String),
    Precision(String),
    Consistency(String),
    Settings,
    /// Toggle chunked responses
    Chunked,
    /// Chunk size argument with the `chunk [size]` prefix removed
    ChunkSize(String),
    /// Toggle pretty JSON
    Pretty,
    /// `use` argument in original case
    Use(String),
    /// `node` arguments
    Node(Vec<String>),
    /// Full `insert` statement in original case
    Insert(String),
    /// Lower-cased `clear` argument
    Clear(String),
}

/// Command parser
pub struct CommandParser;

impl CommandParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a command line
    ///
    /// Returns [`CLIError::BlankCommand`] for lines with no tokens so the
    /// caller can keep them out of history.
    pub fn parse(&self, line: &str) -> Result<Command> {
        let lowered = line.trim().to_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();
        let Some(first) = tokens.first() else {
            return Err(CLIError::BlankCommand);
        };

        let rest_lower = || tokens[1..].join(" ");

        let command = match *first {
            "exit" | "quit" => Command::Exit,
            "gopher" => Command::Gopher,
            "connect" => Command::Connect(rest_lower()),
            "auth" => {
                let args: Vec<&str> = line.split_whitespace().collect();
                if args.len() == 3 {
                    Command::Auth(Some((args[1].to_string(), args[2].to_string())))
                } else {
                    Command::Auth(None)
                }
            },
            "help" => Command::Help,
            "history" => Command::History,
            "format" => Command::Format(rest_lower()),
            "precision" => Command::Precision(rest_lower()),
            "consistency" => Command::Consistency(rest_lower()),
            "settings" => Command::Settings,
            "chunked" => Command::Chunked,
            "chunk" => {
                let normalized = tokens.join(" ");
                let arg = normalized
                    .strip_prefix("chunk size ")
                    .or_else(|| normalized.strip_prefix("chunk "))
                    .unwrap_or("");
                Command::ChunkSize(arg.to_string())
            },
            "pretty" => Command::Pretty,
            "use" => Command::Use(Self::argument(line)),
            "node" => Command::Node(
                strip_semicolon(line)
                    .split_whitespace()
                    .skip(1)
                    .map(str::to_string)
                    .collect(),
            ),
            "insert" => Command::Insert(line.trim().to_string()),
            "clear" => Command::Clear(
                strip_semicolon(&lowered)
                    .split_whitespace()
                    .skip(1)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            _ => Command::Query(line.trim().to_string()),
        };

        Ok(command)
    }

    /// Everything after the first whitespace run, original case, without a
    /// trailing `;`.
    fn argument(line: &str) -> String {
        let trimmed = strip_semicolon(line);
        match trimmed.split_once(char::is_whitespace) {
            Some((_, rest)) => rest.trim().to_string(),
            None => String::new(),
        }
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

fn strip_semicolon(line: &str) -> &str {
    let trimmed = line.trim();
    trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end()
}
