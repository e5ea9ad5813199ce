//! Line input for the interactive shell.
//!
//! The shell only needs a prompt, a password prompt and a way to offer past
//! lines for recall; [`RustylineEditor`] provides them on a terminal and
//! [`ScriptedEditor`] replays canned input.

use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, EditMode, Editor};
use std::collections::VecDeque;

use crate::error::{CLIError, Result};

/// What a prompt produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Ctrl+C at the prompt
    Interrupted,
    /// Ctrl+D or closed input
    Eof,
}

pub trait LineEditor {
    fn readline(&mut self, prompt: &str) -> Result<ReadOutcome>;

    /// Prompt without echoing the input
    fn read_password(&mut self, prompt: &str) -> Result<String>;

    /// Make `line` available for recall
    fn add_history(&mut self, line: &str);
}

/// Terminal editor with emacs bindings and manual history management
pub struct RustylineEditor {
    editor: Editor<(), DefaultHistory>,
}

impl RustylineEditor {
    pub fn new() -> Result<Self> {
        let config = Config::builder()
            .edit_mode(EditMode::Emacs)
            .auto_add_history(false)
            .build();
        let editor = Editor::<(), DefaultHistory>::with_config(config)?;
        Ok(Self { editor })
    }
}

impl LineEditor for RustylineEditor {
    fn readline(&mut self, prompt: &str) -> Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadOutcome::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(e) => Err(CLIError::from(e)),
        }
    }

    fn read_password(&mut self, prompt: &str) -> Result<String> {
        rpassword::prompt_password(prompt)
            .map_err(|e| CLIError::ReadlineError(format!("Failed to read password: {}", e)))
    }

    fn add_history(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            log::debug!("[SHELL] Unable to add history entry: {}", e);
        }
    }
}

/// Editor that replays queued lines, then reports end of input.
#[derive(Debug, Default)]
pub struct ScriptedEditor {
    lines: VecDeque<ReadOutcome>,
    passwords: VecDeque<String>,
    recalled: Vec<String>,
}

impl ScriptedEditor {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(|l| ReadOutcome::Line(l.into())).collect(),
            ..Self::default()
        }
    }

    pub fn with_passwords<I, S>(mut self, passwords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.passwords = passwords.into_iter().map(Into::into).collect();
        self
    }

    /// Queue an interrupt after the lines queued so far
    pub fn then_interrupt(mut self) -> Self {
        self.lines.push_back(ReadOutcome::Interrupted);
        self
    }

    /// Lines handed to [`LineEditor::add_history`]
    pub fn recalled(&self) -> &[String] {
        &self.recalled
    }
}

impl LineEditor for ScriptedEditor {
    fn readline(&mut self, _prompt: &str) -> Result<ReadOutcome> {
        Ok(self.lines.pop_front().unwrap_or(ReadOutcome::Eof))
    }

    fn read_password(&mut self, _prompt: &str) -> Result<String> {
        Ok(self.passwords.pop_front().unwrap_or_default())
    }

    fn add_history(&mut self, line: &str) {
        self.recalled.push(line.to_string());
    }
}
