//! Command history persistence
//!
//! Keeps the lines entered at the prompt and mirrors them to
//! `~/.influx_history`, one entry per line. The file is rewritten after every
//! recorded line and is never held open in between.

use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

use crate::error::{CLIError, Result};

/// Entries kept in memory and on disk
pub const DEFAULT_HISTORY_SIZE: usize = 1000;

const HISTORY_FILE_NAME: &str = ".influx_history";

static PASSWORD_FOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)password\s+for[^=]*=\s+(["']?[^\s"]+["']?)"#).expect("valid regex")
});

static WITH_PASSWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)with\s+password\s+(["']?[^\s"]+["']?)"#).expect("valid regex")
});

/// Command history manager
pub struct CommandHistory {
    /// `None` keeps history in memory only
    path: Option<PathBuf>,
    entries: Vec<String>,
    max_size: usize,
}

impl CommandHistory {
    /// History backed by `path`, or memory-only when `None`
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            entries: Vec::new(),
            max_size: DEFAULT_HISTORY_SIZE,
        }
    }

    /// `~/.influx_history`, if there is a home directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(HISTORY_FILE_NAME))
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size.max(1);
        self
    }

    /// Load history from file. A missing file is an empty history.
    pub fn load(&mut self) -> Result<()> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }

        let contents = std::fs::read_to_string(&path)
            .map_err(|e| CLIError::HistoryError(format!("Failed to read history file: {}", e)))?;
        self.entries = contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect();
        self.truncate();

        log::debug!(
            "[SHELL] Loaded {} history entries from {}",
            self.entries.len(),
            path.display()
        );
        Ok(())
    }

    /// Save history to file
    pub fn save(&self) -> Result<()> {
        let Some(path) = self.path.as_ref() else {
            return Ok(());
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut contents = self.entries.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }

        std::fs::write(path, contents)
            .map_err(|e| CLIError::HistoryError(format!("Failed to write history file: {}", e)))
    }

    /// Append a finished line and persist it.
    ///
    /// Returns the stored text, or `None` when the line is not kept.
    pub fn record(&mut self, line: &str) -> Result<Option<String>> {
        if !should_record(line) {
            return Ok(None);
        }

        let entry = sanitize(line.trim());
        self.entries.push(entry.clone());
        self.truncate();
        self.save()?;
        Ok(Some(entry))
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Text printed by the `history` command
    pub fn render(&self) -> String {
        self.entries.iter().map(|e| format!("{}\n", e)).collect()
    }

    /// Get history file path
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn truncate(&mut self) {
        if self.entries.len() > self.max_size {
            let excess = self.entries.len() - self.max_size;
            self.entries.drain(..excess);
        }
    }
}

/// Blank lines and credentials never reach the history.
pub fn should_record(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && !trimmed.to_lowercase().starts_with("auth")
}

/// Replace passwords in user-management statements with `[REDACTED]`.
pub fn sanitize(line: &str) -> String {
    let mut out = line.to_string();
    for re in [&*PASSWORD_FOR, &*WITH_PASSWORD] {
        out = re
            .replace_all(&out, |caps: &regex::Captures<'_>| {
                let whole = &caps[0];
                let secret = &caps[1];
                format!("{}[REDACTED]", &whole[..whole.len() - secret.len()])
            })
            .into_owned();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::tempdir;

    #[test]
    fn test_history_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history");

        let mut history = CommandHistory::new(Some(path.clone()));
        history.record("SELECT 1").unwrap();
        history.record("show databases").unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "SELECT 1\nshow databases\n"
        );

        let mut reloaded = CommandHistory::new(Some(path));
        reloaded.load().unwrap();
        assert_eq!(reloaded.entries(), ["SELECT 1", "show databases"]);
    }

    #[test]
    fn test_history_max_size() {
        let dir = tempdir().unwrap();
        let mut history =
            CommandHistory::new(Some(dir.path().join("history"))).with_max_size(2);

        for cmd in ["SELECT 1", "SELECT 2", "SELECT 3"] {
            history.record(cmd).unwrap();
        }

        assert_eq!(history.entries(), ["SELECT 2", "SELECT 3"]);
    }

    #[test]
    fn test_load_keeps_most_recent_entries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("history");
        std::fs::write(&path, "SELECT 1\n\nSELECT 2\nSELECT 3\n").unwrap();

        let mut history = CommandHistory::new(Some(path)).with_max_size(2);
        history.load().unwrap();
        assert_eq!(history.entries(), ["SELECT 2", "SELECT 3"]);
    }

    #[test]
    fn test_skips_blank_and_auth_lines() {
        let mut history = CommandHistory::new(None);
        assert_eq!(history.record("   ").unwrap(), None);
        assert_eq!(history.record("auth admin secret").unwrap(), None);
        assert_eq!(history.record("AUTH").unwrap(), None);
        assert_eq!(history.record("use db").unwrap().as_deref(), Some("use db"));
        assert_eq!(history.render(), "use db\n");
    }

    #[test]
    fn test_memory_only_history_writes_nothing() {
        let mut history = CommandHistory::new(None);
        history.record("SELECT 1").unwrap();
        assert!(history.path().is_none());
        assert_eq!(history.entries().len(), 1);
    }

    #[test]
    fn test_sanitize_passwords() {
        assert_eq!(
            sanitize("CREATE USER bob WITH PASSWORD 'hunter2'"),
            "CREATE USER bob WITH PASSWORD [REDACTED]"
        );
        assert_eq!(
            sanitize("set password for bob = 'hunter2'"),
            "set password for bob = [REDACTED]"
        );
        assert_eq!(sanitize("SELECT * FROM cpu"), "SELECT * FROM cpu");
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("history");
        let mut history = CommandHistory::new(Some(path.clone()));
        history.record("SELECT 1").unwrap();
        assert!(path.exists());
    }
}
