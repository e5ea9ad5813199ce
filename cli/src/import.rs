//! Bulk import of an exported text dump.
//!
//! The dump holds an optional `# DDL` section of queries followed by a
//! `# DML` section of line-protocol points. `# CONTEXT-DATABASE:` and
//! `# CONTEXT-RETENTION-POLICY:` lines change where the following points
//! are written.

use influx_link::{BatchPoints, Point, Query};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::time::Instant;

use crate::error::{CLIError, Result};
use crate::executor::ExecutionController;
use crate::transport::Transport;

pub const DEFAULT_BATCH_SIZE: usize = 5000;

const DDL_MARKER: &str = "# DDL";
const DML_MARKER: &str = "# DML";
const CONTEXT_DATABASE: &str = "# CONTEXT-DATABASE:";
const CONTEXT_RETENTION_POLICY: &str = "# CONTEXT-RETENTION-POLICY:";

/// Import settings
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub path: PathBuf,
    /// Upper bound on points written per second, 0 for unlimited
    pub points_per_second: u64,
    pub batch_size: usize,
    pub database: String,
    pub retention_policy: String,
    pub precision: String,
    pub write_consistency: String,
}

impl ImportConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            points_per_second: 0,
            batch_size: DEFAULT_BATCH_SIZE,
            database: String::new(),
            retention_policy: String::new(),
            precision: String::new(),
            write_consistency: String::new(),
        }
    }
}

/// Counters reported when an import finishes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub commands: u64,
    pub failed_commands: u64,
    pub inserts: u64,
    pub failed_inserts: u64,
}

impl ImportStats {
    pub fn summary(&self) -> [String; 3] {
        [
            format!("Processed {} commands", self.commands),
            format!("Processed {} inserts", self.inserts),
            format!("Failed {} inserts", self.failed_inserts),
        ]
    }

    /// Fails when any point was not written
    pub fn into_result(self) -> Result<()> {
        if self.failed_inserts > 0 {
            return Err(CLIError::ImportError(format!(
                "{} point(s) were not inserted",
                self.failed_inserts
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Ddl,
    Dml,
}

/// Holds writes back so that no more than `pps` points go out per second.
struct Throttle {
    pps: u64,
    started: Instant,
    sent: u64,
}

impl Throttle {
    fn new(pps: u64) -> Option<Self> {
        (pps > 0).then(|| Self {
            pps,
            started: Instant::now(),
            sent: 0,
        })
    }

    async fn admit(&mut self, points: usize) {
        self.sent += points as u64;
        let due = Duration::from_secs_f64(self.sent as f64 / self.pps as f64);
        let elapsed = self.started.elapsed();
        if due > elapsed {
            tokio::time::sleep(due - elapsed).await;
        }
    }
}

pub struct Importer<'a> {
    config: ImportConfig,
    transport: &'a dyn Transport,
    controller: &'a ExecutionController,
    section: Section,
    database: String,
    retention_policy: String,
    batch: Vec<Point>,
    throttle: Option<Throttle>,
    stats: ImportStats,
}

impl<'a> Importer<'a> {
    pub fn new(
        config: ImportConfig,
        transport: &'a dyn Transport,
        controller: &'a ExecutionController,
    ) -> Self {
        let database = config.database.clone();
        let retention_policy = config.retention_policy.clone();
        let throttle = Throttle::new(config.points_per_second);
        Self {
            config,
            transport,
            controller,
            section: Section::Ddl,
            database,
            retention_policy,
            batch: Vec::new(),
            throttle,
            stats: ImportStats::default(),
        }
    }

    /// Process every line of `reader`. Only a read failure aborts the run;
    /// rejected commands and points are counted in the returned stats.
    pub async fn run<R>(mut self, reader: R) -> Result<ImportStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await? {
            self.process_line(&line).await;
        }
        self.flush().await;

        log::info!(
            "[IMPORT] Finished {}: {:?}",
            self.config.path.display(),
            self.stats
        );
        Ok(self.stats)
    }

    async fn process_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        if line.starts_with('#') {
            self.process_marker(line).await;
            return;
        }

        match self.section {
            Section::Ddl => self.execute_command(line).await,
            Section::Dml => {
                self.stats.inserts += 1;
                self.batch.push(Point::raw(line));
                if self.batch.len() >= self.config.batch_size.max(1) {
                    self.flush().await;
                }
            },
        }
    }

    async fn process_marker(&mut self, line: &str) {
        if line.starts_with(DDL_MARKER) {
            self.flush().await;
            self.section = Section::Ddl;
        } else if line.starts_with(DML_MARKER) {
            self.section = Section::Dml;
        } else if let Some(database) = line.strip_prefix(CONTEXT_DATABASE) {
            self.flush().await;
            self.database = database.trim().to_string();
            log::debug!("[IMPORT] Database context {:?}", self.database);
        } else if let Some(rp) = line.strip_prefix(CONTEXT_RETENTION_POLICY) {
            self.flush().await;
            self.retention_policy = rp.trim().to_string();
            log::debug!("[IMPORT] Retention policy context {:?}", self.retention_policy);
        }
    }

    async fn execute_command(&mut self, command: &str) {
        self.stats.commands += 1;
        let query = Query::new(command).with_database(self.database.clone());
        let transport = self.transport;

        let outcome = self
            .controller
            .run(|token| async move { transport.query(&query, &token).await })
            .await;

        let failure = match outcome {
            Ok(response) => response.error().map(str::to_string),
            Err(e) => Some(e.to_string()),
        };
        if let Some(err) = failure {
            self.stats.failed_commands += 1;
            log::warn!("[IMPORT] {:?} failed: {}", command, err);
        }
    }

    async fn flush(&mut self) {
        if self.batch.is_empty() {
            return;
        }

        let batch = BatchPoints {
            points: std::mem::take(&mut self.batch),
            database: self.database.clone(),
            retention_policy: self.retention_policy.clone(),
            precision: self.config.precision.clone(),
            write_consistency: self.config.write_consistency.clone(),
        };
        if let Some(throttle) = self.throttle.as_mut() {
            throttle.admit(batch.len()).await;
        }

        let size = batch.len();
        let transport = self.transport;
        let result = self
            .controller
            .run(|token| async move { transport.write(&batch, &token).await })
            .await;

        match result {
            Ok(()) => log::debug!("[IMPORT] Wrote {} points", size),
            Err(e) => {
                self.stats.failed_inserts += size as u64;
                log::warn!("[IMPORT] Batch of {} points failed: {}", size, e);
            },
        }
    }
}
