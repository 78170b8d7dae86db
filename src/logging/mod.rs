//! Developer-facing request log.
//!
//! Every failed backend call, and every user-triggered call that succeeded,
//! is appended as one JSON line to `~/.safevision/requests.jsonl`. Writes are
//! best-effort: a log that cannot be written never affects the dashboard.

use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{self, LoggingConfig};

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// Outcome recorded for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Ok,
    Failed,
}

/// One line of the request log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestLogEntry {
    pub timestamp: String,
    /// Request name, e.g. `"stats"` or `"toggle_recording"`.
    pub request: String,
    pub outcome: Outcome,
    /// Error chain for failures, short summary for successes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

// ---------------------------------------------------------------------------
// Log sink
// ---------------------------------------------------------------------------

/// Append-only JSONL request log.
///
/// A log without a path is disabled: appends are dropped and reads return
/// nothing.
#[derive(Debug, Clone, Default)]
pub struct RequestLog {
    path: Option<PathBuf>,
}

impl RequestLog {
    /// Resolve the log from the `[logging]` config section.
    pub fn from_config(config: &LoggingConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        let path = config.path.clone().or_else(default_log_path);
        Self { path }
    }

    /// Log writing to an explicit file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Record a failed request with its full error chain.
    pub fn failure(&self, request: &str, error: &anyhow::Error) {
        self.append(request, Outcome::Failed, Some(format!("{error:#}")));
    }

    /// Record a successful request.
    pub fn success(&self, request: &str, detail: Option<String>) {
        self.append(request, Outcome::Ok, detail);
    }

    fn append(&self, request: &str, outcome: Outcome, detail: Option<String>) {
        let entry = RequestLogEntry {
            timestamp: Utc::now().to_rfc3339(),
            request: request.to_string(),
            outcome,
            detail,
        };
        let _ = self.write_entry(&entry);
    }

    fn write_entry(&self, entry: &RequestLogEntry) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }

    /// Read every entry, skipping malformed lines.
    pub fn read_all(&self) -> Vec<RequestLogEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };

        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(|line| line.ok())
            .filter_map(|line| serde_json::from_str::<RequestLogEntry>(&line).ok())
            .collect()
    }

    /// The last `n` entries, oldest first.
    pub fn tail(&self, n: usize) -> Vec<RequestLogEntry> {
        let mut entries = self.read_all();
        let skip = entries.len().saturating_sub(n);
        entries.drain(..skip);
        entries
    }
}

fn default_log_path() -> Option<PathBuf> {
    config::state_dir().map(|dir| dir.join("requests.jsonl"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
