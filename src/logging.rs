//! Per-run progress logging.
//!
//! Each collector run gets its own [`RunLogger`], scoped to the resolved log
//! directory. Every event is one timestamped line, mirrored to stdout and
//! appended to a run-specific file so failures leave a trace even when the
//! process exits non-zero. The log is diagnostic output only; nothing
//! downstream parses it.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::models::Source;

/// Appends timestamped lines to `<log_dir>/gather_<source>_<timestamp>.log`
/// and mirrors them to stdout.
pub struct RunLogger {
    file: Mutex<File>,
    path: PathBuf,
}

impl RunLogger {
    /// Open a fresh log file for one run, creating the directory if needed.
    pub fn create(log_dir: &Path, source: Source) -> Result<Self> {
        std::fs::create_dir_all(log_dir)
            .with_context(|| format!("failed to create log directory {}", log_dir.display()))?;

        let name = format!(
            "gather_{}_{}.log",
            source.tag(),
            Utc::now().format("%Y-%m-%dT%H-%M-%S")
        );
        let path = log_dir.join(name);
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;

        Ok(Self {
            file: Mutex::new(file),
            path,
        })
    }

    /// Write one `[timestamp] message` line to stdout and the log file.
    ///
    /// Logging never fails the run; file write errors are swallowed.
    pub fn log(&self, message: &str) {
        let line = format!("[{}] {}", Utc::now().format("%Y-%m-%dT%H:%M:%S"), message);
        println!("{}", line);
        if let Ok(mut file) = self.file.lock() {
            let _ = writeln!(file, "{}", line);
            let _ = file.flush();
        }
    }

    /// Path of this run's log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
