//! Append-only activity log, one line per store mutation:
//!
//! ```text
//! 2025-06-01 12:30:00 | MOVED | Kai | kai_0001.yaml | to Claude
//! ```

use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use {fd_lock::RwLock, tracing::warn};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    path: Option<PathBuf>,
}

impl ActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A log that records nothing.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one entry. Failures are logged, never returned.
    pub fn record(&self, action: &str, agent: &str, file: &Path, details: &str) {
        let Some(path) = &self.path else {
            return;
        };
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let line = format!(
            "{} | {} | {agent} | {name} | {details}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            action.to_uppercase(),
        );
        if let Err(e) = append_line(path, &line) {
            warn!(path = %path.display(), error = %e, "activity log write failed");
        }
    }

    /// The last `n` entries, oldest first. A missing log has no entries.
    pub fn tail(&self, n: usize) -> Result<Vec<String>> {
        let Some(path) = &self.path else {
            return Ok(Vec::new());
        };
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(path, e)),
        };
        let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
        let start = lines.len().saturating_sub(n);
        Ok(lines[start..].iter().map(|l| (*l).to_string()).collect())
    }
}

fn append_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut lock = RwLock::new(file);
    let mut guard = lock.write()?;
    writeln!(*guard, "{line}")
}
