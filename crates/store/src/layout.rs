use std::{
    fmt,
    path::{Path, PathBuf},
};

use {midex_common::names, midex_config::ExchangeConfig, tracing::debug};

use crate::{
    activity::ActivityLog,
    error::{Error, Result},
};

/// The three per-agent folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Folder {
    Inbox,
    Outbox,
    Archive,
}

impl Folder {
    pub const ALL: [Self; 3] = [Self::Inbox, Self::Outbox, Self::Archive];

    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Inbox => "inbox",
            Self::Outbox => "outbox",
            Self::Archive => "archive",
        }
    }
}

impl fmt::Display for Folder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Paths and conventions of one exchange root.
#[derive(Debug, Clone)]
pub struct MessageStore {
    root: PathBuf,
    agents: Vec<String>,
    log: ActivityLog,
}

impl MessageStore {
    pub fn new(root: impl Into<PathBuf>, agents: Vec<String>) -> Self {
        Self {
            root: root.into(),
            agents,
            log: ActivityLog::disabled(),
        }
    }

    pub fn from_config(config: &ExchangeConfig) -> Self {
        let log = if config.log.enabled {
            ActivityLog::new(config.log_path())
        } else {
            ActivityLog::disabled()
        };
        Self {
            root: config.root.clone(),
            agents: config.agents.clone(),
            log,
        }
    }

    #[must_use]
    pub fn with_log(mut self, log: ActivityLog) -> Self {
        self.log = log;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    pub fn log(&self) -> &ActivityLog {
        &self.log
    }

    /// Resolve `name` case-insensitively against the configured agents.
    pub fn agent(&self, name: &str) -> Result<&str> {
        self.agents
            .iter()
            .find(|a| a.eq_ignore_ascii_case(name))
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownAgent {
                name: name.to_string(),
            })
    }

    /// `<root>/<folder>/<agent>`. The agent name must be a safe path component.
    pub fn folder(&self, folder: Folder, agent: &str) -> Result<PathBuf> {
        names::check_component("agent", agent)?;
        Ok(self.root.join(folder.dir_name()).join(agent))
    }

    pub fn inbox(&self, agent: &str) -> Result<PathBuf> {
        self.folder(Folder::Inbox, agent)
    }

    pub fn outbox(&self, agent: &str) -> Result<PathBuf> {
        self.folder(Folder::Outbox, agent)
    }

    pub fn archive(&self, agent: &str) -> Result<PathBuf> {
        self.folder(Folder::Archive, agent)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn symbol_tables_dir(&self) -> PathBuf {
        self.root.join("symbol_tables")
    }

    /// Every `(folder, agent, path)` triple, in folder then agent order.
    pub fn folders(&self) -> Result<Vec<(Folder, &str, PathBuf)>> {
        let mut out = Vec::with_capacity(Folder::ALL.len() * self.agents.len());
        for folder in Folder::ALL {
            for agent in &self.agents {
                out.push((folder, agent.as_str(), self.folder(folder, agent)?));
            }
        }
        Ok(out)
    }

    /// Create every folder of the layout. Existing folders are left alone.
    pub fn ensure(&self) -> Result<()> {
        let mut dirs: Vec<PathBuf> = self.folders()?.into_iter().map(|(_, _, p)| p).collect();
        dirs.push(self.logs_dir());
        dirs.push(self.symbol_tables_dir());
        for dir in dirs {
            std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        }
        debug!(root = %self.root.display(), agents = self.agents.len(), "layout ensured");
        Ok(())
    }
}

/// Message files directly inside `dir`, sorted by file name.
///
/// A missing directory holds no messages. Hidden temporaries are skipped.
pub fn list_messages(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(Error::io(dir, e)),
    };
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if names::is_message_file(&path) && entry.file_type().is_ok_and(|t| t.is_file()) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}
