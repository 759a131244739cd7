use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use {
    midex_common::names,
    midex_config::ArchiveConfig,
    tracing::{info, warn},
};

use crate::{
    error::{Error, Result},
    layout::{Folder, MessageStore, list_messages},
    relocate::relocate,
};

/// Move the file `file_name` from `from` into `archive_dir`.
///
/// Fails with [`Error::NotFound`] when the file is not in `from`, so archiving
/// the same file twice fails the second time.
pub fn archive(file_name: &str, from: &Path, archive_dir: &Path) -> Result<PathBuf> {
    names::check_component("file name", file_name)?;
    let source = from.join(file_name);
    if !source.is_file() {
        return Err(Error::NotFound { path: source });
    }
    relocate(&source, archive_dir)
}

/// Archive a named message of `agent`, looking in its inbox then its outbox.
pub fn archive_message(store: &MessageStore, agent: &str, file_name: &str) -> Result<PathBuf> {
    let agent = store.agent(agent)?;
    let archive_dir = store.archive(agent)?;
    for folder in [Folder::Inbox, Folder::Outbox] {
        let dir = store.folder(folder, agent)?;
        match archive(file_name, &dir, &archive_dir) {
            Ok(path) => {
                store
                    .log()
                    .record("archived", agent, &path, &format!("from {folder}"));
                return Ok(path);
            },
            Err(Error::NotFound { .. }) => continue,
            Err(e) => return Err(e),
        }
    }
    Err(Error::NotFound {
        path: store.inbox(agent)?.join(file_name),
    })
}

/// When an inbox or outbox file counts as processed.
#[derive(Debug, Clone)]
pub struct ArchiveRule {
    /// File stems ending with this are processed. Empty disables the check.
    pub marker: String,
    /// Files last modified longer ago than this are processed.
    pub max_age: Option<Duration>,
}

impl ArchiveRule {
    pub fn from_config(config: &ArchiveConfig) -> Self {
        Self {
            marker: config.processed_marker.clone(),
            max_age: config
                .max_age_days
                .map(|d| Duration::from_secs(u64::from(d) * 24 * 60 * 60)),
        }
    }

    pub fn is_processed(&self, path: &Path, now: SystemTime) -> bool {
        let marked = !self.marker.is_empty()
            && path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|s| s.ends_with(&self.marker));
        if marked {
            return true;
        }
        let Some(max_age) = self.max_age else {
            return false;
        };
        std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .is_some_and(|age| age > max_age)
    }
}

/// One archived file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archived {
    pub agent: String,
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Archive every processed message in every agent's inbox and outbox.
///
/// A file that fails to move is logged and skipped; the sweep continues.
pub fn archive_processed(store: &MessageStore, rule: &ArchiveRule) -> Result<Vec<Archived>> {
    let now = SystemTime::now();
    let mut archived = Vec::new();
    for agent in store.agents() {
        let archive_dir = store.archive(agent)?;
        for folder in [Folder::Inbox, Folder::Outbox] {
            let dir = store.folder(folder, agent)?;
            for file in list_messages(&dir)? {
                if !rule.is_processed(&file, now) {
                    continue;
                }
                match relocate(&file, &archive_dir) {
                    Ok(to) => {
                        store
                            .log()
                            .record("archived", agent, &to, &format!("from {folder}"));
                        archived.push(Archived {
                            agent: agent.clone(),
                            from: file,
                            to,
                        });
                    },
                    Err(e) => {
                        warn!(path = %file.display(), error = %e, "could not archive message");
                    },
                }
            }
        }
    }
    info!(count = archived.len(), "archive sweep finished");
    Ok(archived)
}
