//! Moving messages from a sender's outbox into a recipient's inbox.

use std::path::{Path, PathBuf};

use {
    chrono::{DateTime, Utc},
    midex_common::names,
    midex_config::{RecencyKey, RoutingConfig, SymbolTable, ValidationPolicy},
    midex_protocol::codec,
    midex_store::{Error as StoreError, MessageStore, list_messages, relocate},
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    validate::{Verdict, validate_for_agents},
};

/// The outbox file with the greatest recency key.
///
/// Ties on the key go to the lexicographically greatest file name.
pub fn most_recent(outbox: &Path, key: RecencyKey) -> Result<PathBuf> {
    let mut best: Option<(DateTime<Utc>, String, PathBuf)> = None;
    for path in list_messages(outbox)? {
        let when = recency(&path, key)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let newer = best
            .as_ref()
            .is_none_or(|(w, n, _)| (when, name.as_str()) > (*w, n.as_str()));
        if newer {
            best = Some((when, name, path));
        }
    }
    best.map(|(_, _, path)| path).ok_or_else(|| {
        Error::Store(StoreError::NoMessage {
            folder: outbox.to_path_buf(),
        })
    })
}

/// Move the most recent message in `outbox` into `inbox`.
///
/// Recency is the message's own timestamp, or the modification time for files
/// that do not parse. Does not validate. Returns the delivered path.
pub fn move_most_recent(outbox: &Path, inbox: &Path) -> Result<PathBuf> {
    let source = most_recent(outbox, RecencyKey::Timestamp)?;
    Ok(relocate(&source, inbox)?)
}

/// Move the named message `<sender>_<id>.yaml` from the sender's outbox to the
/// recipient's inbox. Does not validate.
pub fn move_message(
    store: &MessageStore,
    sender: &str,
    recipient: &str,
    message_id: &str,
) -> Result<PathBuf> {
    let sender = store.agent(sender)?;
    let recipient = store.agent(recipient)?;
    let source = store.outbox(sender)?.join(file_name(sender, message_id)?);
    let delivered = relocate(&source, &store.inbox(recipient)?)?;
    store
        .log()
        .record("moved", sender, &delivered, &format!("to {recipient}"));
    Ok(delivered)
}

/// Which outbox message [`route`] picks up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    MostRecent,
    /// A message id, with or without the `<sender>_` prefix.
    Named(String),
}

/// A completed move.
#[derive(Debug, Clone)]
pub struct Routed {
    pub from: PathBuf,
    pub to: PathBuf,
    /// `None` when the policy skipped validation.
    pub verdict: Option<Verdict>,
}

/// Select a message from `sender`'s outbox, apply the validation policy and
/// deliver it to `recipient`'s inbox.
///
/// Under [`ValidationPolicy::Enforce`] an invalid or unreadable message stays
/// in the outbox and [`Error::Validation`] is returned.
pub fn route(
    store: &MessageStore,
    symbols: &SymbolTable,
    config: &RoutingConfig,
    sender: &str,
    recipient: &str,
    selection: &Selection,
) -> Result<Routed> {
    let sender = store.agent(sender)?;
    let recipient = store.agent(recipient)?;
    let outbox = store.outbox(sender)?;
    let source = match selection {
        Selection::MostRecent => most_recent(&outbox, config.recency)?,
        Selection::Named(id) => outbox.join(file_name(sender, id)?),
    };
    if !source.is_file() {
        return Err(StoreError::NotFound { path: source }.into());
    }

    let verdict = match config.validation {
        ValidationPolicy::Skip => None,
        policy => {
            let verdict = check_file(&source, symbols, store.agents());
            for w in verdict.warnings() {
                warn!(path = %source.display(), field = %w.path, "{}", w.message);
            }
            if !verdict.ok {
                if policy == ValidationPolicy::Enforce {
                    store.log().record(
                        "rejected",
                        sender,
                        &source,
                        &verdict.reasons.join("; "),
                    );
                    return Err(Error::Validation {
                        reasons: verdict.reasons,
                    });
                }
                warn!(
                    path = %source.display(),
                    reasons = %verdict.reasons.join("; "),
                    "moving invalid message"
                );
            }
            Some(verdict)
        },
    };

    let delivered = relocate(&source, &store.inbox(recipient)?)?;
    store
        .log()
        .record("moved", sender, &delivered, &format!("to {recipient}"));
    info!(from = %source.display(), to = %delivered.display(), "routed message");
    Ok(Routed {
        from: source,
        to: delivered,
        verdict,
    })
}

fn check_file(path: &Path, symbols: &SymbolTable, agents: &[String]) -> Verdict {
    match codec::read_symbolic(path) {
        Ok(msg) => validate_for_agents(&msg, symbols, agents),
        Err(e) => Verdict {
            ok: false,
            reasons: vec![format!("malformed: {e}")],
            diagnostics: Vec::new(),
        },
    }
}

fn file_name(sender: &str, message_id: &str) -> Result<String> {
    let prefix = format!("{}_", sender.to_lowercase());
    let id = message_id.strip_suffix(".yaml").unwrap_or(message_id);
    let id = id.strip_prefix(&prefix).unwrap_or(id);
    Ok(names::message_file_name(sender, id)?)
}

fn recency(path: &Path, key: RecencyKey) -> Result<DateTime<Utc>> {
    if key == RecencyKey::Timestamp {
        match codec::read_symbolic(path) {
            Ok(msg) => return Ok(msg.timestamp.to_utc()),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "unparseable, using mtime");
            },
        }
    }
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| StoreError::io(path, e))?;
    Ok(modified.into())
}
