//! File-naming conventions for the message exchange.
//!
//! Message files are `<sender-lowercase>_<id>.yaml`. Names starting with `.`
//! are in-flight temporaries and never count as messages.

use std::path::Path;

use crate::{Error, Result};

/// Extensions recognised as symbolic message documents.
pub const MESSAGE_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// Prefix for hidden temporary files created during atomic writes and copies.
pub const TEMP_PREFIX: &str = ".tmp-";

/// Returns `true` if `path` names a visible symbolic message file.
pub fn is_message_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    if name.starts_with('.') {
        return false;
    }
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| MESSAGE_EXTENSIONS.contains(&ext))
}

/// Reject values that cannot safely become a single path component.
pub fn check_component(what: &'static str, value: &str) -> Result<()> {
    let reason = if value.is_empty() {
        "must not be empty"
    } else if value.contains(['/', '\\']) {
        "must not contain path separators"
    } else if value.starts_with('.') {
        "must not start with '.'"
    } else {
        return Ok(());
    };
    Err(Error::InvalidName {
        what,
        value: value.to_string(),
        reason,
    })
}

/// File name for message `id` sent by `sender`: `kai_0001.yaml`.
pub fn message_file_name(sender: &str, id: &str) -> Result<String> {
    check_component("agent", sender)?;
    check_component("message id", id)?;
    Ok(format!("{}_{id}.yaml", sender.to_lowercase()))
}

/// Hidden sibling name used while a file is being written.
pub fn temp_name(final_name: &str) -> String {
    format!("{TEMP_PREFIX}{final_name}")
}

/// The `n`th collision-free variant of `name`: `kai_0001-2.yaml`.
pub fn numbered(name: &str, n: usize) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{stem}-{n}.{ext}"),
        _ => format!("{name}-{n}"),
    }
}
