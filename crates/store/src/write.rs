use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use {
    fd_lock::RwLock,
    midex_common::names,
    midex_protocol::{SymbolicMessage, codec},
    tracing::debug,
};

use crate::error::{Error, Result};

/// Write `bytes` to `path` so readers see either nothing or the whole file.
///
/// The data goes to a hidden sibling under an exclusive lock, is synced, then
/// renamed over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let (dir, name) = split(path)?;
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    let temp = dir.join(names::temp_name(name));

    let written = (|| -> std::io::Result<()> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp)?;
        let mut lock = RwLock::new(file);
        let mut guard = lock.write()?;
        guard.write_all(bytes)?;
        guard.sync_all()
    })();

    let result = written.and_then(|()| fs::rename(&temp, path));
    if let Err(e) = result {
        let _ = fs::remove_file(&temp);
        return Err(Error::io(path, e));
    }
    debug!(path = %path.display(), bytes = bytes.len(), "wrote file");
    Ok(())
}

/// Atomically write a new symbolic message into `outbox` as `file_name`.
///
/// Never overwrites an existing message.
pub fn write_message(outbox: &Path, file_name: &str, msg: &SymbolicMessage) -> Result<PathBuf> {
    names::check_component("file name", file_name)?;
    let path = outbox.join(file_name);
    if path.exists() {
        return Err(Error::AlreadyExists { path });
    }
    let text = codec::encode_symbolic(msg)?;
    write_atomic(&path, text.as_bytes())?;
    Ok(path)
}

fn split(path: &Path) -> Result<(&Path, &str)> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::message(format!("not a file path: {}", path.display())))?;
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    Ok((dir, name))
}
