//! Moving a file between folders without duplicating or losing it.
//!
//! A move is a single `rename`. When source and destination live on different
//! filesystems it becomes copy, verify, delete: the copy lands in a hidden
//! temporary, its SHA-256 is compared with the source's, and the source is
//! removed only after the verified copy has been renamed into place.

use std::{
    fs::{self, File},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use {
    midex_common::names,
    sha2::{Digest, Sha256},
    tracing::{debug, warn},
};

use crate::error::{Error, Result};

/// Upper bound on `-N` suffixes tried before giving up on a free name.
const MAX_NAME_ATTEMPTS: usize = 10_000;

/// Move `source` into `dest_dir`, keeping its file name when free.
///
/// A name already taken in `dest_dir` gets a `-1`, `-2`, … suffix instead of
/// being overwritten. Returns the final path.
pub fn relocate(source: &Path, dest_dir: &Path) -> Result<PathBuf> {
    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::NotFound {
            path: source.to_path_buf(),
        })?;
    if !source.is_file() {
        return Err(Error::NotFound {
            path: source.to_path_buf(),
        });
    }
    fs::create_dir_all(dest_dir).map_err(|e| Error::io(dest_dir, e))?;
    let dest = free_name(dest_dir, name)?;

    match fs::rename(source, &dest) {
        Ok(()) => {
            debug!(from = %source.display(), to = %dest.display(), "renamed");
            Ok(dest)
        },
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            debug!(from = %source.display(), to = %dest.display(), "cross-device, copying");
            copy_verified(source, &dest)?;
            Ok(dest)
        },
        Err(e) => Err(Error::io(source, e)),
    }
}

/// Copy `source` to `dest` through a verified temporary, then remove `source`.
///
/// On digest mismatch the temporary is discarded, `source` is kept and
/// [`Error::IntegrityMismatch`] is returned.
pub fn copy_verified(source: &Path, dest: &Path) -> Result<()> {
    copy_checked(source, dest, digest)
}

fn copy_checked(source: &Path, dest: &Path, digest: impl Fn(&Path) -> Result<Vec<u8>>) -> Result<()> {
    let dir = dest.parent().unwrap_or_else(|| Path::new("."));
    let name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::message(format!("not a file path: {}", dest.display())))?;
    let temp = dir.join(names::temp_name(name));

    let outcome = copy_into(source, &temp, &digest).and_then(|want| {
        let got = digest(&temp)?;
        if got != want {
            return Err(Error::IntegrityMismatch {
                source_path: source.to_path_buf(),
            });
        }
        fs::rename(&temp, dest).map_err(|e| Error::io(dest, e))
    });
    if let Err(e) = outcome {
        let _ = fs::remove_file(&temp);
        return Err(e);
    }

    if let Err(e) = fs::remove_file(source) {
        // The verified copy is in place, so the message is not lost, but it
        // now exists twice.
        warn!(path = %source.display(), error = %e, "copied but could not remove source");
        return Err(Error::io(source, e));
    }
    Ok(())
}

/// Copy `source` to `temp`, preserving its modification time. Returns the
/// source digest.
fn copy_into(
    source: &Path,
    temp: &Path,
    digest: impl Fn(&Path) -> Result<Vec<u8>>,
) -> Result<Vec<u8>> {
    let want = digest(source)?;
    fs::copy(source, temp).map_err(|e| Error::io(source, e))?;
    let modified = fs::metadata(source)
        .and_then(|m| m.modified())
        .map_err(|e| Error::io(source, e))?;
    let copy = File::options()
        .write(true)
        .open(temp)
        .map_err(|e| Error::io(temp, e))?;
    copy.set_modified(modified)
        .and_then(|()| copy.sync_all())
        .map_err(|e| Error::io(temp, e))?;
    Ok(want)
}

fn digest(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(|e| Error::io(path, e))?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| Error::io(path, e))?;
    Ok(hasher.finalize().to_vec())
}

/// `dir/name`, or the first free `-N` variant of it.
pub(crate) fn free_name(dir: &Path, name: &str) -> Result<PathBuf> {
    let first = dir.join(name);
    if !first.exists() {
        return Ok(first);
    }
    (1..=MAX_NAME_ATTEMPTS)
        .map(|n| dir.join(names::numbered(name, n)))
        .find(|p| !p.exists())
        .ok_or_else(|| Error::AlreadyExists { path: first })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moves_without_copying() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("outbox").join("a.yaml");
        fs::create_dir_all(src.parent().unwrap()).unwrap();
        fs::write(&src, "payload").unwrap();

        let dest = relocate(&src, &dir.path().join("inbox")).unwrap();
        assert_eq!(dest, dir.path().join("inbox").join("a.yaml"));
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(dest).unwrap(), "payload");
    }

    #[test]
    fn collisions_get_a_suffix() {
        let dir = tempfile::tempdir().unwrap();
        let inbox = dir.path().join("inbox");
        fs::create_dir_all(&inbox).unwrap();
        fs::write(inbox.join("a.yaml"), "old").unwrap();
        fs::write(inbox.join("a-1.yaml"), "older").unwrap();
        let src = dir.path().join("a.yaml");
        fs::write(&src, "new").unwrap();

        let dest = relocate(&src, &inbox).unwrap();
        assert_eq!(dest, inbox.join("a-2.yaml"));
        assert_eq!(fs::read_to_string(inbox.join("a.yaml")).unwrap(), "old");
        assert_eq!(fs::read_to_string(dest).unwrap(), "new");
    }

    #[test]
    fn missing_source_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = relocate(&dir.path().join("gone.yaml"), dir.path()).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn verified_copy_removes_source_and_keeps_mtime() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.yaml");
        fs::write(&src, "payload").unwrap();
        let mtime = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(1_700_000_000);
        File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(mtime)
            .unwrap();

        let dest = dir.path().join("b.yaml");
        copy_verified(&src, &dest).unwrap();
        assert!(!src.exists());
        assert_eq!(fs::read_to_string(&dest).unwrap(), "payload");
        assert_eq!(fs::metadata(&dest).unwrap().modified().unwrap(), mtime);
        assert!(!dir.path().join(".tmp-b.yaml").exists());
    }

    #[test]
    fn corrupted_copy_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.yaml");
        fs::write(&src, "payload").unwrap();
        let dest = dir.path().join("b.yaml");
        let temp = dir.path().join(names::temp_name("b.yaml"));

        let flip_temp = |path: &Path| -> Result<Vec<u8>> {
            let mut d = digest(path)?;
            if path == temp.as_path() {
                d[0] ^= 0xff;
            }
            Ok(d)
        };
        let err = copy_checked(&src, &dest, flip_temp).unwrap_err();
        assert!(matches!(err, Error::IntegrityMismatch { ref source_path } if *source_path == src));
        assert_eq!(fs::read_to_string(&src).unwrap(), "payload");
        assert!(!dest.exists());
        assert!(!temp.exists());
    }

    #[test]
    fn failed_copy_keeps_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.yaml");
        fs::write(&src, "payload").unwrap();
        let dest = dir.path().join("missing-dir").join("b.yaml");
        assert!(copy_verified(&src, &dest).is_err());
        assert!(src.exists());
    }
}
