use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The folder holds no message files.
    #[error("no message in {}", folder.display())]
    NoMessage { folder: PathBuf },

    /// A file expected at call time is not there.
    #[error("not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("refusing to overwrite {}", path.display())]
    AlreadyExists { path: PathBuf },

    /// A fallback copy did not match its source; the source was kept.
    #[error("copy of {} does not match its source", source_path.display())]
    IntegrityMismatch { source_path: PathBuf },

    #[error("unknown agent {name:?}")]
    UnknownAgent { name: String },

    #[error(transparent)]
    Protocol(#[from] midex_protocol::Error),

    #[error(transparent)]
    Common(#[from] midex_common::Error),

    #[error("{message}")]
    Message { message: String },
}

impl Error {
    /// Wrap an I/O failure on `path`, mapping `NotFound` to [`Error::NotFound`].
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { path }
        } else {
            Self::Common(midex_common::Error::io(path, source))
        }
    }

    #[must_use]
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
