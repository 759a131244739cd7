use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Required fields absent or of the wrong shape.
    #[error("malformed record: {reason}")]
    MalformedRecord { reason: String },

    #[error("unsupported message format: .{ext}")]
    UnsupportedFormat { ext: String },

    #[error("failed to encode message: {message}")]
    Encode { message: String },

    #[error(transparent)]
    Common(#[from] midex_common::Error),
}

impl Error {
    #[must_use]
    pub fn malformed(reason: impl std::fmt::Display) -> Self {
        Self::MalformedRecord {
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedRecord { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
