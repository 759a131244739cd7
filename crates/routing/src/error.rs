use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The message failed validation and the policy refuses to move it.
    #[error("message failed validation: {}", reasons.join("; "))]
    Validation { reasons: Vec<String> },

    #[error(transparent)]
    Store(#[from] midex_store::Error),

    #[error(transparent)]
    Protocol(#[from] midex_protocol::Error),

    #[error(transparent)]
    Common(#[from] midex_common::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
