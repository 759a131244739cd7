//! Shared error definitions and file-naming conventions used across all midex crates.

pub mod error;
pub mod names;

pub use error::{Error, FromMessage, Result};
