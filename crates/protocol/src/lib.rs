//! Message definitions for the symbolic exchange.
//!
//! One message per file, in one of two encodings:
//! - symbolic: compact YAML record (`note`, `velocity`, `cc`, …) written by agents
//! - structured: field-labelled JSON for humans (`code`, `intensity`, `controls`, …)
//!
//! Both encodings carry timestamps as RFC 3339 with an explicit offset; see
//! [`Timestamp`].

pub mod codec;
pub mod convert;
pub mod error;
pub mod message;
pub mod structured;
pub mod timestamp;

pub use {
    codec::Format,
    convert::{to_structured, to_symbolic},
    error::{Error, Result},
    message::{Context, SymbolicMessage},
    structured::{StructuredControl, StructuredMessage},
    timestamp::Timestamp,
};
