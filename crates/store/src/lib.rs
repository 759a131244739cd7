//! The on-disk message store.
//!
//! Layout under the exchange root:
//!
//! ```text
//! inbox/<Agent>/     messages delivered to an agent
//! outbox/<Agent>/    messages an agent has written and not yet routed
//! archive/<Agent>/   processed messages; never scanned again
//! logs/exchange.log  activity log
//! symbol_tables/     symbol table documents
//! ```
//!
//! Messages are only ever relocated, never edited in place or deleted.

pub mod activity;
pub mod archive;
pub mod convert;
pub mod error;
pub mod layout;
pub mod relocate;
pub mod status;
pub mod write;

pub use {
    activity::ActivityLog,
    archive::{ArchiveRule, Archived, archive, archive_message, archive_processed},
    convert::convert_file,
    error::{Error, Result},
    layout::{Folder, MessageStore, list_messages},
    relocate::{copy_verified, relocate},
    status::{FolderStatus, folder_status, status},
    write::{write_atomic, write_message},
};
