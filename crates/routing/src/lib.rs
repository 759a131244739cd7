//! Validate messages against the symbol table and route them from an
//! agent's outbox to another agent's inbox.
//!
//! Routing never validates on its own; [`route`] applies the configured
//! [`midex_config::ValidationPolicy`] before moving.

pub mod error;
pub mod router;
pub mod validate;

pub use {
    error::{Error, Result},
    router::{Routed, Selection, most_recent, move_message, move_most_recent, route},
    validate::{FileVerdict, Verdict, validate, validate_folder, validate_for_agents},
};
