//! Exchange configuration and symbol-table loading.
//!
//! Config files: `midex.toml`, `midex.yaml`, `midex.yml` or `midex.json`,
//! searched in `./` then `~/.config/midex/`. String values support `${VAR}`
//! and `${VAR:-default}` substitution.
//!
//! The symbol table is a YAML or JSON document mapping note codes to symbolic
//! names plus the channel and intensity bounds messages are validated against.
//! It is loaded once per run and passed explicitly to whoever needs it.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config,
        load_or_create_symbol_table, load_symbol_table, save_config, save_symbol_table,
    },
    schema::{
        ArchiveConfig, Bounds, ExchangeConfig, LogConfig, Range, RecencyKey, RoutingConfig,
        SymbolTable, ValidationPolicy,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
