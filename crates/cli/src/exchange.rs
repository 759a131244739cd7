//! The loaded configuration and store a command runs against.

use std::path::{Path, PathBuf};

use {
    anyhow::{Context, Result},
    midex_config::{ExchangeConfig, SymbolTable},
    midex_store::MessageStore,
    tracing::debug,
};

pub struct Exchange {
    pub config: ExchangeConfig,
    pub store: MessageStore,
}

impl Exchange {
    /// Load config from `config_path` (or the standard locations), then apply
    /// `MIDEX_ROOT` and finally the `--root` flag.
    pub fn open(config_path: Option<&Path>, root: Option<PathBuf>) -> Result<Self> {
        let config = match config_path {
            Some(path) => midex_config::load_config(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => midex_config::discover_and_load(),
        };
        let mut config = midex_config::apply_env_overrides(config);
        if let Some(root) = root {
            config.root = root;
        }
        debug!(root = %config.root.display(), agents = ?config.agents, "exchange opened");
        Ok(Self::from_config(config))
    }

    pub fn from_config(config: ExchangeConfig) -> Self {
        let store = MessageStore::from_config(&config);
        Self { config, store }
    }

    /// Load the symbol table, writing the default one first if it is missing.
    pub fn symbols(&self) -> Result<SymbolTable> {
        let path = self.config.symbol_table_path();
        midex_config::load_or_create_symbol_table(&path)
            .with_context(|| format!("loading symbol table {}", path.display()))
    }
}
