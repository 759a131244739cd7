use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    env_subst::substitute_env,
    error::{Context, Error, Result},
    schema::{ExchangeConfig, SymbolTable},
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["midex.toml", "midex.yaml", "midex.yml", "midex.json"];

/// Environment variable overriding [`ExchangeConfig::root`].
pub const ROOT_ENV: &str = "MIDEX_ROOT";

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<ExchangeConfig> {
    let raw = read(path)?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./midex.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/midex/midex.{toml,yaml,yml,json}` (user-global)
///
/// Returns `ExchangeConfig::default()` if no config file is found or the one
/// found does not parse.
pub fn discover_and_load() -> ExchangeConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    ExchangeConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/midex/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "midex").map(|d| d.config_dir().to_path_buf())
}

/// Apply environment overrides on top of a loaded config.
pub fn apply_env_overrides(mut config: ExchangeConfig) -> ExchangeConfig {
    if let Some(root) = std::env::var_os(ROOT_ENV).filter(|v| !v.is_empty()) {
        debug!(root = ?root, "root overridden from {ROOT_ENV}");
        config.root = PathBuf::from(root);
    }
    config
}

/// Serialize `config` in the format implied by `path` and write it.
///
/// Creates parent directories if needed.
pub fn save_config(config: &ExchangeConfig, path: &Path) -> Result<()> {
    let text = match extension(path) {
        "toml" => toml::to_string_pretty(config).context("serialize config")?,
        "yaml" | "yml" => serde_yaml::to_string(config).context("serialize config")?,
        "json" => serde_json::to_string_pretty(config).context("serialize config")?,
        ext => {
            return Err(Error::UnsupportedFormat {
                what: "config",
                ext: ext.to_string(),
            });
        },
    };
    write(path, &text)?;
    debug!(path = %path.display(), "saved config");
    Ok(())
}

/// Load a symbol table (YAML or JSON).
pub fn load_symbol_table(path: &Path) -> Result<SymbolTable> {
    let raw = read(path)?;
    let table: SymbolTable = match extension(path) {
        "yaml" | "yml" => serde_yaml::from_str(&raw).map_err(|e| Error::parse(path, e))?,
        "json" => serde_json::from_str(&raw).map_err(|e| Error::parse(path, e))?,
        ext => {
            return Err(Error::UnsupportedFormat {
                what: "symbol table",
                ext: ext.to_string(),
            });
        },
    };
    info!(path = %path.display(), notes = table.notes.len(), "symbol table loaded");
    Ok(table)
}

/// Load the symbol table, writing [`SymbolTable::seed`] first if the file does
/// not exist yet. A table that exists but does not parse is an error.
pub fn load_or_create_symbol_table(path: &Path) -> Result<SymbolTable> {
    if path.exists() {
        return load_symbol_table(path);
    }
    warn!(path = %path.display(), "symbol table not found, creating default");
    let table = SymbolTable::seed();
    save_symbol_table(&table, path)?;
    Ok(table)
}

pub fn save_symbol_table(table: &SymbolTable, path: &Path) -> Result<()> {
    let text = match extension(path) {
        "json" => serde_json::to_string_pretty(table).context("serialize symbol table")?,
        _ => serde_yaml::to_string(table).context("serialize symbol table")?,
    };
    write(path, &text)
}

fn parse_config(raw: &str, path: &Path) -> Result<ExchangeConfig> {
    match extension(path) {
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        ext => Err(Error::UnsupportedFormat {
            what: "config",
            ext: ext.to_string(),
        }),
    }
}

fn extension(path: &Path) -> &str {
    path.extension().and_then(|e| e.to_str()).unwrap_or("toml")
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, text: &str) -> Result<()> {
    let wrap = |source| Error::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(wrap)?;
    }
    std::fs::write(path, text).map_err(wrap)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::schema::{RecencyKey, ValidationPolicy},
    };

    #[test]
    fn loads_toml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("midex.toml");
        std::fs::write(
            &path,
            r#"
root = "/srv/exchange"
agents = ["Kai", "Claude"]

[routing]
validation = "enforce"

[archive]
max_age_days = 7
"#,
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.root, PathBuf::from("/srv/exchange"));
        assert_eq!(cfg.agents, vec!["Kai", "Claude"]);
        assert_eq!(cfg.routing.validation, ValidationPolicy::Enforce);
        assert_eq!(cfg.routing.recency, RecencyKey::Timestamp);
        assert_eq!(cfg.archive.max_age_days, Some(7));
        assert_eq!(cfg.archive.processed_marker, "_processed");
    }

    #[test]
    fn loads_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("midex.yaml");
        std::fs::write(&path, "root: /data/x\nlog:\n  enabled: false\n").unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.root, PathBuf::from("/data/x"));
        assert!(!cfg.log.enabled);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("midex.ini");
        std::fs::write(&path, "root=x").unwrap();
        assert!(matches!(
            load_config(&path),
            Err(Error::UnsupportedFormat { what: "config", .. })
        ));
    }

    #[test]
    fn save_then_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("midex.toml");
        let cfg = ExchangeConfig {
            root: dir.path().join("exchange"),
            ..ExchangeConfig::default()
        };
        save_config(&cfg, &path).unwrap();
        let back = load_config(&path).unwrap();
        assert_eq!(back.root, cfg.root);
        assert_eq!(back.agents, cfg.agents);
    }

    #[test]
    fn creates_default_symbol_table_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symbol_tables").join("table.yaml");
        let table = load_or_create_symbol_table(&path).unwrap();
        assert!(path.exists());
        assert_eq!(table, SymbolTable::seed());
        assert_eq!(load_symbol_table(&path).unwrap(), table);
    }

    #[test]
    fn broken_symbol_table_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.yaml");
        std::fs::write(&path, "notes: [this is: not a map").unwrap();
        assert!(matches!(
            load_or_create_symbol_table(&path),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn toml_symbol_table_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.toml");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(
            load_symbol_table(&path),
            Err(Error::UnsupportedFormat { .. })
        ));
    }
}
