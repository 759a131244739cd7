/// Config schema types: exchange layout, routing policy, archive rules and
/// the symbol table messages are validated against.
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

/// Agents seeded into a fresh exchange.
pub const DEFAULT_AGENTS: &[&str] = &["Kai", "Claude", "Perplexity", "Grok"];

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// Directory holding `inbox/`, `outbox/`, `archive/`, `logs/` and
    /// `symbol_tables/`.
    pub root: PathBuf,
    /// The closed set of agent names that own an inbox and an outbox.
    pub agents: Vec<String>,
    /// Symbol table location. Relative paths resolve against `root`.
    pub symbol_table: PathBuf,
    pub routing: RoutingConfig,
    pub archive: ArchiveConfig,
    pub log: LogConfig,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            agents: DEFAULT_AGENTS.iter().map(|a| (*a).to_string()).collect(),
            symbol_table: PathBuf::from("symbol_tables/symbol_table_v0.1.yaml"),
            routing: RoutingConfig::default(),
            archive: ArchiveConfig::default(),
            log: LogConfig::default(),
        }
    }
}

impl ExchangeConfig {
    /// Absolute (or root-relative) path of the symbol table.
    #[must_use]
    pub fn symbol_table_path(&self) -> PathBuf {
        resolve(&self.root, &self.symbol_table)
    }

    /// Path of the activity log file.
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        resolve(&self.root, &self.log.file)
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// `<data dir>/exchange`, or `./MIDI_Exchange` when no home directory exists.
fn default_root() -> PathBuf {
    directories::ProjectDirs::from("", "", "midex")
        .map(|d| d.data_dir().join("exchange"))
        .unwrap_or_else(|| PathBuf::from("MIDI_Exchange"))
}

/// What a move does with a message that fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Move without reading the message.
    Skip,
    /// Validate, log violations, move anyway.
    #[default]
    Warn,
    /// Refuse to move an invalid message.
    Enforce,
}

/// Which value decides the "most recent" message in an outbox.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecencyKey {
    /// The message's own `timestamp` field, falling back to the file's
    /// modification time when the file cannot be parsed.
    #[default]
    Timestamp,
    /// Filesystem modification time only.
    Modified,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub validation: ValidationPolicy,
    pub recency: RecencyKey,
}

/// Rules deciding which inbox/outbox files count as processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveConfig {
    /// File-stem suffix marking a message as processed (`kai_0001_processed.yaml`).
    pub processed_marker: String,
    /// Also archive messages whose modification time is older than this.
    pub max_age_days: Option<u32>,
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            processed_marker: "_processed".into(),
            max_age_days: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Append one line per mutation to the activity log.
    pub enabled: bool,
    /// Relative paths resolve against `root`.
    pub file: PathBuf,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: PathBuf::from("logs/exchange.log"),
        }
    }
}

// ── Symbol table ────────────────────────────────────────────────────────────

/// Inclusive integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub min: i32,
    pub max: i32,
}

impl Range {
    #[must_use]
    pub const fn new(min: i32, max: i32) -> Self {
        Self { min, max }
    }

    #[must_use]
    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bounds {
    pub channel: Range,
    pub intensity: Range,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            channel: Range::new(0, 15),
            intensity: Range::new(0, 127),
        }
    }
}

/// Static mapping of note codes to symbolic names plus validation bounds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SymbolTable {
    /// Note code -> symbolic name. Only codes listed here are valid.
    pub notes: BTreeMap<i32, String>,
    /// Channel -> label (informational).
    pub channels: BTreeMap<i32, String>,
    /// Named velocity levels.
    pub velocity: BTreeMap<String, i32>,
    /// Controller id -> topic.
    pub cc: BTreeMap<i32, String>,
    pub bounds: Bounds,
}

impl SymbolTable {
    /// Table with only `notes` and `bounds` set.
    #[must_use]
    pub fn with_notes<S: Into<String>>(
        notes: impl IntoIterator<Item = (i32, S)>,
        bounds: Bounds,
    ) -> Self {
        Self {
            notes: notes.into_iter().map(|(c, n)| (c, n.into())).collect(),
            bounds,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn note_name(&self, code: i32) -> Option<&str> {
        self.notes.get(&code).map(String::as_str)
    }

    #[must_use]
    pub fn channel_label(&self, channel: i32) -> Option<&str> {
        self.channels.get(&channel).map(String::as_str)
    }

    #[must_use]
    pub fn cc_topic(&self, controller: i32) -> Option<&str> {
        self.cc.get(&controller).map(String::as_str)
    }

    /// The table written when none exists yet.
    #[must_use]
    pub fn seed() -> Self {
        let notes = [
            (60, "confirm"),
            (61, "query"),
            (62, "reflection"),
            (63, "agreement"),
            (64, "inquiry"),
            (65, "proposal"),
            (66, "clarify"),
            (67, "challenge"),
            (68, "refer_to_standard"),
            (69, "synthesize"),
            (70, "acknowledge"),
            (71, "disagree"),
        ];
        let cc = [
            (1, "topic_ethics"),
            (2, "topic_memory"),
            (3, "topic_semantics"),
            (4, "topic_creativity"),
            (5, "topic_philosophy"),
            (6, "topic_technical"),
        ];
        Self {
            notes: notes.iter().map(|(c, n)| (*c, (*n).to_string())).collect(),
            channels: DEFAULT_AGENTS
                .iter()
                .zip(1..)
                .map(|(agent, ch)| (ch, (*agent).to_string()))
                .collect(),
            velocity: [("low", 32), ("medium", 64), ("high", 95), ("maximum", 127)]
                .iter()
                .map(|(k, v)| ((*k).to_string(), *v))
                .collect(),
            cc: cc.iter().map(|(c, t)| (*c, (*t).to_string())).collect(),
            bounds: Bounds::default(),
        }
    }
}
