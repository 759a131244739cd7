//! Symbol table validation.
//!
//! Checks a symbol table document for unknown or misspelled sections, broken
//! bounds and labels that fall outside the bounds they are supposed to live in.
//! Message validation against a loaded table lives in `midex-routing`.

use std::{collections::BTreeMap, path::Path};

use crate::schema::{Range, SymbolTable};

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Category: "syntax", "unknown-field", "bounds", "symbols", "file-ref"
    pub category: &'static str,
    /// Dotted path, e.g. "bounds.channel"
    pub path: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        severity: Severity,
        category: &'static str,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            category,
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a symbol table.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
    pub table_path: Option<std::path::PathBuf>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}

/// Top-level sections a symbol table may contain.
const KNOWN_SECTIONS: &[&str] = &["notes", "channels", "velocity", "cc", "bounds"];
const KNOWN_BOUNDS: &[&str] = &["channel", "intensity"];

/// The MIDI data-byte range velocities and controller values live in.
const MIDI_DATA: Range = Range::new(0, 127);
/// Zero-based MIDI channels.
const MIDI_CHANNELS: Range = Range::new(0, 15);

/// Validate the symbol table file at `path`.
#[must_use]
pub fn validate_file(path: &Path) -> ValidationResult {
    let mut result = match std::fs::read_to_string(path) {
        Ok(raw) => {
            let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
            validate_str(&raw, is_json)
        },
        Err(e) => ValidationResult {
            diagnostics: vec![Diagnostic::new(
                Severity::Error,
                "file-ref",
                "",
                format!("failed to read symbol table: {e}"),
            )],
            table_path: None,
        },
    };
    result.table_path = Some(path.to_path_buf());
    result
}

/// Validate raw symbol table text (YAML, or JSON when `is_json`).
#[must_use]
pub fn validate_str(raw: &str, is_json: bool) -> ValidationResult {
    let mut diagnostics = Vec::new();

    // 1. Syntax: parse into a generic tree
    let value: serde_json::Value = if is_json {
        serde_json::from_str(raw).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str::<serde_yaml::Value>(raw)
            .map_err(|e| e.to_string())
            .and_then(|v| serde_json::to_value(v).map_err(|e| e.to_string()))
    }
    .unwrap_or_else(|e| {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "syntax",
            "",
            format!("syntax error: {e}"),
        ));
        serde_json::Value::Null
    });
    if value.is_null() {
        if diagnostics.is_empty() {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "syntax",
                "",
                "symbol table is empty",
            ));
        }
        return ValidationResult {
            diagnostics,
            table_path: None,
        };
    }

    // 2. Unknown sections
    if let Some(map) = value.as_object() {
        check_unknown_keys(map.keys(), KNOWN_SECTIONS, "", &mut diagnostics);
        if let Some(bounds) = map.get("bounds").and_then(|b| b.as_object()) {
            check_unknown_keys(bounds.keys(), KNOWN_BOUNDS, "bounds", &mut diagnostics);
        }
    }

    // 3. Shape: full deserialization
    let table = if is_json {
        serde_json::from_str::<SymbolTable>(raw).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str::<SymbolTable>(raw).map_err(|e| e.to_string())
    };
    match table {
        Ok(table) => diagnostics.extend(validate_table(&table).diagnostics),
        Err(e) => diagnostics.push(Diagnostic::new(
            Severity::Error,
            "type-error",
            "",
            format!("type error: {e}"),
        )),
    }

    ValidationResult {
        diagnostics,
        table_path: None,
    }
}

/// Semantic checks on an already-parsed table.
#[must_use]
pub fn validate_table(table: &SymbolTable) -> ValidationResult {
    let mut diagnostics = Vec::new();

    if table.notes.is_empty() {
        diagnostics.push(Diagnostic::new(
            Severity::Error,
            "symbols",
            "notes",
            "notes table is empty; every message would be rejected",
        ));
    }

    for (name, range, natural) in [
        ("channel", table.bounds.channel, MIDI_CHANNELS),
        ("intensity", table.bounds.intensity, MIDI_DATA),
    ] {
        let path = format!("bounds.{name}");
        if range.min > range.max {
            diagnostics.push(Diagnostic::new(
                Severity::Error,
                "bounds",
                path,
                format!("min {} is greater than max {}", range.min, range.max),
            ));
        } else if !natural.contains(range.min) || !natural.contains(range.max) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "bounds",
                path,
                format!("{range} extends outside the MIDI {name} range {natural}"),
            ));
        }
    }

    for (channel, label) in &table.channels {
        if !table.bounds.channel.contains(*channel) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "bounds",
                format!("channels.{channel}"),
                format!(
                    "channel {channel} ({label}) is outside the channel range {}",
                    table.bounds.channel
                ),
            ));
        }
    }

    for (level, value) in &table.velocity {
        if !table.bounds.intensity.contains(*value) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "bounds",
                format!("velocity.{level}"),
                format!(
                    "level {value} is outside the intensity range {}",
                    table.bounds.intensity
                ),
            ));
        }
    }

    for controller in table.cc.keys() {
        if !MIDI_DATA.contains(*controller) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "bounds",
                format!("cc.{controller}"),
                format!("controller id {controller} is outside {MIDI_DATA}"),
            ));
        }
    }

    check_names(&table.notes, "notes", &mut diagnostics);
    check_names(&table.cc, "cc", &mut diagnostics);

    ValidationResult {
        diagnostics,
        table_path: None,
    }
}

/// Flag blank symbol names and names shared by several codes.
fn check_names(map: &BTreeMap<i32, String>, section: &str, diagnostics: &mut Vec<Diagnostic>) {
    let mut seen: BTreeMap<&str, i32> = BTreeMap::new();
    for (code, name) in map {
        let name = name.trim();
        if name.is_empty() {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "symbols",
                format!("{section}.{code}"),
                "symbol name is blank",
            ));
            continue;
        }
        if let Some(first) = seen.insert(name, *code) {
            seen.insert(name, first);
            diagnostics.push(Diagnostic::new(
                Severity::Info,
                "symbols",
                format!("{section}.{code}"),
                format!("\"{name}\" is also mapped by {first}"),
            ));
        }
    }
}

fn check_unknown_keys<'a>(
    keys: impl Iterator<Item = &'a String>,
    known: &[&str],
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    for key in keys {
        if known.contains(&key.as_str()) {
            continue;
        }
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        let message = match suggest(key, known, 3) {
            Some(s) => format!("unknown field (did you mean \"{s}\"?)"),
            None => "unknown field".to_string(),
        };
        diagnostics.push(Diagnostic::new(
            Severity::Warning,
            "unknown-field",
            path,
            message,
        ));
    }
}

/// Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.chars().enumerate() {
        let mut curr = Vec::with_capacity(b.len() + 1);
        curr.push(i + 1);
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr.push((prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1));
        }
        prev = curr;
    }
    prev[b.len()]
}

/// Closest candidate within `max_distance` edits, if any.
fn suggest<'a>(needle: &str, candidates: &[&'a str], max_distance: usize) -> Option<&'a str> {
    candidates
        .iter()
        .map(|c| (*c, levenshtein(needle, c)))
        .filter(|(_, d)| *d > 0 && *d <= max_distance)
        .min_by_key(|(_, d)| *d)
        .map(|(c, _)| c)
}
