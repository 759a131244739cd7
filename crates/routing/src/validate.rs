//! Message validation.
//!
//! Errors make a message invalid and each one adds a reason to the verdict.
//! Warnings are advisory and never flip `ok`.

use std::path::{Path, PathBuf};

use {
    midex_config::{Diagnostic, Range, Severity, SymbolTable},
    midex_protocol::{SymbolicMessage, codec},
    tracing::debug,
};

use crate::error::Result;

/// Controller values are MIDI data bytes.
const CC_VALUE: Range = Range::new(0, 127);

/// Outcome of validating one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Verdict {
    pub ok: bool,
    /// One entry per violated rule, in check order.
    pub reasons: Vec<String>,
    /// Errors and warnings with their field paths.
    pub diagnostics: Vec<Diagnostic>,
}

impl Verdict {
    fn from_diagnostics(diagnostics: Vec<Diagnostic>) -> Self {
        let reasons: Vec<String> = diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.message.clone())
            .collect();
        Self {
            ok: reasons.is_empty(),
            reasons,
            diagnostics,
        }
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
    }
}

/// Validate `msg` against `symbols`.
#[must_use]
pub fn validate(msg: &SymbolicMessage, symbols: &SymbolTable) -> Verdict {
    Verdict::from_diagnostics(check(msg, symbols))
}

/// Like [`validate`], also warning when sender or recipient is not one of
/// `agents`.
#[must_use]
pub fn validate_for_agents(
    msg: &SymbolicMessage,
    symbols: &SymbolTable,
    agents: &[String],
) -> Verdict {
    let mut diagnostics = check(msg, symbols);
    for (field, name) in [("from", &msg.from), ("to", &msg.to)] {
        if !agents.iter().any(|a| a.eq_ignore_ascii_case(name)) {
            diagnostics.push(Diagnostic::new(
                Severity::Warning,
                "agents",
                field,
                format!("unknown agent {name:?}"),
            ));
        }
    }
    Verdict::from_diagnostics(diagnostics)
}

fn check(msg: &SymbolicMessage, symbols: &SymbolTable) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let bounds = &symbols.bounds;

    if symbols.note_name(msg.note).is_none() {
        out.push(Diagnostic::new(
            Severity::Error,
            "symbols",
            "note",
            format!("unknown code {}", msg.note),
        ));
    }
    if !bounds.channel.contains(msg.channel) {
        out.push(Diagnostic::new(
            Severity::Error,
            "bounds",
            "channel",
            format!("channel out of range: {} not in {}", msg.channel, bounds.channel),
        ));
    }
    if !bounds.intensity.contains(msg.velocity) {
        out.push(Diagnostic::new(
            Severity::Error,
            "bounds",
            "velocity",
            format!(
                "intensity out of range: {} not in {}",
                msg.velocity, bounds.intensity
            ),
        ));
    }

    for (i, &(controller, value)) in msg.cc.iter().enumerate() {
        let path = format!("cc[{i}]");
        // An empty cc table means controllers are not catalogued.
        if !symbols.cc.is_empty() && symbols.cc_topic(controller).is_none() {
            out.push(Diagnostic::new(
                Severity::Warning,
                "symbols",
                path.clone(),
                format!("unknown cc controller {controller}"),
            ));
        }
        if !CC_VALUE.contains(value) {
            out.push(Diagnostic::new(
                Severity::Warning,
                "bounds",
                path,
                format!("cc value out of range: {value} not in {CC_VALUE}"),
            ));
        }
    }
    out
}

/// Verdict for one file of a folder sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileVerdict {
    pub path: PathBuf,
    pub verdict: Verdict,
}

/// Validate every message file directly inside `dir`, checking senders and
/// recipients against `agents` as [`validate_for_agents`] does.
///
/// A file that cannot be read or decoded gets a failing verdict with a
/// `malformed` reason; the sweep carries on.
pub fn validate_folder(
    dir: &Path,
    symbols: &SymbolTable,
    agents: &[String],
) -> Result<Vec<FileVerdict>> {
    let files = midex_store::list_messages(dir)?;
    let verdicts = files
        .into_iter()
        .map(|path| {
            let verdict = match codec::read_symbolic(&path) {
                Ok(msg) => validate_for_agents(&msg, symbols, agents),
                Err(e) => Verdict::from_diagnostics(vec![Diagnostic::new(
                    Severity::Error,
                    "malformed",
                    "",
                    format!("malformed: {e}"),
                )]),
            };
            debug!(path = %path.display(), ok = verdict.ok, "validated");
            FileVerdict { path, verdict }
        })
        .collect();
    Ok(verdicts)
}
