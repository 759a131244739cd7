//! `validate`, `check-table`, `to-structured` and `to-symbolic`.

use std::{io::Write, path::Path};

use {
    anyhow::{Result, bail},
    midex_config::{Diagnostic, Severity, validate::validate_file},
    midex_protocol::{Format, codec},
    midex_routing::{FileVerdict, validate_folder, validate_for_agents},
    midex_store::convert_file,
};

use crate::exchange::Exchange;

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const GREEN: &str = "\x1b[32m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn print_diagnostic(out: &mut impl Write, d: &Diagnostic) -> std::io::Result<()> {
    let (color, label) = match d.severity {
        Severity::Error => (RED, "error"),
        Severity::Warning => (YELLOW, "warning"),
        Severity::Info => (CYAN, "info"),
    };
    if d.path.is_empty() {
        writeln!(out, "  {BOLD}{color}{label}{RESET} {}", d.message)
    } else {
        writeln!(out, "  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message)
    }
}

// ── validate ────────────────────────────────────────────────────────────────

/// Validate one message file, one folder, or every outbox when `target` is
/// `None`. Fails if any message is invalid.
pub fn validate(ex: &Exchange, target: Option<&Path>, out: &mut impl Write) -> Result<()> {
    let symbols = ex.symbols()?;
    let verdicts: Vec<FileVerdict> = match target {
        Some(path) if path.is_file() => {
            let verdict = match codec::read_symbolic(path) {
                Ok(msg) => validate_for_agents(&msg, &symbols, ex.store.agents()),
                Err(e) => bail!("{e}"),
            };
            vec![FileVerdict {
                path: path.to_path_buf(),
                verdict,
            }]
        },
        Some(dir) if dir.is_dir() => validate_folder(dir, &symbols, ex.store.agents())?,
        Some(missing) => bail!("no such file or folder: {}", missing.display()),
        None => {
            let mut all = Vec::new();
            for agent in ex.store.agents() {
                all.extend(validate_folder(&ex.store.outbox(agent)?, &symbols, ex.store.agents())?);
            }
            all
        },
    };

    let mut invalid = 0;
    for fv in &verdicts {
        let name = fv.path.display();
        if fv.verdict.ok {
            writeln!(out, "{GREEN}ok{RESET}      {name}")?;
        } else {
            invalid += 1;
            writeln!(out, "{RED}invalid{RESET} {name}")?;
        }
        for d in &fv.verdict.diagnostics {
            print_diagnostic(out, d)?;
        }
    }
    writeln!(out, "{} message(s), {invalid} invalid", verdicts.len())?;
    if invalid > 0 {
        bail!("{invalid} invalid message(s)");
    }
    Ok(())
}

// ── check-table ─────────────────────────────────────────────────────────────

pub fn check_table(ex: &Exchange, path: Option<&Path>, verbose: bool, out: &mut impl Write) -> Result<()> {
    let path = path.map_or_else(|| ex.config.symbol_table_path(), Path::to_path_buf);
    if !path.exists() {
        bail!("symbol table not found: {} (run `midex init`)", path.display());
    }
    writeln!(out, "Checking {}\n", path.display())?;
    let result = validate_file(&path);

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }
        print_diagnostic(out, d)?;
        shown += 1;
    }
    if shown > 0 {
        writeln!(out)?;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if errors == 0 && warnings == 0 {
        writeln!(out, "No issues found.")?;
    } else {
        writeln!(out, "{errors} error(s), {warnings} warning(s)")?;
    }
    if errors > 0 {
        bail!("symbol table has {errors} error(s)");
    }
    Ok(())
}

// ── convert ─────────────────────────────────────────────────────────────────

/// Convert `input` into `target` format, refusing input already in it.
pub fn convert(
    ex: &Exchange,
    input: &Path,
    output: Option<&Path>,
    target: Format,
    out: &mut impl Write,
) -> Result<()> {
    let from = Format::from_path(input)?;
    if from == target {
        bail!(
            "{} is already a .{} document",
            input.display(),
            target.extension()
        );
    }
    let written = convert_file(input, output, &ex.symbols()?)?;
    writeln!(out, "Wrote {}", written.display())?;
    Ok(())
}
