use std::io::Write;

use {
    anyhow::{Result, bail},
    clap::ValueEnum,
    midex_common::names,
    midex_config::{ValidationPolicy, save_symbol_table},
    midex_protocol::{Context, SymbolicMessage, Timestamp},
    midex_routing::{Selection, route, validate_for_agents},
    midex_store::{ArchiveRule, Folder, archive_message, archive_processed, status, write_message},
    tracing::info,
};

use crate::exchange::Exchange;

/// Activity-log lines shown under the status table.
const STATUS_LOG_LINES: usize = 5;

/// `--policy` values for `move`.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Policy {
    Skip,
    Warn,
    Enforce,
}

impl From<Policy> for ValidationPolicy {
    fn from(p: Policy) -> Self {
        match p {
            Policy::Skip => Self::Skip,
            Policy::Warn => Self::Warn,
            Policy::Enforce => Self::Enforce,
        }
    }
}

// ── init ────────────────────────────────────────────────────────────────────

pub fn init(ex: &Exchange, out: &mut impl Write) -> Result<()> {
    ex.store.ensure()?;
    let table_path = ex.config.symbol_table_path();
    if table_path.exists() {
        writeln!(out, "Symbol table: {} (kept)", table_path.display())?;
    } else {
        save_symbol_table(&midex_config::SymbolTable::seed(), &table_path)?;
        writeln!(out, "Symbol table: {} (created)", table_path.display())?;
    }
    writeln!(
        out,
        "Exchange ready at {} for {}",
        ex.store.root().display(),
        ex.store.agents().join(", ")
    )?;
    Ok(())
}

// ── status ──────────────────────────────────────────────────────────────────

pub fn show_status(ex: &Exchange, json: bool, out: &mut impl Write) -> Result<()> {
    let report = status(&ex.store)?;
    if json {
        let map: serde_json::Map<String, serde_json::Value> = report
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&map)?)?;
        return Ok(());
    }

    writeln!(out, "Exchange at {}", ex.store.root().display())?;
    for agent in ex.store.agents() {
        let cell = |folder: Folder| {
            let st = report
                .get(&format!("{folder}/{agent}"))
                .copied()
                .unwrap_or_default();
            match st.latest {
                Some(t) => format!("{} {} (latest {})", st.count, folder, t.format("%Y-%m-%d %H:%M")),
                None => format!("{} {}", st.count, folder),
            }
        };
        writeln!(
            out,
            "  {agent:<12} {} | {} | {}",
            cell(Folder::Inbox),
            cell(Folder::Outbox),
            cell(Folder::Archive)
        )?;
    }

    let recent = ex.store.log().tail(STATUS_LOG_LINES)?;
    if !recent.is_empty() {
        writeln!(out, "\nRecent activity:")?;
        for line in recent {
            writeln!(out, "  {line}")?;
        }
    }
    Ok(())
}

// ── move ────────────────────────────────────────────────────────────────────

pub fn move_cmd(
    ex: &Exchange,
    from: &str,
    to: &str,
    id: Option<&str>,
    policy: Option<Policy>,
    out: &mut impl Write,
) -> Result<()> {
    let symbols = ex.symbols()?;
    let mut routing = ex.config.routing.clone();
    if let Some(policy) = policy {
        routing.validation = policy.into();
    }
    let selection = id.map_or(Selection::MostRecent, |id| Selection::Named(id.to_string()));

    let routed = route(&ex.store, &symbols, &routing, from, to, &selection)?;
    if let Some(verdict) = &routed.verdict {
        for reason in &verdict.reasons {
            writeln!(out, "warning: {reason}")?;
        }
    }
    writeln!(out, "Moved {} -> {}", routed.from.display(), routed.to.display())?;
    Ok(())
}

// ── archive ─────────────────────────────────────────────────────────────────

pub fn archive_cmd(
    ex: &Exchange,
    agent: Option<&str>,
    file: Option<&str>,
    older_than_days: Option<u32>,
    out: &mut impl Write,
) -> Result<()> {
    match (agent, file) {
        (Some(agent), Some(file)) => {
            let path = archive_message(&ex.store, agent, file)?;
            writeln!(out, "Archived {}", path.display())?;
        },
        (None, None) => {
            let mut config = ex.config.archive.clone();
            if older_than_days.is_some() {
                config.max_age_days = older_than_days;
            }
            let archived = archive_processed(&ex.store, &ArchiveRule::from_config(&config))?;
            for a in &archived {
                writeln!(out, "Archived {} -> {}", a.from.display(), a.to.display())?;
            }
            writeln!(out, "{} message(s) archived", archived.len())?;
        },
        _ => bail!("--agent and --file must be given together"),
    }
    Ok(())
}

// ── send ────────────────────────────────────────────────────────────────────

pub struct SendArgs<'a> {
    pub from: &'a str,
    pub to: &'a str,
    pub id: Option<&'a str>,
    pub note: i32,
    pub velocity: i32,
    pub channel: Option<i32>,
}

/// Write a sample message into the sender's outbox. Invalid messages are not
/// written.
pub fn send(ex: &Exchange, args: &SendArgs<'_>, out: &mut impl Write) -> Result<()> {
    let symbols = ex.symbols()?;
    let from = ex.store.agent(args.from)?.to_string();
    let to = ex.store.agent(args.to)?.to_string();
    let outbox = ex.store.outbox(&from)?;

    let id = match args.id {
        Some(id) => id.to_string(),
        None => next_id(&outbox, &from)?,
    };
    let file_name = names::message_file_name(&from, &id)?;
    // Channels follow the agent order, starting at 1.
    let channel = args.channel.unwrap_or_else(|| {
        ex.store
            .agents()
            .iter()
            .position(|a| *a == from)
            .and_then(|i| i32::try_from(i + 1).ok())
            .unwrap_or(1)
    });

    let mut msg = SymbolicMessage::new(&from, &to, Timestamp::now(), args.note, channel, args.velocity);
    msg.message_id = Some(format!("{}_{id}", from.to_lowercase()));
    msg.context = Context {
        intent: Some("test_message".into()),
        tone: Some("experimental".into()),
        topic: Some("symbolic_midi_testing".into()),
    };
    msg.human_readable = Some(format!("Test message from {from} to {to}"));

    let verdict = validate_for_agents(&msg, &symbols, ex.store.agents());
    if !verdict.ok {
        bail!("message failed validation: {}", verdict.reasons.join("; "));
    }
    let path = write_message(&outbox, &file_name, &msg)?;
    ex.store.log().record("created", &from, &path, &format!("for {to}"));
    info!(path = %path.display(), "message written");
    writeln!(out, "Wrote {}", path.display())?;
    Ok(())
}

/// First free four-digit id in `outbox`.
fn next_id(outbox: &std::path::Path, sender: &str) -> Result<String> {
    for n in 1..=9999 {
        let id = format!("{n:04}");
        if !outbox.join(names::message_file_name(sender, &id)?).exists() {
            return Ok(id);
        }
    }
    bail!("no free message id in {}", outbox.display())
}

// ── log ─────────────────────────────────────────────────────────────────────

pub fn show_log(ex: &Exchange, lines: usize, out: &mut impl Write) -> Result<()> {
    match ex.store.log().path() {
        Some(path) => writeln!(out, "Activity log: {}", path.display())?,
        None => {
            writeln!(out, "Activity logging is disabled.")?;
            return Ok(());
        },
    }
    for line in ex.store.log().tail(lines)? {
        writeln!(out, "  {line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use {super::*, midex_config::ExchangeConfig, std::fs};

    fn exchange(root: &std::path::Path) -> Exchange {
        let config = ExchangeConfig {
            root: root.to_path_buf(),
            ..ExchangeConfig::default()
        };
        let ex = Exchange::from_config(config);
        init(&ex, &mut Vec::new()).unwrap();
        ex
    }

    fn text(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn init_seeds_layout_and_table() {
        let dir = tempfile::tempdir().unwrap();
        let ex = exchange(dir.path());
        assert!(dir.path().join("outbox/Grok").is_dir());
        assert!(ex.config.symbol_table_path().is_file());

        let mut out = Vec::new();
        init(&ex, &mut out).unwrap();
        assert!(text(out).contains("(kept)"));
    }

    #[test]
    fn send_then_move_then_status() {
        let dir = tempfile::tempdir().unwrap();
        let ex = exchange(dir.path());
        let args = SendArgs {
            from: "kai",
            to: "Claude",
            id: None,
            note: 62,
            velocity: 110,
            channel: None,
        };
        send(&ex, &args, &mut Vec::new()).unwrap();
        send(&ex, &args, &mut Vec::new()).unwrap();
        assert!(dir.path().join("outbox/Kai/kai_0001.yaml").is_file());
        assert!(dir.path().join("outbox/Kai/kai_0002.yaml").is_file());

        move_cmd(&ex, "Kai", "Claude", Some("0001"), None, &mut Vec::new()).unwrap();
        assert!(dir.path().join("inbox/Claude/kai_0001.yaml").is_file());

        let mut out = Vec::new();
        show_status(&ex, false, &mut out).unwrap();
        let out = text(out);
        assert!(out.contains("Recent activity"));
        assert!(out.contains("| MOVED | Kai | kai_0001.yaml | to Claude"));

        let mut out = Vec::new();
        show_status(&ex, true, &mut out).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["outbox/Kai"]["count"], 1);
        assert_eq!(json["inbox/Claude"]["count"], 1);
    }

    #[test]
    fn send_refuses_invalid_message() {
        let dir = tempfile::tempdir().unwrap();
        let ex = exchange(dir.path());
        let args = SendArgs {
            from: "Kai",
            to: "Claude",
            id: Some("bad"),
            note: 5,
            velocity: 110,
            channel: None,
        };
        let err = send(&ex, &args, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("unknown code"));
        assert!(!dir.path().join("outbox/Kai/kai_bad.yaml").exists());
    }

    #[test]
    fn archive_requires_agent_and_file_together() {
        let dir = tempfile::tempdir().unwrap();
        let ex = exchange(dir.path());
        assert!(archive_cmd(&ex, Some("Kai"), None, None, &mut Vec::new()).is_err());

        fs::write(dir.path().join("inbox/Kai/claude_0001_processed.yaml"), "x").unwrap();
        let mut out = Vec::new();
        archive_cmd(&ex, None, None, None, &mut out).unwrap();
        assert!(text(out).contains("1 message(s) archived"));
        assert!(dir.path().join("archive/Kai/claude_0001_processed.yaml").is_file());
    }
}
