//! Interactive menu, the default when no subcommand is given.
//!
//! Each choice runs one operation. Its error is printed and the loop carries
//! on; only end of input or "7" leaves the menu.

use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use {anyhow::Result, midex_protocol::Format, tracing::debug};

use crate::{check_commands, exchange::Exchange, exchange_commands};

const CHOICES: &str = "\
1. Show exchange status
2. Move message
3. Convert symbolic to structured
4. Convert structured to symbolic
5. Archive processed messages
6. Validate outboxes
7. Exit";

pub fn run(ex: &Exchange, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    exchange_commands::init(ex, out)?;
    loop {
        writeln!(out, "\n{CHOICES}")?;
        let Some(choice) = prompt(input, out, "Choice (1-7)")? else {
            return Ok(());
        };
        debug!(%choice, "menu choice");
        let outcome = match choice.as_str() {
            "1" => exchange_commands::show_status(ex, false, out),
            "2" => move_message(ex, input, out),
            "3" => convert(ex, input, out, Format::Structured),
            "4" => convert(ex, input, out, Format::Symbolic),
            "5" => exchange_commands::archive_cmd(ex, None, None, None, out),
            "6" => check_commands::validate(ex, None, out),
            "7" | "q" | "quit" | "exit" => {
                writeln!(out, "Bye.")?;
                return Ok(());
            },
            other => {
                writeln!(out, "Invalid choice {other:?}")?;
                Ok(())
            },
        };
        if let Err(e) = outcome {
            writeln!(out, "error: {e:#}")?;
        }
    }
}

/// Print `label`, read one trimmed line. `None` at end of input.
fn prompt(input: &mut impl BufRead, out: &mut impl Write, label: &str) -> Result<Option<String>> {
    write!(out, "{label}: ")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn required(input: &mut impl BufRead, out: &mut impl Write, label: &str) -> Result<String> {
    match prompt(input, out, label)? {
        Some(v) if !v.is_empty() => Ok(v),
        _ => anyhow::bail!("{label} is required"),
    }
}

fn optional(input: &mut impl BufRead, out: &mut impl Write, label: &str) -> Result<Option<String>> {
    Ok(prompt(input, out, label)?.filter(|v| !v.is_empty()))
}

fn move_message(ex: &Exchange, input: &mut impl BufRead, out: &mut impl Write) -> Result<()> {
    let from = required(input, out, "Sender")?;
    let to = required(input, out, "Recipient")?;
    let id = optional(input, out, "Message ID (empty for most recent)")?;
    exchange_commands::move_cmd(ex, &from, &to, id.as_deref(), None, out)
}

fn convert(
    ex: &Exchange,
    input: &mut impl BufRead,
    out: &mut impl Write,
    target: Format,
) -> Result<()> {
    let label = format!("Message file (.{})", target.other().extension());
    let path = PathBuf::from(required(input, out, &label)?);
    check_commands::convert(ex, &path, None, target, out)
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        midex_config::ExchangeConfig,
        midex_protocol::{SymbolicMessage, Timestamp, codec},
        std::fs,
    };

    fn exchange(root: &std::path::Path) -> Exchange {
        Exchange::from_config(ExchangeConfig {
            root: root.to_path_buf(),
            ..ExchangeConfig::default()
        })
    }

    fn run_script(ex: &Exchange, script: &str) -> String {
        let mut out = Vec::new();
        run(ex, &mut script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn put(dir: &std::path::Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        let msg = SymbolicMessage::new("Kai", "Claude", Timestamp::now(), 62, 1, 110);
        fs::write(dir.join(name), codec::encode_symbolic(&msg).unwrap()).unwrap();
    }

    #[test]
    fn errors_do_not_end_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let ex = exchange(dir.path());
        put(&dir.path().join("inbox/Claude"), "grok_0001_processed.yaml");
        let sent = dir.path().join("outbox/Kai/kai_0001.yaml");
        let script = format!(
            "2\nGrok\nClaude\n\n5\n2\nKai\nClaude\n\n3\n{missing}\n6\n7\n",
            missing = dir.path().join("none.yaml").display(),
        );
        put(sent.parent().unwrap(), "kai_0001.yaml");

        let out = run_script(&ex, &script);
        assert!(out.contains("error: no message in"));
        assert!(out.contains("1 message(s) archived"));
        assert!(out.contains("Moved"));
        assert!(out.contains("0 message(s), 0 invalid"));
        assert!(out.contains("Bye."));
        assert!(dir.path().join("archive/Claude/grok_0001_processed.yaml").is_file());
        assert!(dir.path().join("inbox/Claude/kai_0001.yaml").is_file());
        assert!(!sent.exists());
    }

    #[test]
    fn both_conversions_are_offered() {
        let dir = tempfile::tempdir().unwrap();
        let ex = exchange(dir.path());
        let yaml = dir.path().join("kai_0001.yaml");
        put(dir.path(), "kai_0001.yaml");
        let json = dir.path().join("kai_0001.json");
        let script = format!(
            "3\n{}\n4\n{}\n4\n{}\n7\n",
            yaml.display(),
            json.display(),
            yaml.display(),
        );

        let out = run_script(&ex, &script);
        assert!(json.is_file());
        assert!(dir.path().join("kai_0001-1.yaml").is_file());
        assert!(out.contains("is already a .yaml document"));
    }

    #[test]
    fn end_of_input_exits_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_script(&exchange(dir.path()), "9\n");
        assert!(out.contains("Invalid choice \"9\""));
    }

    #[test]
    fn unknown_agent_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_script(&exchange(dir.path()), "2\nNobody\nClaude\n\n7\n");
        assert!(out.contains("error: unknown agent \"Nobody\""));
    }
}
