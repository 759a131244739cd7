mod check_commands;
mod exchange;
mod exchange_commands;
mod menu;

use std::path::PathBuf;

use {
    clap::{Parser, Subcommand},
    midex_protocol::Format,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use crate::{
    exchange::Exchange,
    exchange_commands::{Policy, SendArgs},
};

#[derive(Parser)]
#[command(name = "midex", about = "midex: symbolic MIDI message exchange", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file (overrides the standard search locations).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Exchange root (overrides config and MIDEX_ROOT).
    #[arg(long, global = true)]
    root: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu (default when no subcommand is provided).
    Menu,
    /// Create the folder layout and the default symbol table.
    Init,
    /// Message counts and latest activity per folder.
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Move a message from a sender's outbox to a recipient's inbox.
    Move {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Message id (`0001` or `kai_0001`). Defaults to the most recent.
        #[arg(long)]
        id: Option<String>,
        /// Override the configured validation policy.
        #[arg(long, value_enum)]
        policy: Option<Policy>,
    },
    /// Convert a symbolic `.yaml` message into structured JSON.
    ToStructured {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert a structured `.json` message into a symbolic document.
    ToSymbolic {
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Archive one message, or sweep every processed message.
    Archive {
        #[arg(long, requires = "file")]
        agent: Option<String>,
        #[arg(long, requires = "agent")]
        file: Option<String>,
        /// Also archive messages older than this many days.
        #[arg(long, conflicts_with = "file")]
        older_than: Option<u32>,
    },
    /// Validate a message file, a folder, or every outbox.
    Validate { path: Option<PathBuf> },
    /// Write a test message into the sender's outbox.
    Send {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        id: Option<String>,
        #[arg(long, default_value_t = 62)]
        note: i32,
        #[arg(long, default_value_t = 110)]
        velocity: i32,
        #[arg(long)]
        channel: Option<i32>,
    },
    /// Check the symbol table and report errors/warnings.
    CheckTable {
        /// Table to check instead of the configured one.
        path: Option<PathBuf>,
        /// Show informational diagnostics in addition to errors and warnings.
        #[arg(long)]
        verbose: bool,
    },
    /// Show the last entries of the activity log.
    Log {
        #[arg(short = 'n', long, default_value_t = 20)]
        lines: usize,
    },
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "midex starting");

    let ex = Exchange::open(cli.config.as_deref(), cli.root)?;
    let out = &mut std::io::stdout().lock();

    match cli.command {
        None | Some(Commands::Menu) => menu::run(&ex, &mut std::io::stdin().lock(), out),
        Some(Commands::Init) => exchange_commands::init(&ex, out),
        Some(Commands::Status { json }) => exchange_commands::show_status(&ex, json, out),
        Some(Commands::Move {
            from,
            to,
            id,
            policy,
        }) => exchange_commands::move_cmd(&ex, &from, &to, id.as_deref(), policy, out),
        Some(Commands::ToStructured { input, output }) => {
            check_commands::convert(&ex, &input, output.as_deref(), Format::Structured, out)
        },
        Some(Commands::ToSymbolic { input, output }) => {
            check_commands::convert(&ex, &input, output.as_deref(), Format::Symbolic, out)
        },
        Some(Commands::Archive {
            agent,
            file,
            older_than,
        }) => exchange_commands::archive_cmd(&ex, agent.as_deref(), file.as_deref(), older_than, out),
        Some(Commands::Validate { path }) => check_commands::validate(&ex, path.as_deref(), out),
        Some(Commands::Send {
            from,
            to,
            id,
            note,
            velocity,
            channel,
        }) => {
            let args = SendArgs {
                from: &from,
                to: &to,
                id: id.as_deref(),
                note,
                velocity,
                channel,
            };
            exchange_commands::send(&ex, &args, out)
        },
        Some(Commands::CheckTable { path, verbose }) => {
            check_commands::check_table(&ex, path.as_deref(), verbose, out)
        },
        Some(Commands::Log { lines }) => exchange_commands::show_log(&ex, lines, out),
    }
}

#[cfg(test)]
mod tests {
    use {super::*, clap::CommandFactory};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn archive_flags_pair_up() {
        assert!(Cli::try_parse_from(["midex", "archive", "--agent", "Kai"]).is_err());
        assert!(
            Cli::try_parse_from(["midex", "archive", "--agent", "Kai", "--file", "a.yaml"]).is_ok()
        );
        assert!(Cli::try_parse_from(["midex", "archive", "--older-than", "7"]).is_ok());
    }

    #[test]
    fn move_policy_parses() {
        let cli = Cli::try_parse_from([
            "midex", "move", "--from", "Kai", "--to", "Claude", "--policy", "enforce",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Move {
                policy: Some(Policy::Enforce),
                ..
            })
        ));
    }
}
