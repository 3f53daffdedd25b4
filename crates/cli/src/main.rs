//! Revstore CLI for the versioned resource store.
//!
//! Three modes:
//! - **Shell mode**: `revstore [flags] COMMAND`: single command, exit
//! - **REPL mode**: `revstore [flags]`: interactive prompt (if stdin is TTY)
//! - **Pipe mode**: `echo "read Patient p1" | revstore`: line-by-line from stdin
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

mod commands;
mod format;
mod parse;
mod repl;
mod state;

use std::io::IsTerminal;
use std::path::Path;
use std::process;

use revstore_durability::DurabilityMode;
use revstore_engine::{ResourceStore, StoreConfig};
use tracing_subscriber::EnvFilter;

use commands::build_cli;
use format::{format_error, format_output, format_parse_error, OutputMode};
use parse::matches_to_action;
use state::SessionState;

const DEFAULT_DB: &str = ".revstore";

fn main() {
    init_tracing();

    let cli = build_cli();
    let matches = cli.get_matches();

    let output_mode = if matches.get_flag("json") {
        OutputMode::Json
    } else {
        OutputMode::Human
    };

    let store = match open_store(&matches) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{}", e);
            process::exit(1);
        }
    };
    let state = SessionState::new(store);

    if matches.subcommand().is_some() {
        let exit_code = run_shell_mode(&matches, &state, output_mode);
        process::exit(exit_code);
    } else if std::io::stdin().is_terminal() {
        repl::run_repl(&state, output_mode);
    } else {
        let exit_code = repl::run_pipe(&state, output_mode);
        process::exit(exit_code);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_store(matches: &clap::ArgMatches) -> Result<ResourceStore, String> {
    let mut config = if matches.get_flag("ephemeral") {
        StoreConfig::ephemeral()
    } else {
        let path = matches
            .get_one::<String>("db")
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_DB);
        load_config(Path::new(path))?
    };
    if matches.get_flag("strict") && config.data_dir.is_some() {
        config.durability = DurabilityMode::Strict;
    }
    tracing::debug!(data_dir = ?config.data_dir, durability = ?config.durability, "opening store");
    ResourceStore::open(config).map_err(|e| format!("Failed to open store: {}", e))
}

fn load_config(path: &Path) -> Result<StoreConfig, String> {
    StoreConfig::load_or_default(path)
        .map_err(|e| format!("Failed to load config from {}: {}", path.display(), e))
}

fn run_shell_mode(matches: &clap::ArgMatches, state: &SessionState, mode: OutputMode) -> i32 {
    let command = match matches_to_action(matches) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("{}", format_parse_error(&e, mode));
            return 1;
        }
    };

    let code = match state.execute(command) {
        Ok(output) => {
            let formatted = format_output(&output, mode);
            if !formatted.is_empty() {
                println!("{}", formatted);
            }
            0
        }
        Err(e) => {
            eprintln!("{}", format_error(&e, mode));
            1
        }
    };

    if let Err(e) = state.flush() {
        eprintln!("{}", format_error(&e, mode));
        return 1;
    }
    code
}
