//! REPL and pipe modes.

use std::io::{self, BufRead};

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::commands::build_repl_cli;
use crate::format::{format_error, format_output, format_parse_error, OutputMode};
use crate::parse::{check_meta_command, matches_to_action, MetaCommand};
use crate::state::SessionState;

const HISTORY_FILE: &str = ".revstore_history";

/// Interactive prompt.
pub fn run_repl(state: &SessionState, mode: OutputMode) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("(error) Failed to start line editor: {}", e);
            return;
        }
    };
    let _ = editor.load_history(HISTORY_FILE);

    loop {
        match editor.readline("revstore> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = editor.add_history_entry(line);

                if let Some(meta) = check_meta_command(line) {
                    match meta {
                        MetaCommand::Quit => break,
                        MetaCommand::Clear => {
                            let _ = editor.clear_screen();
                        }
                        MetaCommand::Help { command } => print_help(command.as_deref()),
                    }
                    continue;
                }

                match run_line(state, line, mode) {
                    Ok(out) => println!("{}", out),
                    Err(err) => eprintln!("{}", err),
                }
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("(error) {}", e);
                break;
            }
        }
    }

    let _ = editor.save_history(HISTORY_FILE);
    if let Err(e) = state.flush() {
        eprintln!("{}", format_error(&e, mode));
    }
}

/// Newline-separated commands on stdin. Returns the exit code: 1 if any
/// command failed.
pub fn run_pipe(state: &SessionState, mode: OutputMode) -> i32 {
    let stdin = io::stdin();
    let mut exit_code = 0;

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                eprintln!("(error) {}", e);
                return 1;
            }
        };
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if check_meta_command(line).is_some() {
            eprintln!("(error) Meta-commands are only available in REPL mode");
            exit_code = 1;
            continue;
        }
        match run_line(state, line, mode) {
            Ok(out) => println!("{}", out),
            Err(err) => {
                eprintln!("{}", err);
                exit_code = 1;
            }
        }
    }

    if let Err(e) = state.flush() {
        eprintln!("{}", format_error(&e, mode));
        exit_code = 1;
    }
    exit_code
}

/// Parse and run one line; the error side is already formatted.
fn run_line(state: &SessionState, line: &str, mode: OutputMode) -> Result<String, String> {
    let args = shlex::split(line).ok_or_else(|| "(error) Unbalanced quotes".to_string())?;
    let matches = build_repl_cli()
        .try_get_matches_from(args)
        .map_err(|e| format!("(error) {}", e.to_string().trim_end()))?;

    let command = matches_to_action(&matches).map_err(|e| format_parse_error(&e, mode))?;

    state
        .execute(command)
        .map(|output| format_output(&output, mode))
        .map_err(|e| format_error(&e, mode))
}

fn print_help(command: Option<&str>) {
    let mut cli = build_repl_cli();
    match command.and_then(|name| cli.find_subcommand_mut(name)) {
        Some(sub) => {
            let _ = sub.print_help();
        }
        None => {
            println!("Commands:");
            for sub in cli.get_subcommands() {
                println!(
                    "  {:<10} {}",
                    sub.get_name(),
                    sub.get_about().map(|s| s.to_string()).unwrap_or_default()
                );
            }
            println!("\nMeta: help [COMMAND], clear, quit");
        }
    }
}
