//! clap command tree.
//!
//! The same subcommands serve shell mode (`revstore [flags] COMMAND`) and
//! each REPL/pipe line (parsed with [`build_repl_cli`]).

use clap::{Arg, ArgAction, Command};

/// Top-level CLI: global flags plus every subcommand.
pub fn build_cli() -> Command {
    let cli = Command::new("revstore")
        .about("Versioned resource store with optimistic concurrency")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("db")
                .long("db")
                .value_name("DIR")
                .help("Data directory (default: .revstore)"),
        )
        .arg(
            Arg::new("ephemeral")
                .long("ephemeral")
                .action(ArgAction::SetTrue)
                .conflicts_with("db")
                .help("In-memory store; nothing is written to disk"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .action(ArgAction::SetTrue)
                .help("fsync the journal on every write"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .action(ArgAction::SetTrue)
                .help("Machine-readable JSON output"),
        );
    add_subcommands(cli)
}

/// Parser for one REPL or pipe line.
pub fn build_repl_cli() -> Command {
    add_subcommands(
        Command::new("revstore")
            .no_binary_name(true)
            .disable_help_flag(true)
            .disable_version_flag(true),
    )
}

fn add_subcommands(cli: Command) -> Command {
    cli.subcommand(
        Command::new("create")
            .about("Create a resource; a server id is assigned when ID is omitted")
            .arg(resource_type())
            .arg(
                Arg::new("args")
                    .value_name("[ID] JSON")
                    .num_args(1..=2)
                    .required(true),
            ),
    )
    .subcommand(
        Command::new("update")
            .about("Write a new version")
            .arg(resource_type())
            .arg(id())
            .arg(body())
            .arg(if_match())
            .arg(
                Arg::new("if-none-match")
                    .long("if-none-match")
                    .value_name("*")
                    .help("Only create; fail if the resource is active"),
            ),
    )
    .subcommand(
        Command::new("delete")
            .about("Logically delete (append a tombstone)")
            .arg(resource_type())
            .arg(id())
            .arg(if_match()),
    )
    .subcommand(
        Command::new("erase")
            .about("Permanently remove every version")
            .arg(resource_type())
            .arg(id())
            .arg(
                Arg::new("reason")
                    .long("reason")
                    .value_name("TEXT")
                    .help("Recorded with the erase"),
            ),
    )
    .subcommand(
        Command::new("read")
            .about("Read the current version")
            .arg(resource_type())
            .arg(id())
            .arg(
                Arg::new("if-none-match")
                    .long("if-none-match")
                    .value_name("ETAG")
                    .help("Report 304 when this is still the current version"),
            ),
    )
    .subcommand(
        Command::new("vread")
            .about("Read a specific version")
            .arg(resource_type())
            .arg(id())
            .arg(Arg::new("version").required(true).value_name("VERSION")),
    )
    .subcommand(
        Command::new("history")
            .about("List versions, newest first")
            .arg(resource_type())
            .arg(id())
            .arg(Arg::new("limit").long("limit").value_name("N"))
            .arg(
                Arg::new("before")
                    .long("before")
                    .value_name("VERSION")
                    .help("Only versions older than this"),
            ),
    )
    .subcommand(
        Command::new("list")
            .about("List ids of a resource type")
            .arg(resource_type()),
    )
    .subcommand(Command::new("flush").about("fsync the journal"))
    .subcommand(Command::new("compact").about("Rewrite the journal without erased data"))
    .subcommand(Command::new("info").about("Store summary"))
}

fn resource_type() -> Arg {
    Arg::new("type").required(true).value_name("TYPE")
}

fn id() -> Arg {
    Arg::new("id").required(true).value_name("ID")
}

fn body() -> Arg {
    Arg::new("json").required(true).value_name("JSON")
}

fn if_match() -> Arg {
    Arg::new("if-match")
        .long("if-match")
        .value_name("ETAG")
        .help("Only write if the current version matches (W/\"<n>\")")
}
