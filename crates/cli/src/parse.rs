//! ArgMatches → StoreCommand conversion, plus REPL meta-commands.
//!
//! Header-style arguments (`--if-match`, `--if-none-match`) are parsed here
//! with the wire rules, so a malformed ETag is rejected before the store is
//! touched.

use clap::ArgMatches;
use revstore_core::{HistoryQuery, Payload, Precondition, ReadCondition, ResourceKey};
use revstore_wire::{parse_if_match, parse_if_none_match, HeaderError};

/// Store commands.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreCommand {
    Create {
        resource_type: String,
        id: Option<String>,
        payload: Payload,
    },
    Update {
        key: ResourceKey,
        payload: Payload,
        precondition: Precondition,
    },
    Delete {
        key: ResourceKey,
        precondition: Precondition,
    },
    Erase {
        key: ResourceKey,
        reason: Option<String>,
    },
    Read {
        key: ResourceKey,
        condition: ReadCondition,
    },
    Vread {
        key: ResourceKey,
        version_id: u64,
    },
    History {
        key: ResourceKey,
        query: HistoryQuery,
    },
    List {
        resource_type: String,
    },
    Flush,
    Compact,
    Info,
}

/// REPL meta-commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    Help { command: Option<String> },
    Quit,
    Clear,
}

/// Parse failure.
#[derive(Debug)]
pub enum ParseError {
    /// Bad arguments
    Usage(String),
    /// Malformed ETag header value
    Header(HeaderError),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Usage(msg) => f.write_str(msg),
            ParseError::Header(e) => write!(f, "{}", e),
        }
    }
}

impl From<HeaderError> for ParseError {
    fn from(e: HeaderError) -> Self {
        ParseError::Header(e)
    }
}

impl From<String> for ParseError {
    fn from(msg: String) -> Self {
        ParseError::Usage(msg)
    }
}

/// Check for REPL meta-commands before delegating to clap.
///
/// Returns `Some(MetaCommand)` if the line is a meta-command, `None` otherwise.
pub fn check_meta_command(line: &str) -> Option<MetaCommand> {
    let trimmed = line.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next()?;

    match cmd {
        "quit" | "exit" => Some(MetaCommand::Quit),
        "clear" => Some(MetaCommand::Clear),
        "help" => {
            let command = parts
                .next()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty());
            Some(MetaCommand::Help { command })
        }
        _ => None,
    }
}

/// Convert clap ArgMatches into a StoreCommand.
pub fn matches_to_action(matches: &ArgMatches) -> Result<StoreCommand, ParseError> {
    let (sub_name, m) = matches
        .subcommand()
        .ok_or_else(|| ParseError::Usage("No command provided".to_string()))?;

    let command = match sub_name {
        "create" => parse_create(m)?,
        "update" => parse_update(m)?,
        "delete" => StoreCommand::Delete {
            key: key(m)?,
            precondition: match m.get_one::<String>("if-match") {
                Some(etag) => Precondition::IfMatch(parse_if_match(etag)?),
                None => Precondition::None,
            },
        },
        "erase" => StoreCommand::Erase {
            key: key(m)?,
            reason: m.get_one::<String>("reason").cloned(),
        },
        "read" => StoreCommand::Read {
            key: key(m)?,
            condition: m
                .get_one::<String>("if-none-match")
                .map(|v| parse_if_none_match(v).read_condition())
                .unwrap_or(ReadCondition::None),
        },
        "vread" => StoreCommand::Vread {
            key: key(m)?,
            version_id: number(m, "version")?.ok_or_else(|| usage("Missing version"))?,
        },
        "history" => {
            let mut query = HistoryQuery::all();
            if let Some(limit) = number(m, "limit")? {
                query = query.limit(limit as usize);
            }
            if let Some(before) = number(m, "before")? {
                query = query.before(before);
            }
            StoreCommand::History {
                key: key(m)?,
                query,
            }
        }
        "list" => StoreCommand::List {
            resource_type: arg(m, "type")?,
        },
        "flush" => StoreCommand::Flush,
        "compact" => StoreCommand::Compact,
        "info" => StoreCommand::Info,
        other => return Err(usage(format!("Unknown command: {}", other))),
    };
    Ok(command)
}

// =========================================================================
// Writes
// =========================================================================

fn parse_create(m: &ArgMatches) -> Result<StoreCommand, ParseError> {
    let resource_type = arg(m, "type")?;
    let args: Vec<&String> = m
        .get_many::<String>("args")
        .map(|values| values.collect())
        .unwrap_or_default();

    let (id, raw) = match args.as_slice() {
        [raw] => (None, *raw),
        [id, raw] => (Some((*id).clone()), *raw),
        _ => return Err(usage("Usage: create TYPE [ID] JSON")),
    };

    Ok(StoreCommand::Create {
        resource_type,
        id,
        payload: parse_payload(raw)?,
    })
}

fn parse_update(m: &ArgMatches) -> Result<StoreCommand, ParseError> {
    let precondition = match (
        m.get_one::<String>("if-match"),
        m.get_one::<String>("if-none-match"),
    ) {
        (Some(_), Some(_)) => {
            return Err(usage("--if-match and --if-none-match are exclusive"));
        }
        (Some(etag), None) => Precondition::IfMatch(parse_if_match(etag)?),
        (None, Some(value)) => parse_if_none_match(value).precondition(value)?,
        (None, None) => Precondition::None,
    };

    Ok(StoreCommand::Update {
        key: key(m)?,
        payload: parse_payload(&arg(m, "json")?)?,
        precondition,
    })
}

/// Validate JSON text and store it compactly.
pub fn parse_payload(raw: &str) -> Result<Payload, ParseError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|e| usage(format!("Invalid JSON: {}", e)))?;
    Payload::from_json(&value).map_err(|e| usage(e.to_string()))
}

// =========================================================================
// Helpers
// =========================================================================

fn key(m: &ArgMatches) -> Result<ResourceKey, ParseError> {
    Ok(ResourceKey::new(arg(m, "type")?, arg(m, "id")?))
}

fn arg(m: &ArgMatches, name: &str) -> Result<String, ParseError> {
    m.get_one::<String>(name)
        .cloned()
        .ok_or_else(|| usage(format!("Missing {}", name)))
}

fn number(m: &ArgMatches, name: &str) -> Result<Option<u64>, ParseError> {
    m.get_one::<String>(name)
        .map(|s| s.parse::<u64>())
        .transpose()
        .map_err(|e| usage(format!("Invalid {}: {}", name, e)))
}

fn usage(msg: impl Into<String>) -> ParseError {
    ParseError::Usage(msg.into())
}
