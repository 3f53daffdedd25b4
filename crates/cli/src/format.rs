//! Output formatting.
//!
//! Human mode prints HTTP-like status lines; JSON mode prints the wire
//! envelopes from `revstore-wire`.

use revstore_core::{Error, VersionRecord};
use revstore_wire::{etag, ErrorResponse, ReadResponse, WriteResponse, NOT_MODIFIED};
use serde_json::json;

use crate::parse::ParseError;
use crate::state::Output;

/// Output mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

pub fn format_output(output: &Output, mode: OutputMode) -> String {
    match mode {
        OutputMode::Human => format_human(output),
        OutputMode::Json => format_json(output).to_string(),
    }
}

pub fn format_error(error: &Error, mode: OutputMode) -> String {
    let response = ErrorResponse::from(error);
    match mode {
        OutputMode::Human => format!(
            "(error) {} {}: {}",
            response.status, response.error.code, response.error.message
        ),
        OutputMode::Json => json!(response).to_string(),
    }
}

pub fn format_parse_error(error: &ParseError, mode: OutputMode) -> String {
    match error {
        ParseError::Header(e) => {
            let response = ErrorResponse::from(e);
            match mode {
                OutputMode::Human => format!(
                    "(error) {} {}: {}",
                    response.status, response.error.code, response.error.message
                ),
                OutputMode::Json => json!(response).to_string(),
            }
        }
        ParseError::Usage(msg) => match mode {
            OutputMode::Human => format!("(error) {}", msg),
            OutputMode::Json => json!({ "status": 400, "error": { "code": "Usage", "message": msg } })
                .to_string(),
        },
    }
}

// =========================================================================
// Human
// =========================================================================

fn format_human(output: &Output) -> String {
    match output {
        Output::Written(result) => {
            let r = WriteResponse::from(result);
            format!(
                "{} {}\nETag: {}\nLocation: {}\nLast-Modified: {}",
                r.status,
                r.outcome,
                r.etag,
                r.location,
                r.last_modified.to_rfc3339()
            )
        }
        Output::Erased(record) => format!(
            "erased {} ({} version{})",
            record.key,
            record.versions_erased,
            if record.versions_erased == 1 { "" } else { "s" }
        ),
        Output::Read(read) => {
            let r = ReadResponse::from(read);
            let mut out = format!(
                "{} {}\nETag: {}\nLast-Modified: {}",
                r.status,
                if r.status == NOT_MODIFIED { "Not Modified" } else { "OK" },
                r.etag,
                r.last_modified.to_rfc3339()
            );
            if let Some(body) = &r.body {
                let pretty = serde_json::to_string_pretty(body).unwrap_or_default();
                out.push_str("\n\n");
                out.push_str(&pretty);
            }
            out
        }
        Output::History { versions, .. } => versions
            .iter()
            .map(history_line)
            .collect::<Vec<_>>()
            .join("\n"),
        Output::Keys(keys) if keys.is_empty() => "(empty)".to_string(),
        Output::Keys(keys) => keys
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        Output::Flushed => "OK".to_string(),
        Output::Compacted { journal_bytes } => format!("OK ({} bytes)", journal_bytes),
        Output::Info(info) => {
            let mut lines = vec![
                format!("resources: {}", info.resources),
                format!("versions: {}", info.versions),
                format!("durability: {}", info.durability),
                format!("journal_bytes: {}", info.journal_bytes),
            ];
            match &info.data_dir {
                Some(dir) => lines.push(format!("data_dir: {}", dir.display())),
                None => lines.push("data_dir: (in memory)".to_string()),
            }
            lines.join("\n")
        }
    }
}

fn history_line(record: &VersionRecord) -> String {
    let detail = if record.is_deletion_marker {
        "(deleted)".to_string()
    } else {
        format!("{} bytes", record.payload.len())
    };
    format!(
        "{:<8} {}  {}",
        etag(record.version_id),
        record.created_at.to_rfc3339(),
        detail
    )
}

// =========================================================================
// JSON
// =========================================================================

fn format_json(output: &Output) -> serde_json::Value {
    match output {
        Output::Written(result) => json!(WriteResponse::from(result)),
        Output::Erased(record) => json!({
            "key": record.key.to_string(),
            "versions_erased": record.versions_erased,
            "reason": record.reason,
            "erased_at": record.erased_at,
        }),
        Output::Read(read) => json!(ReadResponse::from(read)),
        Output::History { key, versions } => json!({
            "key": key.to_string(),
            "versions": versions.iter().map(|r| json!({
                "version_id": r.version_id,
                "etag": etag(r.version_id),
                "last_modified": r.created_at,
                "deleted": r.is_deletion_marker,
            })).collect::<Vec<_>>(),
        }),
        Output::Keys(keys) => json!(keys.iter().map(|k| k.to_string()).collect::<Vec<_>>()),
        Output::Flushed => json!({ "status": "ok" }),
        Output::Compacted { journal_bytes } => {
            json!({ "status": "ok", "journal_bytes": journal_bytes })
        }
        Output::Info(info) => json!({
            "resources": info.resources,
            "versions": info.versions,
            "durability": info.durability.to_string(),
            "journal_bytes": info.journal_bytes,
            "data_dir": info.data_dir.as_ref().map(|d| d.display().to_string()),
        }),
    }
}
