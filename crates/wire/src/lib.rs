//! Wire mapping for Revstore
//!
//! Translates store results to and from their HTTP-facing form:
//!
//! | Concern | Form |
//! |---------|------|
//! | ETag | `W/"<version>"` |
//! | `If-Match` | `W/"<version>"` only |
//! | `If-None-Match` | `*` on writes; `1`, `"1"`, `W/1`, `W/"1"` on reads |
//! | `Location` | `<type>/<id>/_history/<version>` |
//! | Errors | `{"code": "...", "message": "..."}` plus a status code |
//!
//! ## Examples
//!
//! ```
//! use revstore_wire::{etag, parse_if_match};
//!
//! assert_eq!(etag(3), "W/\"3\"");
//! assert_eq!(parse_if_match("W/\"3\"").unwrap(), 3);
//! assert!(parse_if_match("3").is_err());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod etag;
pub mod response;
pub mod status;

pub use error::{HeaderError, WireError};
pub use etag::{etag, location, parse_if_match, parse_if_none_match, IfNoneMatch};
pub use response::{ErrorResponse, ReadResponse, WriteResponse};
pub use error::error_code;
pub use status::{status_for_code, status_for_error, status_for_outcome, NOT_MODIFIED};
