//! Error types for calendar parsing.

use thiserror::Error;

/// Errors that abort a calendar parse.
///
/// Every variant is fatal for the document being parsed: no partial
/// calendar is ever returned alongside one of these.
#[derive(Error, Debug)]
pub enum ParseError {
    /// A logical line could not be split into key/value.
    #[error("Malformed line: {0}")]
    Structure(String),

    /// The version declaration was missing or not the supported one.
    #[error("Unsupported calendar version: {0}")]
    Version(String),

    /// An event block closed without one of its required fields.
    #[error("Event is missing required field '{field}'")]
    MissingField { field: &'static str },

    /// A date or timestamp value matched neither recognized encoding.
    #[error("Unparseable date/time value: {0}")]
    Temporal(String),

    /// A top-level line that is neither a known key nor a block marker.
    #[error("Unknown line found: {0}")]
    UnknownLine(String),

    /// Two event blocks declared the same UID.
    #[error("Duplicate event UID: {0}")]
    DuplicateUid(String),

    /// The stream ended before the calendar's closing marker.
    #[error("Unexpected end of calendar document")]
    UnexpectedEof,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for calendar operations.
pub type AcalResult<T> = Result<T, ParseError>;
