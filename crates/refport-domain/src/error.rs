//! Error taxonomy shared by every parser, serializer and orchestrator

use serde::Serialize;
use thiserror::Error;

/// Errors raised by the interchange layer.
///
/// Format-level variants (`EmptyContent`, `InvalidFormat`, `UnbalancedBraces`,
/// `MissingHeader`, `NoData`, `NoReferencesFound`, `UnsupportedFormat`) abort a
/// whole call. Record-level variants are collected per record.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterchangeError {
    #[error("Empty content")]
    EmptyContent,
    #[error("Invalid {format} content: {message}")]
    InvalidFormat { format: String, message: String },
    #[error("Unbalanced braces: {open} opening vs {close} closing")]
    UnbalancedBraces { open: usize, close: usize },
    #[error("Missing required header: {header}")]
    MissingHeader { header: String },
    #[error("No data rows after the header")]
    NoData,
    #[error("No references found")]
    NoReferencesFound,
    #[error("Missing required field: {field}")]
    MissingRequiredField { field: String },
    #[error("Invalid author format: {value}")]
    InvalidAuthorFormat { value: String },
    #[error("Invalid date format: {value}")]
    InvalidDateFormat { value: String },
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },
    #[error("Parse error: {message}")]
    ParseError { message: String },
    #[error("Format error: {message}")]
    FormatError { message: String },
    #[error("Record store error: {message}")]
    Store { message: String },
    #[error("I/O error: {message}")]
    Io { message: String },
}

impl InterchangeError {
    pub fn invalid_format(format: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidFormat {
            format: format.into(),
            message: message.into(),
        }
    }

    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            field: field.into(),
        }
    }

    /// Whether this error only concerns a single record.
    pub fn is_record_level(&self) -> bool {
        matches!(
            self,
            Self::MissingRequiredField { .. }
                | Self::InvalidAuthorFormat { .. }
                | Self::InvalidDateFormat { .. }
                | Self::Store { .. }
        )
    }
}

impl From<std::io::Error> for InterchangeError {
    fn from(e: std::io::Error) -> Self {
        Self::Io {
            message: e.to_string(),
        }
    }
}

impl From<serde_json::Error> for InterchangeError {
    fn from(e: serde_json::Error) -> Self {
        Self::ParseError {
            message: e.to_string(),
        }
    }
}

/// A failure tied to one record, identified by its title or position.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{identifier}: {error}")]
pub struct RecordError {
    pub identifier: String,
    pub error: InterchangeError,
}

impl RecordError {
    pub fn new(identifier: impl Into<String>, error: InterchangeError) -> Self {
        Self {
            identifier: identifier.into(),
            error,
        }
    }
}

pub type Result<T, E = InterchangeError> = std::result::Result<T, E>;
