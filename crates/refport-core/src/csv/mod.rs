//! CSV (spreadsheet) import and export
//!
//! Import is header driven: column names pass through an alias table, rows
//! of the wrong width are skipped. Export writes a fixed column set.

mod delimiter;
mod formatter;
mod headers;
mod parser;

pub use delimiter::detect_delimiter;
pub use formatter::{write_records, HEADER_LABELS, USAGE_COUNT_LABEL};
pub use headers::{canonical_header, normalize_header};
pub use parser::{parse, validate, EXTRA_SOURCE_TYPE};

use refport_domain::{CanonicalReference, Result};

use crate::format::{Format, ParseOptions, ParsedRecord, ReferenceFormat, SerializeOptions};

/// CSV handler for the format registry
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvFormat;

impl CsvFormat {
    /// Serialize with a per-record usage count column
    pub fn serialize_with_usage(
        &self,
        references: &[CanonicalReference],
        usage: &[u64],
        options: &SerializeOptions,
    ) -> Result<String> {
        write_records(references, Some(usage), options)
    }
}

impl ReferenceFormat for CsvFormat {
    fn format(&self) -> Format {
        Format::Csv
    }

    fn validate(&self, content: &str) -> Result<()> {
        validate(content)
    }

    fn parse_records(&self, content: &str, _options: &ParseOptions) -> Result<Vec<ParsedRecord>> {
        parse(content)
    }

    fn serialize(
        &self,
        references: &[CanonicalReference],
        options: &SerializeOptions,
    ) -> Result<String> {
        write_records(references, None, options)
    }
}
