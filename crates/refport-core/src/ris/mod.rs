//! RIS (Research Information Systems) format parsing and formatting
//!
//! Entries are read into `RisEntry` values (ordered tag lists), then mapped
//! to canonical references. Export runs the mapping in reverse with a fixed
//! tag order and optional abstract wrapping.

mod converter;
mod entry;
mod formatter;
mod parser;

pub use converter::{from_reference, to_reference};
pub use entry::{RisEntry, RisTag};
pub use formatter::{format_entries, format_entry};
pub use parser::{parse_entries, validate};

use refport_domain::{CanonicalReference, Result};

use crate::format::{Format, ParseOptions, ParsedRecord, ReferenceFormat, SerializeOptions};

/// Parse RIS content into canonical records, rejected entries in place
pub fn parse(content: &str) -> Result<Vec<ParsedRecord>> {
    Ok(parse_entries(content)?
        .iter()
        .enumerate()
        .map(|(index, entry)| to_reference(entry, index))
        .collect())
}

/// Serialize canonical records as RIS
pub fn serialize(references: &[CanonicalReference], options: &SerializeOptions) -> String {
    let entries: Vec<RisEntry> = references
        .iter()
        .map(|r| from_reference(r, options))
        .collect();
    format_entries(&entries)
}

/// RIS handler for the format registry
#[derive(Debug, Clone, Copy, Default)]
pub struct RisFormat;

impl ReferenceFormat for RisFormat {
    fn format(&self) -> Format {
        Format::Ris
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
        Ok(serialize(references, options))
    }
}
