//! BibTeX parsing and formatting
//!
//! Raw entries come out of a nom-based scanner, then get LaTeX-decoded and
//! mapped onto canonical references. Export runs per-type field order
//! tables and generates citation keys where a record has none.

mod cite_key;
mod converter;
mod entry;
mod formatter;
mod latex;
mod parser;

pub use cite_key::{generate_cite_key, make_cite_key_unique, sanitize_cite_key};
pub use converter::{from_reference, to_reference};
pub use entry::{BibtexEntry, BibtexField};
pub use formatter::{format_entries, format_entry};
pub use latex::{decode as decode_latex, encode as encode_latex};
pub use parser::{parse_entries, validate, ParsedEntry};

use std::collections::HashSet;

use refport_domain::{CanonicalReference, Result};

use crate::config::EmphasisMode;
use crate::format::{Format, ParseOptions, ParsedRecord, ReferenceFormat, SerializeOptions};

/// Parse BibTeX content into canonical records, rejected entries in place
pub fn parse(content: &str, emphasis: EmphasisMode) -> Result<Vec<ParsedRecord>> {
    Ok(parse_entries(content)?
        .into_iter()
        .enumerate()
        .map(|(index, parsed)| parsed.and_then(|entry| to_reference(&entry, index, emphasis)))
        .collect())
}

/// Serialize canonical records as BibTeX, generating missing keys and
/// keeping every key unique within the output
pub fn serialize(references: &[CanonicalReference], options: &SerializeOptions) -> String {
    let mut used = HashSet::new();
    let entries: Vec<BibtexEntry> = references
        .iter()
        .map(|r| {
            let base = r
                .citation_key()
                .map(sanitize_cite_key)
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| generate_cite_key(r));
            let key = make_cite_key_unique(&base, &used);
            used.insert(key.clone());
            from_reference(r, &key, options)
        })
        .collect();
    format_entries(&entries)
}

/// BibTeX handler for the format registry
#[derive(Debug, Clone, Copy, Default)]
pub struct BibtexFormat;

impl ReferenceFormat for BibtexFormat {
    fn format(&self) -> Format {
        Format::BibTeX
    }

    fn validate(&self, content: &str) -> Result<()> {
        validate(content)
    }

    fn parse_records(&self, content: &str, options: &ParseOptions) -> Result<Vec<ParsedRecord>> {
        parse(content, options.emphasis)
    }

    fn serialize(
        &self,
        references: &[CanonicalReference],
        options: &SerializeOptions,
    ) -> Result<String> {
        Ok(serialize(references, options))
    }
}
