//! Interchange formats, content sniffing and the handler registry

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use refport_domain::{CanonicalReference, InterchangeError, RecordError, Result};

use crate::bibtex::BibtexFormat;
use crate::config::{EmphasisMode, ExportConfig, ImportConfig};
use crate::csl::JsonFormat;
use crate::csv::CsvFormat;
use crate::ris::RisFormat;

lazy_static! {
    static ref BIBTEX_ENTRY: Regex = Regex::new(r"@[A-Za-z]+\s*\{").unwrap();
}

/// Supported interchange formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Ris,
    #[serde(rename = "bibtex")]
    BibTeX,
    Csv,
    Json,
}

impl Format {
    pub const ALL: [Format; 4] = [Self::Ris, Self::BibTeX, Self::Csv, Self::Json];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Ris => "ris",
            Self::BibTeX => "bibtex",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Ris => "application/x-research-info-systems",
            Self::BibTeX => "application/x-bibtex",
            Self::Csv => "text/csv",
            Self::Json => "application/json",
        }
    }

    /// File extension used on export
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Ris => "ris",
            Self::BibTeX => "bib",
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// Resolve a user-supplied format name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "ris" => Ok(Self::Ris),
            "bibtex" | "bib" => Ok(Self::BibTeX),
            "csv" => Ok(Self::Csv),
            "json" | "csl" | "csl-json" | "csljson" => Ok(Self::Json),
            _ => Err(InterchangeError::UnsupportedFormat {
                format: name.trim().to_string(),
            }),
        }
    }

    pub fn from_extension(ext: &str) -> Result<Self> {
        match ext.trim().trim_start_matches('.').to_lowercase().as_str() {
            "ris" => Ok(Self::Ris),
            "bib" | "bibtex" => Ok(Self::BibTeX),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(InterchangeError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }

    /// Format implied by a file name's extension, if any
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        path.as_ref()
            .extension()
            .and_then(|e| e.to_str())
            .and_then(|e| Self::from_extension(e).ok())
    }

    /// Sniff the format of raw content.
    ///
    /// RIS wins when a `TY  -` line is present, then JSON (only if it actually
    /// parses), then BibTeX (`@word{`), then CSV (comma-shaped first line).
    pub fn detect(content: &str) -> Result<Self> {
        let trimmed = content.trim_start_matches('\u{feff}').trim();
        if trimmed.is_empty() {
            return Err(InterchangeError::EmptyContent);
        }

        if trimmed.contains("TY  -") {
            return Ok(Self::Ris);
        }

        if (trimmed.starts_with('[') || trimmed.starts_with('{'))
            && serde_json::from_str::<serde_json::Value>(trimmed).is_ok()
        {
            return Ok(Self::Json);
        }

        if BIBTEX_ENTRY.is_match(trimmed) {
            return Ok(Self::BibTeX);
        }

        let first_line = trimmed.lines().next().unwrap_or_default();
        if first_line.split(',').filter(|c| !c.trim().is_empty()).count() > 1 {
            return Ok(Self::Csv);
        }

        Err(InterchangeError::invalid_format(
            "unknown",
            "content is not RIS, BibTeX, CSV or JSON",
        ))
    }

    /// Explicit hint, then file extension, then content sniffing
    pub fn resolve(hint: Option<Format>, file_name: Option<&str>, content: &str) -> Result<Self> {
        if let Some(format) = hint.or_else(|| file_name.and_then(Self::from_path)) {
            return Ok(format);
        }
        Self::detect(content)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Format {
    type Err = InterchangeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s)
    }
}

/// Options consumed by parsers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub emphasis: EmphasisMode,
}

impl From<&ImportConfig> for ParseOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            emphasis: config.emphasis,
        }
    }
}

/// Options consumed by serializers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializeOptions {
    pub include_extra_fields: bool,
    pub wrap_abstracts: bool,
    pub max_line_length: usize,
    pub max_abstract_length: usize,
    pub include_usage_count: bool,
}

impl Default for SerializeOptions {
    fn default() -> Self {
        Self {
            include_extra_fields: true,
            wrap_abstracts: true,
            max_line_length: 255,
            max_abstract_length: 500,
            include_usage_count: false,
        }
    }
}

impl From<&ExportConfig> for SerializeOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            include_extra_fields: config.include_extra_fields,
            wrap_abstracts: config.wrap_abstracts,
            max_line_length: config.max_line_length,
            max_abstract_length: config.max_abstract_length,
            include_usage_count: config.include_usage_count,
        }
    }
}

/// One parsed source entry: a canonical record, or the reason it was rejected
pub type ParsedRecord = std::result::Result<CanonicalReference, RecordError>;

/// Identifier used in error lists for the `index`-th entry of an input
pub(crate) fn record_label(title: Option<&str>, index: usize) -> String {
    match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => title.to_string(),
        None => format!("record {}", index + 1),
    }
}

/// A parser/serializer pair for one interchange format
pub trait ReferenceFormat {
    fn format(&self) -> Format;

    /// Structural check; format-level errors abort the whole call.
    fn validate(&self, content: &str) -> Result<()>;

    /// Validate, then parse every entry. Entry-level problems are returned
    /// in place as `Err` items.
    fn parse_records(&self, content: &str, options: &ParseOptions) -> Result<Vec<ParsedRecord>>;

    fn serialize(
        &self,
        references: &[CanonicalReference],
        options: &SerializeOptions,
    ) -> Result<String>;

    fn mime_type(&self) -> &'static str {
        self.format().mime_type()
    }

    fn extension(&self) -> &'static str {
        self.format().extension()
    }

    /// Parse with default options, dropping rejected entries
    fn parse(&self, content: &str) -> Result<Vec<CanonicalReference>> {
        Ok(self
            .parse_records(content, &ParseOptions::default())?
            .into_iter()
            .filter_map(|r| r.ok())
            .collect())
    }
}

/// Look up the handler registered for a format.
pub fn handler_for(format: Format) -> Box<dyn ReferenceFormat> {
    match format {
        Format::Ris => Box::new(RisFormat),
        Format::BibTeX => Box::new(BibtexFormat),
        Format::Csv => Box::new(CsvFormat),
        Format::Json => Box::new(JsonFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("TY  - JOUR\nTI  - A\nER  - ", Format::Ris)]
    #[case("@article{key,\n title = {A}\n}", Format::BibTeX)]
    #[case("[{\"title\": \"A\"}]", Format::Json)]
    #[case("{\"references\": []}", Format::Json)]
    #[case("title,type\nA,Book\n", Format::Csv)]
    fn test_detect(#[case] content: &str, #[case] expected: Format) {
        assert_eq!(Format::detect(content).unwrap(), expected);
    }

    #[test]
    fn test_detect_rejects_unknown_content() {
        assert_eq!(Format::detect("   \n"), Err(InterchangeError::EmptyContent));
        assert!(matches!(
            Format::detect("just some prose"),
            Err(InterchangeError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_json_that_does_not_parse_is_not_json() {
        // Braced but invalid JSON falls through to the other sniffers
        let content = "{title,type}\n";
        assert_eq!(Format::detect(content).unwrap(), Format::Csv);
    }

    #[rstest]
    #[case("ris", Format::Ris)]
    #[case("BibTeX", Format::BibTeX)]
    #[case("bib", Format::BibTeX)]
    #[case("CSV", Format::Csv)]
    #[case("csl-json", Format::Json)]
    fn test_from_name(#[case] name: &str, #[case] expected: Format) {
        assert_eq!(Format::from_name(name).unwrap(), expected);
        assert_eq!(name.parse::<Format>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_names_are_unsupported() {
        assert_eq!(
            Format::from_name("endnote"),
            Err(InterchangeError::UnsupportedFormat {
                format: "endnote".to_string()
            })
        );
        assert!(Format::from_extension("xml").is_err());
    }

    #[test]
    fn test_extensions_and_paths() {
        assert_eq!(Format::from_extension(".bib").unwrap(), Format::BibTeX);
        assert_eq!(Format::from_path("library/refs.RIS"), Some(Format::Ris));
        assert_eq!(Format::from_path("notes.txt"), None);
        for format in Format::ALL {
            assert_eq!(Format::from_extension(format.extension()).unwrap(), format);
        }
    }

    #[test]
    fn test_resolve_prefers_hint_then_extension() {
        let ris = "TY  - JOUR\nER  - ";
        assert_eq!(
            Format::resolve(Some(Format::Csv), Some("a.bib"), ris).unwrap(),
            Format::Csv
        );
        assert_eq!(Format::resolve(None, Some("a.bib"), ris).unwrap(), Format::BibTeX);
        assert_eq!(Format::resolve(None, Some("a.txt"), ris).unwrap(), Format::Ris);
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(Format::Ris.mime_type(), "application/x-research-info-systems");
        assert_eq!(Format::BibTeX.mime_type(), "application/x-bibtex");
        assert_eq!(Format::Csv.mime_type(), "text/csv");
        assert_eq!(Format::Json.mime_type(), "application/json");
        for format in Format::ALL {
            let handler = handler_for(format);
            assert_eq!(handler.format(), format);
            assert_eq!(handler.mime_type(), format.mime_type());
        }
    }
}
