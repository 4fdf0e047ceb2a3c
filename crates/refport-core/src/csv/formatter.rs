//! CSV writer with a fixed column order

use ::csv::WriterBuilder;

use refport_domain::normalize::{strip_html, truncate_words};
use refport_domain::{CanonicalReference, InterchangeError, Result};

use crate::format::SerializeOptions;

/// Export header labels, in column order
pub const HEADER_LABELS: [&str; 23] = [
    "Type",
    "Title",
    "Authors",
    "Editors",
    "Year",
    "Journal",
    "Publication",
    "Publisher",
    "Volume",
    "Issue",
    "Pages",
    "DOI",
    "PMID",
    "ISBN",
    "ISSN",
    "URL",
    "Abstract",
    "Keywords",
    "Language",
    "Location",
    "Edition",
    "Notes",
    "Citation Key",
];

pub const USAGE_COUNT_LABEL: &str = "Usage Count";

fn row(r: &CanonicalReference, options: &SerializeOptions) -> Vec<String> {
    let text = |v: &Option<String>| v.clone().unwrap_or_default();
    let abstract_text = r
        .abstract_text
        .as_deref()
        .map(|a| truncate_words(&strip_html(a), options.max_abstract_length))
        .unwrap_or_default();

    vec![
        r.reference_type.label().to_string(),
        text(&r.title),
        r.author.as_ref().map(|a| a.formatted()).unwrap_or_default(),
        r.editor.as_ref().map(|e| e.formatted()).unwrap_or_default(),
        r.year.map(|y| y.to_string()).unwrap_or_default(),
        text(&r.journal),
        text(&r.publication),
        text(&r.publisher),
        text(&r.volume),
        text(&r.issue),
        text(&r.pages),
        text(&r.doi),
        text(&r.pmid),
        text(&r.isbn),
        text(&r.issn),
        text(&r.url),
        abstract_text,
        r.keywords_joined().unwrap_or_default(),
        text(&r.language),
        text(&r.location),
        text(&r.edition),
        text(&r.notes),
        r.citation_key().unwrap_or_default().to_string(),
    ]
}

/// Write references as CSV. `usage` holds one count per reference and is
/// only read when the usage column is enabled.
pub fn write_records(
    references: &[CanonicalReference],
    usage: Option<&[u64]>,
    options: &SerializeOptions,
) -> Result<String> {
    let format_error = |e: &dyn std::fmt::Display| InterchangeError::FormatError {
        message: e.to_string(),
    };

    let mut writer = WriterBuilder::new().from_writer(Vec::new());

    let mut header: Vec<&str> = HEADER_LABELS.to_vec();
    if options.include_usage_count {
        header.push(USAGE_COUNT_LABEL);
    }
    writer.write_record(&header).map_err(|e| format_error(&e))?;

    for (index, reference) in references.iter().enumerate() {
        let mut fields = row(reference, options);
        if options.include_usage_count {
            let count = usage.and_then(|u| u.get(index)).copied().unwrap_or_default();
            fields.push(count.to_string());
        }
        writer.write_record(&fields).map_err(|e| format_error(&e))?;
    }

    let bytes = writer.into_inner().map_err(|e| format_error(&e))?;
    String::from_utf8(bytes).map_err(|e| format_error(&e))
}
