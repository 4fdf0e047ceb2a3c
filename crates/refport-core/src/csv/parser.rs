//! CSV reader
//!
//! The first non-empty row is the header. Rows whose width differs from the
//! header are dropped whole.

use ::csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use refport_domain::normalize::{
    clean_doi, clean_isbn, clean_issn, clean_keywords, clean_pmid, clean_url, non_empty,
    normalize_pages, parse_date_field,
};
use refport_domain::{
    CanonicalReference, Contributors, InterchangeError, RecordError, ReferenceType, Result,
    EXTRA_CITATION_KEY,
};

use super::headers::{canonical_header, is_ignored};
use crate::format::{record_label, ParsedRecord};

/// Extras key holding a type label that mapped to `other`
pub const EXTRA_SOURCE_TYPE: &str = "source_type";

/// Where a column's values go
#[derive(Debug, Clone, PartialEq, Eq)]
enum Column {
    Field(&'static str),
    Extra(String),
    Ignored,
}

impl Column {
    fn from_header(raw: &str) -> Self {
        match canonical_header(raw) {
            Some(field) => Self::Field(field),
            None if is_ignored(raw) || raw.trim().is_empty() => Self::Ignored,
            None => Self::Extra(raw.trim().to_string()),
        }
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.iter().all(|f| f.trim().is_empty())
}

/// Header row and data rows, blank rows removed
fn read_rows(content: &str) -> Result<(Vec<Column>, Vec<StringRecord>)> {
    let content = content.trim_start_matches('\u{feff}');
    if content.trim().is_empty() {
        return Err(InterchangeError::EmptyContent);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(content.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| InterchangeError::ParseError {
            message: e.to_string(),
        })?;
        if !is_blank(&record) {
            rows.push(record);
        }
    }

    let mut rows = rows.into_iter();
    let header = rows.next().ok_or(InterchangeError::EmptyContent)?;
    let columns: Vec<Column> = header.iter().map(Column::from_header).collect();

    for required in ["title", "type"] {
        if !columns.contains(&Column::Field(required)) {
            return Err(InterchangeError::MissingHeader {
                header: required.to_string(),
            });
        }
    }

    Ok((columns, rows.collect()))
}

/// Structural check: a header row naming `title` and `type` columns
pub fn validate(content: &str) -> Result<()> {
    read_rows(content).map(|_| ())
}

/// Parse CSV content into canonical records, rejected rows in place
pub fn parse(content: &str) -> Result<Vec<ParsedRecord>> {
    let (columns, rows) = read_rows(content)?;
    if rows.is_empty() {
        return Err(InterchangeError::NoData);
    }

    let mut records = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        if row.len() != columns.len() {
            debug!(
                row = index + 2,
                expected = columns.len(),
                found = row.len(),
                "skipping CSV row with mismatched column count"
            );
            continue;
        }
        records.push(convert_row(&columns, row, index));
    }

    if records.is_empty() {
        return Err(InterchangeError::NoReferencesFound);
    }
    Ok(records)
}

fn convert_row(columns: &[Column], row: &StringRecord, index: usize) -> ParsedRecord {
    let title = columns
        .iter()
        .position(|c| *c == Column::Field("title"))
        .and_then(|i| row.get(i));
    build_reference(columns, row).map_err(|e| RecordError::new(record_label(title, index), e))
}

fn build_reference(
    columns: &[Column],
    row: &StringRecord,
) -> std::result::Result<CanonicalReference, InterchangeError> {
    let mut r = CanonicalReference::default();

    for (column, value) in columns.iter().zip(row.iter()) {
        let value = value.trim();
        if value.is_empty() {
            continue;
        }

        let field = match column {
            Column::Field(field) => *field,
            Column::Extra(name) => {
                r.set_extra(name.as_str(), value);
                continue;
            }
            Column::Ignored => continue,
        };

        match field {
            "type" => {
                r.reference_type = ReferenceType::from_alias(value);
                if r.reference_type == ReferenceType::Other && !value.eq_ignore_ascii_case("other") {
                    r.set_extra(EXTRA_SOURCE_TYPE, value);
                }
            }
            "title" => r.title = non_empty(value),
            "author" | "editor" => {
                let names = Contributors::parse(value);
                if names.is_empty() {
                    return Err(InterchangeError::InvalidAuthorFormat {
                        value: value.to_string(),
                    });
                }
                if field == "author" {
                    r.author = Some(names);
                } else {
                    r.editor = Some(names);
                }
            }
            "year" => r.year = parse_date_field(value)?,
            "journal" => r.journal = non_empty(value),
            "publication" => r.publication = non_empty(value),
            "publisher" => r.publisher = non_empty(value),
            "volume" => r.volume = non_empty(value),
            "issue" => r.issue = non_empty(value),
            "pages" => r.pages = non_empty(normalize_pages(value)),
            "doi" => r.doi = clean_doi(value),
            "pmid" => r.pmid = clean_pmid(value),
            "isbn" => r.isbn = clean_isbn(value),
            "issn" => r.issn = clean_issn(value),
            "url" => r.url = clean_url(value),
            "abstract" => r.abstract_text = non_empty(value),
            "keywords" => r.keywords = clean_keywords(value),
            "language" => r.language = non_empty(value),
            "location" => r.location = non_empty(value),
            "edition" => r.edition = non_empty(value),
            "notes" => r.notes = non_empty(value),
            "citation_key" => r.set_extra(EXTRA_CITATION_KEY, value),
            other => r.set_extra(other, value),
        }
    }

    Ok(r)
}
