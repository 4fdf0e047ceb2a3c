//! BibTeX entry ↔ canonical reference mapping

use lazy_static::lazy_static;
use regex::Regex;

use refport_domain::normalize::{
    clean_doi, clean_isbn, clean_issn, clean_keywords, clean_pmid, clean_url, non_empty,
    normalize_pages, parse_date_field, split_pages,
};
use refport_domain::{
    CanonicalReference, Contributors, InterchangeError, PersonName, RecordError, ReferenceType,
    EXTRA_BIBTEX_TYPE, EXTRA_CITATION_KEY, RESERVED_EXTRAS,
};

use super::entry::BibtexEntry;
use super::latex::{decode, encode};
use crate::config::EmphasisMode;
use crate::format::{record_label, ParsedRecord, SerializeOptions};

lazy_static! {
    static ref PASSTHROUGH_FIELD: Regex = Regex::new(r"^[a-z][a-z0-9_-]*$").unwrap();
}

/// Field distinguishing newspaper and magazine articles from journal ones
const SUBTYPE_FIELD: &str = "entrysubtype";

/// Fields emitted per type, in order
fn field_order(reference_type: ReferenceType) -> &'static [&'static str] {
    match reference_type {
        ReferenceType::Journal | ReferenceType::Newspaper | ReferenceType::Magazine => &[
            "author", "title", "journal", "year", "volume", "number", "pages", "doi", "url",
        ],
        ReferenceType::Book => &[
            "author", "editor", "title", "publisher", "address", "year", "edition", "volume",
            "isbn", "doi", "url",
        ],
        ReferenceType::Chapter => &[
            "author", "title", "booktitle", "editor", "publisher", "address", "year", "pages",
            "isbn", "doi", "url",
        ],
        ReferenceType::Conference => &[
            "author", "title", "booktitle", "editor", "publisher", "address", "year", "pages",
            "doi", "url",
        ],
        ReferenceType::Thesis => &["author", "title", "school", "address", "year", "doi", "url"],
        ReferenceType::Report => &[
            "author", "title", "institution", "number", "address", "year", "doi", "url",
        ],
        ReferenceType::Website => &["author", "title", "journal", "year", "url", "doi"],
        ReferenceType::Other => &[
            "author", "editor", "title", "journal", "booktitle", "publisher", "address", "year",
            "volume", "number", "pages", "doi", "url",
        ],
    }
}

/// Emitted after the per-type fields for every type, unless already written
const TRAILING_FIELDS: &[&str] = &[
    "author", "editor", "journal", "booktitle", "publisher", "address", "year", "edition",
    "volume", "number", "pages", "isbn", "issn", "pmid", "doi", "url", "abstract", "keywords",
    "language", "note",
];

/// Canonical field a BibTeX field writes
fn slot(name: &str) -> &str {
    match name {
        "school" | "institution" => "publisher",
        other => other,
    }
}

/// Split an author field on top-level `and`; braces protect literal names.
fn split_authors(value: &str) -> Vec<&str> {
    let bytes = value.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b if depth == 0
                && b.is_ascii_whitespace()
                && i + 4 < bytes.len()
                && bytes[i + 1..i + 4].eq_ignore_ascii_case(b"and")
                && bytes[i + 4].is_ascii_whitespace() =>
            {
                parts.push(&value[start..i]);
                start = i + 5;
                i += 5;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(&value[start..]);

    parts
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

fn parse_contributors(
    value: &str,
    emphasis: EmphasisMode,
) -> Result<Vec<PersonName>, InterchangeError> {
    split_authors(value)
        .into_iter()
        .map(|raw| {
            let literal = raw.starts_with('{') && raw.ends_with('}');
            let decoded = decode(raw, emphasis);
            let name = if literal {
                non_empty(&decoded).map(PersonName::new)
            } else {
                PersonName::parse(&decoded)
            };
            name.ok_or_else(|| InterchangeError::InvalidAuthorFormat {
                value: raw.to_string(),
            })
        })
        .collect()
}

fn set_once(slot: &mut Option<String>, value: String) {
    if slot.is_none() {
        *slot = non_empty(value);
    }
}

/// Convert one BibTeX entry into a canonical reference
pub fn to_reference(entry: &BibtexEntry, index: usize, emphasis: EmphasisMode) -> ParsedRecord {
    convert_entry(entry, emphasis).map_err(|e| {
        let title = entry.title().map(|t| decode(t, emphasis));
        let label = match title.as_deref().and_then(non_empty) {
            Some(title) => title,
            None if !entry.cite_key.is_empty() => entry.cite_key.clone(),
            None => record_label(None, index),
        };
        RecordError::new(label, e)
    })
}

fn convert_entry(
    entry: &BibtexEntry,
    emphasis: EmphasisMode,
) -> Result<CanonicalReference, InterchangeError> {
    let mut r = CanonicalReference {
        reference_type: ReferenceType::from_bibtex(&entry.entry_type),
        ..Default::default()
    };
    r.set_extra(EXTRA_BIBTEX_TYPE, entry.entry_type.as_str());
    r.set_extra(EXTRA_CITATION_KEY, entry.cite_key.as_str());

    let mut year_value: Option<String> = None;
    let mut date_value: Option<String> = None;

    for field in &entry.fields {
        let raw = field.value.trim();
        if raw.is_empty() {
            continue;
        }
        let text = || decode(raw, emphasis);

        match field.name.as_str() {
            "title" => set_once(&mut r.title, text()),
            "author" => {
                let names = parse_contributors(raw, emphasis)?;
                if !names.is_empty() {
                    r.author = Some(Contributors::Structured(names));
                }
            }
            "editor" => {
                let names = parse_contributors(raw, emphasis)?;
                if !names.is_empty() {
                    r.editor = Some(Contributors::Structured(names));
                }
            }
            "year" => set_once(&mut year_value, text()),
            "date" => set_once(&mut date_value, text()),
            "journal" | "journaltitle" => set_once(&mut r.journal, text()),
            "booktitle" => set_once(&mut r.publication, text()),
            "publisher" | "school" | "institution" | "organization" => {
                set_once(&mut r.publisher, text())
            }
            "address" | "location" => set_once(&mut r.location, text()),
            "volume" => set_once(&mut r.volume, text()),
            "number" | "issue" => set_once(&mut r.issue, text()),
            "pages" => set_once(&mut r.pages, normalize_pages(&text())),
            // Identifiers are taken verbatim
            "doi" => {
                if r.doi.is_none() {
                    r.doi = clean_doi(raw);
                }
            }
            "url" => {
                if r.url.is_none() {
                    r.url = clean_url(raw);
                }
            }
            "pmid" => {
                if r.pmid.is_none() {
                    r.pmid = clean_pmid(raw);
                }
            }
            "isbn" => {
                if r.isbn.is_none() {
                    r.isbn = clean_isbn(raw);
                }
            }
            "issn" => {
                if r.issn.is_none() {
                    r.issn = clean_issn(raw);
                }
            }
            "abstract" => set_once(&mut r.abstract_text, text()),
            "keywords" => r.keywords.extend(clean_keywords(&text())),
            "language" | "langid" => set_once(&mut r.language, text()),
            "edition" => set_once(&mut r.edition, text()),
            "note" => set_once(&mut r.notes, text()),
            SUBTYPE_FIELD if r.reference_type == ReferenceType::Journal => {
                match text().to_lowercase().as_str() {
                    "newspaper" => r.reference_type = ReferenceType::Newspaper,
                    "magazine" => r.reference_type = ReferenceType::Magazine,
                    _ => r.set_extra(SUBTYPE_FIELD, text()),
                }
            }
            other => r.set_extra(other, text()),
        }
    }

    if let Some(value) = year_value.or(date_value) {
        r.year = parse_date_field(&value)?;
    }

    Ok(r)
}

/// BibTeX entry type for export: the original type when it still agrees
/// with the record's type, otherwise the reverse table.
fn export_type(r: &CanonicalReference) -> String {
    match r.extra(EXTRA_BIBTEX_TYPE) {
        Some(t) if ReferenceType::from_bibtex(t) == r.reference_type => t.to_lowercase(),
        _ => r.reference_type.bibtex_type().to_string(),
    }
}

/// `Family, Given and Family, Given`; literal names are braced
fn format_contributors(names: &[PersonName]) -> Option<String> {
    let formatted: Vec<String> = names
        .iter()
        .map(|name| match &name.given {
            Some(_) => encode(&name.formatted()),
            None if name.family.contains(' ') || name.family.contains(',') => {
                format!("{{{}}}", encode(&name.family))
            }
            None => encode(&name.family),
        })
        .collect();
    (!formatted.is_empty()).then(|| formatted.join(" and "))
}

/// Value of one BibTeX field, already escaped
fn field_value(r: &CanonicalReference, name: &str) -> Option<String> {
    let text = |v: Option<&str>| v.and_then(non_empty).map(|v| encode(&v));
    let verbatim = |v: Option<&str>| v.and_then(non_empty);

    match name {
        "author" => format_contributors(&r.authors()),
        "editor" => format_contributors(&r.editors()),
        "title" => text(r.title.as_deref()),
        "journal" => text(r.journal.as_deref()),
        "booktitle" => text(r.publication.as_deref()),
        "publisher" | "school" | "institution" => text(r.publisher.as_deref()),
        "address" => text(r.location.as_deref()),
        "year" => r.year.map(|y| y.to_string()),
        "edition" => text(r.edition.as_deref()),
        "volume" => text(r.volume.as_deref()),
        "number" => text(r.issue.as_deref()),
        "pages" => r.pages.as_deref().and_then(non_empty).map(|p| {
            match split_pages(&p) {
                (start, Some(end)) => format!("{}--{}", encode(&start), encode(&end)),
                (start, None) => encode(&start),
            }
        }),
        "doi" => verbatim(r.doi.as_deref()),
        "url" => verbatim(r.url.as_deref()),
        "isbn" => verbatim(r.isbn.as_deref()),
        "issn" => verbatim(r.issn.as_deref()),
        "pmid" => verbatim(r.pmid.as_deref()),
        "abstract" => text(r.abstract_text.as_deref()),
        "keywords" => r.keywords_joined().map(|k| encode(&k)),
        "language" => text(r.language.as_deref()),
        "note" => text(r.notes.as_deref()),
        _ => None,
    }
}

/// Convert a canonical reference into a BibTeX entry with the given key
pub fn from_reference(
    r: &CanonicalReference,
    cite_key: &str,
    options: &SerializeOptions,
) -> BibtexEntry {
    let mut entry = BibtexEntry::new(export_type(r), cite_key);

    let mut emitted: Vec<&str> = Vec::new();
    for &name in field_order(r.reference_type).iter().chain(TRAILING_FIELDS) {
        if emitted.contains(&slot(name)) {
            continue;
        }
        if let Some(value) = field_value(r, name) {
            entry.add_field(name, value);
            emitted.push(slot(name));
        }
    }

    match r.reference_type {
        ReferenceType::Newspaper => entry.add_field(SUBTYPE_FIELD, "newspaper"),
        ReferenceType::Magazine => entry.add_field(SUBTYPE_FIELD, "magazine"),
        _ => {}
    }

    if options.include_extra_fields {
        for (name, value) in &r.extras {
            let taken = emitted.contains(&name.as_str())
                || entry.get_field(name).is_some()
                || RESERVED_EXTRAS.contains(&name.as_str());
            if !taken && PASSTHROUGH_FIELD.is_match(name) {
                entry.add_field(name.as_str(), encode(value));
            }
        }
    }

    entry
}
