//! RIS entry ↔ canonical reference mapping

use lazy_static::lazy_static;
use regex::Regex;

use refport_domain::normalize::{
    clean_doi, clean_isbn, clean_issn, clean_keywords, clean_url, join_pages, looks_like_issn,
    non_empty, normalize_pages, parse_date_field, split_pages, wrap_words,
};
use refport_domain::{
    CanonicalReference, Contributors, InterchangeError, PersonName, RecordError, ReferenceType,
    EXTRA_CITATION_KEY, EXTRA_RIS_TYPE, RESERVED_EXTRAS,
};

use super::entry::RisEntry;
use crate::format::{record_label, ParsedRecord, SerializeOptions};

lazy_static! {
    static ref PASSTHROUGH_TAG: Regex = Regex::new(r"^[A-Z][A-Z0-9]{1,3}$").unwrap();
}

/// Width of the `XX  - ` prefix
const TAG_PREFIX_LEN: usize = 6;

fn set_once(slot: &mut Option<String>, value: &str) {
    if slot.is_none() {
        *slot = non_empty(value);
    }
}

/// Each `AU`/`A2` line holds exactly one name; repeated lines add more.
fn push_name(names: &mut Vec<PersonName>, value: &str) -> Result<(), InterchangeError> {
    let name = PersonName::parse(value).ok_or_else(|| InterchangeError::InvalidAuthorFormat {
        value: value.trim().to_string(),
    })?;
    names.push(name);
    Ok(())
}

/// Convert one RIS entry into a canonical reference
pub fn to_reference(entry: &RisEntry, index: usize) -> ParsedRecord {
    let label = || record_label(entry.get_tag("TI").or(entry.get_tag("T1")), index);
    convert_entry(entry).map_err(|e| RecordError::new(label(), e))
}

fn convert_entry(entry: &RisEntry) -> Result<CanonicalReference, InterchangeError> {
    let mut r = CanonicalReference {
        reference_type: ReferenceType::from_ris(&entry.ris_type),
        ..Default::default()
    };
    r.set_extra(EXTRA_RIS_TYPE, entry.ris_type.trim());

    let mut authors = Vec::new();
    let mut editors = Vec::new();
    let mut start_page: Option<String> = None;
    let mut end_page: Option<String> = None;

    for tag in &entry.tags {
        let value = tag.value.trim();
        if value.is_empty() {
            continue;
        }

        match tag.tag.as_str() {
            "TI" | "T1" => set_once(&mut r.title, value),
            "AU" | "A1" => push_name(&mut authors, value)?,
            "A2" | "ED" => push_name(&mut editors, value)?,
            "PY" | "Y1" | "DA" => {
                if r.year.is_none() {
                    r.year = parse_date_field(value)?;
                }
            }
            "JO" | "JF" | "JA" | "J1" | "J2" => set_once(&mut r.journal, value),
            "T2" | "BT" => set_once(&mut r.publication, value),
            "VL" => set_once(&mut r.volume, value),
            "IS" | "CP" => set_once(&mut r.issue, value),
            "SP" => set_once(&mut start_page, value),
            "EP" => set_once(&mut end_page, value),
            "PB" => set_once(&mut r.publisher, value),
            "CY" | "PP" => set_once(&mut r.location, value),
            "DO" => {
                if r.doi.is_none() {
                    r.doi = clean_doi(value);
                }
            }
            "SN" => {
                if looks_like_issn(value) {
                    if r.issn.is_none() {
                        r.issn = clean_issn(value);
                    }
                } else if r.isbn.is_none() {
                    r.isbn = clean_isbn(value);
                }
            }
            "UR" | "L2" => {
                if r.url.is_none() {
                    r.url = clean_url(value);
                }
            }
            "AB" | "N2" => set_once(&mut r.abstract_text, value),
            "KW" => r.keywords.extend(clean_keywords(value)),
            "LA" => set_once(&mut r.language, value),
            "ET" => set_once(&mut r.edition, value),
            "N1" => {
                r.notes = Some(match r.notes.take() {
                    Some(existing) => format!("{}; {}", existing, value),
                    None => value.to_string(),
                });
            }
            "ID" => r.set_extra(EXTRA_CITATION_KEY, value),
            other => {
                let joined = match r.extras.get(other) {
                    Some(existing) => format!("{}; {}", existing, value),
                    None => value.to_string(),
                };
                r.extras.insert(other.to_string(), joined);
            }
        }
    }

    if !authors.is_empty() {
        r.author = Some(Contributors::Structured(authors));
    }
    if !editors.is_empty() {
        r.editor = Some(Contributors::Structured(editors));
    }
    r.pages = match (start_page, end_page) {
        (Some(start), end) => Some(normalize_pages(&join_pages(&start, end.as_deref()))),
        (None, Some(end)) => Some(normalize_pages(&end)),
        (None, None) => None,
    };

    Ok(r)
}

/// RIS `TY` code for export: the original code when it still agrees with
/// the record's type, otherwise the reverse table.
fn export_type(r: &CanonicalReference) -> String {
    match r.extra(EXTRA_RIS_TYPE) {
        Some(code) if ReferenceType::from_ris(code) == r.reference_type => code.to_uppercase(),
        _ => r.reference_type.ris_code().to_string(),
    }
}

/// Convert a canonical reference into a RIS entry in export tag order
pub fn from_reference(r: &CanonicalReference, options: &SerializeOptions) -> RisEntry {
    let mut entry = RisEntry::new(export_type(r));

    entry.add_opt("ID", r.citation_key());
    for author in r.authors() {
        entry.add_tag("AU", author.formatted());
    }
    entry.add_opt("TI", r.title.as_deref());
    for editor in r.editors() {
        entry.add_tag("A2", editor.formatted());
    }

    entry.add_opt("JO", r.journal.as_deref());
    entry.add_opt("T2", r.publication.as_deref());

    if let Some(year) = r.year {
        entry.add_tag("PY", year.to_string());
    }
    entry.add_opt("VL", r.volume.as_deref());
    entry.add_opt("IS", r.issue.as_deref());
    if let Some(pages) = r.pages.as_deref() {
        let (start, end) = split_pages(pages);
        entry.add_opt("SP", Some(start.as_str()));
        entry.add_opt("EP", end.as_deref());
    }
    entry.add_opt("PB", r.publisher.as_deref());
    entry.add_opt("CY", r.location.as_deref());
    entry.add_opt("ET", r.edition.as_deref());
    entry.add_opt("DO", r.doi.as_deref());
    entry.add_opt("SN", r.isbn.as_deref());
    entry.add_opt("SN", r.issn.as_deref());
    entry.add_opt("UR", r.url.as_deref());

    if let Some(abstract_text) = r.abstract_text.as_deref() {
        if options.wrap_abstracts {
            let width = options.max_line_length.saturating_sub(TAG_PREFIX_LEN).max(1);
            let mut lines = wrap_words(abstract_text, width).into_iter();
            if let Some(first) = lines.next() {
                entry.add_tag("AB", first);
                // Continuation lines are written untagged by the formatter
                for line in lines {
                    entry.add_tag("", line);
                }
            }
        } else {
            entry.add_opt("AB", Some(abstract_text));
        }
    }

    for keyword in &r.keywords {
        entry.add_opt("KW", Some(keyword.as_str()));
    }
    entry.add_opt("LA", r.language.as_deref());
    entry.add_opt("N1", r.notes.as_deref());

    if options.include_extra_fields {
        for (key, value) in &r.extras {
            if !RESERVED_EXTRAS.contains(&key.as_str())
                && PASSTHROUGH_TAG.is_match(key)
                && !matches!(key.as_str(), "TY" | "ER")
            {
                entry.add_opt(key, Some(value.as_str()));
            }
        }
    }

    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ris::parser::parse_entries;

    fn parse_one(input: &str) -> CanonicalReference {
        let entries = parse_entries(input).unwrap();
        to_reference(&entries[0], 0).unwrap()
    }

    #[test]
    fn test_tag_mapping() {
        let r = parse_one(
            "TY  - CHAP\nT1  - Chapter Title\nA1  - Smith, John\nED  - Roe, Richard\nY1  - 2019/04/01\nBT  - The Book\nSP  - 10\nEP  - 20\nCY  - Boston\nSN  - 978-0-306-40615-7\nL2  - https://example.org/c\nN2  - Summary.\nKW  - one; two\nKW  - three\nER  - ",
        );
        assert_eq!(r.reference_type, ReferenceType::Chapter);
        assert_eq!(r.title.as_deref(), Some("Chapter Title"));
        assert_eq!(r.editors()[0].family, "Roe");
        assert_eq!(r.year, Some(2019));
        assert_eq!(r.publication.as_deref(), Some("The Book"));
        assert_eq!(r.pages.as_deref(), Some("10-20"));
        assert_eq!(r.location.as_deref(), Some("Boston"));
        assert_eq!(r.isbn.as_deref(), Some("9780306406157"));
        assert_eq!(r.url.as_deref(), Some("https://example.org/c"));
        assert_eq!(r.abstract_text.as_deref(), Some("Summary."));
        assert_eq!(r.keywords, vec!["one", "two", "three"]);
        assert_eq!(r.extra(EXTRA_RIS_TYPE), Some("CHAP"));
    }

    #[test]
    fn test_issn_detected_by_shape() {
        let r = parse_one("TY  - JOUR\nTI  - T\nSN  - 0028-0836\nER  - ");
        assert_eq!(r.issn.as_deref(), Some("0028-0836"));
        assert_eq!(r.isbn, None);
    }

    #[test]
    fn test_unknown_tags_are_kept() {
        let r = parse_one("TY  - JOUR\nTI  - T\nM3  - first\nM3  - second\nID  - smith2020\nER  - ");
        assert_eq!(r.extra("M3"), Some("first; second"));
        assert_eq!(r.citation_key(), Some("smith2020"));
    }

    #[test]
    fn test_unknown_type_maps_to_other() {
        let r = parse_one("TY  - WXYZ\nTI  - T\nER  - ");
        assert_eq!(r.reference_type, ReferenceType::Other);
        assert_eq!(r.extra(EXTRA_RIS_TYPE), Some("WXYZ"));
    }

    #[test]
    fn test_record_level_errors() {
        let entries = parse_entries("TY  - JOUR\nTI  - Dated\nPY  - someday\nER  - ").unwrap();
        let err = to_reference(&entries[0], 0).unwrap_err();
        assert_eq!(err.identifier, "Dated");
        assert!(matches!(err.error, InterchangeError::InvalidDateFormat { .. }));

        let entries = parse_entries("TY  - JOUR\nAU  - , John\nER  - ").unwrap();
        let err = to_reference(&entries[0], 4).unwrap_err();
        assert_eq!(err.identifier, "record 5");
        assert!(matches!(err.error, InterchangeError::InvalidAuthorFormat { .. }));
    }

    #[test]
    fn test_export_order_and_pages() {
        let mut r = CanonicalReference::new(ReferenceType::Journal, "A Study");
        r.author = Some(Contributors::parse("Smith, J."));
        r.year = Some(2020);
        r.pages = Some("123-145".to_string());
        r.journal = Some("Journal".to_string());
        r.publication = Some("Container".to_string());

        let entry = from_reference(&r, &SerializeOptions::default());
        let tags: Vec<&str> = entry.tags.iter().map(|t| t.tag.as_str()).collect();
        assert_eq!(tags, vec!["AU", "TI", "JO", "T2", "PY", "SP", "EP"]);
        assert_eq!(entry.get_tag("JO"), Some("Journal"));
        assert_eq!(entry.get_tag("T2"), Some("Container"));
        assert_eq!(entry.get_tag("SP"), Some("123"));
        assert_eq!(entry.get_tag("EP"), Some("145"));
    }

    #[test]
    fn test_one_name_per_author_line() {
        let r = parse_one(
            "TY  - BOOK\nAU  - García Márquez, Gabriel José\nAU  - Smith, J. & Sons\nTI  - Cien años\nER  - ",
        );
        let authors = r.authors();
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].family, "García Márquez");
        assert_eq!(authors[0].given.as_deref(), Some("Gabriel José"));

        let back = parse_one(&crate::ris::formatter::format_entry(&from_reference(
            &r,
            &SerializeOptions::default(),
        )));
        assert_eq!(back.authors(), authors);
    }

    #[test]
    fn test_journal_on_book_stays_journal() {
        let mut r = CanonicalReference::new(ReferenceType::Book, "Collected");
        r.journal = Some("Series Journal".to_string());

        let entry = from_reference(&r, &SerializeOptions::default());
        assert_eq!(entry.get_tag("JO"), Some("Series Journal"));
        assert_eq!(entry.get_tag("T2"), None);
    }

    #[test]
    fn test_export_reuses_source_type_code() {
        let mut r = CanonicalReference::new(ReferenceType::Journal, "T");
        r.set_extra(EXTRA_RIS_TYPE, "EJOUR");
        assert_eq!(from_reference(&r, &SerializeOptions::default()).ris_type, "EJOUR");

        r.reference_type = ReferenceType::Book;
        assert_eq!(from_reference(&r, &SerializeOptions::default()).ris_type, "BOOK");
    }

    #[test]
    fn test_abstract_wrapping_respects_width() {
        let mut r = CanonicalReference::new(ReferenceType::Journal, "T");
        r.abstract_text = Some("word ".repeat(40).trim().to_string());

        let options = SerializeOptions {
            max_line_length: 30,
            ..Default::default()
        };
        let entry = from_reference(&r, &options);
        let abstract_lines: Vec<_> = entry
            .tags
            .iter()
            .filter(|t| t.tag == "AB" || t.tag.is_empty())
            .collect();
        assert!(abstract_lines.len() > 1);
        assert!(abstract_lines
            .iter()
            .all(|t| t.value.chars().count() <= 30 - TAG_PREFIX_LEN));
    }
}
