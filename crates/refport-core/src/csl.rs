//! CSL-JSON import and export
//!
//! Export maps canonical records onto CSL items. Import is lenient: it takes
//! CSL keys as well as the canonical field names, so a JSON dump of
//! `CanonicalReference` values reads back unchanged.

use serde_json::{json, Map, Value};

use refport_domain::normalize::{
    clean_doi, clean_isbn, clean_issn, clean_keywords, clean_pmid, clean_url, non_empty,
    normalize_pages, parse_date_field,
};
use refport_domain::{
    CanonicalReference, Contributors, InterchangeError, PersonName, RecordError, ReferenceType,
    Result, EXTRA_CITATION_KEY, RESERVED_EXTRAS,
};

use crate::format::{record_label, Format, ParseOptions, ParsedRecord, ReferenceFormat, SerializeOptions};

/// Keys that may wrap the item list in an object
const LIST_KEYS: &[&str] = &["references", "items"];

fn names_to_csl(names: &[PersonName]) -> Value {
    Value::Array(
        names
            .iter()
            .map(|n| match &n.given {
                Some(given) => json!({ "family": n.family, "given": given }),
                None => json!({ "family": n.family }),
            })
            .collect(),
    )
}

/// Convert one reference to a CSL item. `index` numbers items without a key.
pub fn to_csl(r: &CanonicalReference, index: usize, options: &SerializeOptions) -> Value {
    let mut item = Map::new();
    let mut put = |key: &str, value: Option<&str>| {
        if let Some(value) = value.and_then(non_empty) {
            item.insert(key.to_string(), Value::String(value));
        }
    };

    put("type", Some(r.reference_type.csl_type()));
    match r.citation_key() {
        Some(key) => {
            put("id", Some(key));
            put("citation-key", Some(key));
        }
        None => put("id", Some(&format!("ITEM-{}", index + 1))),
    }
    put("title", r.title.as_deref());
    let container = if r.reference_type.is_serial() {
        r.journal_or_container()
    } else {
        r.container_or_journal()
    };
    put("container-title", container);
    put("publisher", r.publisher.as_deref());
    put("publisher-place", r.location.as_deref());
    put("volume", r.volume.as_deref());
    put("issue", r.issue.as_deref());
    put("page", r.pages.as_deref());
    put("DOI", r.doi.as_deref());
    put("PMID", r.pmid.as_deref());
    put("ISBN", r.isbn.as_deref());
    put("ISSN", r.issn.as_deref());
    put("URL", r.url.as_deref());
    put("abstract", r.abstract_text.as_deref());
    put("keyword", r.keywords_joined().as_deref());
    put("language", r.language.as_deref());
    put("edition", r.edition.as_deref());
    put("note", r.notes.as_deref());

    let authors = r.authors();
    if !authors.is_empty() {
        item.insert("author".to_string(), names_to_csl(&authors));
    }
    let editors = r.editors();
    if !editors.is_empty() {
        item.insert("editor".to_string(), names_to_csl(&editors));
    }
    if let Some(year) = r.year {
        item.insert("issued".to_string(), json!({ "date-parts": [[year]] }));
    }

    if options.include_extra_fields {
        let custom: Map<String, Value> = r
            .extras
            .iter()
            .filter(|(k, _)| !RESERVED_EXTRAS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        if !custom.is_empty() {
            item.insert("custom".to_string(), Value::Object(custom));
        }
    }

    Value::Object(item)
}

/// Scalar JSON value as trimmed text
fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn first_text(item: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().filter_map(|k| item.get(*k)).find_map(text)
}

fn person(value: &Value) -> Option<PersonName> {
    match value {
        Value::String(s) => PersonName::parse(s),
        Value::Object(o) => {
            let family = o
                .get("family")
                .and_then(text)
                .or_else(|| o.get("literal").and_then(text))?;
            let name = PersonName::new(family);
            Some(match o.get("given").and_then(text) {
                Some(given) => name.with_given(given),
                None => name,
            })
        }
        _ => None,
    }
}

fn contributors(value: &Value) -> std::result::Result<Option<Contributors>, InterchangeError> {
    let invalid = || InterchangeError::InvalidAuthorFormat {
        value: value.to_string(),
    };
    let names = match value {
        Value::Null => return Ok(None),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => Contributors::parse(s).names(),
        Value::Array(items) => items
            .iter()
            .map(|v| person(v).ok_or_else(invalid))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        _ => return Err(invalid()),
    };
    if names.is_empty() {
        return Err(invalid());
    }
    Ok(Some(Contributors::Structured(names)))
}

/// Year from `year`, `issued` (date-parts, raw or literal) or `date`
fn year(item: &Map<String, Value>) -> std::result::Result<Option<i32>, InterchangeError> {
    if let Some(year) = item.get("year").and_then(text) {
        return parse_date_field(&year);
    }
    match item.get("issued") {
        Some(Value::Object(issued)) => {
            let from_parts = issued
                .get("date-parts")
                .and_then(|p| p.get(0))
                .and_then(|p| p.get(0))
                .and_then(text);
            match from_parts.or_else(|| first_text(issued, &["raw", "literal"])) {
                Some(value) => parse_date_field(&value),
                None => Ok(None),
            }
        }
        Some(other) => text(other).map_or(Ok(None), |v| parse_date_field(&v)),
        None => item
            .get("date")
            .and_then(text)
            .map_or(Ok(None), |v| parse_date_field(&v)),
    }
}

fn keywords(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(text).collect(),
        other => text(other).map(|k| clean_keywords(&k)).unwrap_or_default(),
    }
}

/// Convert a CSL item, or an object using canonical field names
pub fn from_csl(item: &Map<String, Value>) -> std::result::Result<CanonicalReference, InterchangeError> {
    let reference_type = first_text(item, &["type"])
        .map(|t| ReferenceType::from_alias(&t))
        .unwrap_or_default();

    let mut r = CanonicalReference {
        reference_type,
        title: first_text(item, &["title"]),
        year: year(item)?,
        publisher: first_text(item, &["publisher"]),
        location: first_text(item, &["publisher-place", "location", "place"]),
        volume: first_text(item, &["volume"]),
        issue: first_text(item, &["issue", "number"]),
        pages: first_text(item, &["page", "pages"]).map(|p| normalize_pages(&p)),
        doi: first_text(item, &["DOI", "doi"]).and_then(|v| clean_doi(&v)),
        pmid: first_text(item, &["PMID", "pmid"]).and_then(|v| clean_pmid(&v)),
        isbn: first_text(item, &["ISBN", "isbn"]).and_then(|v| clean_isbn(&v)),
        issn: first_text(item, &["ISSN", "issn"]).and_then(|v| clean_issn(&v)),
        url: first_text(item, &["URL", "url"]).and_then(|v| clean_url(&v)),
        abstract_text: first_text(item, &["abstract"]),
        language: first_text(item, &["language"]),
        edition: first_text(item, &["edition"]),
        notes: first_text(item, &["note", "notes"]),
        ..Default::default()
    };

    r.journal = first_text(item, &["journal"]);
    r.publication = first_text(item, &["publication"]);
    if let Some(container) = first_text(item, &["container-title"]) {
        let slot = if reference_type.is_serial() {
            &mut r.journal
        } else {
            &mut r.publication
        };
        slot.get_or_insert(container);
    }

    if let Some(value) = item.get("author").or_else(|| item.get("authors")) {
        r.author = contributors(value)?;
    }
    if let Some(value) = item.get("editor").or_else(|| item.get("editors")) {
        r.editor = contributors(value)?;
    }
    if let Some(value) = item.get("keyword").or_else(|| item.get("keywords")) {
        r.keywords = keywords(value);
    }

    for key in ["custom", "extras"] {
        if let Some(Value::Object(extras)) = item.get(key) {
            for (k, v) in extras {
                if let Some(v) = text(v) {
                    r.set_extra(k.as_str(), v);
                }
            }
        }
    }
    if let Some(key) = first_text(item, &["citation-key", EXTRA_CITATION_KEY]) {
        r.set_extra(EXTRA_CITATION_KEY, key);
    }

    Ok(r)
}

/// Records from a parsed JSON value: an array of items, a single item, or an
/// object holding a `references` or `items` array
pub fn references_from_value(value: &Value) -> Result<Vec<ParsedRecord>> {
    let items: Vec<&Value> = match value {
        Value::Array(items) => items.iter().collect(),
        Value::Object(obj) => match LIST_KEYS.iter().find_map(|k| obj.get(*k)) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(_) => {
                return Err(InterchangeError::invalid_format(
                    "JSON",
                    "reference list is not an array",
                ))
            }
            None => vec![value],
        },
        _ => {
            return Err(InterchangeError::invalid_format(
                "JSON",
                "expected an array or an object",
            ))
        }
    };

    if items.is_empty() {
        return Err(InterchangeError::NoReferencesFound);
    }

    Ok(items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::Object(obj) => from_csl(obj).map_err(|e| {
                let title = first_text(obj, &["title"]);
                RecordError::new(record_label(title.as_deref(), index), e)
            }),
            _ => Err(RecordError::new(
                record_label(None, index),
                InterchangeError::ParseError {
                    message: "item is not a JSON object".to_string(),
                },
            )),
        })
        .collect())
}

fn parse_value(content: &str) -> Result<Value> {
    let trimmed = content.trim_start_matches('\u{feff}').trim();
    if trimmed.is_empty() {
        return Err(InterchangeError::EmptyContent);
    }
    serde_json::from_str(trimmed).map_err(|e| InterchangeError::invalid_format("JSON", e.to_string()))
}

/// Serialize references as a pretty-printed CSL-JSON array
pub fn serialize(references: &[CanonicalReference], options: &SerializeOptions) -> Result<String> {
    let items: Vec<Value> = references
        .iter()
        .enumerate()
        .map(|(index, r)| to_csl(r, index, options))
        .collect();
    serde_json::to_string_pretty(&items).map_err(|e| InterchangeError::FormatError {
        message: e.to_string(),
    })
}

/// CSL-JSON handler for the format registry
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl ReferenceFormat for JsonFormat {
    fn format(&self) -> Format {
        Format::Json
    }

    fn validate(&self, content: &str) -> Result<()> {
        parse_value(content).map(|_| ())
    }

    fn parse_records(&self, content: &str, _options: &ParseOptions) -> Result<Vec<ParsedRecord>> {
        references_from_value(&parse_value(content)?)
    }

    fn serialize(
        &self,
        references: &[CanonicalReference],
        options: &SerializeOptions,
    ) -> Result<String> {
        serialize(references, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CanonicalReference {
        let mut r = CanonicalReference::new(ReferenceType::Journal, "A Study");
        r.author = Some(Contributors::parse("Smith, John; Doe, Jane"));
        r.year = Some(2020);
        r.journal = Some("Nature".to_string());
        r.pages = Some("1-10".to_string());
        r.doi = Some("10.1/abc".to_string());
        r.keywords = vec!["x".to_string(), "y".to_string()];
        r.set_extra("shelf", "QA76");
        r
    }

    #[test]
    fn test_to_csl_shapes() {
        let item = to_csl(&sample(), 0, &SerializeOptions::default());
        assert_eq!(item["type"], "article-journal");
        assert_eq!(item["id"], "ITEM-1");
        assert!(item.get("citation-key").is_none());
        assert_eq!(item["author"][0], json!({"family": "Smith", "given": "John"}));
        assert_eq!(item["issued"]["date-parts"][0][0], 2020);
        assert_eq!(item["container-title"], "Nature");
        assert_eq!(item["page"], "1-10");
        assert_eq!(item["DOI"], "10.1/abc");
        assert_eq!(item["keyword"], "x, y");
        assert_eq!(item["custom"]["shelf"], "QA76");
    }

    #[test]
    fn test_csl_round_trip() {
        let mut original = sample();
        original.set_extra(EXTRA_CITATION_KEY, "smith2020study");

        let out = JsonFormat
            .serialize(&[original.clone()], &SerializeOptions::default())
            .unwrap();
        let back = JsonFormat.parse(&out).unwrap();
        assert_eq!(back, vec![original]);
    }

    #[test]
    fn test_canonical_json_is_accepted() {
        let r = sample();
        let value = serde_json::to_value(vec![&r]).unwrap();
        let back = references_from_value(&value).unwrap();
        assert_eq!(back[0].as_ref().unwrap(), &r);
    }

    #[test]
    fn test_lenient_shapes() {
        let value = json!({
            "items": [
                {"title": "Strings", "type": "book", "author": ["Jane Doe", "Roe, Richard"], "issued": {"raw": "May 1999"}},
                {"title": "Formatted", "authors": "Smith, J. and Jones, K.", "year": 2001, "keywords": "a; b"},
                {"title": "Chapter", "type": "chapter", "container-title": "Big Book", "issued": "2003"}
            ]
        });
        let records: Vec<_> = references_from_value(&value)
            .unwrap()
            .into_iter()
            .map(|r| r.unwrap())
            .collect();

        assert_eq!(records[0].reference_type, ReferenceType::Book);
        assert_eq!(records[0].authors()[0].family, "Doe");
        assert_eq!(records[0].authors()[1].family, "Roe");
        assert_eq!(records[0].year, Some(1999));
        assert_eq!(records[1].authors().len(), 2);
        assert_eq!(records[1].year, Some(2001));
        assert_eq!(records[1].keywords, vec!["a", "b"]);
        assert_eq!(records[1].reference_type, ReferenceType::Other);
        assert_eq!(records[2].publication.as_deref(), Some("Big Book"));
        assert_eq!(records[2].year, Some(2003));
    }

    #[test]
    fn test_single_object_and_errors() {
        let single = references_from_value(&json!({"title": "Solo"})).unwrap();
        assert_eq!(single.len(), 1);

        assert_eq!(
            references_from_value(&json!([])),
            Err(InterchangeError::NoReferencesFound)
        );
        assert!(matches!(
            references_from_value(&json!("nope")),
            Err(InterchangeError::InvalidFormat { .. })
        ));

        let mixed = references_from_value(&json!([{"title": "Ok"}, 42, {"title": "Bad", "year": "whenever"}])).unwrap();
        assert!(mixed[0].is_ok());
        assert_eq!(mixed[1].as_ref().unwrap_err().identifier, "record 2");
        assert_eq!(mixed[2].as_ref().unwrap_err().identifier, "Bad");
    }

    #[test]
    fn test_invalid_json() {
        assert_eq!(JsonFormat.validate("  "), Err(InterchangeError::EmptyContent));
        assert!(matches!(
            JsonFormat.validate("[{"),
            Err(InterchangeError::InvalidFormat { .. })
        ));
    }
}
