//! Column name aliases
//!
//! Spreadsheet exports name the same column a dozen ways. Every header is
//! normalized (case, `_`/`-` and repeated spaces folded) and looked up here.

/// Canonical field → accepted column names
const HEADER_ALIASES: &[(&str, &[&str])] = &[
    (
        "type",
        &[
            "type",
            "reference type",
            "item type",
            "document type",
            "publication type",
            "entry type",
            "ref type",
        ],
    ),
    (
        "title",
        &["title", "article title", "document title", "primary title", "name"],
    ),
    (
        "author",
        &["author", "authors", "author(s)", "creator", "creators", "contributors"],
    ),
    ("editor", &["editor", "editors", "secondary author"]),
    (
        "year",
        &[
            "year",
            "publication year",
            "pub year",
            "pubyear",
            "date",
            "publication date",
            "published",
        ],
    ),
    (
        "journal",
        &["journal", "journal name", "journal title", "source title", "periodical"],
    ),
    (
        "publication",
        &[
            "publication",
            "publication title",
            "container",
            "container title",
            "book title",
            "booktitle",
            "secondary title",
        ],
    ),
    ("publisher", &["publisher", "publisher name", "institution", "school"]),
    ("volume", &["volume", "vol"]),
    ("issue", &["issue", "number", "no", "issue number"]),
    ("pages", &["pages", "page", "page numbers", "page range"]),
    ("doi", &["doi", "digital object identifier"]),
    ("pmid", &["pmid", "pubmed id", "pubmed"]),
    ("isbn", &["isbn"]),
    ("issn", &["issn", "eissn"]),
    ("url", &["url", "link", "web link", "website"]),
    ("abstract", &["abstract", "summary", "description"]),
    ("keywords", &["keywords", "keyword", "tags", "subjects"]),
    ("language", &["language", "lang"]),
    ("location", &["location", "place", "place published", "address", "city"]),
    ("edition", &["edition"]),
    ("notes", &["notes", "note", "comments"]),
    (
        "citation_key",
        &["citation key", "cite key", "citekey", "bibtex key", "key"],
    ),
];

/// Columns written on export that carry no record data
const IGNORED_HEADERS: &[&str] = &["usage count"];

/// Lowercase, `_` and `-` as spaces, whitespace collapsed
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}')
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Canonical field name for a column header, if it is a known alias
pub fn canonical_header(raw: &str) -> Option<&'static str> {
    let normalized = normalize_header(raw);
    HEADER_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.iter().any(|a| normalize_header(a) == normalized))
        .map(|(field, _)| *field)
}

/// Whether a column is deliberately dropped on import
pub fn is_ignored(raw: &str) -> bool {
    IGNORED_HEADERS.contains(&normalize_header(raw).as_str())
}
