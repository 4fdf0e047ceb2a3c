//! Reference type taxonomy and the per-format type mapping tables
//!
//! Forward tables (source tag → canonical type) are static slices. Reverse
//! mappings are exhaustive matches, so adding a variant without a mapping
//! fails to compile.

use serde::{Deserialize, Serialize};

/// Canonical reference type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceType {
    Journal,
    Book,
    Chapter,
    Conference,
    Thesis,
    Report,
    Website,
    Newspaper,
    Magazine,
    #[default]
    Other,
}

/// RIS type codes
pub const RIS_TYPES: &[(&str, ReferenceType)] = &[
    ("JOUR", ReferenceType::Journal),
    ("JFULL", ReferenceType::Journal),
    ("EJOUR", ReferenceType::Journal),
    ("ABST", ReferenceType::Journal),
    ("INPR", ReferenceType::Journal),
    ("BOOK", ReferenceType::Book),
    ("EBOOK", ReferenceType::Book),
    ("EDBOOK", ReferenceType::Book),
    ("CLSWK", ReferenceType::Book),
    ("CHAP", ReferenceType::Chapter),
    ("ECHAP", ReferenceType::Chapter),
    ("ENCYC", ReferenceType::Chapter),
    ("DICT", ReferenceType::Chapter),
    ("CONF", ReferenceType::Conference),
    ("CPAPER", ReferenceType::Conference),
    ("THES", ReferenceType::Thesis),
    ("RPRT", ReferenceType::Report),
    ("GOVDOC", ReferenceType::Report),
    ("STAND", ReferenceType::Report),
    ("ELEC", ReferenceType::Website),
    ("BLOG", ReferenceType::Website),
    ("ICOMM", ReferenceType::Website),
    ("WEB", ReferenceType::Website),
    ("DBASE", ReferenceType::Website),
    ("NEWS", ReferenceType::Newspaper),
    ("MGZN", ReferenceType::Magazine),
    ("GEN", ReferenceType::Other),
    ("UNPB", ReferenceType::Other),
    ("MANSCPT", ReferenceType::Other),
    ("PAT", ReferenceType::Other),
    ("COMP", ReferenceType::Other),
    ("DATA", ReferenceType::Other),
    ("PCOMM", ReferenceType::Other),
    ("SER", ReferenceType::Other),
    ("CTLG", ReferenceType::Other),
    ("PAMP", ReferenceType::Other),
];

/// BibTeX entry types
pub const BIBTEX_TYPES: &[(&str, ReferenceType)] = &[
    ("article", ReferenceType::Journal),
    ("book", ReferenceType::Book),
    ("inbook", ReferenceType::Chapter),
    ("incollection", ReferenceType::Chapter),
    ("inproceedings", ReferenceType::Conference),
    ("conference", ReferenceType::Conference),
    ("proceedings", ReferenceType::Conference),
    ("phdthesis", ReferenceType::Thesis),
    ("mastersthesis", ReferenceType::Thesis),
    ("techreport", ReferenceType::Report),
    ("manual", ReferenceType::Report),
    ("online", ReferenceType::Website),
    ("electronic", ReferenceType::Website),
    ("www", ReferenceType::Website),
    ("booklet", ReferenceType::Other),
    ("unpublished", ReferenceType::Other),
    ("misc", ReferenceType::Other),
];

/// CSL item types
pub const CSL_TYPES: &[(&str, ReferenceType)] = &[
    ("article-journal", ReferenceType::Journal),
    ("article", ReferenceType::Journal),
    ("book", ReferenceType::Book),
    ("chapter", ReferenceType::Chapter),
    ("entry-encyclopedia", ReferenceType::Chapter),
    ("entry-dictionary", ReferenceType::Chapter),
    ("paper-conference", ReferenceType::Conference),
    ("thesis", ReferenceType::Thesis),
    ("report", ReferenceType::Report),
    ("webpage", ReferenceType::Website),
    ("post-weblog", ReferenceType::Website),
    ("article-newspaper", ReferenceType::Newspaper),
    ("article-magazine", ReferenceType::Magazine),
    ("document", ReferenceType::Other),
    ("manuscript", ReferenceType::Other),
    ("patent", ReferenceType::Other),
    ("dataset", ReferenceType::Other),
];

/// Human-readable labels, as found in spreadsheet exports
pub const LABELS: &[(&str, ReferenceType)] = &[
    ("journal article", ReferenceType::Journal),
    ("journal", ReferenceType::Journal),
    ("article", ReferenceType::Journal),
    ("book", ReferenceType::Book),
    ("edited book", ReferenceType::Book),
    ("book chapter", ReferenceType::Chapter),
    ("book section", ReferenceType::Chapter),
    ("chapter", ReferenceType::Chapter),
    ("conference paper", ReferenceType::Conference),
    ("conference proceedings", ReferenceType::Conference),
    ("proceedings", ReferenceType::Conference),
    ("thesis", ReferenceType::Thesis),
    ("dissertation", ReferenceType::Thesis),
    ("phd thesis", ReferenceType::Thesis),
    ("report", ReferenceType::Report),
    ("technical report", ReferenceType::Report),
    ("website", ReferenceType::Website),
    ("web page", ReferenceType::Website),
    ("webpage", ReferenceType::Website),
    ("newspaper article", ReferenceType::Newspaper),
    ("newspaper", ReferenceType::Newspaper),
    ("magazine article", ReferenceType::Magazine),
    ("magazine", ReferenceType::Magazine),
    ("other", ReferenceType::Other),
    ("generic", ReferenceType::Other),
];

fn lookup(table: &[(&str, ReferenceType)], key: &str) -> Option<ReferenceType> {
    table
        .iter()
        .find(|(code, _)| code.eq_ignore_ascii_case(key))
        .map(|(_, t)| *t)
}

impl ReferenceType {
    pub const ALL: [ReferenceType; 10] = [
        Self::Journal,
        Self::Book,
        Self::Chapter,
        Self::Conference,
        Self::Thesis,
        Self::Report,
        Self::Website,
        Self::Newspaper,
        Self::Magazine,
        Self::Other,
    ];

    /// Canonical tag
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Journal => "journal",
            Self::Book => "book",
            Self::Chapter => "chapter",
            Self::Conference => "conference",
            Self::Thesis => "thesis",
            Self::Report => "report",
            Self::Website => "website",
            Self::Newspaper => "newspaper",
            Self::Magazine => "magazine",
            Self::Other => "other",
        }
    }

    /// Parse a canonical tag. Returns `None` for anything else.
    pub fn from_canonical(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
    }

    /// Map a RIS `TY` code; unknown codes become `Other`.
    pub fn from_ris(code: &str) -> Self {
        lookup(RIS_TYPES, code.trim()).unwrap_or(Self::Other)
    }

    /// Map a BibTeX entry type; unknown types become `Other`.
    pub fn from_bibtex(entry_type: &str) -> Self {
        lookup(BIBTEX_TYPES, entry_type.trim()).unwrap_or(Self::Other)
    }

    /// Map a CSL item type; unknown types become `Other`.
    pub fn from_csl(csl_type: &str) -> Self {
        lookup(CSL_TYPES, csl_type.trim()).unwrap_or(Self::Other)
    }

    /// Resolve any type spelling: canonical tag, human label, BibTeX, CSL or
    /// RIS code, in that order.
    pub fn from_alias(value: &str) -> Self {
        let value = value.trim();
        let label = value.replace(['_', '-'], " ").to_lowercase();
        Self::from_canonical(value)
            .or_else(|| lookup(LABELS, &label))
            .or_else(|| lookup(BIBTEX_TYPES, value))
            .or_else(|| lookup(CSL_TYPES, value))
            .or_else(|| lookup(RIS_TYPES, value))
            .unwrap_or(Self::Other)
    }

    /// RIS code used on export
    pub fn ris_code(&self) -> &'static str {
        match self {
            Self::Journal => "JOUR",
            Self::Book => "BOOK",
            Self::Chapter => "CHAP",
            Self::Conference => "CONF",
            Self::Thesis => "THES",
            Self::Report => "RPRT",
            Self::Website => "ELEC",
            Self::Newspaper => "NEWS",
            Self::Magazine => "MGZN",
            Self::Other => "GEN",
        }
    }

    /// BibTeX entry type used on export
    pub fn bibtex_type(&self) -> &'static str {
        match self {
            Self::Journal | Self::Newspaper | Self::Magazine => "article",
            Self::Book => "book",
            Self::Chapter => "incollection",
            Self::Conference => "inproceedings",
            Self::Thesis => "phdthesis",
            Self::Report => "techreport",
            Self::Website => "online",
            Self::Other => "misc",
        }
    }

    /// CSL item type used on export
    pub fn csl_type(&self) -> &'static str {
        match self {
            Self::Journal => "article-journal",
            Self::Book => "book",
            Self::Chapter => "chapter",
            Self::Conference => "paper-conference",
            Self::Thesis => "thesis",
            Self::Report => "report",
            Self::Website => "webpage",
            Self::Newspaper => "article-newspaper",
            Self::Magazine => "article-magazine",
            Self::Other => "document",
        }
    }

    /// Label written to spreadsheet exports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Journal => "Journal Article",
            Self::Book => "Book",
            Self::Chapter => "Book Chapter",
            Self::Conference => "Conference Paper",
            Self::Thesis => "Thesis",
            Self::Report => "Report",
            Self::Website => "Website",
            Self::Newspaper => "Newspaper Article",
            Self::Magazine => "Magazine Article",
            Self::Other => "Other",
        }
    }

    /// Types whose container is a serial (journal, newspaper, magazine).
    pub fn is_serial(&self) -> bool {
        matches!(self, Self::Journal | Self::Newspaper | Self::Magazine)
    }
}

impl std::fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
