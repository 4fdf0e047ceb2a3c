//! The canonical reference record

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{InterchangeError, Result};
use crate::names::{Contributors, PersonName};
use crate::normalize::{clean_keywords, join_keywords, non_empty};
use crate::reference_type::ReferenceType;

/// Extras key holding the BibTeX citation key (or RIS `ID`)
pub const EXTRA_CITATION_KEY: &str = "citation_key";
/// Extras key holding the original RIS `TY` code
pub const EXTRA_RIS_TYPE: &str = "ris_type";
/// Extras key holding the original BibTeX entry type
pub const EXTRA_BIBTEX_TYPE: &str = "bibtex_type";

/// Extras keys owned by the interchange layer itself
pub const RESERVED_EXTRAS: &[&str] = &[EXTRA_CITATION_KEY, EXTRA_RIS_TYPE, EXTRA_BIBTEX_TYPE];

/// One bibliographic entry in format-agnostic form
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalReference {
    #[serde(rename = "type", default)]
    pub reference_type: ReferenceType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Contributors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<Contributors>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journal: Option<String>,
    /// Container title: book title for chapters, proceedings for papers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_keywords",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Format-specific passthrough (citation key, original type tags,
    /// unmapped source fields)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extras: BTreeMap<String, String>,
}

/// Keywords arrive either as one delimited string or as a list.
fn deserialize_keywords<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Keywords {
        Joined(String),
        List(Vec<String>),
    }

    Ok(match Option::<Keywords>::deserialize(deserializer)? {
        Some(Keywords::Joined(s)) => clean_keywords(&s),
        Some(Keywords::List(list)) => list
            .iter()
            .filter_map(|k| non_empty(k))
            .collect(),
        None => Vec::new(),
    })
}

impl CanonicalReference {
    pub fn new(reference_type: ReferenceType, title: impl Into<String>) -> Self {
        Self {
            reference_type,
            title: non_empty(title.into()),
            ..Default::default()
        }
    }

    pub fn authors(&self) -> Vec<PersonName> {
        self.author.as_ref().map(Contributors::names).unwrap_or_default()
    }

    pub fn editors(&self) -> Vec<PersonName> {
        self.editor.as_ref().map(Contributors::names).unwrap_or_default()
    }

    pub fn first_author(&self) -> Option<PersonName> {
        self.author.as_ref().and_then(Contributors::first)
    }

    pub fn citation_key(&self) -> Option<&str> {
        self.extra(EXTRA_CITATION_KEY)
    }

    pub fn extra(&self, key: &str) -> Option<&str> {
        self.extras.get(key).map(String::as_str)
    }

    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<String>) {
        if let Some(value) = non_empty(value.into()) {
            self.extras.insert(key.into(), value);
        }
    }

    /// Journal, falling back to the container title
    pub fn journal_or_container(&self) -> Option<&str> {
        self.journal.as_deref().or(self.publication.as_deref())
    }

    /// Container title, falling back to the journal
    pub fn container_or_journal(&self) -> Option<&str> {
        self.publication.as_deref().or(self.journal.as_deref())
    }

    pub fn keywords_joined(&self) -> Option<String> {
        (!self.keywords.is_empty()).then(|| join_keywords(&self.keywords))
    }

    /// Best-known human identifier for statistics and error lists
    pub fn identifier(&self) -> Option<String> {
        self.title
            .clone()
            .or_else(|| self.doi.clone())
            .or_else(|| self.citation_key().map(String::from))
    }

    /// Check the hard validity rules: a non-empty title and well-formed
    /// structured names.
    pub fn validate(&self) -> Result<()> {
        if self.title.as_deref().map_or(true, |t| t.trim().is_empty()) {
            return Err(InterchangeError::missing_field("title"));
        }
        for contributors in [&self.author, &self.editor].into_iter().flatten() {
            if let Contributors::Structured(names) = contributors {
                if let Some(bad) = names.iter().find(|n| n.family.trim().is_empty()) {
                    return Err(InterchangeError::InvalidAuthorFormat {
                        value: bad.formatted(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Copy with blank values removed and strings trimmed.
    pub fn without_empty_fields(&self) -> Self {
        let clean = |v: &Option<String>| v.as_deref().and_then(non_empty);
        let clean_names = |c: &Option<Contributors>| {
            c.as_ref()
                .map(|c| c.clone().into_structured())
                .filter(|c| !c.is_empty())
        };

        Self {
            reference_type: self.reference_type,
            title: clean(&self.title),
            author: clean_names(&self.author),
            editor: clean_names(&self.editor),
            year: self.year,
            journal: clean(&self.journal),
            publication: clean(&self.publication),
            publisher: clean(&self.publisher),
            volume: clean(&self.volume),
            issue: clean(&self.issue),
            pages: clean(&self.pages),
            doi: clean(&self.doi),
            pmid: clean(&self.pmid),
            isbn: clean(&self.isbn),
            issn: clean(&self.issn),
            url: clean(&self.url),
            abstract_text: clean(&self.abstract_text),
            keywords: self.keywords.iter().filter_map(non_empty).collect(),
            language: clean(&self.language),
            location: clean(&self.location),
            edition: clean(&self.edition),
            notes: clean(&self.notes),
            extras: self
                .extras
                .iter()
                .filter_map(|(k, v)| non_empty(v).map(|v| (k.clone(), v)))
                .collect(),
        }
    }

    /// Fold an incoming record into this one: every non-empty incoming field
    /// wins, fields the incoming record lacks are kept.
    pub fn merge_from(&mut self, incoming: &CanonicalReference) {
        let incoming = incoming.without_empty_fields();

        if incoming.reference_type != ReferenceType::Other {
            self.reference_type = incoming.reference_type;
        }

        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(
                    if incoming.$field.is_some() {
                        self.$field = incoming.$field.clone();
                    }
                )*
            };
        }
        take!(
            title,
            author,
            editor,
            year,
            journal,
            publication,
            publisher,
            volume,
            issue,
            pages,
            doi,
            pmid,
            isbn,
            issn,
            url,
            abstract_text,
            language,
            location,
            edition,
            notes,
        );

        if !incoming.keywords.is_empty() {
            self.keywords = incoming.keywords.clone();
        }
        self.extras.extend(incoming.extras);
    }
}
