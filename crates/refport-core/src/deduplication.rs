//! Duplicate detection against the record store
//!
//! A DOI match is authoritative. Without one, records sharing an exact title
//! are told apart by their first author's surname, compared on the last
//! token of the family name with case, punctuation and diacritics removed so
//! that "Smith, John" and "John Smith" agree.

use std::fmt;

use tracing::debug;

use refport_domain::normalize::clean_doi;
use refport_domain::{CanonicalReference, PersonName, Result};

use crate::store::{RecordId, RecordStore, StoredRecord};

/// Surnames this short are too ambiguous to disambiguate on
const MIN_SURNAME_LEN: usize = 3;

/// Why a stored record was judged a duplicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    Doi,
    TitleAndAuthor,
    /// Same title and at least one side has no authors
    Title,
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Doi => f.write_str("DOI match"),
            Self::TitleAndAuthor => f.write_str("title and first author match"),
            Self::Title => f.write_str("title match"),
        }
    }
}

/// A stored record matching an incoming one
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch {
    pub record: StoredRecord,
    pub reason: MatchReason,
}

impl DuplicateMatch {
    pub fn id(&self) -> RecordId {
        self.record.id
    }
}

/// Whether two first authors share a usable surname
pub fn surnames_match(a: &PersonName, b: &PersonName) -> bool {
    let (a, b) = (a.surname_key(), b.surname_key());
    a.len() >= MIN_SURNAME_LEN && a == b
}

/// Look for a stored record that `reference` duplicates.
pub fn find_duplicate<S: RecordStore + ?Sized>(
    store: &S,
    reference: &CanonicalReference,
) -> Result<Option<DuplicateMatch>> {
    if let Some(doi) = reference.doi.as_deref().and_then(clean_doi) {
        if let Some(record) = store.find_by_doi(&doi)? {
            debug!(doi = %doi, id = record.id, "duplicate by DOI");
            return Ok(Some(DuplicateMatch {
                record,
                reason: MatchReason::Doi,
            }));
        }
    }

    let Some(title) = reference.title.as_deref().filter(|t| !t.trim().is_empty()) else {
        return Ok(None);
    };

    let incoming_author = reference.first_author();
    for candidate in store.find_by_title(title)? {
        let reason = match (&incoming_author, candidate.reference.first_author()) {
            (Some(ours), Some(theirs)) if surnames_match(ours, &theirs) => {
                MatchReason::TitleAndAuthor
            }
            (Some(_), Some(_)) => continue,
            _ => MatchReason::Title,
        };

        debug!(title, id = candidate.id, %reason, "duplicate by title");
        return Ok(Some(DuplicateMatch {
            record: candidate,
            reason,
        }));
    }

    Ok(None)
}
