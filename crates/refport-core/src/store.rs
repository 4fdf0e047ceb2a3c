//! Record store contract
//!
//! The interchange layer owns no persistence. Orchestrators talk to whatever
//! store the host provides through `RecordStore`; `InMemoryStore` is the
//! reference implementation used by tests and the CLI's JSON library file.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use refport_domain::normalize::{clean_doi, collapse_whitespace};
use refport_domain::{CanonicalReference, InterchangeError, Result};

pub type RecordId = u64;

/// A record as held by a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: RecordId,
    pub reference: CanonicalReference,
}

/// Operations the import and export orchestrators rely on
pub trait RecordStore {
    /// Record whose DOI matches (case-insensitive, prefixes stripped)
    fn find_by_doi(&self, doi: &str) -> Result<Option<StoredRecord>>;

    /// Records with exactly this title
    fn find_by_title(&self, title: &str) -> Result<Vec<StoredRecord>>;

    fn create(&mut self, reference: &CanonicalReference) -> Result<RecordId>;

    fn update(&mut self, id: RecordId, reference: &CanonicalReference) -> Result<()>;

    fn get_usage_count(&self, id: RecordId) -> Result<u64>;

    fn get(&self, id: RecordId) -> Result<Option<StoredRecord>>;
}

/// Title comparison key: whitespace collapsed, case folded
fn title_key(title: &str) -> String {
    collapse_whitespace(title).to_lowercase()
}

fn not_found(id: RecordId) -> InterchangeError {
    InterchangeError::Store {
        message: format!("record {} not found", id),
    }
}

/// Ordered, serde-serializable store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InMemoryStore {
    next_id: RecordId,
    records: BTreeMap<RecordId, CanonicalReference>,
    #[serde(default)]
    usage: BTreeMap<RecordId, u64>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.records.keys().copied().collect()
    }

    pub fn records(&self) -> impl Iterator<Item = StoredRecord> + '_ {
        self.records.iter().map(|(id, reference)| StoredRecord {
            id: *id,
            reference: reference.clone(),
        })
    }

    pub fn set_usage_count(&mut self, id: RecordId, count: u64) -> Result<()> {
        if !self.records.contains_key(&id) {
            return Err(not_found(id));
        }
        self.usage.insert(id, count);
        Ok(())
    }
}

impl RecordStore for InMemoryStore {
    fn find_by_doi(&self, doi: &str) -> Result<Option<StoredRecord>> {
        let Some(wanted) = clean_doi(doi) else {
            return Ok(None);
        };

        Ok(self
            .records()
            .find(|r| {
                r.reference
                    .doi
                    .as_deref()
                    .and_then(clean_doi)
                    .is_some_and(|d| d.eq_ignore_ascii_case(&wanted))
            }))
    }

    fn find_by_title(&self, title: &str) -> Result<Vec<StoredRecord>> {
        let wanted = title_key(title);
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        Ok(self
            .records()
            .filter(|r| r.reference.title.as_deref().map(title_key).as_deref() == Some(wanted.as_str()))
            .collect())
    }

    fn create(&mut self, reference: &CanonicalReference) -> Result<RecordId> {
        self.next_id += 1;
        let id = self.next_id;
        self.records.insert(id, reference.clone());
        Ok(id)
    }

    fn update(&mut self, id: RecordId, reference: &CanonicalReference) -> Result<()> {
        match self.records.get_mut(&id) {
            Some(existing) => {
                *existing = reference.clone();
                Ok(())
            }
            None => Err(not_found(id)),
        }
    }

    fn get_usage_count(&self, id: RecordId) -> Result<u64> {
        if !self.records.contains_key(&id) {
            return Err(not_found(id));
        }
        Ok(self.usage.get(&id).copied().unwrap_or(0))
    }

    fn get(&self, id: RecordId) -> Result<Option<StoredRecord>> {
        Ok(self.records.get(&id).map(|reference| StoredRecord {
            id,
            reference: reference.clone(),
        }))
    }
}
