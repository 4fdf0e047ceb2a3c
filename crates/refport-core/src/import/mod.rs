//! Import pipeline
//!
//! Detect the format, parse, validate each record, check it against the
//! store for duplicates and then create, merge or skip it. Format-level
//! errors abort the run; anything that goes wrong with a single record is
//! collected in the statistics and the run carries on.

use std::path::Path;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use refport_domain::{CanonicalReference, InterchangeError, RecordError, Result};

use crate::config::ImportConfig;
use crate::csl::references_from_value;
use crate::deduplication::find_duplicate;
use crate::format::{handler_for, record_label, Format, ParseOptions, ParsedRecord, ReferenceFormat};
use crate::store::{RecordId, RecordStore};

/// Per-run import settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportOptions {
    /// Skip detection and parse as this format
    pub format: Option<Format>,
    /// Source file name, consulted for its extension before sniffing
    pub file_name: Option<String>,
    pub update_existing: bool,
    pub batch_size: usize,
    pub parse: ParseOptions,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::from(&ImportConfig::default())
    }
}

impl From<&ImportConfig> for ImportOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            format: None,
            file_name: None,
            update_existing: config.update_existing,
            batch_size: config.batch_size,
            parse: ParseOptions::from(config),
        }
    }
}

impl ImportOptions {
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn update_existing(mut self, update: bool) -> Self {
        self.update_existing = update;
        self
    }
}

/// What happened to one imported record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportAction {
    Created,
    /// Merged into an existing duplicate
    Updated,
    /// Duplicate left untouched
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportedRecord {
    /// Position in the source, 0-based
    pub index: usize,
    pub identifier: String,
    pub action: ImportAction,
    /// Store id of the created, updated or matching record
    pub id: RecordId,
}

/// Counters for one import run
///
/// `total == successful + failed.len() + skipped`; `duplicates` counts both
/// updated and skipped records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportStatistics {
    pub total: usize,
    pub successful: usize,
    pub failed: Vec<RecordError>,
    pub duplicates: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub format: Option<Format>,
}

impl ImportStatistics {
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    fn record(&mut self, action: ImportAction) {
        match action {
            ImportAction::Created => {
                self.successful += 1;
                self.created += 1;
            }
            ImportAction::Updated => {
                self.successful += 1;
                self.duplicates += 1;
                self.updated += 1;
            }
            ImportAction::Skipped => {
                self.duplicates += 1;
                self.skipped += 1;
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub statistics: ImportStatistics,
    pub records: Vec<ImportedRecord>,
}

/// Runs imports into a borrowed store
pub struct Importer<'a, S: RecordStore + ?Sized> {
    store: &'a mut S,
    options: ImportOptions,
}

impl<'a, S: RecordStore + ?Sized> Importer<'a, S> {
    pub fn new(store: &'a mut S, options: ImportOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Import text content, using the configured format hint and file name
    pub fn import_str(&mut self, content: &str) -> Result<ImportReport> {
        let file_name = self.options.file_name.clone();
        self.import_content(content, file_name.as_deref())
    }

    /// Read and import a file; its extension takes part in format detection
    pub fn import_file(&mut self, path: impl AsRef<Path>) -> Result<ImportReport> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| InterchangeError::Io {
            message: format!("{}: {}", path.display(), e),
        })?;
        let file_name = self
            .options
            .file_name
            .clone()
            .or_else(|| path.file_name().map(|n| n.to_string_lossy().into_owned()));
        self.import_content(&content, file_name.as_deref())
    }

    /// Import an already parsed JSON value (CSL-JSON or canonical objects)
    pub fn import_json(&mut self, value: &Value) -> Result<ImportReport> {
        let parsed = references_from_value(value)?;
        self.import_parsed(parsed, Format::Json)
    }

    fn import_content(&mut self, content: &str, file_name: Option<&str>) -> Result<ImportReport> {
        let format = Format::resolve(self.options.format, file_name, content)?;
        let handler = handler_for(format);
        handler.validate(content)?;
        let parsed = handler.parse_records(content, &self.options.parse)?;
        self.import_parsed(parsed, format)
    }

    /// Store already parsed records, rejected entries counted as failures
    pub fn import_parsed(&mut self, parsed: Vec<ParsedRecord>, format: Format) -> Result<ImportReport> {
        let mut report = ImportReport {
            statistics: ImportStatistics {
                format: Some(format),
                ..Default::default()
            },
            records: Vec::new(),
        };
        info!(%format, records = parsed.len(), "starting import");

        let batch_size = self.options.batch_size.max(1);
        for (batch, chunk) in parsed.chunks(batch_size).enumerate() {
            let start = batch * batch_size;
            debug!(batch = batch + 1, size = chunk.len(), "importing batch");

            for (offset, item) in chunk.iter().enumerate() {
                let index = start + offset;
                report.statistics.total += 1;

                let reference = match item {
                    Ok(reference) => reference.without_empty_fields(),
                    Err(e) => {
                        warn!(record = %e.identifier, error = %e.error, "rejected record");
                        report.statistics.failed.push(e.clone());
                        continue;
                    }
                };

                let identifier = reference
                    .identifier()
                    .unwrap_or_else(|| record_label(None, index));

                match self.store_record(&reference) {
                    Ok((action, id)) => {
                        report.statistics.record(action);
                        report.records.push(ImportedRecord {
                            index,
                            identifier,
                            action,
                            id,
                        });
                    }
                    Err(e) => {
                        warn!(record = %identifier, error = %e, "failed to import record");
                        report.statistics.failed.push(RecordError::new(identifier, e));
                    }
                }
            }
        }

        let stats = &report.statistics;
        info!(
            total = stats.total,
            created = stats.created,
            updated = stats.updated,
            skipped = stats.skipped,
            failed = stats.failed_count(),
            "import finished"
        );
        Ok(report)
    }

    /// Validate one record and create, merge or skip it
    fn store_record(&mut self, reference: &CanonicalReference) -> Result<(ImportAction, RecordId)> {
        reference.validate()?;

        match find_duplicate(&*self.store, reference)? {
            Some(duplicate) if self.options.update_existing => {
                let id = duplicate.id();
                let mut merged = duplicate.record.reference;
                merged.merge_from(reference);
                self.store.update(id, &merged)?;
                debug!(id, reason = %duplicate.reason, "merged duplicate");
                Ok((ImportAction::Updated, id))
            }
            Some(duplicate) => {
                debug!(id = duplicate.id(), reason = %duplicate.reason, "skipped duplicate");
                Ok((ImportAction::Skipped, duplicate.id()))
            }
            None => Ok((ImportAction::Created, self.store.create(reference)?)),
        }
    }
}
