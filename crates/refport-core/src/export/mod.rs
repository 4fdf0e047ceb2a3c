//! Export pipeline
//!
//! Fetch records from the store, drop empty values, apply the include flags
//! and hand the result to the target format's serializer.

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::{info, warn};

use refport_domain::{CanonicalReference, InterchangeError, RecordError, Result, RESERVED_EXTRAS};

use crate::config::ExportConfig;
use crate::csv::CsvFormat;
use crate::format::{handler_for, Format, ReferenceFormat, SerializeOptions};
use crate::store::{RecordId, RecordStore};

/// Per-run export settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub include_abstracts: bool,
    pub include_keywords: bool,
    pub include_urls: bool,
    pub filename_prefix: String,
    pub serialize: SerializeOptions,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from(&ExportConfig::default())
    }
}

impl From<&ExportConfig> for ExportOptions {
    fn from(config: &ExportConfig) -> Self {
        Self {
            include_abstracts: config.include_abstracts,
            include_keywords: config.include_keywords,
            include_urls: config.include_urls,
            filename_prefix: config.filename_prefix.clone(),
            serialize: SerializeOptions::from(config),
        }
    }
}

impl ExportOptions {
    /// Copy of `reference` as it should be written out
    pub fn prepare(&self, reference: &CanonicalReference) -> CanonicalReference {
        let mut r = reference.without_empty_fields();
        if !self.include_abstracts {
            r.abstract_text = None;
        }
        if !self.include_keywords {
            r.keywords.clear();
        }
        if !self.include_urls {
            r.url = None;
        }
        if !self.serialize.include_extra_fields {
            r.extras.retain(|k, _| RESERVED_EXTRAS.contains(&k.as_str()));
        }
        r
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportStatistics {
    pub requested: usize,
    pub exported: usize,
    pub failed: Vec<RecordError>,
    /// Sum of the store's usage counts over exported records
    pub total_usage: u64,
}

/// Serialized output plus download metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportPayload {
    pub content: String,
    pub filename: String,
    pub mime_type: String,
    pub format: Format,
    pub statistics: ExportStatistics,
}

/// `<prefix>-<YYYYMMDD-HHMMSS>.<ext>`
pub fn export_filename(prefix: &str, format: Format, at: DateTime<Local>) -> String {
    format!(
        "{}-{}.{}",
        prefix.trim(),
        at.format("%Y%m%d-%H%M%S"),
        format.extension()
    )
}

fn serialize(
    references: &[CanonicalReference],
    usage: &[u64],
    format: Format,
    options: &ExportOptions,
) -> Result<String> {
    let prepared: Vec<CanonicalReference> = references.iter().map(|r| options.prepare(r)).collect();
    if format == Format::Csv && options.serialize.include_usage_count {
        CsvFormat.serialize_with_usage(&prepared, usage, &options.serialize)
    } else {
        handler_for(format).serialize(&prepared, &options.serialize)
    }
}

fn payload(content: String, format: Format, options: &ExportOptions, statistics: ExportStatistics) -> ExportPayload {
    ExportPayload {
        content,
        filename: export_filename(&options.filename_prefix, format, Local::now()),
        mime_type: format.mime_type().to_string(),
        format,
        statistics,
    }
}

/// Export in-memory references without a store; usage counts are zero
pub fn export_references(
    references: &[CanonicalReference],
    format: Format,
    options: &ExportOptions,
) -> Result<ExportPayload> {
    let usage = vec![0; references.len()];
    let content = serialize(references, &usage, format, options)?;
    let statistics = ExportStatistics {
        requested: references.len(),
        exported: references.len(),
        ..Default::default()
    };
    Ok(payload(content, format, options, statistics))
}

/// Exports records held by a store
pub struct Exporter<'a, S: RecordStore + ?Sized> {
    store: &'a S,
    options: ExportOptions,
}

impl<'a, S: RecordStore + ?Sized> Exporter<'a, S> {
    pub fn new(store: &'a S, options: ExportOptions) -> Self {
        Self { store, options }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Export the given ids in order. Missing or unreadable records are
    /// listed in the statistics and left out of the payload.
    pub fn export_ids(&self, ids: &[RecordId], format: Format) -> Result<ExportPayload> {
        let mut statistics = ExportStatistics {
            requested: ids.len(),
            ..Default::default()
        };
        let mut references = Vec::with_capacity(ids.len());
        let mut usage = Vec::with_capacity(ids.len());

        for &id in ids {
            match self.fetch(id) {
                Ok((reference, count)) => {
                    references.push(reference);
                    usage.push(count);
                }
                Err(e) => {
                    warn!(id, error = %e, "record not exported");
                    statistics.failed.push(RecordError::new(format!("record {}", id), e));
                }
            }
        }

        let content = serialize(&references, &usage, format, &self.options)?;
        statistics.exported = references.len();
        statistics.total_usage = usage.iter().sum();

        info!(
            %format,
            requested = statistics.requested,
            exported = statistics.exported,
            failed = statistics.failed.len(),
            "export finished"
        );
        Ok(payload(content, format, &self.options, statistics))
    }

    fn fetch(&self, id: RecordId) -> Result<(CanonicalReference, u64)> {
        let record = self.store.get(id)?.ok_or_else(|| InterchangeError::Store {
            message: format!("record {} not found", id),
        })?;
        let usage = self.store.get_usage_count(id)?;
        Ok((record.reference, usage))
    }
}
