//! Bibliographic interchange for refport
//!
//! Parsers and serializers for RIS, BibTeX, CSV and CSL-JSON, plus the
//! import and export orchestration that moves canonical records in and out of
//! an external record store.
//!
//! Module overview:
//! - `format`: format enum, content sniffing, the `ReferenceFormat` trait
//! - `ris`, `bibtex`, `csv`, `csl`: one handler per interchange format
//! - `deduplication`: DOI and title/first-author duplicate matching
//! - `store`: the record store contract and an in-memory store
//! - `import` / `export`: orchestrators with per-run statistics
//! - `config`: TOML/JSON configuration

pub mod bibtex;
pub mod config;
pub mod csl;
pub mod csv;
pub mod deduplication;
pub mod export;
pub mod format;
pub mod import;
pub mod ris;
pub mod store;

pub use refport_domain::{
    CanonicalReference, Contributors, InterchangeError, PersonName, RecordError, ReferenceType,
    Result,
};

pub use config::{ConfigError, EmphasisMode, ExportConfig, ImportConfig, RefportConfig};
pub use deduplication::{find_duplicate, DuplicateMatch};
pub use export::{export_references, ExportOptions, ExportPayload, ExportStatistics, Exporter};
pub use format::{handler_for, Format, ParseOptions, ParsedRecord, ReferenceFormat, SerializeOptions};
pub use import::{ImportAction, ImportOptions, ImportReport, ImportStatistics, ImportedRecord, Importer};
pub use store::{InMemoryStore, RecordId, RecordStore, StoredRecord};
