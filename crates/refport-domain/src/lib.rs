//! Canonical bibliographic model for the refport interchange layer
//!
//! This crate holds everything the format handlers share:
//! - CanonicalReference: one format-agnostic bibliographic record
//! - ReferenceType: the canonical type taxonomy and per-format type tables
//! - PersonName / Contributors: author and editor lists in both representations
//! - normalize: idempotent value cleaning (DOI, pages, keywords, years...)
//! - InterchangeError: the error taxonomy shared by parsers and orchestrators

pub mod error;
pub mod names;
pub mod normalize;
pub mod reference;
pub mod reference_type;

pub use error::{InterchangeError, RecordError, Result};
pub use names::{format_names, parse_names, split_names, Contributors, PersonName};
pub use reference::{
    CanonicalReference, EXTRA_BIBTEX_TYPE, EXTRA_CITATION_KEY, EXTRA_RIS_TYPE, RESERVED_EXTRAS,
};
pub use reference_type::ReferenceType;
