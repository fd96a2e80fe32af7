//! Core data models for the clipping pipeline.

mod identifier;
mod message;
mod record;
mod summary;

pub use identifier::{normalize_doi, strip_version, ArxivId, Identifier, ARXIV_DOI_PREFIX};
pub use message::{PageRequest, PageResponse, SidecarRequest, SidecarResponse, SIDECAR_TARGET};
pub use record::{
    FinalizedRecord, MetadataRecord, PageHints, RecordBuilder, DEFAULT_DOCUMENT_TYPE,
    PDF_DOCUMENT_TYPE,
};
pub use summary::{
    Summary, NOTHING_TO_SUMMARIZE, SUMMARY_EXTRACTION_FAILED, SUMMARY_SKIPPED,
};
