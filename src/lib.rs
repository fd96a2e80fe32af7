//! # Scholar Clip
//!
//! Save the academic paper behind a URL (HTML landing page or PDF) into a
//! Notion database, with bibliographic metadata resolved from the page, arXiv
//! and Crossref, and an AI summary generated by Gemini.
//!
//! ## Architecture
//!
//! - [`extract`]: metadata and text scraped from page markup
//! - [`resolve`]: the one identifier (arXiv id or DOI) that keys enrichment
//! - [`sources`]: registry plugins behind the [`Source`] trait
//! - [`enrich`]: registry fields merged over page fields
//! - [`finalize`]: display name and citation key derivation
//! - [`sidecar`]: lazily created, isolated PDF text worker
//! - [`summarize`]: Gemini summary requests
//! - [`store`]: Notion page payloads and writes
//! - [`pipeline`]: the save request that ties the stages together
//! - [`config`]: layered settings

pub mod config;
pub mod enrich;
pub mod error;
pub mod extract;
pub mod finalize;
pub mod models;
pub mod page;
pub mod pipeline;
pub mod resolve;
pub mod sidecar;
pub mod sources;
pub mod store;
pub mod summarize;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use error::PipelineError;
pub use models::{FinalizedRecord, Identifier, MetadataRecord, Summary};
pub use page::{FetchedPage, PageContext};
pub use pipeline::{SaveMode, SaveOutcome, SavePipeline};
pub use sources::{Source, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
