//! The save pipeline: one request in, one status message out.
//!
//! Stages run in a fixed order:
//!
//! 1. credentials (before any network call)
//! 2. page details from the page context
//! 3. identifier resolution
//! 4. registry enrichment (failures degrade, never abort)
//! 5. PDF text from the sidecar when the page is a PDF (failures degrade)
//! 6. finalization (display name, citation key)
//! 7. summary generation
//! 8. store write
//!
//! Errors from stages 1, 2, 7 and 8 abort the request.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::config::Settings;
use crate::enrich::enrich;
use crate::error::PipelineError;
use crate::finalize::finalize;
use crate::models::{FinalizedRecord, MetadataRecord, PageRequest, PageResponse, Summary};
use crate::page::PageContext;
use crate::resolve::resolve_identifier;
use crate::sidecar::PdfSidecar;
use crate::sources::SourceRegistry;
use crate::store::{CreatedPage, NotionWriter};
use crate::summarize::GeminiClient;
use crate::utils::HttpClient;

/// Whether the store write actually happens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveMode {
    #[default]
    Create,
    /// Build the store payload but do not send it
    DryRun,
}

/// Where the finalized record ended up
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    Created(CreatedPage),
    DryRun(Value),
}

/// Everything a successful save produced
#[derive(Debug, Clone)]
pub struct SaveReport {
    pub record: FinalizedRecord,
    pub summary: Summary,
    pub destination: Destination,
}

/// The single status message reported for a save attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub success: bool,
    pub message: String,
}

impl SaveOutcome {
    pub fn from_result(result: &Result<SaveReport, PipelineError>) -> Self {
        match result {
            Ok(report) => {
                let name = report.record.display_name();
                let message = match &report.destination {
                    Destination::Created(_) => format!("Saved \"{}\" to Notion", name),
                    Destination::DryRun(_) => {
                        format!("Prepared \"{}\" (dry run, nothing saved)", name)
                    }
                };
                Self {
                    success: true,
                    message,
                }
            }
            Err(e) => Self {
                success: false,
                message: e.to_string(),
            },
        }
    }
}

/// Runs save requests against one set of settings
#[derive(Debug)]
pub struct SavePipeline {
    settings: Settings,
    client: HttpClient,
    registry: SourceRegistry,
    sidecar: Arc<PdfSidecar>,
}

impl SavePipeline {
    /// Pipeline wired to the real registries and the in-process PDF worker
    pub fn new(settings: Settings) -> Result<Self, PipelineError> {
        let client = HttpClient::from_settings(&settings.http)
            .map_err(|e| PipelineError::external("HTTP client", e.to_string()))?;
        let registry = SourceRegistry::new(client.clone(), &settings.sources);
        let sidecar = Arc::new(PdfSidecar::with_worker(client.clone(), &settings.sidecar));
        Ok(Self::with_parts(settings, client, registry, sidecar))
    }

    pub fn with_parts(
        settings: Settings,
        client: HttpClient,
        registry: SourceRegistry,
        sidecar: Arc<PdfSidecar>,
    ) -> Self {
        Self {
            settings,
            client,
            registry,
            sidecar,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    pub fn sidecar(&self) -> &Arc<PdfSidecar> {
        &self.sidecar
    }

    /// Run a save and reduce it to its status message
    pub async fn run(&self, page: &dyn PageContext, mode: SaveMode) -> SaveOutcome {
        let result = self.save(page, mode).await;
        if let Err(e) = &result {
            tracing::error!("Save failed for {}: {}", page.url(), e);
        }
        SaveOutcome::from_result(&result)
    }

    /// Run every stage for the page behind `page`
    pub async fn save(
        &self,
        page: &dyn PageContext,
        mode: SaveMode,
    ) -> Result<SaveReport, PipelineError> {
        let credentials = self.settings.credentials()?;

        let record = self.prepare(page).await?;

        let summary = self.summarize(&record, &credentials.gemini_api_key).await?;

        let writer = NotionWriter::new(
            self.client.clone(),
            &self.settings.notion,
            credentials.notion_api_key,
            credentials.notion_database_id,
        );
        let destination = match mode {
            SaveMode::Create => Destination::Created(writer.create_page(&record, &summary).await?),
            SaveMode::DryRun => Destination::DryRun(writer.payload(&record, &summary)),
        };

        Ok(SaveReport {
            record,
            summary,
            destination,
        })
    }

    /// Resolve, enrich and finalize the page without summarizing or storing it
    ///
    /// Needs no credentials.
    pub async fn inspect(&self, page: &dyn PageContext) -> Result<FinalizedRecord, PipelineError> {
        self.prepare(page).await
    }

    async fn prepare(&self, page: &dyn PageContext) -> Result<FinalizedRecord, PipelineError> {
        let mut record = match page.handle(PageRequest::GetPageDetails).await {
            PageResponse::Details(record) => *record,
            PageResponse::Error { message, .. } => {
                return Err(PipelineError::PageUnavailable(message))
            }
        };
        tracing::debug!(url = %record.url, is_pdf = record.is_pdf, "Page details received");

        let identifier = resolve_identifier(&mut record);
        match &identifier {
            Some(id) => tracing::info!("Resolved identifier {}", id),
            None => tracing::info!("No identifier found on {}", record.url),
        }

        enrich(&mut record, identifier.as_ref(), &self.registry).await;

        if record.is_pdf {
            self.attach_pdf_text(&mut record).await;
        }
        truncate_chars(&mut record.body_text, self.settings.pipeline.max_body_chars);

        Ok(finalize(record))
    }

    async fn attach_pdf_text(&self, record: &mut MetadataRecord) {
        let response = self.sidecar.extract(&record.url).await;
        match response.text {
            Some(text) => {
                tracing::debug!(chars = text.chars().count(), "PDF text attached");
                record.body_text = text;
            }
            None => {
                let diagnostic = response
                    .error
                    .unwrap_or_else(|| "no text returned".to_string());
                tracing::warn!("{}", PipelineError::ExtractionEmpty(diagnostic));
            }
        }
    }

    async fn summarize(
        &self,
        record: &FinalizedRecord,
        api_key: &str,
    ) -> Result<Summary, PipelineError> {
        let text = record.record().body_text.trim();
        if text.chars().count() <= self.settings.pipeline.min_summary_chars {
            tracing::info!("Not enough text to summarize");
            return Ok(Summary::skipped());
        }

        GeminiClient::new(self.client.clone(), &self.settings.gemini, api_key)
            .summarize(text)
            .await
    }
}

/// Cut `text` down to at most `max` characters
pub fn truncate_chars(text: &mut String, max: usize) {
    if let Some((cut, _)) = text.char_indices().nth(max) {
        text.truncate(cut);
    }
}
