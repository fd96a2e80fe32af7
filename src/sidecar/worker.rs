//! The isolated PDF worker: a task that owns its mailbox and answers one request at a time.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{ContextLauncher, Envelope, SidecarError, SidecarHandle};
use crate::models::{SidecarRequest, SidecarResponse, SIDECAR_TARGET};
use crate::utils::{pdf, HttpClient};

const MAILBOX_CAPACITY: usize = 16;

/// Launches the worker as a tokio task
#[derive(Debug, Clone)]
pub struct WorkerLauncher {
    client: HttpClient,
}

impl WorkerLauncher {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ContextLauncher for WorkerLauncher {
    async fn launch(&self) -> Result<SidecarHandle, SidecarError> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| SidecarError::Launch(e.to_string()))?;

        let (mailbox, inbox) = mpsc::channel(MAILBOX_CAPACITY);
        runtime.spawn(run(self.client.clone(), inbox));
        Ok(SidecarHandle::new(mailbox))
    }
}

async fn run(client: HttpClient, mut inbox: mpsc::Receiver<Envelope>) {
    tracing::debug!("PDF worker started");
    while let Some(Envelope { request, reply }) = inbox.recv().await {
        let response = handle_request(&client, request).await;
        if reply.send(response).is_err() {
            tracing::debug!("PDF request abandoned by caller");
        }
    }
    tracing::debug!("PDF worker stopped");
}

/// Dispatch one request addressed to the worker
pub async fn handle_request(client: &HttpClient, request: SidecarRequest) -> SidecarResponse {
    match request {
        SidecarRequest::ExtractPdfText { target, pdf_url } => {
            if target != SIDECAR_TARGET {
                return SidecarResponse::failure(format!("Unknown target: {}", target));
            }
            extract_from_url(client, &pdf_url).await
        }
    }
}

async fn extract_from_url(client: &HttpClient, pdf_url: &str) -> SidecarResponse {
    tracing::info!("Extracting PDF text from {}", pdf_url);

    let bytes = match fetch(client, pdf_url).await {
        Ok(bytes) => bytes,
        Err(message) => return SidecarResponse::failure(message),
    };

    // lopdf parsing is CPU-bound
    let parsed = tokio::task::spawn_blocking(move || pdf::extract_text(&bytes)).await;

    match parsed {
        Ok(Ok(text)) => SidecarResponse::text(text),
        Ok(Err(e)) => SidecarResponse::failure(e.to_string()),
        Err(e) => SidecarResponse::failure(format!("PDF worker task failed: {}", e)),
    }
}

async fn fetch(client: &HttpClient, pdf_url: &str) -> Result<Vec<u8>, String> {
    let response = client
        .get(pdf_url)
        .send()
        .await
        .map_err(|e| format!("Failed to fetch PDF: {}", e))?;

    if !response.status().is_success() {
        return Err(format!("Failed to fetch PDF: HTTP {}", response.status()));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| format!("Failed to read PDF body: {}", e))?;
    Ok(bytes.to_vec())
}
