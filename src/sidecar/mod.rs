//! PDF extraction sidecar.
//!
//! PDF parsing runs in an isolated worker reached only through a mailbox of
//! [`SidecarRequest`]s, each answered over its own oneshot channel. The worker
//! is created lazily on first use and reused afterwards:
//!
//! ```text
//! Absent ──ensure()──▶ Creating ──launch + settle delay──▶ Ready
//!    ▲                     │
//!    └──── launch failed ──┘
//! ```
//!
//! Callers arriving while the worker is `Creating` await the same shared
//! pending future, so concurrent `ensure()` calls launch exactly one worker.
//! A waiter only moves the state on if its launch is still the one in the
//! slot; results of an older launch never overwrite a newer one.

mod worker;

pub use worker::{handle_request, WorkerLauncher};

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::{mpsc, oneshot};

use crate::config::SidecarSettings;
use crate::models::{SidecarRequest, SidecarResponse};
use crate::utils::HttpClient;

/// Sidecar errors. Cloneable so a single launch result can be shared by every waiter.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SidecarError {
    #[error("Failed to create PDF context: {0}")]
    Launch(String),

    #[error("PDF context is not reachable: {0}")]
    Closed(String),

    #[error("PDF extraction timed out after {0:?}")]
    Timeout(Duration),
}

/// A request together with the channel its answer goes back on
#[derive(Debug)]
pub struct Envelope {
    pub request: SidecarRequest,
    pub reply: oneshot::Sender<SidecarResponse>,
}

/// Sending half of a running worker's mailbox
#[derive(Debug, Clone)]
pub struct SidecarHandle {
    mailbox: mpsc::Sender<Envelope>,
}

impl SidecarHandle {
    pub fn new(mailbox: mpsc::Sender<Envelope>) -> Self {
        Self { mailbox }
    }

    /// Send one request and wait for its answer
    pub async fn send(&self, request: SidecarRequest) -> Result<SidecarResponse, SidecarError> {
        let (reply, answer) = oneshot::channel();
        self.mailbox
            .send(Envelope { request, reply })
            .await
            .map_err(|_| SidecarError::Closed("mailbox closed".to_string()))?;

        answer
            .await
            .map_err(|_| SidecarError::Closed("worker dropped the request".to_string()))
    }

    pub fn is_closed(&self) -> bool {
        self.mailbox.is_closed()
    }
}

/// Creates the isolated context the sidecar talks to
#[async_trait]
pub trait ContextLauncher: Send + Sync + std::fmt::Debug {
    async fn launch(&self) -> Result<SidecarHandle, SidecarError>;
}

type PendingLaunch = Shared<BoxFuture<'static, Result<SidecarHandle, SidecarError>>>;

enum Lifecycle {
    Absent,
    Creating(PendingLaunch),
    Ready(SidecarHandle),
}

/// Observable lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SidecarState {
    Absent,
    Creating,
    Ready,
}

/// Lazily created, reused PDF extraction context
pub struct PdfSidecar {
    launcher: Arc<dyn ContextLauncher>,
    lifecycle: Mutex<Lifecycle>,
    settle_delay: Duration,
    request_timeout: Duration,
}

impl std::fmt::Debug for PdfSidecar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfSidecar")
            .field("launcher", &self.launcher)
            .field("state", &self.state())
            .field("settle_delay", &self.settle_delay)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl PdfSidecar {
    pub fn new(
        launcher: Arc<dyn ContextLauncher>,
        settle_delay: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            launcher,
            lifecycle: Mutex::new(Lifecycle::Absent),
            settle_delay,
            request_timeout,
        }
    }

    /// Sidecar backed by the in-process worker task
    pub fn with_worker(client: HttpClient, settings: &SidecarSettings) -> Self {
        Self::new(
            Arc::new(WorkerLauncher::new(client)),
            Duration::from_millis(settings.settle_delay_ms),
            Duration::from_secs(settings.request_timeout_secs),
        )
    }

    pub fn state(&self) -> SidecarState {
        match &*self.lock() {
            Lifecycle::Absent => SidecarState::Absent,
            Lifecycle::Creating(_) => SidecarState::Creating,
            Lifecycle::Ready(_) => SidecarState::Ready,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Return the running context, creating it if needed
    pub async fn ensure(&self) -> Result<SidecarHandle, SidecarError> {
        let pending = {
            let mut lifecycle = self.lock();
            let in_flight = match &*lifecycle {
                Lifecycle::Ready(handle) => return Ok(handle.clone()),
                Lifecycle::Creating(pending) => Some(pending.clone()),
                Lifecycle::Absent => None,
            };
            match in_flight {
                Some(pending) => pending,
                None => {
                    let pending = self.start_launch();
                    *lifecycle = Lifecycle::Creating(pending.clone());
                    pending
                }
            }
        };

        let result = pending.clone().await;

        let mut lifecycle = self.lock();
        // only the launch still occupying the slot may settle it
        if matches!(&*lifecycle, Lifecycle::Creating(current) if current.ptr_eq(&pending)) {
            *lifecycle = match &result {
                Ok(handle) => Lifecycle::Ready(handle.clone()),
                Err(_) => Lifecycle::Absent,
            };
        }
        result
    }

    fn start_launch(&self) -> PendingLaunch {
        let launcher = Arc::clone(&self.launcher);
        let settle_delay = self.settle_delay;
        async move {
            tracing::debug!("Creating PDF context");
            let handle = launcher.launch().await?;
            // no ready signal exists; give the context time to initialize
            tokio::time::sleep(settle_delay).await;
            tracing::debug!("PDF context ready");
            Ok::<_, SidecarError>(handle)
        }
        .boxed()
        .shared()
    }

    /// Forget a context whose mailbox has closed so the next call relaunches it
    fn discard_if_closed(&self) {
        let mut lifecycle = self.lock();
        if matches!(&*lifecycle, Lifecycle::Ready(handle) if handle.is_closed()) {
            *lifecycle = Lifecycle::Absent;
        }
    }

    /// Extract the text of the PDF at `pdf_url`
    ///
    /// Never fails: an unreachable context, a timeout or an unusable document
    /// all come back as `text: None` with a diagnostic in `error`.
    pub async fn extract(&self, pdf_url: &str) -> SidecarResponse {
        match self.try_extract(pdf_url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("PDF extraction for {} failed: {}", pdf_url, e);
                SidecarResponse::failure(e.to_string())
            }
        }
    }

    async fn try_extract(&self, pdf_url: &str) -> Result<SidecarResponse, SidecarError> {
        let handle = self.ensure().await?;
        let request = SidecarRequest::extract_pdf_text(pdf_url);

        match tokio::time::timeout(self.request_timeout, handle.send(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                self.discard_if_closed();
                Err(e)
            }
            Err(_) => Err(SidecarError::Timeout(self.request_timeout)),
        }
    }
}
