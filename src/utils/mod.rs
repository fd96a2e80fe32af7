//! Utility modules shared across the pipeline.
//!
//! - [`HttpClient`]: one configured `reqwest` client for every outbound call
//! - [`pdf`]: per-page PDF text extraction used by the sidecar worker
//!
//! ```rust,no_run
//! use scholar_clip::utils::{pdf, HttpClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let bytes = client.get("https://arxiv.org/pdf/1706.03762").send().await?.bytes().await?;
//! let text = pdf::extract_text(&bytes)?;
//! # Ok(())
//! # }
//! ```

mod http;
pub mod pdf;

pub use http::HttpClient;
pub use pdf::{extract_text, PdfExtractError};
