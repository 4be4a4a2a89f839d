//! Docextract
//!
//! Turns uploaded `.txt`, `.docx` and `.pdf` files into plain text ready to
//! be submitted for source analysis. Extraction runs locally with no network
//! access; the HTTP layer only stands in for the upload form.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult, ExtractError, ExtractResult};
pub use models::{ExtractedDocument, PendingFile};
pub use services::{CancelSignal, DocumentFormat, Extractor, ExtractorConfig};
