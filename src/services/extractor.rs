use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{ExtractError, ExtractResult};
use crate::models::PendingFile;

use super::{CancelSignal, DocxReader, PdfOptions, PdfReader, TextReader};

/// Format selected from a file name, computed once before any reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    WordDocument,
    Pdf,
    /// Carries the rejected extension, empty when the name has none.
    Unsupported(String),
}

impl DocumentFormat {
    pub fn from_file_name(name: &str) -> Self {
        match name.rsplit_once('.') {
            Some((_, ext)) => Self::from_extension(ext),
            None => DocumentFormat::Unsupported(String::new()),
        }
    }

    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "txt" => DocumentFormat::PlainText,
            "docx" => DocumentFormat::WordDocument,
            "pdf" => DocumentFormat::Pdf,
            other => DocumentFormat::Unsupported(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            DocumentFormat::PlainText => "txt",
            DocumentFormat::WordDocument => "docx",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Unsupported(ext) => ext,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Upper bound for one extraction, read included. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Largest decompressed size accepted for a single DOCX part.
    pub max_part_bytes: usize,
    pub pdf: PdfOptions,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout: None,
            max_part_bytes: 64 * 1024 * 1024,
            pdf: PdfOptions::default(),
        }
    }
}

/// Turns one pending file into plain text without touching the network.
///
/// Instances hold no mutable state, so one extractor can serve any number
/// of concurrent extractions and separate instances never interact.
pub struct Extractor {
    config: ExtractorConfig,
    docx: Arc<DocxReader>,
    pdf: Arc<PdfReader>,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            docx: Arc::new(DocxReader::new(config.max_part_bytes)),
            pdf: Arc::new(PdfReader::new(config.pdf)),
            config,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub async fn extract_text(&self, file: &PendingFile, cancel: &CancelSignal) -> ExtractResult<String> {
        let start = Instant::now();
        let format = file.format();

        if let DocumentFormat::Unsupported(extension) = &format {
            tracing::warn!(file_name = %file.name, extension = %extension, "Unsupported file format");
            return Err(ExtractError::unsupported(extension.clone()));
        }

        tracing::info!(
            file_name = %file.name,
            file_size = file.size_bytes,
            format = format.label(),
            "Starting text extraction"
        );

        // stops blocking readers once this future resolves or is dropped
        let work_cancel = CancelSignal::new();
        let _guard = work_cancel.drop_guard();

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ExtractError::Cancelled),
            result = self.run(format.clone(), file, work_cancel.clone()) => result,
            _ = deadline(self.config.timeout) => Err(ExtractError::TimedOut {
                seconds: self.config.timeout.map(|t| t.as_secs()).unwrap_or_default(),
            }),
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(text) => tracing::info!(
                file_name = %file.name,
                format = format.label(),
                text_length = text.len(),
                elapsed_ms,
                "Text extraction completed"
            ),
            Err(e) => tracing::warn!(
                file_name = %file.name,
                format = format.label(),
                kind = e.kind(),
                error = %e,
                elapsed_ms,
                "Text extraction failed"
            ),
        }

        result
    }

    async fn run(&self, format: DocumentFormat, file: &PendingFile, cancel: CancelSignal) -> ExtractResult<String> {
        let content = file
            .read_bytes()
            .await
            .map_err(|e| ExtractError::read(format!("{}: {}", file.name, e)))?;

        match format {
            DocumentFormat::PlainText => Ok(TextReader::extract_text(&content)),
            DocumentFormat::WordDocument => {
                let docx = Arc::clone(&self.docx);
                run_blocking("docx", move || docx.extract_text(content)).await
            }
            DocumentFormat::Pdf => {
                let pdf = Arc::clone(&self.pdf);
                run_blocking("pdf", move || pdf.extract_text(&content, &cancel)).await
            }
            DocumentFormat::Unsupported(extension) => Err(ExtractError::unsupported(extension)),
        }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

async fn run_blocking<F>(format: &'static str, parse: F) -> ExtractResult<String>
where
    F: FnOnce() -> ExtractResult<String> + Send + 'static,
{
    match tokio::task::spawn_blocking(parse).await {
        Ok(result) => result,
        Err(e) if e.is_panic() => {
            tracing::error!(format = format, "Reader panicked while parsing");
            Err(ExtractError::parse(format, "reader panicked on malformed input"))
        }
        Err(_) => Err(ExtractError::Cancelled),
    }
}

async fn deadline(timeout: Option<Duration>) {
    match timeout {
        Some(timeout) => tokio::time::sleep(timeout).await,
        None => std::future::pending().await,
    }
}
