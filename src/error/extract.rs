use thiserror::Error;

pub type ExtractResult<T> = Result<T, ExtractError>;

/// Normalized failure of a single extraction.
///
/// Readers never leak their library errors: everything coming out of the
/// ZIP, XML or PDF stacks is folded into one of these variants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Unsupported file format: '{extension}' (expected txt, docx or pdf)")]
    UnsupportedFormat { extension: String },

    #[error("Failed to read file contents: {message}")]
    ReadFailure { message: String },

    #[error("Failed to parse {format} document: {message}")]
    ParseFailure { format: &'static str, message: String },

    #[error("Extraction cancelled")]
    Cancelled,

    #[error("Extraction timed out after {seconds}s")]
    TimedOut { seconds: u64 },
}

impl ExtractError {
    /// Stable kind string surfaced to callers in `{kind, message}` bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractError::UnsupportedFormat { .. } => "UnsupportedFormat",
            ExtractError::ReadFailure { .. } => "ReadFailure",
            ExtractError::ParseFailure { .. } => "ParseFailure",
            ExtractError::Cancelled => "Cancelled",
            ExtractError::TimedOut { .. } => "TimedOut",
        }
    }

    /// Whether re-running with the same file could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ExtractError::ReadFailure { .. } | ExtractError::TimedOut { .. }
        )
    }

    pub fn unsupported(extension: impl Into<String>) -> Self {
        ExtractError::UnsupportedFormat {
            extension: extension.into(),
        }
    }

    pub fn read(message: impl Into<String>) -> Self {
        ExtractError::ReadFailure {
            message: message.into(),
        }
    }

    pub fn parse(format: &'static str, message: impl Into<String>) -> Self {
        ExtractError::ParseFailure {
            format,
            message: message.into(),
        }
    }
}
