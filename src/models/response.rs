use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ExtractedDocument, ExtractedPart, FileCategory, PendingFile};
use crate::error::ExtractError;
use crate::services::SizeExceeded;

#[derive(Debug, Serialize)]
pub struct ExtractResponse {
    pub success: bool,
    pub data: ExtractData,
    pub processing_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ExtractData {
    pub files: Vec<FileReport>,
    pub document: DocumentSummary,
}

#[derive(Debug, Serialize)]
pub struct DocumentSummary {
    pub text: String,
    pub parts: Vec<ExtractedPart>,
    pub submittable: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Extracted,
    Failed,
    Rejected,
}

/// `{kind, message}` pair handed to the failure side of the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureBody {
    pub kind: String,
    pub message: String,
    pub retryable: bool,
}

/// Outcome of one picked file.
#[derive(Debug, Serialize)]
pub struct FileReport {
    pub name: String,
    pub size_bytes: usize,
    pub size_display: String,
    pub mime_type: Option<String>,
    pub category: FileCategory,
    pub status: FileStatus,
    pub text: Option<String>,
    pub error: Option<FailureBody>,
    pub completed_at: DateTime<Utc>,
}

impl FileReport {
    fn base(file: &PendingFile, status: FileStatus) -> Self {
        Self {
            name: file.name.clone(),
            size_bytes: file.size_bytes,
            size_display: file.size_display(),
            mime_type: file.mime_type.clone(),
            category: file.category(),
            status,
            text: None,
            error: None,
            completed_at: Utc::now(),
        }
    }

    pub fn extracted(file: &PendingFile, text: String) -> Self {
        Self {
            text: Some(text),
            ..Self::base(file, FileStatus::Extracted)
        }
    }

    pub fn failed(file: &PendingFile, err: &ExtractError) -> Self {
        Self {
            error: Some(FailureBody::from(err)),
            ..Self::base(file, FileStatus::Failed)
        }
    }

    pub fn rejected(file: &PendingFile, err: &SizeExceeded) -> Self {
        Self {
            error: Some(FailureBody {
                kind: "SizeExceeded".to_string(),
                message: err.to_string(),
                retryable: false,
            }),
            ..Self::base(file, FileStatus::Rejected)
        }
    }
}

impl From<&ExtractError> for FailureBody {
    fn from(err: &ExtractError) -> Self {
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

impl From<&ExtractedDocument> for DocumentSummary {
    fn from(doc: &ExtractedDocument) -> Self {
        Self {
            text: doc.combined_text(),
            parts: doc.parts().to_vec(),
            submittable: doc.is_submittable(),
        }
    }
}

impl ExtractResponse {
    pub fn new(files: Vec<FileReport>, document: &ExtractedDocument, processing_time_ms: u64) -> Self {
        let document = DocumentSummary::from(document);
        Self {
            success: document.submittable,
            data: ExtractData { files, document },
            processing_time_ms,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FormatsResponse {
    pub extensions: Vec<&'static str>,
    pub accept: String,
    pub max_file_size_bytes: usize,
    pub max_files_per_request: usize,
}
