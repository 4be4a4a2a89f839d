mod document;
mod file;
mod response;

pub use document::{ExtractedDocument, ExtractedPart};
pub use file::{FileCategory, PendingFile};
pub use response::{
    DocumentSummary, ExtractData, ExtractResponse, FailureBody, FileReport, FileStatus,
    FormatsResponse,
};
