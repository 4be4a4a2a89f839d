use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::Serialize;

use crate::services::DocumentFormat;

/// Where a pending file's bytes live until they are read.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Buffer already received from an upload.
    Memory(Bytes),
    /// On-disk handle; may become unreadable between selection and extraction.
    Path(PathBuf),
}

/// A user-selected file awaiting extraction.
#[derive(Debug, Clone)]
pub struct PendingFile {
    pub name: String,
    pub size_bytes: usize,
    /// Advisory only. Format dispatch always uses the name's extension.
    pub mime_type: Option<String>,
    source: FileSource,
}

impl PendingFile {
    pub fn from_bytes(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size_bytes: content.len(),
            mime_type: None,
            source: FileSource::Memory(content),
        }
    }

    /// Wraps a file on disk, taking its name and size from the file system.
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            name,
            size_bytes: metadata.len() as usize,
            mime_type: None,
            source: FileSource::Path(path.to_path_buf()),
        })
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }

    /// Format implied by the name's extension. The MIME type plays no part.
    pub fn format(&self) -> DocumentFormat {
        DocumentFormat::from_file_name(&self.name)
    }

    /// Reads the full content. Memory sources can be read any number of times.
    pub async fn read_bytes(&self) -> std::io::Result<Bytes> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.clone()),
            FileSource::Path(path) => tokio::fs::read(path).await.map(Bytes::from),
        }
    }

    pub fn category(&self) -> FileCategory {
        FileCategory::from_mime(self.mime_type.as_deref().unwrap_or_default())
    }

    /// Size as shown in the pending list, e.g. `12.3 KB`.
    pub fn size_display(&self) -> String {
        format!("{:.1} KB", self.size_bytes as f64 / 1024.0)
    }
}

/// Coarse grouping used by upload lists to pick an icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Pdf,
    Image,
    Word,
    Other,
}

impl FileCategory {
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.contains("pdf") {
            FileCategory::Pdf
        } else if mime_type.contains("image") {
            FileCategory::Image
        } else if mime_type.contains("word") || mime_type.contains("document") {
            FileCategory::Word
        } else {
            FileCategory::Other
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_ignores_mime_type() {
        let file = PendingFile::from_bytes("Q3.Report.PDF", "x").with_mime_type("text/plain");
        assert_eq!(file.format(), DocumentFormat::Pdf);

        let file = PendingFile::from_bytes("trailing.", "x");
        assert_eq!(file.format(), DocumentFormat::Unsupported(String::new()));
    }

    #[test]
    fn category_follows_mime_type() {
        let word = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
        assert_eq!(FileCategory::from_mime("application/pdf"), FileCategory::Pdf);
        assert_eq!(FileCategory::from_mime("image/png"), FileCategory::Image);
        assert_eq!(FileCategory::from_mime(word), FileCategory::Word);
        assert_eq!(FileCategory::from_mime("text/plain"), FileCategory::Other);
    }

    #[test]
    fn size_display_uses_one_decimal_kilobytes() {
        let file = PendingFile::from_bytes("a.txt", vec![b'a'; 1536]);
        assert_eq!(file.size_display(), "1.5 KB");
    }

    #[tokio::test]
    async fn memory_source_is_rereadable() {
        let file = PendingFile::from_bytes("a.txt", "abc");
        assert_eq!(file.read_bytes().await.unwrap(), file.read_bytes().await.unwrap());
    }
}
