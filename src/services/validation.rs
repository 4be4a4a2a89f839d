//! Upload checks applied before a file ever reaches the extractor.

use thiserror::Error;

use crate::models::PendingFile;

/// Extensions the file picker offers. Advisory: drag-and-drop bypasses it.
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["txt", "pdf", "docx"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("File '{name}' is {size} bytes, exceeding the {limit} byte limit")]
pub struct SizeExceeded {
    pub name: String,
    pub size: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct SizePolicy {
    max_bytes: usize,
}

impl SizePolicy {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub fn check(&self, file: &PendingFile) -> Result<(), SizeExceeded> {
        if file.size_bytes > self.max_bytes {
            return Err(SizeExceeded {
                name: file.name.clone(),
                size: file.size_bytes,
                limit: self.max_bytes,
            });
        }
        Ok(())
    }
}

/// Value for an `<input type="file" accept=...>` attribute.
pub fn accept_attribute() -> String {
    SUPPORTED_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_inclusive() {
        let policy = SizePolicy::new(4);
        assert!(policy.check(&PendingFile::from_bytes("a.txt", "1234")).is_ok());

        let err = policy
            .check(&PendingFile::from_bytes("b.txt", "12345"))
            .unwrap_err();
        assert_eq!(err.size, 5);
        assert_eq!(err.limit, 4);
        assert!(err.to_string().contains("b.txt"));
    }

    #[test]
    fn accept_attribute_lists_dotted_extensions() {
        assert_eq!(accept_attribute(), ".txt,.pdf,.docx");
    }
}
