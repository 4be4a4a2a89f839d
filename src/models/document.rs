use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedPart {
    pub file_name: String,
    pub text: String,
}

/// Texts accumulated across the uploads of one analysis session.
///
/// Parts are kept in the order their extractions completed, which need not
/// match the order the files were picked in. The only mutation is `push`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractedDocument {
    parts: Vec<ExtractedPart>,
}

impl ExtractedDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file_name: impl Into<String>, text: impl Into<String>) {
        self.parts.push(ExtractedPart {
            file_name: file_name.into(),
            text: text.into(),
        });
    }

    pub fn parts(&self) -> &[ExtractedPart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// All parts joined with a blank line, ready for submission.
    pub fn combined_text(&self) -> String {
        self.parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// True once at least one part carries non-blank text.
    pub fn is_submittable(&self) -> bool {
        self.parts.iter().any(|p| !p.text.trim().is_empty())
    }
}
