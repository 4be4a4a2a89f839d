use std::borrow::Cow;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub struct TextReader;

impl TextReader {
    /// Decodes the whole buffer as UTF-8.
    ///
    /// Malformed sequences become U+FFFD instead of failing, and a leading
    /// byte order mark is consumed by the decoder.
    pub fn extract_text(content: &[u8]) -> String {
        let content = content.strip_prefix(UTF8_BOM).unwrap_or(content);
        match String::from_utf8_lossy(content) {
            Cow::Borrowed(text) => text.to_owned(),
            Cow::Owned(text) => {
                tracing::debug!("Plain text contained invalid UTF-8, replaced with U+FFFD");
                text
            }
        }
    }
}
