use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};

use lopdf::content::Content;
use lopdf::{Document, Object, ObjectId};

use super::CancelSignal;
use crate::error::{ExtractError, ExtractResult};

const FORMAT: &str = "pdf";
/// `TJ` adjustment, in thousandths of an em, treated as a space.
const TJ_WORD_GAP: f32 = 100.0;

/// Settings handed to the PDF reader when it is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfOptions {
    /// Documents declaring more pages than this are refused outright.
    pub max_pages: usize,
    /// Retry with pdf-extract when lopdf cannot load the document.
    pub fallback_extractor: bool,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            max_pages: 2000,
            fallback_extractor: true,
        }
    }
}

pub struct PdfReader {
    options: PdfOptions,
}

impl PdfReader {
    pub fn new(options: PdfOptions) -> Self {
        Self { options }
    }

    /// One line per page: the page's text items trimmed and joined by single
    /// spaces, followed by `\n`.
    pub fn extract_text(&self, content: &[u8], cancel: &CancelSignal) -> ExtractResult<String> {
        let mut doc = match Document::load_mem(content) {
            Ok(doc) => doc,
            Err(e) if self.options.fallback_extractor => {
                tracing::warn!("lopdf failed to load PDF: {}, trying pdf-extract", e);
                return extract_with_pdf_extract(content, &e.to_string());
            }
            Err(e) => return Err(ExtractError::parse(FORMAT, e.to_string())),
        };

        // permissions-only files carry an empty user password
        if doc.is_encrypted() {
            doc.decrypt("").map_err(|e| {
                ExtractError::parse(FORMAT, format!("document is encrypted: {}", e))
            })?;
            tracing::debug!("Opened encrypted PDF with the empty user password");
        }

        // keys are the one-indexed page numbers 1..=page_count
        let pages = doc.get_pages();
        if pages.len() > self.options.max_pages {
            return Err(ExtractError::parse(
                FORMAT,
                format!(
                    "document has {} pages, limit is {}",
                    pages.len(),
                    self.options.max_pages
                ),
            ));
        }

        tracing::debug!(pages = pages.len(), "Extracting PDF text");

        let mut text = String::new();
        for (page_number, page_id) in pages {
            if cancel.is_cancelled() {
                tracing::debug!(page = page_number, "PDF extraction cancelled between pages");
                return Err(ExtractError::Cancelled);
            }

            let items = page_items(&doc, page_id).map_err(|e| {
                ExtractError::parse(FORMAT, format!("page {}: {}", page_number, e))
            })?;

            text.push_str(&join_items(&items));
            text.push('\n');
        }

        Ok(text)
    }
}

impl Default for PdfReader {
    fn default() -> Self {
        Self::new(PdfOptions::default())
    }
}

/// Every string shown by `Tj`, `TJ`, `'` or `"` on the page, in content order.
fn page_items(doc: &Document, page_id: ObjectId) -> lopdf::Result<Vec<String>> {
    let encodings: BTreeMap<Vec<u8>, &str> = doc
        .get_page_fonts(page_id)
        .into_iter()
        .map(|(name, font)| (name, font.get_font_encoding()))
        .collect();
    let content = Content::decode(&doc.get_page_content(page_id)?)?;

    let mut encoding = None;
    let mut items = Vec::new();
    for operation in &content.operations {
        let operands = &operation.operands;
        match operation.operator.as_str() {
            "Tf" => {
                if let Some(Ok(font)) = operands.first().map(Object::as_name) {
                    encoding = encodings.get(font).copied();
                }
            }
            "Tj" | "'" => items.extend(operands.first().and_then(|o| decode_string(encoding, o))),
            "\"" => items.extend(operands.get(2).and_then(|o| decode_string(encoding, o))),
            "TJ" => {
                if let Some(Object::Array(parts)) = operands.first() {
                    items.push(decode_array(encoding, parts));
                }
            }
            _ => {}
        }
    }

    Ok(items)
}

fn decode_string(encoding: Option<&str>, object: &Object) -> Option<String> {
    match object {
        Object::String(bytes, _) => Some(Document::decode_text(encoding, bytes)),
        _ => None,
    }
}

/// A `TJ` array is one item. Large negative adjustments are word gaps.
fn decode_array(encoding: Option<&str>, parts: &[Object]) -> String {
    let mut text = String::new();
    for part in parts {
        match part {
            Object::String(bytes, _) => text.push_str(&Document::decode_text(encoding, bytes)),
            Object::Integer(n) if *n < -TJ_WORD_GAP as i64 => text.push(' '),
            Object::Real(n) if *n < -TJ_WORD_GAP => text.push(' '),
            _ => {}
        }
    }
    text
}

fn join_items<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| item.as_ref().trim())
        .filter(|item| !item.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// pdf-extract panics on some malformed inputs instead of returning Err
fn extract_with_pdf_extract(content: &[u8], primary_error: &str) -> ExtractResult<String> {
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(content))) {
        Ok(Ok(text)) => {
            tracing::info!("pdf-extract recovered {} characters", text.len());
            Ok(text)
        }
        Ok(Err(e)) => Err(ExtractError::parse(
            FORMAT,
            format!("{}; fallback extractor: {}", primary_error, e),
        )),
        Err(_) => Err(ExtractError::parse(
            FORMAT,
            format!("{}; fallback extractor panicked", primary_error),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{dictionary, Stream};

    /// One page per entry, each page its own content stream.
    fn build_pdf_from_operations(pages: Vec<Vec<Operation>>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for operations in pages {
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    /// Each item in its own BT/ET text object.
    fn build_pdf(pages: &[&[&str]]) -> Vec<u8> {
        let pages = pages
            .iter()
            .map(|items| {
                let mut operations = Vec::new();
                for (i, item) in items.iter().enumerate() {
                    operations.push(Operation::new("BT", vec![]));
                    operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
                    operations.push(Operation::new("Td", vec![72.into(), (720 - 20 * i as i64).into()]));
                    operations.push(Operation::new("Tj", vec![Object::string_literal(*item)]));
                    operations.push(Operation::new("ET", vec![]));
                }
                operations
            })
            .collect();
        build_pdf_from_operations(pages)
    }

    fn extract(pdf: &[u8]) -> ExtractResult<String> {
        PdfReader::default().extract_text(pdf, &CancelSignal::new())
    }

    #[test]
    fn single_page_text() {
        let text = extract(&build_pdf(&[&["Invoice #42"]])).unwrap();
        assert!(text.contains("Invoice #42"));
        assert_eq!(text.lines().count(), 1);
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn every_page_is_read_exactly_once_in_order() {
        let text = extract(&build_pdf(&[&["first", "page"], &["second"], &["third"]])).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "first page");
        assert_eq!(lines[1], "second");
        assert_eq!(lines[2], "third");
    }

    #[test]
    fn items_in_one_text_object_are_space_joined() {
        let page = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("Invoice")]),
            Operation::new("Td", vec![0.into(), (-14).into()]),
            Operation::new("Tj", vec![Object::string_literal("#42")]),
            Operation::new("ET", vec![]),
        ];
        let text = extract(&build_pdf_from_operations(vec![page, vec![]])).unwrap();
        assert_eq!(text, "Invoice #42\n\n");
    }

    #[test]
    fn tj_arrays_and_quote_operators_are_items() {
        let page = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("Quar"),
                    (-20).into(),
                    Object::string_literal("terly"),
                    (-250).into(),
                    Object::string_literal("Report"),
                ])],
            ),
            Operation::new("'", vec![Object::string_literal("  draft  ")]),
            Operation::new(
                "\"",
                vec![1.into(), 2.into(), Object::string_literal("v2")],
            ),
            Operation::new("ET", vec![]),
        ];
        let text = extract(&build_pdf_from_operations(vec![page])).unwrap();
        assert_eq!(text, "Quarterly Report draft v2\n");
    }

    #[test]
    fn empty_user_password_is_opened() {
        let pdf = include_bytes!("../../tests/fixtures/encrypted_blank_user_password.pdf");
        let text = extract(pdf).unwrap();
        assert_eq!(text, "Confidential memo\n");
    }

    #[test]
    fn password_protected_document_is_a_parse_failure() {
        let pdf = include_bytes!("../../tests/fixtures/encrypted_user_password.pdf");
        let err = extract(pdf).unwrap_err();
        assert!(matches!(err, ExtractError::ParseFailure { format: "pdf", .. }));
        assert!(err.to_string().contains("encrypted"));
    }

    #[test]
    fn random_bytes_are_a_parse_failure() {
        let garbage: Vec<u8> = (0..512u32).map(|i| (i * 31 % 251) as u8).collect();
        let err = extract(&garbage).unwrap_err();
        assert!(matches!(err, ExtractError::ParseFailure { format: "pdf", .. }));
    }

    #[test]
    fn page_limit_is_enforced() {
        let pdf = build_pdf(&[&["a"], &["b"], &["c"]]);
        let reader = PdfReader::new(PdfOptions {
            max_pages: 2,
            fallback_extractor: false,
        });
        let err = reader.extract_text(&pdf, &CancelSignal::new()).unwrap_err();
        assert!(err.to_string().contains("limit is 2"));
    }

    #[test]
    fn cancelled_signal_stops_before_first_page() {
        let pdf = build_pdf(&[&["never read"]]);
        let cancel = CancelSignal::new();
        cancel.cancel();
        let err = PdfReader::default().extract_text(&pdf, &cancel).unwrap_err();
        assert_eq!(err, ExtractError::Cancelled);
    }

    #[test]
    fn items_are_trimmed_and_space_joined() {
        assert_eq!(join_items(&["  Invoice ", "", " #42 "]), "Invoice #42");
        assert_eq!(join_items::<&str>(&[]), "");
    }
}
