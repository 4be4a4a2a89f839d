//! Word (OOXML) text extraction.
//!
//! A `.docx` file is a ZIP package. The package relationships name the main
//! document part; its `w:t` runs are collected per `w:p` paragraph. Headers,
//! footers, comments and embedded media live in other parts and are never
//! opened.

use std::io::{Cursor, Read, Seek};

use bytes::Bytes;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use zip::ZipArchive;

use crate::error::{ExtractError, ExtractResult};

const FORMAT: &str = "docx";
const PACKAGE_RELS: &str = "_rels/.rels";
const DEFAULT_MAIN_PART: &str = "word/document.xml";
const OFFICE_DOCUMENT_REL: &str = "/officeDocument";

pub struct DocxReader {
    max_part_bytes: usize,
}

impl DocxReader {
    pub fn new(max_part_bytes: usize) -> Self {
        Self { max_part_bytes }
    }

    /// Paragraph texts joined by a blank line.
    pub fn extract_text(&self, content: Bytes) -> ExtractResult<String> {
        let paragraphs = self.extract_paragraphs(content)?;
        Ok(paragraphs.join("\n\n"))
    }

    pub fn extract_paragraphs(&self, content: Bytes) -> ExtractResult<Vec<String>> {
        let mut archive = ZipArchive::new(Cursor::new(content))
            .map_err(|e| ExtractError::parse(FORMAT, format!("not a ZIP package: {}", e)))?;

        let main_part = self.main_part_name(&mut archive);
        tracing::debug!(part = %main_part, entries = archive.len(), "Reading DOCX main part");

        let xml = self.read_part(&mut archive, &main_part)?;
        let paragraphs = parse_document_xml(&xml)?;

        tracing::debug!(paragraphs = paragraphs.len(), "DOCX paragraphs extracted");
        Ok(paragraphs)
    }

    /// Resolves the officeDocument relationship, falling back to the
    /// conventional location when the package has no usable `.rels`.
    fn main_part_name<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> String {
        let rels = match self.read_part(archive, PACKAGE_RELS) {
            Ok(rels) => rels,
            Err(e) => {
                tracing::debug!("No package relationships ({}), assuming {}", e, DEFAULT_MAIN_PART);
                return DEFAULT_MAIN_PART.to_string();
            }
        };

        match find_office_document_target(&rels) {
            Some(target) => target.trim_start_matches('/').to_string(),
            None => DEFAULT_MAIN_PART.to_string(),
        }
    }

    fn read_part<R: Read + Seek>(&self, archive: &mut ZipArchive<R>, name: &str) -> ExtractResult<String> {
        let part = archive
            .by_name(name)
            .map_err(|e| ExtractError::parse(FORMAT, format!("cannot open part '{}': {}", name, e)))?;

        let mut xml = String::new();
        part.take(self.max_part_bytes as u64 + 1)
            .read_to_string(&mut xml)
            .map_err(|e| ExtractError::parse(FORMAT, format!("cannot read part '{}': {}", name, e)))?;

        if xml.len() > self.max_part_bytes {
            return Err(ExtractError::parse(
                FORMAT,
                format!("part '{}' expands beyond {} bytes", name, self.max_part_bytes),
            ));
        }
        Ok(xml)
    }
}

fn find_office_document_target(rels: &str) -> Option<String> {
    let mut reader = Reader::from_str(rels);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == b"Relationship" => {
                let is_main = attribute(&e, b"Type")
                    .map(|rel_type| rel_type.ends_with(OFFICE_DOCUMENT_REL))
                    .unwrap_or(false);
                if is_main {
                    return attribute(&e, b"Target");
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}

fn attribute(element: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok())
        .map(|value| value.into_owned())
}

/// Collects non-blank paragraph texts from a WordprocessingML body.
///
/// Paragraphs nested in text boxes are emitted before the paragraph that
/// contains them.
fn parse_document_xml(xml: &str) -> ExtractResult<Vec<String>> {
    let mut reader = Reader::from_str(xml);

    let mut paragraphs = Vec::new();
    let mut open: Vec<String> = Vec::new();
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"r" => run_depth += 1,
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"p" => {
                    if let Some(paragraph) = open.pop() {
                        if !paragraph.trim().is_empty() {
                            paragraphs.push(paragraph);
                        }
                    }
                }
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"t" => in_text = false,
                _ => {}
            },
            // tab stops in paragraph properties are also `w:tab`, only runs count
            Ok(Event::Empty(e)) if run_depth > 0 => match e.local_name().as_ref() {
                b"tab" => push_text(&mut open, &mut paragraphs, "\t"),
                b"br" | b"cr" => push_text(&mut open, &mut paragraphs, "\n"),
                _ => {}
            },
            Ok(Event::Text(e)) if in_text => {
                let text = e.unescape().map_err(|e| {
                    ExtractError::parse(FORMAT, format!("bad text content: {}", e))
                })?;
                push_text(&mut open, &mut paragraphs, &text);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::parse(
                    FORMAT,
                    format!("XML error at position {}: {}", reader.buffer_position(), e),
                ))
            }
            _ => {}
        }
    }

    Ok(paragraphs)
}

fn push_text(open: &mut [String], paragraphs: &mut Vec<String>, text: &str) {
    match open.last_mut() {
        Some(paragraph) => paragraph.push_str(text),
        // text outside any paragraph stands on its own
        None if !text.trim().is_empty() => paragraphs.push(text.to_string()),
        None => {}
    }
}
