//! Paragraph text from Word documents.

use std::io::{Cursor, Read};

use roxmltree::Node;
use zip::ZipArchive;

use crate::error::{AppError, AppResult};
use crate::models::DetectedType;

const DOCUMENT_PART: &str = "word/document.xml";

const WORD_NAMESPACES: &[&str] = &[
    "http://schemas.openxmlformats.org/wordprocessingml/2006/main",
    "http://purl.oclc.org/ooxml/wordprocessingml/main",
];

/// Returns the document's body paragraphs joined by newlines.
pub fn extract_text(bytes: &[u8]) -> AppResult<String> {
    let xml = read_document_part(bytes)?;
    Ok(body_paragraphs(&xml)?.join("\n"))
}

fn read_document_part(bytes: &[u8]) -> AppResult<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| failure(format!("Failed to open DOCX as ZIP: {}", e)))?;

    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| failure(format!("Missing {}: {}", DOCUMENT_PART, e)))?;

    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| failure(format!("Failed to read {}: {}", DOCUMENT_PART, e)))?;
    Ok(xml)
}

/// Text of each top-level `w:p` in `w:body`. Paragraphs nested in tables,
/// text boxes or headers are not part of the body sequence.
pub fn body_paragraphs(xml: &str) -> AppResult<Vec<String>> {
    let document = roxmltree::Document::parse(xml)
        .map_err(|e| failure(format!("Malformed {}: {}", DOCUMENT_PART, e)))?;

    let body = document
        .descendants()
        .find(|node| is_word(node, "body"))
        .ok_or_else(|| failure("Document has no body".to_string()))?;

    Ok(body
        .children()
        .filter(|node| is_word(node, "p"))
        .map(paragraph_text)
        .collect())
}

fn paragraph_text(paragraph: Node) -> String {
    let mut text = String::new();
    for run in paragraph_runs(paragraph) {
        for node in run.children() {
            if is_word(&node, "t") {
                text.push_str(node.text().unwrap_or_default());
            } else if is_word(&node, "tab") {
                text.push('\t');
            } else if is_word(&node, "br") || is_word(&node, "cr") {
                text.push('\n');
            }
        }
    }
    text
}

/// Runs directly under the paragraph or under one of its hyperlinks. Runs
/// inside drawings and text boxes belong to their own paragraphs.
fn paragraph_runs<'a, 'input>(paragraph: Node<'a, 'input>) -> impl Iterator<Item = Node<'a, 'input>> {
    paragraph.children().flat_map(|child| {
        let runs: Vec<Node> = if is_word(&child, "r") {
            vec![child]
        } else if is_word(&child, "hyperlink") {
            child.children().filter(|n| is_word(n, "r")).collect()
        } else {
            Vec::new()
        };
        runs
    })
}

fn is_word(node: &Node, local_name: &str) -> bool {
    node.is_element()
        && node.tag_name().name() == local_name
        && node
            .tag_name()
            .namespace()
            .is_some_and(|ns| WORD_NAMESPACES.contains(&ns))
}

fn failure(message: String) -> AppError {
    AppError::extraction(DetectedType::Docx, message)
}
