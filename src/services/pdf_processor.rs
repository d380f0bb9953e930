use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use lopdf::Document;
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{ContentBlock, DetectedType, Detection, ExtractionResult, PDF_MIME_TYPE};
use crate::services::dispatcher::run_blocking;
use crate::services::ocr_service::OcrEngine;
use crate::services::rasterizer::PageRasterizer;

const PAGE_BREAK: char = '\x0C';

#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    pub number: u32,
    pub text: String,
}

impl PageText {
    fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Turns a PDF into one block per page: text where the page has a text
/// layer, a rendered PNG where it does not.
pub struct PdfProcessor {
    rasterizer: Arc<dyn PageRasterizer>,
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl PdfProcessor {
    pub fn new(rasterizer: Arc<dyn PageRasterizer>, ocr: Option<Arc<dyn OcrEngine>>) -> Self {
        Self { rasterizer, ocr }
    }

    pub async fn extract(&self, bytes: Bytes) -> AppResult<ExtractionResult> {
        let start = Instant::now();

        let pages = run_blocking(DetectedType::Pdf, {
            let bytes = bytes.clone();
            move || extract_page_texts(&bytes)
        })
        .await?;

        let blank: Vec<u32> = pages.iter().filter(|p| p.is_blank()).map(|p| p.number).collect();
        debug!(pages = pages.len(), blank_pages = blank.len(), "PDF text layer read");

        let mut rendered: HashMap<u32, Vec<u8>> = if blank.is_empty() {
            HashMap::new()
        } else {
            self.rasterizer.render_pages(&bytes, &blank).await?.into_iter().collect()
        };

        let mut blocks = Vec::with_capacity(pages.len());
        for page in &pages {
            if !page.is_blank() {
                blocks.push(ContentBlock::text(Some(page.number), page.text.trim()));
                continue;
            }

            let png = rendered.remove(&page.number).ok_or_else(|| {
                AppError::extraction(DetectedType::Pdf, format!("No rendered image for page {}", page.number))
            })?;

            let recognized = self.recognize(page.number, &png).await;
            blocks.push(ContentBlock::image(Some(page.number), PDF_MIME_TYPE, STANDARD.encode(&png)));
            if let Some(text) = recognized {
                blocks.push(ContentBlock::text(Some(page.number), text));
            }
        }

        info!(
            pages = pages.len(),
            rendered_pages = blank.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "PDF processing completed"
        );

        Ok(ExtractionResult::new(
            Detection::new(DetectedType::Pdf, PDF_MIME_TYPE),
            blocks,
            format!("PDF processed. {} pages.", pages.len()),
        ))
    }

    async fn recognize(&self, page: u32, png: &[u8]) -> Option<String> {
        let ocr = self.ocr.as_ref()?;
        match ocr.recognize_png(png).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => {
                debug!(page = page, "OCR found no text on rendered page");
                None
            }
            Err(e) => {
                warn!(page = page, error = %e, "OCR failed on rendered page");
                None
            }
        }
    }
}

/// Reads the text layer of every page, in page order.
pub fn extract_page_texts(bytes: &[u8]) -> AppResult<Vec<PageText>> {
    let document = Document::load_mem(bytes)
        .map_err(|e| AppError::extraction(DetectedType::Pdf, format!("Invalid PDF structure: {}", e)))?;

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    if page_numbers.is_empty() {
        return Ok(Vec::new());
    }

    if let Some(texts) = text_layer_by_pages(bytes, page_numbers.len()) {
        return Ok(page_numbers
            .into_iter()
            .zip(texts)
            .map(|(number, text)| PageText { number, text })
            .collect());
    }

    debug!("Falling back to per-page lopdf text extraction");
    Ok(page_numbers
        .into_iter()
        .map(|number| {
            let text = document.extract_text(&[number]).unwrap_or_else(|e| {
                debug!(page = number, error = %e, "lopdf could not read page text");
                String::new()
            });
            PageText { number, text }
        })
        .collect())
}

/// Page texts from `pdf-extract`, one entry per page. Tries the per-page
/// API first, then the whole-document text split on form feeds. Returns
/// `None` when neither yields exactly `page_count` pages.
pub fn text_layer_by_pages(bytes: &[u8], page_count: usize) -> Option<Vec<String>> {
    if let Some(pages) = guarded("per-page", || pdf_extract::extract_text_from_mem_by_pages(bytes)) {
        if pages.len() == page_count {
            return Some(pages);
        }
        debug!(expected = page_count, got = pages.len(), "pdf-extract page count mismatch");
    }

    let text = guarded("whole-document", || pdf_extract::extract_text_from_mem(bytes))?;
    split_pages(&text, page_count)
}

fn guarded<T, E: std::fmt::Display>(mode: &str, f: impl FnOnce() -> Result<T, E>) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            debug!(mode = mode, error = %e, "pdf-extract failed");
            None
        }
        Err(_) => {
            warn!(mode = mode, "pdf-extract panicked while reading the document");
            None
        }
    }
}

/// Splits whole-document text on form feeds into exactly `page_count`
/// segments. A single page takes the whole text. One leading and one
/// trailing break are tolerated.
pub fn split_pages(text: &str, page_count: usize) -> Option<Vec<String>> {
    if page_count == 0 {
        return None;
    }

    // Some writers open every page with a break instead of closing it.
    // Form feed is whitespace, so only other whitespace is skipped here.
    let text = text
        .trim_start_matches(|c: char| c != PAGE_BREAK && c.is_whitespace())
        .strip_prefix(PAGE_BREAK)
        .unwrap_or(text);

    if page_count == 1 {
        return Some(vec![text.trim_end_matches(PAGE_BREAK).to_string()]);
    }

    let mut segments: Vec<&str> = text.split(PAGE_BREAK).collect();
    if segments.len() == page_count + 1 && segments.last().is_some_and(|s| s.trim().is_empty()) {
        segments.pop();
    }

    if segments.len() != page_count {
        return None;
    }
    Some(segments.into_iter().map(str::to_string).collect())
}
