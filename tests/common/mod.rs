//! Fixtures and fake tools shared by the integration tests.
#![allow(dead_code)]

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use zip::write::SimpleFileOptions;

use unified_extract::services::{OcrEngine, PageRasterizer};
use unified_extract::{AppError, AppResult, AppState, Config, Dispatcher};

pub const TINY_PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Rasterizer that records requested pages and returns a fixed PNG.
#[derive(Default)]
pub struct FakeRasterizer {
    pub requested: Mutex<Vec<u32>>,
}

#[async_trait]
impl PageRasterizer for FakeRasterizer {
    fn name(&self) -> &str {
        "fake-rasterizer"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn render_pages(&self, _pdf: &[u8], pages: &[u32]) -> AppResult<Vec<(u32, Vec<u8>)>> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.extend_from_slice(pages);
        }
        Ok(pages.iter().map(|&page| (page, TINY_PNG.to_vec())).collect())
    }
}

/// Rasterizer that takes longer than any test timeout.
pub struct SlowRasterizer {
    pub delay: Duration,
}

#[async_trait]
impl PageRasterizer for SlowRasterizer {
    fn name(&self) -> &str {
        "slow-rasterizer"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn render_pages(&self, _pdf: &[u8], pages: &[u32]) -> AppResult<Vec<(u32, Vec<u8>)>> {
        tokio::time::sleep(self.delay).await;
        Ok(pages.iter().map(|&page| (page, TINY_PNG.to_vec())).collect())
    }
}

/// Rasterizer whose backing binary is not installed.
pub struct MissingRasterizer;

#[async_trait]
impl PageRasterizer for MissingRasterizer {
    fn name(&self) -> &str {
        "pdftoppm"
    }

    async fn is_available(&self) -> bool {
        false
    }

    async fn render_pages(&self, _pdf: &[u8], _pages: &[u32]) -> AppResult<Vec<(u32, Vec<u8>)>> {
        Err(AppError::tool_unavailable(self.name()))
    }
}

/// OCR engine that answers every image with the same text.
pub struct FakeOcr {
    pub text: String,
    pub calls: AtomicUsize,
}

impl FakeOcr {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for FakeOcr {
    async fn recognize_png(&self, _png: &[u8]) -> AppResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.clone())
    }
}

pub fn test_state(rasterizer: Arc<FakeRasterizer>, ocr: Option<Arc<FakeOcr>>) -> AppState {
    let config = Config {
        ocr_enabled: ocr.is_some(),
        ..Config::default()
    };
    test_state_with(config, rasterizer, ocr)
}

pub fn test_state_with(config: Config, rasterizer: Arc<dyn PageRasterizer>, ocr: Option<Arc<FakeOcr>>) -> AppState {
    let ocr = ocr.map(|engine| engine as Arc<dyn OcrEngine>);
    AppState::new(config, Dispatcher::new(rasterizer, ocr))
}

pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// PDF with one page per entry; `None` produces a page without text.
pub fn pdf_with_pages(pages: &[Option<&str>]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = match text {
            Some(text) => vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
            None => vec![],
        };
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
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

pub fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn docx_with_paragraphs(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p))
        .collect();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
        body
    );

    zip_with(&[
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#,
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#,
        ),
        ("word/document.xml", &document),
    ])
}

/// Single-sheet workbook; every cell is an inline string.
pub fn xlsx_with_rows(rows: &[&[&str]]) -> Vec<u8> {
    let sheet_rows: String = rows
        .iter()
        .enumerate()
        .map(|(r, cells)| {
            let cells: String = cells
                .iter()
                .enumerate()
                .map(|(c, value)| {
                    let column = (b'A' + c as u8) as char;
                    format!(r#"<c r="{}{}" t="inlineStr"><is><t>{}</t></is></c>"#, column, r + 1, value)
                })
                .collect();
            format!(r#"<row r="{}">{}</row>"#, r + 1, cells)
        })
        .collect();
    let sheet = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
        sheet_rows
    );

    zip_with(&[
        (
            "[Content_Types].xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#,
        ),
        (
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        ),
        (
            "xl/workbook.xml",
            r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#,
        ),
        (
            "xl/_rels/workbook.xml.rels",
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#,
        ),
        ("xl/worksheets/sheet1.xml", &sheet),
    ])
}

pub fn png_fixture() -> Vec<u8> {
    let image = RgbImage::from_pixel(4, 4, Rgb([10, 120, 200]));
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .unwrap();
    buffer.into_inner()
}
