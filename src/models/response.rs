use std::fmt;

use serde::{Deserialize, Serialize};

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const DOCX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const XLSX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// File kind derived from content inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectedType {
    Pdf,
    Docx,
    Xlsx,
    Image,
    Unknown,
}

impl DetectedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectedType::Pdf => "pdf",
            DetectedType::Docx => "docx",
            DetectedType::Xlsx => "xlsx",
            DetectedType::Image => "image",
            DetectedType::Unknown => "unknown",
        }
    }

    /// Whether a declared file extension is plausible for this kind.
    pub fn matches_extension(&self, ext: &str) -> bool {
        match self {
            DetectedType::Pdf => ext == "pdf",
            DetectedType::Docx => ext == "docx",
            DetectedType::Xlsx => ext == "xlsx",
            DetectedType::Image => matches!(
                ext,
                "png" | "jpg" | "jpeg" | "gif" | "bmp" | "tif" | "tiff" | "webp" | "ico"
            ),
            DetectedType::Unknown => false,
        }
    }
}

impl fmt::Display for DetectedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sniffed kind plus the MIME type reported for the bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub kind: DetectedType,
    pub mime_type: String,
}

impl Detection {
    pub fn new(kind: DetectedType, mime_type: impl Into<String>) -> Self {
        Self {
            kind,
            mime_type: mime_type.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    pub original_mime_type: String,
    pub image_base64_png: String,
}

/// One unit of unified content. The tag values are part of the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "bloco_texto")]
    Text {
        source_page: Option<u32>,
        content: String,
    },
    #[serde(rename = "bloco_imagem")]
    Image {
        source_page: Option<u32>,
        content: ImageData,
    },
}

impl ContentBlock {
    pub fn text(source_page: Option<u32>, content: impl Into<String>) -> Self {
        ContentBlock::Text {
            source_page,
            content: content.into(),
        }
    }

    pub fn image(source_page: Option<u32>, original_mime_type: impl Into<String>, image_base64_png: String) -> Self {
        ContentBlock::Image {
            source_page,
            content: ImageData {
                original_mime_type: original_mime_type.into(),
                image_base64_png,
            },
        }
    }

    pub fn source_page(&self) -> Option<u32> {
        match self {
            ContentBlock::Text { source_page, .. } | ContentBlock::Image { source_page, .. } => *source_page,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { content, .. } => Some(content),
            ContentBlock::Image { .. } => None,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, ContentBlock::Image { .. })
    }
}

/// Outcome of a single dispatch.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    pub detection: Detection,
    pub blocks: Vec<ContentBlock>,
    pub message: String,
}

impl ExtractionResult {
    pub fn new(detection: Detection, blocks: Vec<ContentBlock>, message: impl Into<String>) -> Self {
        Self {
            detection,
            blocks,
            message: message.into(),
        }
    }

    pub fn detected_type(&self) -> DetectedType {
        self.detection.kind
    }

    /// All text blocks joined by blank lines.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .filter_map(ContentBlock::as_text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvelopeKind {
    #[serde(rename = "documento_unificado")]
    UnifiedDocument,
    #[serde(rename = "unsupported")]
    Unsupported,
    #[serde(rename = "error")]
    Error,
}

/// Unified response envelope of `POST /process-file/`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessFileResponse {
    pub status: ProcessStatus,
    pub content_type: EnvelopeKind,
    pub detected_type: Option<DetectedType>,
    pub mime_type: Option<String>,
    pub data: Option<Vec<ContentBlock>>,
    pub message: String,
    #[serde(default)]
    pub processing_time_ms: u64,
}

impl ProcessFileResponse {
    pub fn success(result: ExtractionResult, processing_time_ms: u64) -> Self {
        Self {
            status: ProcessStatus::Success,
            content_type: EnvelopeKind::UnifiedDocument,
            detected_type: Some(result.detection.kind),
            mime_type: Some(result.detection.mime_type),
            data: Some(result.blocks),
            message: result.message,
            processing_time_ms,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub service: String,
    pub uptime_seconds: Option<u64>,
    pub tools: ToolAvailability,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolAvailability {
    pub pdf_rasterizer: bool,
    pub ocr_engine: bool,
    pub ocr_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_block_wire_format() {
        let block = ContentBlock::text(Some(2), "hello");
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value, json!({"type": "bloco_texto", "source_page": 2, "content": "hello"}));
    }

    #[test]
    fn test_image_block_wire_format() {
        let block = ContentBlock::image(None, "image/jpeg", "AAAA".to_string());
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "bloco_imagem");
        assert!(value["source_page"].is_null());
        assert_eq!(value["content"]["original_mime_type"], "image/jpeg");
        assert_eq!(value["content"]["image_base64_png"], "AAAA");
    }

    #[test]
    fn test_success_envelope() {
        let result = ExtractionResult::new(
            Detection::new(DetectedType::Docx, DOCX_MIME_TYPE),
            vec![ContentBlock::text(None, "body")],
            "DOCX file processed.",
        );
        let value = serde_json::to_value(ProcessFileResponse::success(result, 12)).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["content_type"], "documento_unificado");
        assert_eq!(value["detected_type"], "docx");
        assert_eq!(value["data"][0]["content"], "body");
        assert_eq!(value["processing_time_ms"], 12);
    }

    #[test]
    fn test_result_text_skips_images() {
        let result = ExtractionResult::new(
            Detection::new(DetectedType::Pdf, PDF_MIME_TYPE),
            vec![
                ContentBlock::text(Some(1), "first"),
                ContentBlock::image(Some(2), PDF_MIME_TYPE, String::new()),
                ContentBlock::text(Some(3), "third"),
            ],
            "",
        );
        assert_eq!(result.text(), "first\n\nthird");
        assert_eq!(result.blocks[1].source_page(), Some(2));
    }

    #[test]
    fn test_extension_matching() {
        assert!(DetectedType::Image.matches_extension("jpeg"));
        assert!(!DetectedType::Pdf.matches_extension("docx"));
        assert!(!DetectedType::Unknown.matches_extension("txt"));
    }
}
