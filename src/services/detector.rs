//! Content-based file type detection.
//!
//! Routing never looks at the client's file name: the magic-number database
//! from `infer` classifies the bytes, and ZIP containers are refined by their
//! central directory.

use std::io::Cursor;

use tracing::debug;
use zip::ZipArchive;

use crate::error::{AppError, AppResult};
use crate::models::{DetectedType, Detection, DOCX_MIME_TYPE, PDF_MIME_TYPE, XLSX_MIME_TYPE};

const ZIP_MIME_TYPE: &str = "application/zip";
const OCTET_STREAM_MIME_TYPE: &str = "application/octet-stream";
const PLAIN_TEXT_MIME_TYPE: &str = "text/plain";

/// Raster formats the image pipeline can decode.
const SUPPORTED_IMAGE_MIME_TYPES: &[&str] = &[
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
    "image/x-icon",
    "image/vnd.microsoft.icon",
];

/// Classifies `bytes`, failing with `UnsupportedType` when no supported
/// signature matches.
pub fn detect(bytes: &[u8]) -> AppResult<Detection> {
    let detection = sniff(bytes);
    if detection.kind == DetectedType::Unknown {
        return Err(AppError::unsupported(detection.mime_type));
    }
    Ok(detection)
}

/// Classifies `bytes` without failing. Unknown content reports a best-effort
/// MIME type.
pub fn sniff(bytes: &[u8]) -> Detection {
    let Some(kind) = infer::get(bytes) else {
        return Detection::new(DetectedType::Unknown, fallback_mime_type(bytes));
    };

    let mime_type = kind.mime_type();
    debug!(mime_type = mime_type, "Magic number match");

    match mime_type {
        PDF_MIME_TYPE => Detection::new(DetectedType::Pdf, PDF_MIME_TYPE),
        DOCX_MIME_TYPE => Detection::new(DetectedType::Docx, DOCX_MIME_TYPE),
        XLSX_MIME_TYPE => Detection::new(DetectedType::Xlsx, XLSX_MIME_TYPE),
        ZIP_MIME_TYPE => inspect_zip(bytes).unwrap_or_else(|| Detection::new(DetectedType::Unknown, ZIP_MIME_TYPE)),
        image if SUPPORTED_IMAGE_MIME_TYPES.contains(&image) => Detection::new(DetectedType::Image, image),
        other => Detection::new(DetectedType::Unknown, other),
    }
}

/// Looks inside a ZIP container for the parts that identify Office Open XML
/// documents. `infer` only scans the first few local headers, so packages
/// written in an unusual order show up as plain ZIP files.
fn inspect_zip(bytes: &[u8]) -> Option<Detection> {
    let archive = match ZipArchive::new(Cursor::new(bytes)) {
        Ok(archive) => archive,
        Err(e) => {
            debug!("ZIP signature present but archive unreadable: {}", e);
            return None;
        }
    };

    let mut is_docx = false;
    let mut is_xlsx = false;
    for name in archive.file_names() {
        match name {
            "word/document.xml" => is_docx = true,
            "xl/workbook.xml" => is_xlsx = true,
            _ => {}
        }
    }

    match (is_docx, is_xlsx) {
        (true, false) => Some(Detection::new(DetectedType::Docx, DOCX_MIME_TYPE)),
        (false, true) => Some(Detection::new(DetectedType::Xlsx, XLSX_MIME_TYPE)),
        _ => None,
    }
}

fn fallback_mime_type(bytes: &[u8]) -> &'static str {
    if !bytes.is_empty() && std::str::from_utf8(bytes).is_ok() {
        PLAIN_TEXT_MIME_TYPE
    } else {
        OCTET_STREAM_MIME_TYPE
    }
}
