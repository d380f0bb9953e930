use std::io::Cursor;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use image::{DynamicImage, ImageOutputFormat};
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::models::{ContentBlock, DetectedType, Detection, ExtractionResult};
use crate::services::dispatcher::run_blocking;
use crate::services::ocr_service::OcrEngine;

pub struct ImageProcessor {
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl ImageProcessor {
    pub fn new(ocr: Option<Arc<dyn OcrEngine>>) -> Self {
        Self { ocr }
    }

    pub async fn extract(&self, bytes: Bytes, detection: Detection) -> AppResult<ExtractionResult> {
        let png = run_blocking(DetectedType::Image, move || encode_png(&bytes)).await?;

        let mut blocks = vec![ContentBlock::image(None, detection.mime_type.clone(), STANDARD.encode(&png))];
        let mut message = format!("Image file ({}) processed.", detection.mime_type);

        if let Some(ocr) = &self.ocr {
            match ocr.recognize_png(&png).await {
                Ok(text) if !text.trim().is_empty() => {
                    blocks.push(ContentBlock::text(None, text.trim()));
                    message.push_str(" Text recognized.");
                }
                Ok(_) => message.push_str(" No text found."),
                Err(e) => {
                    warn!(error = %e, "OCR failed on image");
                    message.push_str(&format!(" OCR failed: {}", e));
                }
            }
        }

        info!(mime_type = %detection.mime_type, png_bytes = png.len(), "Image processing completed");
        Ok(ExtractionResult::new(detection, blocks, message))
    }
}

/// Decodes any supported raster format and re-encodes it losslessly as PNG.
pub fn encode_png(bytes: &[u8]) -> AppResult<Vec<u8>> {
    let image = image::load_from_memory(bytes)
        .map_err(|e| AppError::extraction(DetectedType::Image, format!("Failed to decode image: {}", e)))?;

    // PNG has no floating point sample formats.
    let image = match image {
        DynamicImage::ImageRgb32F(_) | DynamicImage::ImageRgba32F(_) => DynamicImage::ImageRgba16(image.to_rgba16()),
        other => other,
    };

    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageOutputFormat::Png)
        .map_err(|e| AppError::extraction(DetectedType::Image, format!("Failed to encode PNG: {}", e)))?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn jpeg_fixture() -> Vec<u8> {
        let image = RgbImage::from_pixel(8, 8, Rgb([200, 30, 30]));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image)
            .write_to(&mut buffer, ImageOutputFormat::Jpeg(90))
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_reencodes_jpeg_as_png() {
        let png = encode_png(&jpeg_fixture()).unwrap();
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));

        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
    }

    #[test]
    fn test_truncated_image_fails() {
        let jpeg = jpeg_fixture();
        let err = encode_png(&jpeg[..12]).unwrap_err();
        assert_eq!(err.error_code(), "EXTRACTION_FAILED");
    }

    #[tokio::test]
    async fn test_extract_without_ocr_emits_single_image_block() {
        let processor = ImageProcessor::new(None);
        let detection = Detection::new(DetectedType::Image, "image/jpeg");
        let result = processor.extract(Bytes::from(jpeg_fixture()), detection).await.unwrap();

        assert_eq!(result.blocks.len(), 1);
        match &result.blocks[0] {
            ContentBlock::Image { source_page, content } => {
                assert!(source_page.is_none());
                assert_eq!(content.original_mime_type, "image/jpeg");
                assert!(!content.image_base64_png.is_empty());
            }
            other => panic!("Expected image block, got {:?}", other),
        }
        assert_eq!(result.message, "Image file (image/jpeg) processed.");
    }
}
