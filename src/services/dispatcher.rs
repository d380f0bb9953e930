use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{ContentBlock, DetectedType, Detection, ExtractionRequest, ExtractionResult};
use crate::services::detector;
use crate::services::docx_processor;
use crate::services::image_processor::ImageProcessor;
use crate::services::ocr_service::{OcrEngine, OcrService};
use crate::services::pdf_processor::PdfProcessor;
use crate::services::rasterizer::{PageRasterizer, PdftoppmRasterizer};
use crate::services::xlsx_processor;

/// Runs CPU-bound extractor code on the blocking pool. Panics surface as an
/// extraction failure for `kind`.
pub(crate) async fn run_blocking<T, F>(kind: DetectedType, f: F) -> AppResult<T>
where
    F: FnOnce() -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        if e.is_panic() {
            AppError::extraction(kind, "Extractor panicked")
        } else {
            AppError::internal(format!("Extraction task was cancelled: {}", e))
        }
    })?
}

/// Routes decoded payloads to the extractor for their sniffed type.
pub struct Dispatcher {
    pdf: PdfProcessor,
    images: ImageProcessor,
    rasterizer: Arc<dyn PageRasterizer>,
    ocr: Option<Arc<dyn OcrEngine>>,
}

impl Dispatcher {
    pub fn new(rasterizer: Arc<dyn PageRasterizer>, ocr: Option<Arc<dyn OcrEngine>>) -> Self {
        Self {
            pdf: PdfProcessor::new(rasterizer.clone(), ocr.clone()),
            images: ImageProcessor::new(ocr.clone()),
            rasterizer,
            ocr,
        }
    }

    pub async fn from_config(config: &Config) -> Self {
        let rasterizer = PdftoppmRasterizer::from_config(config);
        if !rasterizer.is_available().await {
            warn!(
                binary = %config.pdftoppm_path,
                "pdftoppm is not available; PDF pages without text will fail"
            );
        }

        let ocr = OcrService::from_config(config)
            .await
            .map(|service| Arc::new(service) as Arc<dyn OcrEngine>);

        Self::new(Arc::new(rasterizer), ocr)
    }

    pub fn rasterizer(&self) -> &Arc<dyn PageRasterizer> {
        &self.rasterizer
    }

    pub fn ocr_enabled(&self) -> bool {
        self.ocr.is_some()
    }

    pub fn detect(&self, bytes: &[u8]) -> AppResult<Detection> {
        detector::detect(bytes)
    }

    pub async fn extract(&self, bytes: Bytes, detection: Detection) -> AppResult<ExtractionResult> {
        match detection.kind {
            DetectedType::Pdf => self.pdf.extract(bytes).await,
            DetectedType::Image => self.images.extract(bytes, detection).await,
            DetectedType::Docx => {
                let text = run_blocking(DetectedType::Docx, move || docx_processor::extract_text(&bytes)).await?;
                Ok(ExtractionResult::new(detection, vec![ContentBlock::text(None, text)], "DOCX file processed."))
            }
            DetectedType::Xlsx => {
                let text = run_blocking(DetectedType::Xlsx, move || xlsx_processor::extract_text(&bytes)).await?;
                Ok(ExtractionResult::new(detection, vec![ContentBlock::text(None, text)], "XLSX file processed."))
            }
            DetectedType::Unknown => Err(AppError::unsupported(detection.mime_type)),
        }
    }

    /// Detects and extracts a decoded payload.
    pub async fn process(&self, request: &ExtractionRequest) -> AppResult<ExtractionResult> {
        let start = Instant::now();
        let detection = self.detect(&request.bytes)?;

        if let Some(ext) = request.declared_extension() {
            if !detection.kind.matches_extension(&ext) {
                warn!(
                    filename = request.filename.as_deref().unwrap_or_default(),
                    detected_type = %detection.kind,
                    "Declared file extension does not match content; using detected type"
                );
            }
        }

        debug!(
            detected_type = %detection.kind,
            mime_type = %detection.mime_type,
            size_bytes = request.size(),
            "Dispatching file"
        );

        let result = self.extract(request.bytes.clone(), detection).await?;

        info!(
            detected_type = %result.detected_type(),
            blocks = result.blocks.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "File processed"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingRasterizer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageRasterizer for CountingRasterizer {
        fn name(&self) -> &str {
            "counting"
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn render_pages(&self, _pdf: &[u8], pages: &[u32]) -> AppResult<Vec<(u32, Vec<u8>)>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(pages.iter().map(|&p| (p, vec![0x89, b'P', b'N', b'G'])).collect())
        }
    }

    fn dispatcher() -> (Dispatcher, Arc<CountingRasterizer>) {
        let rasterizer = Arc::new(CountingRasterizer {
            calls: AtomicUsize::new(0),
        });
        (Dispatcher::new(rasterizer.clone(), None), rasterizer)
    }

    #[tokio::test]
    async fn test_unknown_content_is_unsupported() {
        let (dispatcher, rasterizer) = dispatcher();
        let request = ExtractionRequest::new(b"just some plain text".to_vec());

        let err = dispatcher.process(&request).await.unwrap_err();
        assert_eq!(err.error_code(), "UNSUPPORTED_TYPE");
        assert_eq!(rasterizer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_detection_is_never_extracted() {
        let (dispatcher, _) = dispatcher();
        let detection = Detection::new(DetectedType::Unknown, "application/octet-stream");
        let err = dispatcher.extract(Bytes::from_static(b"\x00\x01"), detection).await.unwrap_err();
        assert!(matches!(err, AppError::UnsupportedType { .. }));
    }

    #[tokio::test]
    async fn test_run_blocking_maps_panics() {
        let err = run_blocking::<(), _>(DetectedType::Xlsx, || panic!("boom")).await.unwrap_err();
        match err {
            AppError::ExtractionFailed { kind, .. } => assert_eq!(kind, DetectedType::Xlsx),
            other => panic!("Expected extraction failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_run_blocking_passes_results_through() {
        let value = run_blocking(DetectedType::Pdf, || Ok(41 + 1)).await.unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_tool_accessors() {
        let (dispatcher, _) = dispatcher();
        assert_eq!(dispatcher.rasterizer().name(), "counting");
        assert!(!dispatcher.ocr_enabled());
    }
}
