use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::command::{probe_tool, run_tool};

/// Recognises text in a PNG image.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn recognize_png(&self, png: &[u8]) -> AppResult<String>;
}

/// OCR backed by the `tesseract` command line tool.
pub struct OcrService {
    binary: String,
    language: String,
    timeout: Duration,
}

impl OcrService {
    pub fn new(binary: impl Into<String>, language: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            language: language.into(),
            timeout,
        }
    }

    /// Builds the engine when OCR is enabled and tesseract answers
    /// `--version`.
    pub async fn from_config(config: &Config) -> Option<Self> {
        if !config.ocr_enabled {
            debug!("OCR disabled by configuration");
            return None;
        }

        let service = Self::new(config.tesseract_path.clone(), config.ocr_language.clone(), config.request_timeout());
        if service.is_available().await {
            info!(language = %service.language, "Tesseract OCR enabled");
            Some(service)
        } else {
            warn!(binary = %service.binary, "OCR_ENABLED is set but tesseract is not available; continuing without OCR");
            None
        }
    }

    pub async fn is_available(&self) -> bool {
        probe_tool(&self.binary, "--version").await
    }
}

#[async_trait]
impl OcrEngine for OcrService {
    async fn recognize_png(&self, png: &[u8]) -> AppResult<String> {
        let start = Instant::now();
        let workdir = tempfile::tempdir().map_err(|e| AppError::internal(format!("Failed to create temporary directory: {}", e)))?;
        let input = workdir.path().join("image.png");
        tokio::fs::write(&input, png).await?;

        let mut command = Command::new(&self.binary);
        command.arg(&input).arg("stdout").arg("-l").arg(&self.language);

        let output = run_tool(command, "tesseract", self.timeout).await?;
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();

        debug!(
            characters = text.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "OCR finished"
        );
        Ok(text)
    }
}
