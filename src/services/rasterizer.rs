use std::path::Path;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::DetectedType;
use crate::services::command::{probe_tool, run_tool};

/// Renders PDF pages to PNG images.
#[async_trait]
pub trait PageRasterizer: Send + Sync {
    fn name(&self) -> &str;

    async fn is_available(&self) -> bool;

    /// Renders the given 1-based page numbers, returning `(page, png)` pairs.
    async fn render_pages(&self, pdf: &[u8], pages: &[u32]) -> AppResult<Vec<(u32, Vec<u8>)>>;
}

/// Rasterizer backed by poppler's `pdftoppm`.
pub struct PdftoppmRasterizer {
    binary: String,
    dpi: u32,
    timeout: Duration,
}

impl PdftoppmRasterizer {
    pub fn new(binary: impl Into<String>, dpi: u32, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            dpi,
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.pdftoppm_path.clone(), config.pdf_render_dpi, config.request_timeout())
    }

    fn command(&self, input: &Path, output_prefix: &Path, page: u32) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg("-f")
            .arg(page.to_string())
            .arg("-l")
            .arg(page.to_string())
            .arg("-singlefile")
            .arg(input)
            .arg(output_prefix);
        command
    }
}

#[async_trait]
impl PageRasterizer for PdftoppmRasterizer {
    fn name(&self) -> &str {
        "pdftoppm"
    }

    async fn is_available(&self) -> bool {
        probe_tool(&self.binary, "-v").await
    }

    async fn render_pages(&self, pdf: &[u8], pages: &[u32]) -> AppResult<Vec<(u32, Vec<u8>)>> {
        if pages.is_empty() {
            return Ok(Vec::new());
        }

        let start = Instant::now();
        let workdir = tempfile::tempdir().map_err(|e| AppError::internal(format!("Failed to create temporary directory: {}", e)))?;
        let input = workdir.path().join("input.pdf");
        tokio::fs::write(&input, pdf).await?;

        let mut rendered = Vec::with_capacity(pages.len());
        for &page in pages {
            let prefix = workdir.path().join(format!("page-{}", page));
            let command = self.command(&input, &prefix, page);

            run_tool(command, self.name(), self.timeout).await.map_err(|e| match e {
                AppError::Internal { message } => AppError::extraction(DetectedType::Pdf, format!("Page {} could not be rendered: {}", page, message)),
                other => other,
            })?;

            let png = tokio::fs::read(prefix.with_extension("png")).await.map_err(|e| {
                AppError::extraction(DetectedType::Pdf, format!("Rendered image for page {} is missing: {}", page, e))
            })?;
            debug!(page = page, png_bytes = png.len(), "Page rasterized");
            rendered.push((page, png));
        }

        info!(
            pages = rendered.len(),
            dpi = self.dpi,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Rasterized PDF pages without text"
        );
        Ok(rendered)
    }
}
