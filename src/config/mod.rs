use std::env;
use std::time::Duration;
use anyhow::{Result, Context};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

impl LogFormat {
    /// Reads `LOG_FORMAT`. Kept out of [`Config`] because the subscriber
    /// must exist before configuration loading starts logging.
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT") {
            Ok(val) => val.parse().unwrap_or_else(|e| {
                eprintln!("Invalid LOG_FORMAT: {} (using pretty)", e);
                LogFormat::Pretty
            }),
            Err(_) => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub max_file_size_mb: usize,
    pub request_timeout_seconds: u64,
    pub pdf_render_dpi: u32,
    pub pdftoppm_path: String,
    pub ocr_enabled: bool,
    pub ocr_language: String,
    pub tesseract_path: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 8000,
            max_file_size_mb: 25,
            request_timeout_seconds: 120,
            pdf_render_dpi: 200,
            pdftoppm_path: "pdftoppm".to_string(),
            ocr_enabled: false,
            ocr_language: "eng".to_string(),
            tesseract_path: "tesseract".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");
        let defaults = Config::default();

        let config = Config {
            server_host: Self::string_env_var("SERVER_HOST", &defaults.server_host),
            server_port: Self::parse_env_var("SERVER_PORT", defaults.server_port)
                .context("Failed to parse SERVER_PORT")?,
            max_file_size_mb: Self::parse_env_var("MAX_FILE_SIZE_MB", defaults.max_file_size_mb)
                .context("Failed to parse MAX_FILE_SIZE_MB")?,
            request_timeout_seconds: Self::parse_env_var("REQUEST_TIMEOUT_SECONDS", defaults.request_timeout_seconds)
                .context("Failed to parse REQUEST_TIMEOUT_SECONDS")?,
            pdf_render_dpi: Self::parse_env_var("PDF_RENDER_DPI", defaults.pdf_render_dpi)
                .context("Failed to parse PDF_RENDER_DPI")?,
            pdftoppm_path: Self::string_env_var("PDFTOPPM_PATH", &defaults.pdftoppm_path),
            ocr_enabled: Self::parse_env_var("OCR_ENABLED", defaults.ocr_enabled)
                .context("Failed to parse OCR_ENABLED")?,
            ocr_language: Self::string_env_var("OCR_LANGUAGE", &defaults.ocr_language),
            tesseract_path: Self::string_env_var("TESSERACT_PATH", &defaults.tesseract_path),
        };

        config.validate()?;

        info!("Configuration loaded successfully: {:?}", config);
        Ok(config)
    }

    fn parse_env_var<T>(var_name: &str, default: T) -> Result<T>
    where
        T: std::str::FromStr + Copy + std::fmt::Debug,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(val) => match val.parse() {
                Ok(parsed) => Ok(parsed),
                Err(e) => {
                    warn!("Failed to parse {}: {} (using default: {:?})", var_name, e, default);
                    Ok(default)
                }
            },
            Err(_) => {
                info!("{} not set, using default: {:?}", var_name, default);
                Ok(default)
            }
        }
    }

    fn string_env_var(var_name: &str, default: &str) -> String {
        match env::var(var_name) {
            Ok(val) if !val.trim().is_empty() => val.trim().to_string(),
            _ => {
                info!("{} not set, using default: {}", var_name, default);
                default.to_string()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server_port == 0 {
            return Err(anyhow::anyhow!("SERVER_PORT must be greater than 0"));
        }
        if self.max_file_size_mb == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("REQUEST_TIMEOUT_SECONDS must be greater than 0"));
        }
        if self.pdf_render_dpi == 0 {
            return Err(anyhow::anyhow!("PDF_RENDER_DPI must be greater than 0"));
        }
        if self.ocr_language.is_empty() {
            return Err(anyhow::anyhow!("OCR_LANGUAGE must not be empty"));
        }
        Ok(())
    }

    /// Upper bound on the decoded file, in bytes.
    pub fn max_file_size_bytes(&self) -> usize {
        self.max_file_size_mb * 1024 * 1024
    }

    /// Upper bound on the HTTP body. Base64 inflates by 4/3; the extra
    /// 64 KiB covers the JSON wrapper and the optional filename.
    pub fn max_body_bytes(&self) -> usize {
        self.max_file_size_bytes() / 3 * 4 + 4 + 64 * 1024
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}
