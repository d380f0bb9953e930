use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// JSON body of `POST /process-file/`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessFileRequest {
    pub file_base64: String,
    /// Client-declared file name. Logged and compared against the sniffed
    /// type, never used for routing.
    #[serde(default)]
    pub filename: Option<String>,
}

/// A decoded payload, ready for detection.
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub bytes: Bytes,
    pub filename: Option<String>,
}

impl ExtractionRequest {
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: Option<String>) -> Self {
        self.filename = filename.filter(|name| !name.trim().is_empty());
        self
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Lowercased extension of the declared file name, if any.
    pub fn declared_extension(&self) -> Option<String> {
        let name = self.filename.as_deref()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}
