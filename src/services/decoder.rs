//! Transport decoding of `file_base64` payloads.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use bytes::Bytes;
use tracing::debug;

use crate::error::{AppError, AppResult};
use crate::models::{ExtractionRequest, ProcessFileRequest};

const LENIENT: GeneralPurposeConfig = GeneralPurposeConfig::new()
    .with_decode_padding_mode(DecodePaddingMode::Indifferent)
    .with_decode_allow_trailing_bits(true);

const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT);

const MB: usize = 1024 * 1024;

/// Decodes a request body into an [`ExtractionRequest`], enforcing `max_bytes`
/// on the decoded size.
pub fn decode_request(request: ProcessFileRequest, max_bytes: usize) -> AppResult<ExtractionRequest> {
    let bytes = decode_payload(&request.file_base64, max_bytes)?;
    Ok(ExtractionRequest::new(bytes).with_filename(request.filename))
}

/// Decodes base64 text, tolerating whitespace, missing padding, a
/// `data:<mime>;base64,` prefix and the URL-safe alphabet.
pub fn decode_payload(encoded: &str, max_bytes: usize) -> AppResult<Bytes> {
    let body = strip_data_url(encoded.trim());
    let compact: String = body.chars().filter(|c| !c.is_ascii_whitespace()).collect();

    if compact.is_empty() {
        return Err(AppError::EmptyFile);
    }

    let estimated = compact.len() / 4 * 3;
    if estimated > max_bytes {
        return Err(too_large(estimated, max_bytes));
    }

    let decoded = match STANDARD_LENIENT.decode(compact.as_bytes()) {
        Ok(decoded) => decoded,
        Err(err) if compact.contains(['-', '_']) => {
            debug!("Standard base64 decoding failed ({}), retrying with URL-safe alphabet", err);
            URL_SAFE_LENIENT.decode(compact.as_bytes())?
        }
        Err(err) => return Err(err.into()),
    };

    if decoded.is_empty() {
        return Err(AppError::EmptyFile);
    }
    if decoded.len() > max_bytes {
        return Err(too_large(decoded.len(), max_bytes));
    }

    Ok(Bytes::from(decoded))
}

fn strip_data_url(input: &str) -> &str {
    if input.starts_with("data:") {
        if let Some((header, rest)) = input.split_once(',') {
            if header.ends_with(";base64") {
                return rest;
            }
        }
    }
    input
}

fn too_large(size: usize, limit: usize) -> AppError {
    AppError::FileTooLarge {
        size: size.div_ceil(MB),
        limit: limit / MB,
    }
}
