//! Upload surface
//!
//! Validates an uploaded dataset blob and extracts the ordered utterance
//! list the batch evaluator runs over.

use crate::error::{ConsoleError, Result};
use crate::format::{self, DataFormat};
use crate::transcoder;
use tracing::debug;

/// Uploads above this size are rejected before any parsing happens.
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "txt", "json"];

/// Check size and extension before touching the content. The error messages
/// are user-facing; an oversized or mis-named upload is never a crash.
pub fn validate_upload(file_name: &str, blob: &str) -> Result<()> {
    if blob.len() > MAX_UPLOAD_BYTES {
        return Err(ConsoleError::Validation(format!(
            "upload '{}' is {} bytes, above the 5 MiB limit",
            file_name,
            blob.len()
        )));
    }
    if blob.trim().is_empty() {
        return Err(ConsoleError::Validation(format!(
            "upload '{}' is empty",
            file_name
        )));
    }

    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ConsoleError::Validation(format!(
            "unsupported file type '{}'; accepted: .csv, .txt, .json",
            file_name
        )));
    }

    Ok(())
}

/// Extract the ordered utterance list from an uploaded blob.
///
/// `.txt` is treated as a single-column dataset: one utterance per non-blank
/// line, no header. For CSV/JSON the `text` column is used when present,
/// otherwise the first column. `declared_format` overrides auto-detection.
pub fn extract_utterances(
    file_name: &str,
    blob: &str,
    declared_format: Option<DataFormat>,
) -> Result<Vec<String>> {
    validate_upload(file_name, blob)?;

    if file_name.to_lowercase().ends_with(".txt") && declared_format.is_none() {
        let lines: Vec<String> = blob
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .map(|l| l.to_string())
            .collect();
        debug!(count = lines.len(), "extracted utterances from plain text");
        return Ok(lines);
    }

    let detected = declared_format.unwrap_or_else(|| format::detect(blob));
    if detected == DataFormat::Unknown {
        return Err(ConsoleError::Format(format!(
            "could not determine the format of '{}'; pass an explicit format",
            file_name
        )));
    }

    let doc = transcoder::parse(blob, detected)?;
    let column = if doc.columns.iter().any(|c| c == "text") {
        "text".to_string()
    } else {
        doc.columns.first().cloned().ok_or_else(|| {
            ConsoleError::Format(format!("'{}' contains no columns", file_name))
        })?
    };

    let utterances: Vec<String> = (0..doc.rows.len())
        .filter_map(|i| doc.cell(i, &column).map(|s| s.to_string()))
        .filter(|s| !s.trim().is_empty())
        .collect();

    if utterances.is_empty() {
        return Err(ConsoleError::Validation(format!(
            "'{}' contains no usable utterances in column '{}'",
            file_name, column
        )));
    }

    debug!(count = utterances.len(), column = %column, "extracted utterances");
    Ok(utterances)
}
