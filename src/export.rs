//! Export surface
//!
//! Emits batch results as CSV (UTF-8 with BOM so spreadsheet tools pick the
//! right encoding) or TSV. One row per classification result.

use crate::error::{ConsoleError, Result};
use crate::prediction::ClassificationResult;

/// BOM prefix for locale-correct spreadsheet import of the CSV export.
const UTF8_BOM: &str = "\u{feff}";

/// Marker used in the intent column for items that were not recognized.
const UNRECOGNIZED: &str = "unrecognized";

const HEADER: [&str; 8] = [
    "index",
    "text",
    "intent",
    "confidence_pct",
    "threshold",
    "recognized",
    "entities",
    "response_time_ms",
];

/// RFC4180-escaped CSV, prefixed with a UTF-8 BOM.
pub fn to_csv(items: &[ClassificationResult]) -> Result<String> {
    let body = write_rows(items, b',')?;
    Ok(format!("{}{}", UTF8_BOM, body))
}

/// Tab-separated rendition for direct spreadsheet import.
pub fn to_tsv(items: &[ClassificationResult]) -> Result<String> {
    write_rows(items, b'\t')
}

fn write_rows(items: &[ClassificationResult], delimiter: u8) -> Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    wtr.write_record(HEADER)
        .map_err(|e| ConsoleError::Format(format!("failed to write export header: {}", e)))?;

    for (index, item) in items.iter().enumerate() {
        let intent = if item.recognized {
            item.prediction
                .intent_label
                .as_deref()
                .unwrap_or(UNRECOGNIZED)
        } else {
            UNRECOGNIZED
        };

        let entities = serde_json::to_string(&item.prediction.sorted_entities())?;

        wtr.write_record([
            (index + 1).to_string().as_str(),
            item.text.as_str(),
            intent,
            format!("{:.1}", item.prediction.confidence * 100.0).as_str(),
            format!("{}", item.threshold).as_str(),
            if item.recognized { "yes" } else { "no" },
            entities.as_str(),
            item.response_time_ms
                .map(|ms| ms.to_string())
                .unwrap_or_default()
                .as_str(),
        ])
        .map_err(|e| ConsoleError::Format(format!("failed to write export row: {}", e)))?;
    }

    let bytes = wtr
        .into_inner()
        .map_err(|e| ConsoleError::Format(format!("failed to flush export: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| ConsoleError::Format(format!("export output not UTF-8: {}", e)))
}
