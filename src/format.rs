//! Format Detector
//!
//! Heuristic sniffing of raw text blobs into JSON / CSV / YAML. Best effort
//! only; callers should always allow an explicit format override.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataFormat {
    Json,
    Csv,
    Yaml,
    Unknown,
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataFormat::Json => write!(f, "json"),
            DataFormat::Csv => write!(f, "csv"),
            DataFormat::Yaml => write!(f, "yaml"),
            DataFormat::Unknown => write!(f, "unknown"),
        }
    }
}

impl DataFormat {
    /// Parse a user-supplied format name ("json", "csv", "yaml"/"yml").
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "json" => Some(DataFormat::Json),
            "csv" => Some(DataFormat::Csv),
            "yaml" | "yml" => Some(DataFormat::Yaml),
            _ => None,
        }
    }
}

/// Classify a raw text blob, in priority order:
///
/// 1. parses as JSON -> Json
/// 2. at least 2 non-blank lines and >= 2 comma-separated fields on the first -> Csv
/// 3. contains a colon plus a `key: value` / hyphen bullet / double-space
///    indentation pattern -> Yaml
/// 4. otherwise Unknown
///
/// Stateless: every call inspects the blob from scratch, so changed content
/// can never be answered from a previous blob's result. A single-column CSV
/// has no commas and will land in Yaml/Unknown; the explicit override exists
/// for exactly that case.
pub fn detect(blob: &str) -> DataFormat {
    if serde_json::from_str::<serde_json::Value>(blob).is_ok() {
        return DataFormat::Json;
    }

    let non_blank: Vec<&str> = blob.lines().filter(|l| !l.trim().is_empty()).collect();
    if non_blank.len() >= 2 && non_blank[0].split(',').count() >= 2 {
        return DataFormat::Csv;
    }

    if blob.contains(':') && (blob.contains(": ") || blob.contains("- ") || blob.contains("  ")) {
        return DataFormat::Yaml;
    }

    DataFormat::Unknown
}
