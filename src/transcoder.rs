//! Data Transcoder
//!
//! Bidirectional converter between CSV, JSON and YAML renditions of the same
//! tabular records. Everything parses into [`TabularDocument`] and serializes
//! back out; cross-format conversion is parse-then-serialize.

use crate::error::{ConsoleError, Result};
use crate::format::DataFormat;
use serde_json::Value;

/// Canonical in-memory form: an ordered record list over one shared column
/// set. Rows are positionally aligned with `columns`; a record always carries
/// every column, with an empty string where the source had no value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TabularDocument {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl TabularDocument {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell value by column name for one row, if both exist.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(idx).map(|s| s.as_str())
    }

    /// Push a row, padding or rejecting against the column set.
    fn push_aligned(&mut self, mut row: Vec<String>, line: usize) -> Result<()> {
        if row.len() > self.columns.len() {
            return Err(ConsoleError::format_at_line(
                line,
                format!(
                    "row has {} fields but the header defines {} columns",
                    row.len(),
                    self.columns.len()
                ),
            ));
        }
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
        Ok(())
    }
}

/// Parse a raw blob in the declared format into the canonical document.
pub fn parse(blob: &str, format: DataFormat) -> Result<TabularDocument> {
    match format {
        DataFormat::Json => parse_json(blob),
        DataFormat::Csv => parse_csv(blob),
        DataFormat::Yaml => parse_yaml(blob),
        DataFormat::Unknown => Err(ConsoleError::Format(
            "cannot parse: format could not be determined; pass an explicit format".to_string(),
        )),
    }
}

/// Serialize the canonical document into the target format.
pub fn serialize(doc: &TabularDocument, format: DataFormat) -> Result<String> {
    match format {
        DataFormat::Json => serialize_json(doc),
        DataFormat::Csv => serialize_csv(doc),
        DataFormat::Yaml => serialize_yaml(doc),
        DataFormat::Unknown => Err(ConsoleError::Format(
            "cannot serialize to an unknown format".to_string(),
        )),
    }
}

/// Cross-format conversion. Lossy shapes (nested values) downgrade to
/// stringified scalar cells rather than failing.
pub fn convert(blob: &str, source: DataFormat, target: DataFormat) -> Result<String> {
    let doc = parse(blob, source)?;
    serialize(&doc, target)
}

// --- JSON ---

fn parse_json(blob: &str) -> Result<TabularDocument> {
    let value: Value = serde_json::from_str(blob)
        .map_err(|e| ConsoleError::Format(format!("invalid JSON: {}", e)))?;

    // Accept a bare array of records, or the {"intents": [...]} export shape
    // flattened one level.
    let records = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("intents") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(ConsoleError::Format(
                    "JSON input must be an array of objects or {\"intents\": [...]}".to_string(),
                ))
            }
        },
        _ => {
            return Err(ConsoleError::Format(
                "JSON input must be an array of objects or {\"intents\": [...]}".to_string(),
            ))
        }
    };

    let mut doc = TabularDocument::default();
    for (i, record) in records.into_iter().enumerate() {
        let obj = match record {
            Value::Object(obj) => obj,
            other => {
                return Err(ConsoleError::Format(format!(
                    "JSON record {} is not an object: {}",
                    i, other
                )))
            }
        };

        // Column set grows as new keys appear, keeping first-seen order
        for key in obj.keys() {
            if !doc.columns.iter().any(|c| c == key) {
                doc.columns.push(key.clone());
                for row in &mut doc.rows {
                    row.push(String::new());
                }
            }
        }

        let row = doc
            .columns
            .iter()
            .map(|col| obj.get(col).map(json_cell_to_string).unwrap_or_default())
            .collect();
        doc.rows.push(row);
    }

    Ok(doc)
}

/// Flatten one JSON value into a string cell. Nested arrays/objects become
/// their JSON text rather than failing.
fn json_cell_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested => nested.to_string(),
    }
}

fn serialize_json(doc: &TabularDocument) -> Result<String> {
    let records: Vec<Value> = doc
        .rows
        .iter()
        .map(|row| {
            let mut obj = serde_json::Map::new();
            for (col, cell) in doc.columns.iter().zip(row) {
                obj.insert(col.clone(), Value::String(cell.clone()));
            }
            Value::Object(obj)
        })
        .collect();

    Ok(serde_json::to_string_pretty(&records)?)
}

// --- CSV ---

fn parse_csv(blob: &str) -> Result<TabularDocument> {
    // The header is the first non-blank line; leading blank lines are skipped
    let body = skip_blank_lines(blob);
    if body.trim().is_empty() {
        return Err(ConsoleError::Format("CSV input is empty".to_string()));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body.as_bytes());

    let columns: Vec<String> = rdr
        .headers()
        .map_err(|e| ConsoleError::Format(format!("failed to read CSV header: {}", e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut doc = TabularDocument::new(columns);
    for (i, record) in rdr.records().enumerate() {
        // Data rows start on line 2 of the (blank-stripped) input
        let line = i + 2;
        let record =
            record.map_err(|e| ConsoleError::format_at_line(line, format!("bad CSV row: {}", e)))?;
        let row: Vec<String> = record.iter().map(|f| f.to_string()).collect();
        doc.push_aligned(row, line)?;
    }

    Ok(doc)
}

fn serialize_csv(doc: &TabularDocument) -> Result<String> {
    // The csv writer applies RFC4180 quoting: fields containing the delimiter,
    // a quote or a newline are quoted, with embedded quotes doubled.
    let mut wtr = csv::WriterBuilder::new().from_writer(Vec::new());
    wtr.write_record(&doc.columns)
        .map_err(|e| ConsoleError::Format(format!("failed to write CSV header: {}", e)))?;
    for row in &doc.rows {
        wtr.write_record(row)
            .map_err(|e| ConsoleError::Format(format!("failed to write CSV row: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| ConsoleError::Format(format!("failed to flush CSV writer: {}", e)))?;
    String::from_utf8(bytes).map_err(|e| ConsoleError::Format(format!("CSV output not UTF-8: {}", e)))
}

fn skip_blank_lines(blob: &str) -> &str {
    let mut rest = blob;
    loop {
        match rest.split_once('\n') {
            Some((first, tail)) if first.trim().is_empty() => rest = tail,
            _ => return rest,
        }
    }
}

// --- YAML ---

/// Only the flat `key: value` record-list profile is supported. Anything
/// deeper (nested mappings, sequences inside records, multi-document input)
/// is rejected outright rather than silently truncated.
fn parse_yaml(blob: &str) -> Result<TabularDocument> {
    let value: serde_yaml::Value = serde_yaml::from_str(blob)
        .map_err(|e| ConsoleError::Format(format!("invalid YAML: {}", e)))?;

    let items = match value {
        serde_yaml::Value::Sequence(items) => items,
        serde_yaml::Value::Mapping(_) => {
            // A single flat mapping is treated as a one-record document
            vec![value]
        }
        _ => {
            return Err(ConsoleError::Format(
                "YAML input must be a list of flat key/value records".to_string(),
            ))
        }
    };

    let mut doc = TabularDocument::default();
    for (i, item) in items.into_iter().enumerate() {
        let mapping = match item {
            serde_yaml::Value::Mapping(m) => m,
            _ => {
                return Err(ConsoleError::Format(format!(
                    "YAML record {} is not a key/value mapping",
                    i
                )))
            }
        };

        let mut cells: Vec<(String, String)> = Vec::with_capacity(mapping.len());
        for (key, val) in mapping {
            let key = yaml_scalar_to_string(&key).ok_or_else(|| {
                ConsoleError::Format(format!("YAML record {} has a non-scalar key", i))
            })?;
            let val = yaml_scalar_to_string(&val).ok_or_else(|| {
                ConsoleError::Format(format!(
                    "YAML record {} field '{}' is nested; only flat key: value records are supported",
                    i, key
                ))
            })?;
            cells.push((key, val));
        }

        for (key, _) in &cells {
            if !doc.columns.iter().any(|c| c == key) {
                doc.columns.push(key.clone());
                for row in &mut doc.rows {
                    row.push(String::new());
                }
            }
        }

        let row = doc
            .columns
            .iter()
            .map(|col| {
                cells
                    .iter()
                    .find(|(k, _)| k == col)
                    .map(|(_, v)| v.clone())
                    .unwrap_or_default()
            })
            .collect();
        doc.rows.push(row);
    }

    Ok(doc)
}

fn yaml_scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => Some(String::new()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn serialize_yaml(doc: &TabularDocument) -> Result<String> {
    // serde_yaml's Mapping preserves insertion order, so the column order of
    // the document survives a round trip.
    let records: Vec<serde_yaml::Value> = doc
        .rows
        .iter()
        .map(|row| {
            let mut mapping = serde_yaml::Mapping::new();
            for (col, cell) in doc.columns.iter().zip(row) {
                mapping.insert(
                    serde_yaml::Value::String(col.clone()),
                    serde_yaml::Value::String(cell.clone()),
                );
            }
            serde_yaml::Value::Mapping(mapping)
        })
        .collect();

    serde_yaml::to_string(&records)
        .map_err(|e| ConsoleError::Format(format!("failed to write YAML: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> TabularDocument {
        TabularDocument {
            columns: vec!["text".to_string(), "intent".to_string()],
            rows: vec![
                vec!["book me a flight".to_string(), "book_flight".to_string()],
                vec!["hello there".to_string(), "greet".to_string()],
            ],
        }
    }

    #[test]
    fn test_csv_round_trip() {
        let doc = sample_doc();
        let text = serialize(&doc, DataFormat::Csv).unwrap();
        assert_eq!(parse(&text, DataFormat::Csv).unwrap(), doc);
    }

    #[test]
    fn test_csv_round_trip_with_embedded_comma_and_quote() {
        let doc = TabularDocument {
            columns: vec!["text".to_string(), "intent".to_string()],
            rows: vec![vec![r#"He said, "hi""#.to_string(), "greet".to_string()]],
        };
        let text = serialize(&doc, DataFormat::Csv).unwrap();
        // RFC4180: the field is quoted and the embedded quotes are doubled
        assert!(text.contains(r#""He said, ""hi""""#));
        assert_eq!(parse(&text, DataFormat::Csv).unwrap(), doc);
    }

    #[test]
    fn test_json_round_trip() {
        let doc = sample_doc();
        let text = serialize(&doc, DataFormat::Json).unwrap();
        assert_eq!(parse(&text, DataFormat::Json).unwrap(), doc);
    }

    #[test]
    fn test_yaml_round_trip() {
        let doc = sample_doc();
        let text = serialize(&doc, DataFormat::Yaml).unwrap();
        assert_eq!(parse(&text, DataFormat::Yaml).unwrap(), doc);
    }

    #[test]
    fn test_json_intents_wrapper_is_flattened() {
        let blob = r#"{"intents": [{"intent": "greet", "example": "hi"}]}"#;
        let doc = parse(blob, DataFormat::Json).unwrap();
        assert_eq!(doc.columns, vec!["intent", "example"]);
        assert_eq!(doc.cell(0, "example"), Some("hi"));
    }

    #[test]
    fn test_json_nested_values_become_stringified_cells() {
        let blob = r#"[{"intent": "greet", "examples": ["hi", "hello"]}]"#;
        let doc = parse(blob, DataFormat::Json).unwrap();
        assert_eq!(doc.cell(0, "examples"), Some(r#"["hi","hello"]"#));
    }

    #[test]
    fn test_json_records_with_uneven_keys_share_column_set() {
        let blob = r#"[{"a": "1"}, {"a": "2", "b": "3"}]"#;
        let doc = parse(blob, DataFormat::Json).unwrap();
        assert_eq!(doc.columns, vec!["a", "b"]);
        assert_eq!(doc.cell(0, "b"), Some(""));
        assert_eq!(doc.cell(1, "b"), Some("3"));
    }

    #[test]
    fn test_csv_row_with_too_many_fields_fails_with_line() {
        let blob = "a,b\n1,2\n1,2,3\n";
        let err = parse(blob, DataFormat::Csv).unwrap_err();
        assert!(err.to_string().contains("line 3"));
    }

    #[test]
    fn test_csv_short_row_is_padded() {
        let blob = "a,b\n1\n";
        let doc = parse(blob, DataFormat::Csv).unwrap();
        assert_eq!(doc.cell(0, "b"), Some(""));
    }

    #[test]
    fn test_csv_leading_blank_lines_skipped() {
        let blob = "\n\na,b\n1,2\n";
        let doc = parse(blob, DataFormat::Csv).unwrap();
        assert_eq!(doc.columns, vec!["a", "b"]);
        assert_eq!(doc.rows.len(), 1);
    }

    #[test]
    fn test_yaml_nested_record_rejected() {
        let blob = "- intent: greet\n  examples:\n    - hi\n    - hello\n";
        let err = parse(blob, DataFormat::Yaml).unwrap_err();
        assert!(err.to_string().contains("nested"));
    }

    #[test]
    fn test_yaml_scalar_document_rejected() {
        let err = parse("just a string", DataFormat::Yaml).unwrap_err();
        assert!(matches!(err, ConsoleError::Format(_)));
    }

    #[test]
    fn test_cross_format_csv_to_yaml() {
        let yaml = convert("text,intent\nhi,greet\n", DataFormat::Csv, DataFormat::Yaml).unwrap();
        let doc = parse(&yaml, DataFormat::Yaml).unwrap();
        assert_eq!(doc.cell(0, "intent"), Some("greet"));
    }

    #[test]
    fn test_parse_unknown_format_fails() {
        assert!(parse("anything", DataFormat::Unknown).is_err());
    }
}
