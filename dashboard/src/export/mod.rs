//! Spreadsheet export of a record batch.
//!
//! Export flattens each record instead of projecting cells:
//!
//! - `children` is dropped
//! - `properties.*` entries are hoisted to top level, then `properties` is dropped
//! - date-like strings are reformatted; everything else, full UUIDs included,
//!   is kept as-is
//!
//! The flattened batch is written as CSV with the union of keys as header.

use chrono::Local;
use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{ExportError, ExportResult};
use crate::table::columns::{CHILDREN_FIELD, PROPERTIES_FIELD};
use crate::table::format_date;

/// Flatten one record for export.
pub fn flatten_record(record: &Value) -> Value {
    let Value::Object(fields) = record else {
        return record.clone();
    };

    // Rebuilt rather than removed from, so surviving keys keep their order.
    let mut flat: Map<String, Value> = Map::new();
    let mut properties = None;
    for (key, value) in fields {
        match key.as_str() {
            CHILDREN_FIELD => {}
            PROPERTIES_FIELD => properties = Some(value),
            _ => {
                flat.insert(key.clone(), value.clone());
            }
        }
    }
    if let Some(Value::Object(properties)) = properties {
        for (key, value) in properties {
            flat.insert(key.clone(), value.clone());
        }
    }

    for value in flat.values_mut() {
        if let Some(formatted) = value.as_str().and_then(format_date) {
            *value = Value::String(formatted);
        }
    }

    Value::Object(flat)
}

/// Flatten every record of a batch.
pub fn export_projection(records: &[Value]) -> Vec<Value> {
    records.iter().map(flatten_record).collect()
}

/// Union of keys across flattened records, in first-seen order.
pub fn export_headers(rows: &[Value]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for row in rows {
        if let Value::Object(fields) = row {
            for key in fields.keys() {
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.clone());
                }
            }
        }
    }
    headers
}

/// Text of one spreadsheet cell.
fn sheet_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Write a flattened batch as CSV.
pub fn write_csv<W: Write>(rows: &[Value], writer: W) -> ExportResult<()> {
    let headers = export_headers(rows);
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(&headers)?;
    for row in rows {
        let record: Vec<String> = headers.iter().map(|h| sheet_cell(row.get(h))).collect();
        csv_writer.write_record(&record)?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Export a record batch to CSV bytes.
pub fn export_to_bytes(records: &[Value]) -> ExportResult<Vec<u8>> {
    if records.is_empty() {
        return Err(ExportError::NothingToExport);
    }
    let mut buffer = Vec::new();
    write_csv(&export_projection(records), &mut buffer)?;
    Ok(buffer)
}

/// `Notion_data_2024-01-15_10-00.csv`, stamped with local time.
pub fn export_file_name(label: &str) -> String {
    format!("{}_data_{}.csv", label, Local::now().format("%Y-%m-%d_%H-%M"))
}

/// Export a record batch into `dir`, returning the written path.
pub fn export_to_dir(records: &[Value], label: &str, dir: &Path) -> ExportResult<PathBuf> {
    let bytes = export_to_bytes(records)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(label));
    std::fs::write(&path, bytes)?;
    tracing::info!(path = %path.display(), rows = records.len(), "exported records");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn test_hoists_properties_and_drops_children() {
        let flat = flatten_record(&json!({
            "id": "p1",
            "properties": {"a": 1},
            "children": [{"id": "c1"}]
        }));
        assert_eq!(flat, json!({"id": "p1", "a": 1}));
        assert!(flat.get("properties").is_none());
        assert!(flat.get("children").is_none());
    }

    #[test]
    fn test_dates_formatted_uuids_kept_full() {
        let flat = flatten_record(&json!({
            "id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "properties": {"due": "2024-01-15"},
            "created": "2024-01-15T10:00:00Z",
            "count": 3
        }));
        assert_eq!(flat["id"], "3fa85f64-5717-4562-b3fc-2c963f66afa6");
        assert_eq!(flat["created"], "15 Jan 2024 10:00:00 AM");
        assert_eq!(flat["due"], "15 Jan 2024 12:00:00 AM");
        assert_eq!(flat["count"], 3);
    }

    #[test]
    fn test_property_overrides_top_level_in_place() {
        let flat = flatten_record(&json!({"name": "outer", "x": 1, "properties": {"name": "inner", "y": 2}}));
        let keys: Vec<_> = flat.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["name", "x", "y"]);
        assert_eq!(flat["name"], "inner");
    }

    #[test]
    fn test_input_records_untouched() {
        let record = json!({"properties": {"a": 1}, "children": []});
        let before = record.clone();
        let _ = flatten_record(&record);
        assert_eq!(record, before);
    }

    #[test]
    fn test_csv_union_header() {
        let rows = export_projection(&[
            json!({"id": 1, "name": "Acme", "active": true}),
            json!({"id": 2, "properties": {"tier": "gold"}, "tags": ["x"]}),
        ]);
        let mut out = Vec::new();
        write_csv(&rows, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "id,name,active,tags,tier");
        assert_eq!(lines[1], "1,Acme,true,,");
        assert_eq!(lines[2], r#"2,,,"[""x""]",gold"#);
    }

    #[test]
    fn test_empty_batch_refused() {
        assert!(matches!(export_to_bytes(&[]), Err(ExportError::NothingToExport)));
    }

    #[test]
    fn test_export_to_dir() {
        let dir = tempdir().unwrap();
        let path = export_to_dir(&[json!({"id": 1})], "Notion", dir.path()).unwrap();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("Notion_data_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "id\n1\n");
    }
}
