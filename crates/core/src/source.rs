//! Initial record source: a JSON or YAML list of records on disk.
//!
//! The format is chosen by file extension (`.yaml`/`.yml` for YAML, anything else JSON).

use crate::record::Record;
use crate::{DashboardError, DashboardResult};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
}

/// Parse records from `text`, rejecting duplicate ids.
pub fn parse_records(text: &str, yaml: bool) -> DashboardResult<Vec<Record>> {
    let records: Vec<Record> = if yaml {
        serde_yaml::from_str(text).map_err(DashboardError::RecordsYamlDeserialization)?
    } else {
        serde_json::from_str(text).map_err(DashboardError::RecordsDeserialization)?
    };

    let mut seen = HashSet::new();
    for record in &records {
        if !seen.insert(record.id.as_str()) {
            return Err(DashboardError::InvalidInput(format!(
                "duplicate record id '{}'",
                record.id
            )));
        }
    }
    Ok(records)
}

/// Load the record list stored at `path`.
///
/// # Errors
///
/// Returns [`DashboardError`] if the file cannot be read, does not parse, or contains two
/// records with the same id.
pub fn load_records(path: &Path) -> DashboardResult<Vec<Record>> {
    let text = fs::read_to_string(path).map_err(DashboardError::FileRead)?;
    let records = parse_records(&text, is_yaml(path))?;
    tracing::info!("loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Write `records` back to `path` in the format implied by its extension.
pub fn save_records(path: &Path, records: &[Record]) -> DashboardResult<()> {
    let text = if is_yaml(path) {
        serde_yaml::to_string(records).map_err(DashboardError::RecordsYamlSerialization)?
    } else {
        let mut json =
            serde_json::to_string_pretty(records).map_err(DashboardError::RecordsSerialization)?;
        json.push('\n');
        json
    };
    fs::write(path, text).map_err(DashboardError::FileWrite)
}
