//! Bulk loader for the prefix table.
//!
//! Input is CSV without a header row: column 1 is the prefix, column 2 the
//! comma-separated code list (quoted when it holds more than one code).
//! Spaces inside the code list are removed before splitting. Later rows
//! overwrite earlier rows for the same prefix.

use std::io::Read;
use std::path::Path;

use tracing::info;

use crate::error::LookupError;
use crate::store::PrefixStore;

/// Loads `path` into `store` and returns the number of rows applied.
///
/// # Errors
///
/// Returns [`LookupError::DataLoad`] if the file cannot be opened or a row
/// is malformed. Rows before the malformed one stay applied.
pub fn load_csv(path: impl AsRef<Path>, store: &PrefixStore) -> Result<usize, LookupError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| LookupError::DataLoad {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let rows = load_reader(file, store).map_err(|err| match err {
        LookupError::DataLoad { reason, .. } => LookupError::DataLoad {
            path: path.display().to_string(),
            reason,
        },
        other => other,
    })?;

    info!(path = %path.display(), rows, prefixes = store.len(), "Prefix table loaded");
    Ok(rows)
}

/// Loads CSV rows from any reader into `store`.
///
/// Errors carry `<reader>` as their path.
pub fn load_reader<R: Read>(reader: R, store: &PrefixStore) -> Result<usize, LookupError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = 0;
    for (idx, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|e| data_error(format!("line {}: {e}", idx + 1)))?;
        let (prefix, codes) = parse_record(&record)
            .ok_or_else(|| data_error(format!("line {}: expected prefix and code list", idx + 1)))?;
        store.set(prefix, codes);
        rows += 1;
    }
    Ok(rows)
}

/// Splits one record into its prefix and code list.
fn parse_record(record: &csv::StringRecord) -> Option<(String, Vec<String>)> {
    let prefix = record.get(0)?.trim();
    let codes = record.get(1)?;
    if prefix.is_empty() {
        return None;
    }

    let codes = codes
        .replace(' ', "")
        .split(',')
        .map(str::to_string)
        .collect();
    Some((prefix.to_string(), codes))
}

fn data_error(reason: String) -> LookupError {
    LookupError::DataLoad {
        path: "<reader>".to_string(),
        reason,
    }
}
