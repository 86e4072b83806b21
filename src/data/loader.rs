use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use calamine::{open_workbook_auto, Data, Reader};
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::model::{
    Dataset, Value, LAT, LEGACY_LAT, LEGACY_LON, LON, TEXT_COLUMNS,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A data file that is missing, unreadable, or fundamentally malformed.
///
/// Fatal to the session: no partial dataset is ever produced. Malformed
/// individual coordinate cells are NOT this error; they are coerced to null
/// and the row is dropped during cleaning.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("reading data file: {0}")]
    Io(#[from] std::io::Error),
    #[error("reading workbook: {0}")]
    Workbook(#[from] calamine::Error),
    #[error("workbook contains no worksheets")]
    EmptyWorkbook,
    #[error("parsing CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("parsing JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a top-level JSON array of record objects")]
    JsonShape,
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
}

/// Raw parsed columns in source order, before the cleaning pass.
type RawColumns = Vec<(String, Vec<Value>)>;

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a stop dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xls` / `.ods` – workbook, first worksheet (recommended)
/// * `.csv`  – header row plus one stop per record
/// * `.json` – `[{ "stop_name": ..., "lat": ..., ... }, ...]`
///
/// Every format goes through the same cleaning pass: legacy coordinate
/// headers are canonicalized, coordinates are coerced to numbers (bad cells
/// become null), known text columns are coerced to text, and rows without
/// both coordinates are dropped.
pub fn load_file(path: &Path) -> Result<Dataset, DataSourceError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let raw = match ext.as_str() {
        "xlsx" | "xls" | "ods" => load_workbook(path)?,
        "csv" => {
            let file = std::fs::File::open(path)?;
            read_csv(file)?
        }
        "json" => {
            let text = std::fs::read_to_string(path)?;
            read_json(&text)?
        }
        other => return Err(DataSourceError::UnsupportedExtension(other.to_string())),
    };

    Ok(clean(raw))
}

// ---------------------------------------------------------------------------
// Workbook loader
// ---------------------------------------------------------------------------

/// Read the first worksheet of a workbook. Header row gives column names;
/// every following row is one stop.
fn load_workbook(path: &Path) -> Result<RawColumns, DataSourceError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(DataSourceError::EmptyWorkbook)??;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };

    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| {
            let name = cell.to_string();
            if name.is_empty() {
                format!("column_{i}")
            } else {
                name
            }
        })
        .collect();

    let mut columns: RawColumns = dedupe_names(names)
        .into_iter()
        .map(|name| (name, Vec::new()))
        .collect();

    for row in rows {
        for (col_idx, (_, cells)) in columns.iter_mut().enumerate() {
            let value = row.get(col_idx).map_or(Value::Null, workbook_cell);
            cells.push(value);
        }
    }

    Ok(columns)
}

/// Disambiguate repeated header names: the second occurrence of `name`
/// becomes `name_1`, the third `name_2`, and so on. [`Dataset`] requires
/// unique column names, so two same-named columns must not collapse into
/// one.
fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let mut taken: std::collections::HashSet<String> = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let mut unique = name.clone();
        let mut suffix = 0;
        while !taken.insert(unique.clone()) {
            suffix += 1;
            unique = format!("{name}_{suffix}");
        }
        out.push(unique);
    }
    out
}

fn workbook_cell(cell: &Data) -> Value {
    match cell {
        Data::Empty | Data::Error(_) => Value::Null,
        Data::String(s) if s.is_empty() => Value::Null,
        Data::String(s) => Value::Text(s.clone()),
        Data::Float(f) => Value::Number(*f),
        Data::Int(i) => Value::Number(*i as f64),
        Data::Bool(b) => Value::Bool(*b),
        Data::DateTime(dt) => Value::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Value::Text(s.clone()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one stop per record.
fn read_csv<R: Read>(reader: R) -> Result<RawColumns, DataSourceError> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut columns: RawColumns = dedupe_names(headers)
        .into_iter()
        .map(|name| (name, Vec::new()))
        .collect();

    for result in reader.records() {
        let record = result?;
        for (col_idx, (_, cells)) in columns.iter_mut().enumerate() {
            cells.push(guess_cell_type(record.get(col_idx).unwrap_or("")));
        }
    }

    Ok(columns)
}

fn guess_cell_type(s: &str) -> Value {
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(f) = s.parse::<f64>() {
        return Value::Number(f);
    }
    if s == "true" || s == "false" {
        return Value::Bool(s == "true");
    }
    Value::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "stop_name": "Anděl", "lat": 50.07, "lon": 14.40, ... },
///   ...
/// ]
/// ```
///
/// Keys may differ per record; columns are the union of all keys in
/// first-seen order, with missing cells padded as null.
fn read_json(text: &str) -> Result<RawColumns, DataSourceError> {
    let root: JsonValue = serde_json::from_str(text)?;
    let records = root.as_array().ok_or(DataSourceError::JsonShape)?;

    let mut order: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, Vec<Value>> = HashMap::new();

    for (row_idx, record) in records.iter().enumerate() {
        let obj = record.as_object().ok_or(DataSourceError::JsonShape)?;

        for (key, val) in obj {
            let cells = by_name.entry(key.clone()).or_insert_with(|| {
                order.push(key.clone());
                vec![Value::Null; row_idx]
            });
            cells.push(json_cell(val));
        }
        // Columns this record did not mention get a null for the row.
        for cells in by_name.values_mut() {
            if cells.len() <= row_idx {
                cells.push(Value::Null);
            }
        }
    }

    Ok(order
        .into_iter()
        .map(|name| {
            let cells = by_name.remove(&name).unwrap_or_default();
            (name, cells)
        })
        .collect())
}

fn json_cell(val: &JsonValue) -> Value {
    match val {
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Number(n) => n.as_f64().map_or(Value::Null, Value::Number),
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Null => Value::Null,
        other => Value::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Cleaning pass
// ---------------------------------------------------------------------------

/// Normalize raw parsed columns into a [`Dataset`] satisfying the
/// coordinate-completeness invariant: every surviving row has numeric
/// `lat` and `lon`.
fn clean(mut columns: RawColumns) -> Dataset {
    // Two historical schemas must converge: rename avgLat/avgLon only when
    // both are present.
    let has_legacy = columns.iter().any(|(n, _)| n == LEGACY_LAT)
        && columns.iter().any(|(n, _)| n == LEGACY_LON);
    if has_legacy {
        for (name, _) in &mut columns {
            if name == LEGACY_LAT {
                *name = LAT.to_string();
            } else if name == LEGACY_LON {
                *name = LON.to_string();
            }
        }
    }

    for (name, cells) in &mut columns {
        if name == LAT || name == LON {
            // Unparseable coordinate → null, never an error.
            for cell in cells.iter_mut() {
                *cell = cell.as_f64().map_or(Value::Null, Value::Number);
            }
        } else if TEXT_COLUMNS.contains(&name.as_str()) {
            for cell in cells.iter_mut() {
                *cell = coerce_text(cell);
            }
        }
    }

    // Drop every row lacking a numeric coordinate. A missing lat/lon column
    // means no row can satisfy the invariant, so the dataset comes out empty.
    let n_rows = columns.first().map_or(0, |(_, cells)| cells.len());
    let keep: Vec<usize> = (0..n_rows)
        .filter(|&row| {
            [LAT, LON].iter().all(|coord| {
                columns
                    .iter()
                    .find(|(name, _)| name == coord)
                    .is_some_and(|(_, cells)| {
                        matches!(cells[row], Value::Number(_))
                    })
            })
        })
        .collect();

    if keep.len() < n_rows {
        log::info!(
            "dropped {} row(s) without valid coordinates",
            n_rows - keep.len()
        );
    }

    let columns: RawColumns = columns
        .into_iter()
        .map(|(name, cells)| {
            let kept: Vec<Value> = keep.iter().map(|&row| cells[row].clone()).collect();
            (name, kept)
        })
        .collect();

    Dataset::new(columns)
}

/// Coerce a known text column cell to text. Integer-valued numbers keep
/// their integer form so district codes read from a workbook as floats come
/// out as `"110"` rather than `"110.0"`. Nulls stay null.
fn coerce_text(cell: &Value) -> Value {
    match cell {
        Value::Null => Value::Null,
        Value::Text(_) => cell.clone(),
        Value::Number(n) if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 => {
            Value::Text(format!("{}", *n as i64))
        }
        other => Value::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// DatasetCache – TTL-memoized loading
// ---------------------------------------------------------------------------

/// Process-wide dataset memoization, keyed by path.
///
/// Within the TTL, `load` returns the identical in-memory `Arc` without
/// touching the file. After expiry the next call re-reads the file and
/// replaces the entry; readers still holding the old `Arc` keep a complete,
/// consistent dataset. Callers hold the cache handle explicitly — there is
/// no ambient global.
pub struct DatasetCache {
    ttl: Duration,
    entries: Mutex<HashMap<PathBuf, CacheEntry>>,
}

struct CacheEntry {
    loaded_at: Instant,
    dataset: Arc<Dataset>,
}

impl DatasetCache {
    /// Matches the original deployment's ten-minute refresh window.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

    pub fn new(ttl: Duration) -> Self {
        DatasetCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Load a dataset, reusing the cached copy while it is fresh.
    pub fn load(&self, path: &Path) -> Result<Arc<Dataset>, DataSourceError> {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(entry) = entries.get(path) {
            if entry.loaded_at.elapsed() < self.ttl {
                return Ok(Arc::clone(&entry.dataset));
            }
        }

        let dataset = Arc::new(load_file(path)?);
        log::info!(
            "loaded {} stops from {} (columns: {:?})",
            dataset.len(),
            path.display(),
            dataset.column_names()
        );
        entries.insert(
            path.to_path_buf(),
            CacheEntry {
                loaded_at: Instant::now(),
                dataset: Arc::clone(&dataset),
            },
        );
        Ok(dataset)
    }
}

impl Default for DatasetCache {
    fn default() -> Self {
        DatasetCache::new(Self::DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{DISTRICT_CODE, STOP_NAME, TRAFFIC_TYPE};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn load_csv_str(text: &str) -> Dataset {
        clean(read_csv(Cursor::new(text)).unwrap())
    }

    fn temp_path(name: &str, ext: &str) -> PathBuf {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!(
            "pid_stops_test_{}_{name}_{n}.{ext}",
            std::process::id()
        ))
    }

    #[test]
    fn unparseable_coordinate_drops_exactly_that_row() {
        let ds = load_csv_str(
            "stop_name,lat,lon\n\
             Alpha,50.1,14.4\n\
             Beta,not a number,14.5\n\
             Gamma,50.2,14.6\n",
        );
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.value(1, STOP_NAME), Some(&Value::Text("Gamma".into())));
    }

    #[test]
    fn legacy_coordinate_headers_are_canonicalized() {
        let ds = load_csv_str("stop_name,avgLat,avgLon\nAlpha,50.1,14.4\n");
        assert!(ds.has_column(LAT));
        assert!(ds.has_column(LON));
        assert!(!ds.has_column(LEGACY_LAT));
        assert_eq!(ds.value(0, LAT), Some(&Value::Number(50.1)));
    }

    #[test]
    fn legacy_rename_requires_both_headers() {
        // Only avgLat present: no rename, so no lat column and no valid rows.
        let ds = load_csv_str("stop_name,avgLat,lon\nAlpha,50.1,14.4\n");
        assert!(!ds.has_column(LAT));
        assert_eq!(ds.len(), 0);
    }

    #[test]
    fn missing_coordinate_column_yields_empty_dataset() {
        let ds = load_csv_str("stop_name,lat\nAlpha,50.1\n");
        assert_eq!(ds.len(), 0);
    }

    #[test]
    fn known_text_columns_are_coerced_to_text() {
        let ds = load_csv_str(
            "stop_name,district_code,lat,lon\n\
             Alpha,110,50.1,14.4\n",
        );
        // district_code parses as a number in CSV but must come back as text
        // in integer form.
        assert_eq!(
            ds.value(0, DISTRICT_CODE),
            Some(&Value::Text("110".into()))
        );
    }

    #[test]
    fn duplicate_headers_are_disambiguated() {
        let ds = load_csv_str(
            "stop_name,stop_name,lat,lon\n\
             Alpha,Beta,50.1,14.4\n",
        );
        assert_eq!(
            ds.column_names(),
            ["stop_name", "stop_name_1", "lat", "lon"]
        );
        assert_eq!(ds.value(0, STOP_NAME), Some(&Value::Text("Alpha".into())));
        assert_eq!(
            ds.value(0, "stop_name_1"),
            Some(&Value::Text("Beta".into()))
        );
    }

    #[test]
    fn dedupe_handles_names_colliding_with_suffixed_ones() {
        let names = ["a", "a_1", "a", "a"].map(String::from).to_vec();
        assert_eq!(dedupe_names(names), ["a", "a_1", "a_2", "a_3"]);
    }

    #[test]
    fn empty_cells_stay_null_in_text_columns() {
        let ds = load_csv_str(
            "stop_name,fullName,lat,lon\n\
             Alpha,,50.1,14.4\n",
        );
        assert_eq!(ds.value(0, "fullName"), Some(&Value::Null));
    }

    #[test]
    fn json_records_with_uneven_keys_pad_with_null() {
        let raw = read_json(
            r#"[
                {"stop_name": "Alpha", "lat": 50.1, "lon": 14.4},
                {"stop_name": "Beta", "lat": 50.2, "lon": 14.5, "municipality": "Praha"}
            ]"#,
        )
        .unwrap();
        let ds = clean(raw);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.value(0, "municipality"), Some(&Value::Null));
        assert_eq!(
            ds.value(1, "municipality"),
            Some(&Value::Text("Praha".into()))
        );
    }

    #[test]
    fn unsupported_extension_is_a_data_source_error() {
        let err = load_file(Path::new("stops.parquet")).unwrap_err();
        assert!(matches!(err, DataSourceError::UnsupportedExtension(_)));
    }

    #[test]
    fn workbook_round_trip_through_load_file() {
        use rust_xlsxwriter::Workbook;

        let path = temp_path("workbook", "xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in [STOP_NAME, TRAFFIC_TYPE, "lat", "lon"]
            .iter()
            .enumerate()
        {
            sheet.write_string(0, col as u16, *name).unwrap();
        }
        sheet.write_string(1, 0, "Anděl").unwrap();
        sheet.write_string(1, 1, "tram").unwrap();
        sheet.write_number(1, 2, 50.071).unwrap();
        sheet.write_number(1, 3, 14.403).unwrap();
        // Row without coordinates must be dropped.
        sheet.write_string(2, 0, "Ghost").unwrap();
        workbook.save(&path).unwrap();

        let ds = load_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(ds.len(), 1);
        assert_eq!(ds.value(0, STOP_NAME), Some(&Value::Text("Anděl".into())));
        assert_eq!(ds.value(0, TRAFFIC_TYPE), Some(&Value::Text("tram".into())));
        assert_eq!(ds.value(0, LAT), Some(&Value::Number(50.071)));
    }

    #[test]
    fn cache_returns_identical_arc_within_ttl() {
        let path = temp_path("cache_fresh", "csv");
        std::fs::write(&path, "stop_name,lat,lon\nAlpha,50.1,14.4\n").unwrap();

        let cache = DatasetCache::new(Duration::from_secs(600));
        let first = cache.load(&path).unwrap();
        let second = cache.load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn cache_reloads_after_expiry_without_disturbing_old_readers() {
        let path = temp_path("cache_expired", "csv");
        std::fs::write(&path, "stop_name,lat,lon\nAlpha,50.1,14.4\n").unwrap();

        let cache = DatasetCache::new(Duration::ZERO);
        let first = cache.load(&path).unwrap();
        let second = cache.load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(!Arc::ptr_eq(&first, &second));
        // The old reader's dataset is still intact.
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn cache_propagates_load_failure() {
        let cache = DatasetCache::default();
        let err = cache.load(Path::new("/nonexistent/stops.csv")).unwrap_err();
        assert!(matches!(err, DataSourceError::Io(_)));
    }
}
