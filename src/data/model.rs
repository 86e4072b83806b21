use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

pub const LAT: &str = "lat";
pub const LON: &str = "lon";
/// Legacy coordinate headers; renamed to [`LAT`]/[`LON`] at load time when
/// both are present.
pub const LEGACY_LAT: &str = "avgLat";
pub const LEGACY_LON: &str = "avgLon";

pub const STOP_NAME: &str = "stop_name";
pub const FULL_NAME: &str = "fullName";
pub const MUNICIPALITY: &str = "municipality";
pub const DISTRICT_CODE: &str = "district_code";
pub const TRAFFIC_TYPE: &str = "mainTrafficType";

/// Columns coerced to text at load time so substring search never sees a
/// non-string cell.
pub const TEXT_COLUMNS: [&str; 5] = [
    STOP_NAME,
    FULL_NAME,
    MUNICIPALITY,
    DISTRICT_CODE,
    TRAFFIC_TYPE,
];

/// Columns searched by the free-text name query, in priority order.
pub const NAME_COLUMNS: [&str; 2] = [STOP_NAME, FULL_NAME];

// ---------------------------------------------------------------------------
// Value – a single cell
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value. The source schema evolved over time, so
/// any column may be absent entirely and any cell may be null.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl Value {
    /// Interpret the value as `f64` (used for coordinate coercion).
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Borrow the value as text. Only `Text` qualifies; coerced columns
    /// guarantee this for every non-null cell.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => write!(f, "{s}"),
            Value::Number(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Null => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// The full loaded table, modeled as a set of named optional columns.
///
/// Immutable after construction. Column presence is a capability: every
/// consumer checks [`Dataset::column`] before use instead of assuming a fixed
/// record shape. Filtered views are plain `Vec<usize>` row indices into this
/// table; they are recomputed from scratch on every criteria change.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Column names in source order (drives table display and export).
    column_order: Vec<String>,
    columns: BTreeMap<String, Vec<Value>>,
    n_rows: usize,
}

impl Dataset {
    /// Build a dataset from `(name, cells)` pairs.
    ///
    /// All columns must have the same length; the loader guarantees this by
    /// padding short rows with `Null` during parsing.
    pub fn new(columns: Vec<(String, Vec<Value>)>) -> Self {
        let n_rows = columns.first().map_or(0, |(_, cells)| cells.len());
        debug_assert!(columns.iter().all(|(_, cells)| cells.len() == n_rows));

        let column_order: Vec<String> =
            columns.iter().map(|(name, _)| name.clone()).collect();
        let columns: BTreeMap<String, Vec<Value>> = columns.into_iter().collect();
        // Duplicate names would collapse in the map; the loader
        // disambiguates headers before construction.
        debug_assert_eq!(columns.len(), column_order.len());

        Dataset {
            column_order,
            columns,
            n_rows,
        }
    }

    /// Column names in source order.
    pub fn column_names(&self) -> &[String] {
        &self.column_order
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// All cells of a column, or `None` if the column is absent from the
    /// source file.
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns.get(name).map(|c| c.as_slice())
    }

    /// A single cell. `None` when the column is absent or the row index is
    /// out of range.
    pub fn value(&self, row: usize, column: &str) -> Option<&Value> {
        self.columns.get(column).and_then(|c| c.get(row))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.n_rows
    }

    pub fn is_empty(&self) -> bool {
        self.n_rows == 0
    }

    /// Sorted unique non-null text values of a column (drives the filter
    /// widgets). Absent column → empty set.
    pub fn unique_text_values(&self, column: &str) -> BTreeSet<String> {
        self.column(column)
            .map(|cells| {
                cells
                    .iter()
                    .filter_map(|v| v.as_text())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}
