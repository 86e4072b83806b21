use anyhow::{Context, Result};
use rust_xlsxwriter::Workbook;

use crate::data::model::{
    Dataset, Value, DISTRICT_CODE, LAT, LON, MUNICIPALITY, STOP_NAME, TRAFFIC_TYPE,
};

/// Sheet name of the spreadsheet export, matching the dataset it came from.
pub const EXPORT_SHEET: &str = "stops";

/// Display/export column order. Only columns actually present in the
/// dataset are used.
const VISIBLE_COLUMNS: [&str; 6] = [
    STOP_NAME,
    MUNICIPALITY,
    DISTRICT_CODE,
    TRAFFIC_TYPE,
    LAT,
    LON,
];

/// The subset of the visible-column order present in this dataset.
pub fn visible_columns(dataset: &Dataset) -> Vec<&'static str> {
    VISIBLE_COLUMNS
        .into_iter()
        .filter(|col| dataset.has_column(col))
        .collect()
}

// ---------------------------------------------------------------------------
// CSV export
// ---------------------------------------------------------------------------

/// Serialize the view's visible columns as UTF-8 CSV with a header row.
/// Rows keep the view's order; null cells become empty fields.
pub fn to_csv(dataset: &Dataset, indices: &[usize]) -> Result<Vec<u8>> {
    let columns = visible_columns(dataset);
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(&columns).context("writing CSV header")?;

    for &row in indices {
        let record: Vec<String> = columns
            .iter()
            .map(|col| {
                dataset
                    .value(row, col)
                    .map(Value::to_string)
                    .unwrap_or_default()
            })
            .collect();
        writer
            .write_record(&record)
            .with_context(|| format!("writing CSV row {row}"))?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("flushing CSV output: {e}"))
}

// ---------------------------------------------------------------------------
// XLSX export
// ---------------------------------------------------------------------------

/// Serialize the view's visible columns as a single-sheet XLSX workbook.
pub fn to_xlsx(dataset: &Dataset, indices: &[usize], sheet_name: &str) -> Result<Vec<u8>> {
    let columns = visible_columns(dataset);
    let mut workbook = Workbook::new();
    let sheet = workbook
        .add_worksheet()
        .set_name(sheet_name)
        .context("naming worksheet")?;

    for (col_idx, col) in columns.iter().enumerate() {
        sheet
            .write_string(0, col_idx as u16, *col)
            .context("writing XLSX header")?;
    }

    for (out_row, &row) in indices.iter().enumerate() {
        let xlsx_row = (out_row + 1) as u32;
        for (col_idx, col) in columns.iter().enumerate() {
            let col_idx = col_idx as u16;
            match dataset.value(row, col) {
                Some(Value::Number(v)) => sheet.write_number(xlsx_row, col_idx, *v),
                Some(Value::Text(s)) => sheet.write_string(xlsx_row, col_idx, s),
                Some(Value::Bool(b)) => sheet.write_boolean(xlsx_row, col_idx, *b),
                Some(Value::Null) | None => continue,
            }
            .with_context(|| format!("writing XLSX row {xlsx_row}"))?;
        }
    }

    workbook
        .save_to_buffer()
        .context("serializing XLSX workbook")
}
