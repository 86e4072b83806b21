use crate::color::{ColorTable, Rgb};
use crate::data::model::{Dataset, LAT, LON, STOP_NAME, TRAFFIC_TYPE};

/// Initial zoom level for a freshly filtered view.
pub const DEFAULT_ZOOM: u8 = 8;

// ---------------------------------------------------------------------------
// Map projection of a filtered view
// ---------------------------------------------------------------------------

/// One marker on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub lat: f64,
    pub lon: f64,
    pub color: Rgb,
    /// Stop name for tooltips; `None` when the cell is null or the column
    /// is absent.
    pub label: Option<String>,
    /// Traffic type driving the color, kept for legend grouping.
    pub traffic_type: Option<String>,
}

/// Map-ready representation of a filtered view: per-row position and color,
/// plus the initial viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct MapProjection {
    pub points: Vec<MapPoint>,
    /// Median latitude/longitude of the view. Median over mean for
    /// robustness against outlying coordinates.
    pub center: (f64, f64),
    pub zoom: u8,
}

/// Project a filtered view for map rendering.
///
/// Returns `None` for an empty view — there is no meaningful centroid of
/// zero rows, so the caller shows its "no rows match" state instead of a
/// map. Rows are guaranteed by the loader to carry numeric coordinates.
pub fn project_for_map(
    dataset: &Dataset,
    indices: &[usize],
    colors: &ColorTable,
) -> Option<MapProjection> {
    if indices.is_empty() {
        return None;
    }

    let lat_col = dataset.column(LAT)?;
    let lon_col = dataset.column(LON)?;
    let name_col = dataset.column(STOP_NAME);
    let type_col = dataset.column(TRAFFIC_TYPE);

    let points: Vec<MapPoint> = indices
        .iter()
        .map(|&row| {
            let traffic_type = type_col
                .and_then(|cells| cells[row].as_text())
                .map(str::to_string);
            MapPoint {
                lat: lat_col[row].as_f64().unwrap_or(f64::NAN),
                lon: lon_col[row].as_f64().unwrap_or(f64::NAN),
                color: colors.color_for(traffic_type.as_deref()),
                label: name_col
                    .and_then(|cells| cells[row].as_text())
                    .map(str::to_string),
                traffic_type,
            }
        })
        .collect();

    let center = (
        median(points.iter().map(|p| p.lat)),
        median(points.iter().map(|p| p.lon)),
    );

    Some(MapProjection {
        points,
        center,
        zoom: DEFAULT_ZOOM,
    })
}

// ---------------------------------------------------------------------------
// Density binning
// ---------------------------------------------------------------------------

/// One occupied cell of the density overlay, positioned at the cell center.
#[derive(Debug, Clone, PartialEq)]
pub struct DensityBin {
    pub lon: f64,
    pub lat: f64,
    pub count: usize,
}

/// Bin points into a square lon/lat grid so the renderer can draw a
/// translucent density layer under the scatter. `cells` is the number of
/// cells spanning the larger axis of the bounding box. Bins come back
/// sorted by position for deterministic output.
pub fn density_bins(points: &[MapPoint], cells: usize) -> Vec<DensityBin> {
    if points.is_empty() || cells == 0 {
        return Vec::new();
    }

    let min_lon = points.iter().map(|p| p.lon).fold(f64::INFINITY, f64::min);
    let max_lon = points.iter().map(|p| p.lon).fold(f64::NEG_INFINITY, f64::max);
    let min_lat = points.iter().map(|p| p.lat).fold(f64::INFINITY, f64::min);
    let max_lat = points.iter().map(|p| p.lat).fold(f64::NEG_INFINITY, f64::max);

    let span = (max_lon - min_lon).max(max_lat - min_lat);
    if span == 0.0 {
        // All points coincide.
        return vec![DensityBin {
            lon: min_lon,
            lat: min_lat,
            count: points.len(),
        }];
    }
    let cell = span / cells as f64;

    let mut counts: std::collections::HashMap<(i64, i64), usize> =
        std::collections::HashMap::new();
    for point in points {
        let ix = ((point.lon - min_lon) / cell).floor() as i64;
        let iy = ((point.lat - min_lat) / cell).floor() as i64;
        *counts.entry((ix, iy)).or_insert(0) += 1;
    }

    let mut bins: Vec<DensityBin> = counts
        .into_iter()
        .map(|((ix, iy), count)| DensityBin {
            lon: min_lon + (ix as f64 + 0.5) * cell,
            lat: min_lat + (iy as f64 + 0.5) * cell,
            count,
        })
        .collect();
    bins.sort_by(|a, b| {
        a.lon
            .total_cmp(&b.lon)
            .then_with(|| a.lat.total_cmp(&b.lat))
    });
    bins
}

/// Median of a non-empty sequence; even-length sequences average the two
/// middle values.
fn median(values: impl Iterator<Item = f64>) -> f64 {
    let mut sorted: Vec<f64> = values.collect();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}
