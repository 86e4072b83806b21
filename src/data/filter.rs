use std::collections::BTreeSet;

use super::model::{Dataset, Value, DISTRICT_CODE, NAME_COLUMNS, TRAFFIC_TYPE};

// ---------------------------------------------------------------------------
// Filter criteria
// ---------------------------------------------------------------------------

/// One application of the filter: which traffic types and districts are
/// selected, plus a free-text name query.
///
/// An empty selection set means "no restriction on that dimension" at this
/// layer. The UI seeds `types` with every known value on first load; that
/// default is a UI concern and must stay out of the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub types: BTreeSet<String>,
    pub districts: BTreeSet<String>,
    pub name_query: String,
}

// ---------------------------------------------------------------------------
// Filter engine
// ---------------------------------------------------------------------------

/// Return indices of rows matching all active criteria.
///
/// Pure and deterministic: the full dataset is narrowed from scratch on
/// every call, in a fixed stage order (types, districts, name query). A
/// missing column disables its stage rather than erroring — the source
/// schema has optional columns. Zero matches is a valid result.
pub fn apply(dataset: &Dataset, criteria: &FilterCriteria) -> Vec<usize> {
    let type_col = if criteria.types.is_empty() {
        None
    } else {
        dataset.column(TRAFFIC_TYPE)
    };
    let district_col = if criteria.districts.is_empty() {
        None
    } else {
        dataset.column(DISTRICT_CODE)
    };

    // Name-query stage applies only if at least one name column exists.
    let name_cols: Vec<&[Value]> = if criteria.name_query.is_empty() {
        Vec::new()
    } else {
        NAME_COLUMNS
            .iter()
            .filter_map(|col| dataset.column(col))
            .collect()
    };
    let query_lower = criteria.name_query.to_lowercase();

    (0..dataset.len())
        .filter(|&row| {
            if let Some(cells) = type_col {
                if !is_selected(&cells[row], &criteria.types) {
                    return false;
                }
            }
            if let Some(cells) = district_col {
                if !is_selected(&cells[row], &criteria.districts) {
                    return false;
                }
            }
            if !name_cols.is_empty() && !name_matches(&name_cols, row, &query_lower) {
                return false;
            }
            true
        })
        .collect()
}

/// Membership test for the categorical stages. A null cell never matches.
fn is_selected(cell: &Value, selected: &BTreeSet<String>) -> bool {
    cell.as_text().is_some_and(|text| selected.contains(text))
}

/// Case-insensitive substring test across the present name columns: the row
/// matches if any column's non-null cell contains the (already lower-cased)
/// query. Nulls never match and never raise.
fn name_matches(name_cols: &[&[Value]], row: usize, query_lower: &str) -> bool {
    name_cols.iter().any(|cells| {
        cells[row]
            .as_text()
            .is_some_and(|text| text.to_lowercase().contains(query_lower))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{Value, FULL_NAME, LAT, LON, STOP_NAME};

    fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }

    fn opt_text(s: Option<&str>) -> Value {
        s.map_or(Value::Null, |s| Value::Text(s.to_string()))
    }

    /// Dataset with name columns and coordinates; rows given as
    /// (stop_name, fullName) pairs.
    fn name_dataset(rows: &[(Option<&str>, Option<&str>)]) -> Dataset {
        Dataset::new(vec![
            (
                STOP_NAME.to_string(),
                rows.iter().map(|(a, _)| opt_text(*a)).collect(),
            ),
            (
                FULL_NAME.to_string(),
                rows.iter().map(|(_, b)| opt_text(*b)).collect(),
            ),
            (LAT.to_string(), vec![Value::Number(50.0); rows.len()]),
            (LON.to_string(), vec![Value::Number(14.0); rows.len()]),
        ])
    }

    fn stops_dataset() -> Dataset {
        Dataset::new(vec![
            (
                STOP_NAME.to_string(),
                vec![text("Anděl"), text("Karlovo náměstí"), text("Hlavní nádraží")],
            ),
            (
                TRAFFIC_TYPE.to_string(),
                vec![text("tram"), text("metroB"), text("train")],
            ),
            (
                DISTRICT_CODE.to_string(),
                vec![text("AB"), text("AB"), text("CD")],
            ),
            (
                LAT.to_string(),
                vec![Value::Number(50.07), Value::Number(50.08), Value::Number(50.08)],
            ),
            (
                LON.to_string(),
                vec![Value::Number(14.40), Value::Number(14.42), Value::Number(14.44)],
            ),
        ])
    }

    fn criteria_with_query(q: &str) -> FilterCriteria {
        FilterCriteria {
            name_query: q.to_string(),
            ..FilterCriteria::default()
        }
    }

    /// Reference implementation of the name stage: an explicit per-column
    /// loop ORing the containment test, the way the original test suite
    /// defines correctness.
    fn loop_reference_mask(dataset: &Dataset, query: &str) -> Vec<bool> {
        let query = query.to_lowercase();
        let mut mask = vec![false; dataset.len()];
        for col in NAME_COLUMNS {
            if let Some(cells) = dataset.column(col) {
                for (row, cell) in cells.iter().enumerate() {
                    let hit = cell
                        .as_text()
                        .is_some_and(|t| t.to_lowercase().contains(&query));
                    mask[row] = mask[row] || hit;
                }
            }
        }
        mask
    }

    #[test]
    fn name_stage_equals_loop_reference() {
        let ds = name_dataset(&[
            (Some("Alpha"), Some("Alpha Station")),
            (Some("Beta"), Some("Beta Stop")),
            (Some("Gamma"), None),
            (None, Some("Delta")),
        ]);
        for query in ["alpha", "ALPHA", "a", "stop", "zzz", "ě"] {
            let expected: Vec<usize> = loop_reference_mask(&ds, query)
                .iter()
                .enumerate()
                .filter_map(|(row, &hit)| hit.then_some(row))
                .collect();
            let actual = apply(&ds, &criteria_with_query(query));
            assert_eq!(actual, expected, "query {query:?}");
        }
    }

    #[test]
    fn query_matches_any_name_column() {
        // Rows: only the first has "alpha" in either column.
        let ds = name_dataset(&[
            (Some("Alpha"), Some("Alpha Station")),
            (Some("Beta"), Some("Beta Stop")),
            (Some("Gamma"), None),
            (None, Some("Delta")),
        ]);
        assert_eq!(apply(&ds, &criteria_with_query("alpha")), vec![0]);
    }

    #[test]
    fn query_is_case_insensitive_in_both_directions() {
        let ds = name_dataset(&[(Some("ALPHA"), None), (None, Some("alpha"))]);
        assert_eq!(apply(&ds, &criteria_with_query("alpha")), vec![0, 1]);
        assert_eq!(apply(&ds, &criteria_with_query("ALPHA")), vec![0, 1]);
    }

    #[test]
    fn all_null_name_cells_never_match() {
        let ds = name_dataset(&[(None, None), (None, None)]);
        assert!(apply(&ds, &criteria_with_query("a")).is_empty());
    }

    #[test]
    fn missing_name_columns_make_query_a_no_op() {
        let ds = Dataset::new(vec![
            (LAT.to_string(), vec![Value::Number(50.0)]),
            (LON.to_string(), vec![Value::Number(14.0)]),
        ]);
        assert_eq!(apply(&ds, &criteria_with_query("anything")), vec![0]);
    }

    #[test]
    fn empty_criteria_pass_the_full_dataset_through() {
        let ds = stops_dataset();
        let criteria = FilterCriteria::default();
        assert_eq!(apply(&ds, &criteria), vec![0, 1, 2]);
    }

    #[test]
    fn type_stage_keeps_only_selected_members() {
        let ds = stops_dataset();
        let criteria = FilterCriteria {
            types: ["tram".to_string(), "train".to_string()].into(),
            ..FilterCriteria::default()
        };
        assert_eq!(apply(&ds, &criteria), vec![0, 2]);
    }

    #[test]
    fn district_stage_composes_with_type_stage() {
        let ds = stops_dataset();
        let criteria = FilterCriteria {
            types: ["tram".to_string(), "metroB".to_string()].into(),
            districts: ["AB".to_string()].into(),
            ..FilterCriteria::default()
        };
        assert_eq!(apply(&ds, &criteria), vec![0, 1]);
    }

    #[test]
    fn null_categorical_cell_never_matches_a_selection() {
        let ds = Dataset::new(vec![
            (TRAFFIC_TYPE.to_string(), vec![text("bus"), Value::Null]),
            (
                LAT.to_string(),
                vec![Value::Number(50.0), Value::Number(50.1)],
            ),
            (
                LON.to_string(),
                vec![Value::Number(14.0), Value::Number(14.1)],
            ),
        ]);
        let criteria = FilterCriteria {
            types: ["bus".to_string()].into(),
            ..FilterCriteria::default()
        };
        assert_eq!(apply(&ds, &criteria), vec![0]);
    }

    #[test]
    fn applying_identical_criteria_twice_is_idempotent() {
        let ds = stops_dataset();
        let criteria = FilterCriteria {
            types: ["tram".to_string()].into(),
            name_query: "and".to_string(),
            ..FilterCriteria::default()
        };
        assert_eq!(apply(&ds, &criteria), apply(&ds, &criteria));
    }

    #[test]
    fn adding_a_restriction_never_grows_the_result() {
        let ds = stops_dataset();
        let loose = FilterCriteria {
            types: ["tram".to_string(), "metroB".to_string(), "train".to_string()].into(),
            ..FilterCriteria::default()
        };
        let baseline = apply(&ds, &loose).len();

        let mut tighter_district = loose.clone();
        tighter_district.districts.insert("AB".to_string());
        assert!(apply(&ds, &tighter_district).len() <= baseline);

        let mut tighter_types = loose.clone();
        tighter_types.types.remove("train");
        assert!(apply(&ds, &tighter_types).len() <= baseline);

        let mut tighter_query = loose;
        tighter_query.name_query = "nádraží".to_string();
        assert!(apply(&ds, &tighter_query).len() <= baseline);
    }

    #[test]
    fn zero_matches_is_a_valid_result() {
        let ds = stops_dataset();
        let criteria = FilterCriteria {
            types: ["ferry".to_string()].into(),
            ..FilterCriteria::default()
        };
        assert_eq!(apply(&ds, &criteria), Vec::<usize>::new());
    }
}
