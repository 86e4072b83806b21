use crate::data::model::{Dataset, TRAFFIC_TYPE};

/// How many traffic types the headline caption shows.
pub const TOP_TYPES: usize = 5;

// ---------------------------------------------------------------------------
// Summary of a filtered view
// ---------------------------------------------------------------------------

/// Headline statistics of a filtered view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub row_count: usize,
    /// The most frequent traffic types with their counts, descending,
    /// at most [`TOP_TYPES`] entries. Ties keep first-encountered order.
    pub top_types: Vec<(String, usize)>,
}

/// Compute headline statistics over the given view.
///
/// Null traffic-type cells are excluded from the ranking; a missing
/// traffic-type column simply yields an empty ranking.
pub fn summarize(dataset: &Dataset, indices: &[usize]) -> Summary {
    let mut counts: Vec<(String, usize)> = Vec::new();

    if let Some(cells) = dataset.column(TRAFFIC_TYPE) {
        for &row in indices {
            let Some(text) = cells[row].as_text() else {
                continue;
            };
            match counts.iter_mut().find(|(name, _)| name == text) {
                Some((_, n)) => *n += 1,
                None => counts.push((text.to_string(), 1)),
            }
        }
    }

    // Stable sort keeps first-encountered order among equal counts.
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(TOP_TYPES);

    Summary {
        row_count: indices.len(),
        top_types: counts,
    }
}
