use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::color::ColorTable;
use crate::data::filter::{self, FilterCriteria};
use crate::data::loader::DatasetCache;
use crate::data::model::{Dataset, DISTRICT_CODE, TRAFFIC_TYPE};
use crate::query::{self, QueryParams};
use crate::summary::{self, Summary};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// The dataset is shared immutably (`Arc`); every criteria change recomputes
/// `visible` from the full dataset, never incrementally.
pub struct AppState {
    /// TTL-memoized loader, held explicitly (no global cache).
    pub cache: DatasetCache,

    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<Arc<Dataset>>,

    /// Path of the loaded dataset, for reload and window title.
    pub dataset_path: Option<PathBuf>,

    /// Current filter criteria.
    pub criteria: FilterCriteria,

    /// Indices of stops passing the current filters (cached).
    pub visible: Vec<usize>,

    /// Fixed traffic-type colors.
    pub colors: ColorTable,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            cache: DatasetCache::default(),
            dataset: None,
            dataset_path: None,
            criteria: FilterCriteria::default(),
            visible: Vec::new(),
            colors: ColorTable::default(),
            status_message: None,
        }
    }
}

impl AppState {
    /// Load a dataset through the cache and seed criteria, optionally from a
    /// decoded filter link.
    pub fn load_dataset(&mut self, path: &Path, initial: Option<QueryParams>) {
        match self.cache.load(path) {
            Ok(dataset) => {
                self.dataset_path = Some(path.to_path_buf());
                self.set_dataset(dataset, initial);
            }
            Err(e) => {
                log::error!("failed to load {}: {e}", path.display());
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Ingest a loaded dataset and seed the criteria.
    ///
    /// When no types were given explicitly, the selection defaults to every
    /// known traffic type — a UI-layer convention; the filter engine itself
    /// treats an empty set as pass-through.
    pub fn set_dataset(&mut self, dataset: Arc<Dataset>, initial: Option<QueryParams>) {
        let initial = initial.unwrap_or_default();

        self.criteria = FilterCriteria {
            types: match initial.types {
                Some(types) => types.into_iter().collect(),
                None => dataset.unique_text_values(TRAFFIC_TYPE),
            },
            districts: initial.districts.into_iter().collect(),
            name_query: initial.q,
        };

        self.dataset = Some(dataset);
        self.status_message = None;
        self.refilter();
    }

    /// Recompute `visible` after a criteria change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible = filter::apply(ds, &self.criteria);
        }
    }

    /// Reset to the first-load state: all types, no districts, no query.
    pub fn reset_filters(&mut self) {
        if let Some(ds) = &self.dataset {
            self.criteria = FilterCriteria {
                types: ds.unique_text_values(TRAFFIC_TYPE),
                ..FilterCriteria::default()
            };
        } else {
            self.criteria = FilterCriteria::default();
        }
        self.refilter();
    }

    /// All traffic types present in the dataset (filter widget choices).
    pub fn known_types(&self) -> BTreeSet<String> {
        self.dataset
            .as_ref()
            .map(|ds| ds.unique_text_values(TRAFFIC_TYPE))
            .unwrap_or_default()
    }

    /// All district codes present in the dataset.
    pub fn known_districts(&self) -> BTreeSet<String> {
        self.dataset
            .as_ref()
            .map(|ds| ds.unique_text_values(DISTRICT_CODE))
            .unwrap_or_default()
    }

    /// Toggle one traffic type in the selection.
    pub fn toggle_type(&mut self, value: &str) {
        toggle(&mut self.criteria.types, value);
        self.refilter();
    }

    /// Toggle one district in the selection.
    pub fn toggle_district(&mut self, value: &str) {
        toggle(&mut self.criteria.districts, value);
        self.refilter();
    }

    pub fn select_all_types(&mut self) {
        self.criteria.types = self.known_types();
        self.refilter();
    }

    pub fn select_no_types(&mut self) {
        self.criteria.types.clear();
        self.refilter();
    }

    pub fn select_all_districts(&mut self) {
        self.criteria.districts = self.known_districts();
        self.refilter();
    }

    pub fn select_no_districts(&mut self) {
        self.criteria.districts.clear();
        self.refilter();
    }

    /// Headline statistics for the current view.
    pub fn summary(&self) -> Option<Summary> {
        self.dataset
            .as_ref()
            .map(|ds| summary::summarize(ds, &self.visible))
    }

    /// Shareable encoding of the current criteria.
    pub fn share_link(&self) -> String {
        query::encode(&self.criteria)
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}
