//! Quarter-scoped reference data store
//!
//! Resolves a claim date to its regulatory quarter, loads that quarter's
//! bundle (via the on-disk cache when valid), and memoizes bundles in
//! memory keyed by quarter directory. Future dates fall back to the latest
//! available quarter; the store never serves a quarter dated after the
//! requested date.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use crate::bundle::ReferenceBundle;
use crate::cache::{read_cache, write_cache, CACHE_VERSION};
use crate::error::RefDataError;
use crate::tables;

/// First day of the quarter containing `date`
pub fn quarter_start(date: NaiveDate) -> NaiveDate {
    let month = ((date.month() - 1) / 3) * 3 + 1;
    NaiveDate::from_ymd_opt(date.year(), month, 1).expect("valid quarter start")
}

#[derive(Default)]
struct StoreState {
    /// Built bundles keyed by quarter directory
    bundles: HashMap<PathBuf, Arc<ReferenceBundle>>,
    /// Descending (quarter start, directory) index; populated by preload
    quarters: Option<Vec<(NaiveDate, PathBuf)>>,
}

/// Loads and caches ASC reference bundles from a data directory
///
/// The in-memory cache and first-time loads run under a single mutex, so
/// concurrent callers for the same quarter never observe a partially built
/// bundle and the on-disk artifact is written by one loader at a time.
pub struct AscReferenceStore {
    data_dir: PathBuf,
    state: Mutex<StoreState>,
}

impl AscReferenceStore {
    /// Creates a lazy store rooted at `data_dir`
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Scans every quarter directory and loads all bundles up front.
    ///
    /// After a successful preload, lookups are answered from memory with no
    /// filesystem I/O.
    pub fn preload(&self) -> Result<(), RefDataError> {
        let quarters = self.scan_quarters();
        let mut state = self.state.lock().expect("reference store lock poisoned");
        for (_, dir) in &quarters {
            if !state.bundles.contains_key(dir) {
                let bundle = self.load_quarter(dir)?;
                state.bundles.insert(dir.clone(), Arc::new(bundle));
            }
        }
        state.quarters = Some(quarters);
        Ok(())
    }

    /// Returns the bundle governing `date`.
    ///
    /// Fails with [`RefDataError::DataNotFound`] when no quarter at or
    /// before `date` exists anywhere in the store.
    pub fn bundle_for(&self, date: NaiveDate) -> Result<Arc<ReferenceBundle>, RefDataError> {
        let mut state = self.state.lock().expect("reference store lock poisoned");

        let quarter_dir = self
            .find_quarter_dir(&state, date)
            .ok_or(RefDataError::DataNotFound(date))?;

        if let Some(bundle) = state.bundles.get(&quarter_dir) {
            return Ok(Arc::clone(bundle));
        }

        let bundle = Arc::new(self.load_quarter(&quarter_dir)?);
        state.bundles.insert(quarter_dir, Arc::clone(&bundle));
        Ok(bundle)
    }

    /// Resolves the quarter directory for a date: exact quarter first, then
    /// the latest available quarter when the date is beyond it.
    fn find_quarter_dir(&self, state: &StoreState, date: NaiveDate) -> Option<PathBuf> {
        let target = quarter_start(date);

        if let Some(quarters) = &state.quarters {
            if let Some((_, dir)) = quarters.iter().find(|(start, _)| *start == target) {
                return Some(dir.clone());
            }
            // Future dates price off the latest known schedule.
            return match quarters.first() {
                Some((latest, dir)) if date > *latest => Some(dir.clone()),
                _ => None,
            };
        }

        let exact = self
            .data_dir
            .join(target.year().to_string())
            .join(target.format("%Y%m%d").to_string());
        if exact.is_dir() {
            return Some(exact);
        }

        let quarters = self.scan_quarters();
        match quarters.first() {
            Some((latest, dir)) if date > *latest => Some(dir.clone()),
            _ => None,
        }
    }

    /// All `<year>/<YYYYMMDD>` quarter directories, newest first
    fn scan_quarters(&self) -> Vec<(NaiveDate, PathBuf)> {
        let mut quarters = Vec::new();
        let year_dirs = match fs::read_dir(&self.data_dir) {
            Ok(entries) => entries,
            Err(_) => return quarters,
        };
        for year_entry in year_dirs.filter_map(Result::ok) {
            let year_path = year_entry.path();
            if !year_path.is_dir() {
                continue;
            }
            let Ok(quarter_dirs) = fs::read_dir(&year_path) else {
                continue;
            };
            for quarter_entry in quarter_dirs.filter_map(Result::ok) {
                let quarter_path = quarter_entry.path();
                if !quarter_path.is_dir() {
                    continue;
                }
                let Some(name) = quarter_path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                if let Ok(start) = NaiveDate::parse_from_str(name, "%Y%m%d") {
                    quarters.push((start, quarter_path));
                }
            }
        }
        quarters.sort_by(|a, b| b.0.cmp(&a.0));
        quarters
    }

    /// Loads one quarter's bundle, consulting the on-disk cache first
    fn load_quarter(&self, quarter_dir: &Path) -> Result<ReferenceBundle, RefDataError> {
        match read_cache(quarter_dir, &self.data_dir) {
            Ok(bundle) => {
                debug!(quarter = %quarter_dir.display(), "ASC bundle served from cache artifact");
                return Ok(bundle);
            }
            Err(reason) => {
                debug!(quarter = %quarter_dir.display(), %reason, "ASC cache miss, rebuilding from source");
            }
        }

        let bundle = self.build_bundle(quarter_dir)?;

        // Best effort: a read-only data directory must not fail the request.
        if let Err(error) = write_cache(quarter_dir, &bundle) {
            warn!(quarter = %quarter_dir.display(), %error, "failed to write ASC cache artifact");
        }
        Ok(bundle)
    }

    /// Builds a bundle from the quarter's source tables
    fn build_bundle(&self, quarter_dir: &Path) -> Result<ReferenceBundle, RefDataError> {
        let mut bundle = ReferenceBundle {
            rates: HashMap::new(),
            device_offsets: HashMap::new(),
            wage_indices: HashMap::new(),
            code_pairs: Default::default(),
            cache_version: CACHE_VERSION,
        };

        // BB loads second so ancillary entries win on key collision.
        for (basename, addendum) in [
            ("AA", crate::bundle::Addendum::Surgical),
            ("BB", crate::bundle::Addendum::Ancillary),
        ] {
            if let Some(path) = tables::find_table_file(quarter_dir, basename) {
                tables::load_rates(&path, &mut bundle.rates, addendum)?;
            }
        }

        if let Some(path) = tables::find_table_file(quarter_dir, "FF") {
            tables::load_device_offsets(&path, &mut bundle.device_offsets)?;
        }

        if let Some(path) = tables::find_wage_index_file(quarter_dir) {
            tables::load_wage_index(&path, &mut bundle.wage_indices)?;
        }

        if let Some(path) = tables::code_pair_sources(&self.data_dir, quarter_dir)
            .into_iter()
            .next()
        {
            tables::load_code_pairs(&path, &mut bundle.code_pairs)?;
        }

        debug!(
            quarter = %quarter_dir.display(),
            rates = bundle.rates.len(),
            offsets = bundle.device_offsets.len(),
            wage_indices = bundle.wage_indices.len(),
            "built ASC reference bundle from source files"
        );
        Ok(bundle)
    }
}
