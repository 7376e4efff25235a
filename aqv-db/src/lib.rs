//! In-memory store for air-quality datasets.
//!
//! This crate owns every loaded table and exposes typed query methods that
//! return serializable chart models.
//!
//! # Architecture
//!
//! - `Rc<RefCell<StoreInner>>` wrapper for interior mutability on a single
//!   thread; clones share the same tables
//! - CSV text is parsed once by the `load_*` methods into validated
//!   [`Dataset`]s; queries never re-parse cells
//! - Derived state (city registry, date index, national means) is rebuilt
//!   or invalidated whenever a load replaces a dataset
//!
//! # Usage
//!
//! ```rust
//! use aqv_core::pollutant::{Metric, Pollutant};
//! use aqv_db::DataStore;
//!
//! let store = DataStore::new(2025, Pollutant::Aqi);
//! store.load_city_coords("City,Longtitude,Latitude\n北京,116.4,39.9\n").unwrap();
//! store
//!     .load_dataset(Pollutant::Aqi, Metric::Mean, "date,北京\n2025-01-01,57\n")
//!     .unwrap();
//!
//! let national = store.query_national_daily_mean(Pollutant::Aqi);
//! assert_eq!(national.len(), 1);
//! ```
//!
//! # Primary datasets
//!
//! Each pollutant may be loaded as daily `max`, `mean` and `min` tables.
//! Map, radar and national aggregates read the pollutant's *primary*
//! dataset: the `mean` table (or `max` when no mean was loaded) restricted
//! to rows dated in or after the store's year. Drill-down city series read
//! the full per-metric tables.

mod loader;
pub mod models;
pub mod queries;

use aqv_core::city::CityCoord;
use aqv_core::dataset::{Dataset, MonthlyTable};
use aqv_core::date_index::DateIndex;
use aqv_core::observation::DataPoint;
use aqv_core::pollutant::{Metric, Pollutant};
use aqv_core::region::{Region, RegionTable};
use aqv_data::aggregate::{valid_city_registry, CityRegistry};
use chrono::Datelike;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared, cheaply cloneable handle to the loaded tables.
///
/// # Example
///
/// ```rust
/// use aqv_core::pollutant::Pollutant;
/// use aqv_db::DataStore;
///
/// let store = DataStore::new(2025, Pollutant::Aqi);
/// store.load_pollutants("type\nAQI\nCO\n").unwrap();
/// assert_eq!(store.pollutants(), vec![Pollutant::Aqi, Pollutant::Co]);
/// ```
#[derive(Clone)]
pub struct DataStore {
    inner: Rc<RefCell<StoreInner>>,
}

struct StoreInner {
    year: i32,
    registry_pollutant: Pollutant,
    pollutants: Vec<Pollutant>,
    city_coords: Vec<CityCoord>,
    regions: RegionTable,
    detailed: HashMap<(Pollutant, Metric), Dataset>,
    primary: HashMap<Pollutant, Dataset>,
    monthly: HashMap<(Pollutant, Region), MonthlyTable>,
    registry: CityRegistry,
    date_index: DateIndex,
    national_cache: HashMap<Pollutant, Vec<DataPoint>>,
}

impl StoreInner {
    /// Rebuild the primary dataset of `pollutant` from its detailed tables.
    fn rebuild_primary(&mut self, pollutant: Pollutant) {
        let source = self
            .detailed
            .get(&(pollutant, Metric::Mean))
            .or_else(|| self.detailed.get(&(pollutant, Metric::Max)));
        match source {
            Some(dataset) => {
                let year = self.year;
                let filtered = dataset.retain_dates(|d| d.year() >= year);
                self.primary.insert(pollutant, filtered);
            }
            None => {
                self.primary.remove(&pollutant);
            }
        }
    }

    /// City names the registry is inferred from: the coordinate table, or
    /// the columns of `dataset` when no coordinates are loaded.
    fn candidates(&self, dataset: Option<&Dataset>) -> Vec<String> {
        if !self.city_coords.is_empty() {
            self.city_coords.iter().map(|c| c.name.clone()).collect()
        } else {
            dataset.map(|d| d.cities().to_vec()).unwrap_or_default()
        }
    }

    /// Recompute everything derived from the registry pollutant and drop
    /// cached national aggregates.
    fn refresh_derived(&mut self) {
        let dataset = self.primary.get(&self.registry_pollutant);
        let candidates = self.candidates(dataset);
        self.registry = match dataset {
            Some(ds) => valid_city_registry(ds, &candidates),
            None => CityRegistry::new(candidates),
        };
        self.date_index = DateIndex::new(dataset.map(Dataset::len).unwrap_or(0));
        self.national_cache.clear();
        log::debug!(
            "[AQV] store: registry has {} cities, date index spans {} rows",
            self.registry.len(),
            self.date_index.len()
        );
    }
}

impl DataStore {
    /// Create an empty store.
    ///
    /// `year` selects the rows of the primary datasets and drill-down
    /// series; `registry_pollutant` names the dataset that decides which
    /// cities report data and how long the date axis is.
    pub fn new(year: i32, registry_pollutant: Pollutant) -> Self {
        let inner = StoreInner {
            year,
            registry_pollutant,
            pollutants: Pollutant::ALL.to_vec(),
            city_coords: Vec::new(),
            regions: RegionTable::embedded(),
            detailed: HashMap::new(),
            primary: HashMap::new(),
            monthly: HashMap::new(),
            registry: CityRegistry::default(),
            date_index: DateIndex::new(0),
            national_cache: HashMap::new(),
        };
        Self {
            inner: Rc::new(RefCell::new(inner)),
        }
    }
}
