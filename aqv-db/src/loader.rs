//! CSV loading for populating the store.
//!
//! Every loader replaces the affected table wholesale and refreshes the
//! derived state, so readers never observe a half-updated dataset.
//!
//! # CSV Formats
//!
//! - **Daily datasets** (has headers): `date,<city>,<city>,...`
//! - **Monthly tables** (has headers): `month,<city>,<city>,...`
//! - **City coordinates** (has headers): `City,Longtitude,Latitude`
//! - **Pollutant list** (has headers): one pollutant name per row
//! - **Region table** (has headers): `CITY,REGION`

use crate::DataStore;
use aqv_core::city::CityCoord;
use aqv_core::dataset::{Dataset, MonthlyTable};
use aqv_core::pollutant::{Metric, Pollutant};
use aqv_core::region::{Region, RegionTable};

impl DataStore {
    /// Load a daily dataset for `pollutant` / `metric` from CSV text.
    ///
    /// # Example CSV
    /// ```text
    /// date,北京,天津
    /// 2025-01-01,57,88
    /// ```
    pub fn load_dataset(&self, pollutant: Pollutant, metric: Metric, csv_data: &str) -> anyhow::Result<()> {
        let dataset = Dataset::from_csv(csv_data)?;
        self.insert_dataset(pollutant, metric, dataset);
        Ok(())
    }

    /// Install an already-parsed daily dataset, replacing any previous one.
    pub fn insert_dataset(&self, pollutant: Pollutant, metric: Metric, dataset: Dataset) {
        let mut inner = self.inner.borrow_mut();
        log::info!(
            "[AQV] loader: {} {} has {} rows x {} cities",
            pollutant,
            metric,
            dataset.len(),
            dataset.cities().len()
        );
        inner.detailed.insert((pollutant, metric), dataset);
        inner.rebuild_primary(pollutant);
        inner.refresh_derived();
    }

    /// Load the city coordinate table. The coordinate names become the
    /// candidate set for the city registry.
    pub fn load_city_coords(&self, csv_data: &str) -> anyhow::Result<()> {
        let coords = CityCoord::parse_csv(csv_data)?;
        let mut inner = self.inner.borrow_mut();
        log::info!("[AQV] loader: loaded {} city coordinates", coords.len());
        inner.city_coords = coords;
        inner.refresh_derived();
        Ok(())
    }

    /// Load the pollutant list (e.g. `type.csv`). Unknown names are
    /// skipped; an empty list falls back to every pollutant.
    pub fn load_pollutants(&self, csv_data: &str) -> anyhow::Result<()> {
        let pollutants = Pollutant::parse_list(csv_data)?;
        log::info!("[AQV] loader: loaded {} pollutants", pollutants.len());
        self.inner.borrow_mut().pollutants = pollutants;
        Ok(())
    }

    /// Replace the embedded city → region table.
    pub fn load_region_table(&self, csv_data: &str) -> anyhow::Result<()> {
        let table = RegionTable::parse(csv_data)?;
        log::info!("[AQV] loader: loaded {} region memberships", table.len());
        self.inner.borrow_mut().regions = table;
        Ok(())
    }

    /// Load a precomputed monthly table (`<P>_monthmean_<region>.csv`).
    ///
    /// # Example CSV
    /// ```text
    /// month,沈阳,大连
    /// 2025-01,80.5,62.1
    /// ```
    pub fn load_monthly_table(&self, pollutant: Pollutant, region: Region, csv_data: &str) -> anyhow::Result<()> {
        let table = MonthlyTable::from_csv(csv_data)?;
        log::info!(
            "[AQV] loader: monthly {} {} has {} months",
            pollutant,
            region,
            table.len()
        );
        self.inner.borrow_mut().monthly.insert((pollutant, region), table);
        Ok(())
    }
}
