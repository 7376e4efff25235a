//! Asynchronous loading of a data directory into a [`DataStore`].
//!
//! # Directory layout
//!
//! ```text
//! data/
//!   type.csv                      pollutant list
//!   citynamewithlocation.csv      City,Longtitude,Latitude
//!   city_regions.csv              optional CITY,REGION override
//!   AQI_daymean.csv               <P>_day<metric>.csv per pollutant/metric
//!   AQI_monthmean_东北.csv        optional <P>_monthmean_<region>.csv
//! ```
//!
//! A file that cannot be read or parsed is logged with `warn!` and skipped;
//! the store then treats that table as empty. Monthly tables are optional
//! and fall back to tables derived from the daily data.

use aqv_core::pollutant::{Metric, Pollutant};
use aqv_core::region::Region;
use aqv_db::DataStore;
use log::{debug, info, warn};
use std::path::Path;

pub const POLLUTANT_LIST_FILE: &str = "type.csv";
pub const CITY_COORDS_FILE: &str = "citynamewithlocation.csv";
pub const REGION_TABLE_FILE: &str = "city_regions.csv";

/// Name of the precomputed monthly table of `pollutant` in `region`.
pub fn monthly_file_name(pollutant: Pollutant, region: Region) -> String {
    format!("{}_monthmean_{}.csv", pollutant, region)
}

/// What a directory load produced.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub failed: Vec<String>,
}

async fn read_file(dir: &Path, name: &str) -> anyhow::Result<String> {
    let path = dir.join(name);
    tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {}: {}", path.display(), e))
}

/// Read `name` and hand it to `load`. Failures are downgraded to a warning.
async fn load_file<F>(dir: &Path, name: &str, report: &mut LoadReport, load: F)
where
    F: FnOnce(&str) -> anyhow::Result<()>,
{
    let result = match read_file(dir, name).await {
        Ok(text) => load(&text),
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => report.loaded += 1,
        Err(e) => {
            warn!("[AQV] loader: {} skipped: {}", name, e);
            report.failed.push(name.to_string());
        }
    }
}

/// Load every dataset in `dir` into `store`.
pub async fn load_data_dir(store: &DataStore, dir: &Path) -> LoadReport {
    let mut report = LoadReport::default();
    info!("[AQV] loader: reading data directory {}", dir.display());

    load_file(dir, POLLUTANT_LIST_FILE, &mut report, |csv| store.load_pollutants(csv)).await;
    load_file(dir, CITY_COORDS_FILE, &mut report, |csv| store.load_city_coords(csv)).await;

    if tokio::fs::try_exists(dir.join(REGION_TABLE_FILE)).await.unwrap_or(false) {
        load_file(dir, REGION_TABLE_FILE, &mut report, |csv| store.load_region_table(csv)).await;
    } else {
        debug!("[AQV] loader: no {}, using the built-in region table", REGION_TABLE_FILE);
    }

    for pollutant in Pollutant::ALL {
        for metric in Metric::ALL {
            let name = metric.daily_file_name(pollutant);
            load_file(dir, &name, &mut report, |csv| {
                store.load_dataset(pollutant, metric, csv)
            })
            .await;
        }
    }

    for pollutant in Pollutant::ALL {
        for region in Region::ALL {
            let name = monthly_file_name(pollutant, region);
            match read_file(dir, &name).await {
                Ok(text) => match store.load_monthly_table(pollutant, region, &text) {
                    Ok(()) => report.loaded += 1,
                    Err(e) => {
                        warn!("[AQV] loader: {} skipped: {}", name, e);
                        report.failed.push(name);
                    }
                },
                Err(_) => debug!("[AQV] loader: no {}, rankings derive from daily data", name),
            }
        }
    }

    info!(
        "[AQV] loader: {} files loaded, {} skipped",
        report.loaded,
        report.failed.len()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aqv-load-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_monthly_file_name() {
        assert_eq!(monthly_file_name(Pollutant::Pm25, Region::Northeast), "PM2.5_monthmean_东北.csv");
    }

    #[tokio::test]
    async fn test_missing_directory_yields_empty_store() {
        let store = DataStore::new(2025, Pollutant::Aqi);
        let report = load_data_dir(&store, Path::new("/nonexistent/aqv-data")).await;
        assert_eq!(report.loaded, 0);
        // type.csv, coordinates and 21 daily files
        assert_eq!(report.failed.len(), 23);
        assert!(store.date_index().is_empty());
        assert!(store.query_national_daily_mean(Pollutant::Aqi).is_empty());
    }

    #[tokio::test]
    async fn test_loads_present_files() {
        let dir = scratch_dir("present");
        std::fs::write(dir.join(POLLUTANT_LIST_FILE), "type\nAQI\nCO\n").unwrap();
        std::fs::write(dir.join("AQI_daymean.csv"), "date,北京,沈阳\n2025-01-01,50,70\n").unwrap();
        std::fs::write(
            dir.join(monthly_file_name(Pollutant::Aqi, Region::Northeast)),
            "month,沈阳,大连\n2025-01,80.5,62.1\n",
        )
        .unwrap();

        let store = DataStore::new(2025, Pollutant::Aqi);
        let report = load_data_dir(&store, &dir).await;
        assert_eq!(report.loaded, 3);
        assert!(report.failed.contains(&CITY_COORDS_FILE.to_string()));
        assert_eq!(store.pollutants(), vec![Pollutant::Aqi, Pollutant::Co]);
        assert_eq!(store.date_index().len(), 1);
        assert_eq!(store.query_monthly_table(Pollutant::Aqi, Region::Northeast).cities().len(), 2);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_region_table_override() {
        let dir = scratch_dir("regions");
        std::fs::write(dir.join(REGION_TABLE_FILE), "CITY,REGION\n北京,东北\n").unwrap();

        let store = DataStore::new(2025, Pollutant::Aqi);
        let report = load_data_dir(&store, &dir).await;
        assert_eq!(report.loaded, 1);
        assert!(!report.failed.contains(&REGION_TABLE_FILE.to_string()));
        assert_eq!(store.region_of("北京"), Region::Northeast);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_sample_fixture_directory() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../fixtures/sample");
        let store = DataStore::new(2025, Pollutant::Aqi);
        let report = load_data_dir(&store, &dir).await;
        // type.csv, coordinates, four daily files and one monthly table
        assert_eq!(report.loaded, 7);
        assert_eq!(store.registry().len(), 6);
        // two December rows fall before the year
        assert_eq!(store.date_index().len(), 90);
        assert_eq!(store.query_monthly_table(Pollutant::Aqi, Region::Northeast).len(), 3);
    }
}
