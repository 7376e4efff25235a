//! Typed query methods over the loaded tables.
//!
//! All queries return models from [`crate::models`] (or chart structures
//! from `aqv-data`) and never fail: missing tables, cities or indices yield
//! empty results.
//!
//! # Date indices
//!
//! Map, radar and info panel queries address a day by its row index in the
//! primary dataset, as produced by the store's [`DateIndex`].

use crate::models::{
    date_values, CityMapValue, DatasetSummary, DateValue, InfoPanel, MonthDetailData, RadarAxis,
    RaincloudData, RaincloudMonth, RidgelineData,
};
use crate::DataStore;
use aqv_core::city::CityCoord;
use aqv_core::dataset::MonthlyTable;
use aqv_core::date_index::DateIndex;
use aqv_core::observation::DataPoint;
use aqv_core::pollutant::{Metric, Pollutant};
use aqv_core::region::Region;
use aqv_data::aggregate::{
    city_year_series, daily_city_values, group_by_month, max_value, mean, monthly_means,
    monthly_table_from_daily, national_daily_mean, national_mean_at, national_monthly_mean,
    valid_city_registry, CityRegistry,
};
use aqv_data::calendar::{calendar_cells, CalendarCell};
use aqv_data::density::{
    heuristic_bandwidth, kde, monthly_densities, sample_grid, RAINCLOUD_BANDWIDTH_DIVISOR,
    RAINCLOUD_SAMPLE_POINTS, RIDGELINE_BANDWIDTH_DIVISOR, RIDGELINE_SAMPLE_POINTS,
};
use aqv_data::normalize::{color_for, heat_intensity, normalize};
use aqv_data::ranking::{build_snapshots, RankOrder, RankSnapshot};
use aqv_utils::dates::format_date;
use chrono::Datelike;

/// Metric of the drill-down city series.
pub const DRILLDOWN_METRIC: Metric = Metric::Max;

/// Ridgeline x-axis extent used when a city has no positive reading.
const RIDGELINE_FALLBACK_MAX: f64 = 10.0;

impl DataStore {
    // ───────────────────── Store state ─────────────────────

    pub fn year(&self) -> i32 {
        self.inner.borrow().year
    }

    /// Pollutants listed by the pollutant table, in file order.
    pub fn pollutants(&self) -> Vec<Pollutant> {
        self.inner.borrow().pollutants.clone()
    }

    pub fn date_index(&self) -> DateIndex {
        self.inner.borrow().date_index
    }

    /// Cities taking part in national aggregates.
    pub fn registry(&self) -> CityRegistry {
        self.inner.borrow().registry.clone()
    }

    pub fn city_coords(&self) -> Vec<CityCoord> {
        self.inner.borrow().city_coords.clone()
    }

    pub fn region_of(&self, city: &str) -> Region {
        self.inner.borrow().regions.region_of(city)
    }

    /// Whether a primary dataset is loaded for `pollutant`.
    pub fn has_dataset(&self, pollutant: Pollutant) -> bool {
        self.inner.borrow().primary.contains_key(&pollutant)
    }

    /// Registry inferred from `pollutant`'s primary dataset.
    ///
    /// The store's own registry is the one inferred from its registry
    /// pollutant; this recomputes it for any other pollutant on demand.
    pub fn valid_city_registry(&self, pollutant: Pollutant) -> CityRegistry {
        let inner = self.inner.borrow();
        let dataset = inner.primary.get(&pollutant);
        let candidates = inner.candidates(dataset);
        match dataset {
            Some(ds) => valid_city_registry(ds, &candidates),
            None => CityRegistry::new(candidates),
        }
    }

    /// One summary per loaded daily dataset, ordered by pollutant and metric.
    pub fn query_dataset_summaries(&self) -> Vec<DatasetSummary> {
        let inner = self.inner.borrow();
        let mut summaries: Vec<DatasetSummary> = inner
            .detailed
            .iter()
            .map(|(&(pollutant, metric), ds)| DatasetSummary {
                pollutant,
                metric,
                rows: ds.len(),
                cities: ds.cities().len(),
                first_date: ds.rows().first().map(|r| format_date(&r.date)),
                last_date: ds.rows().last().map(|r| format_date(&r.date)),
            })
            .collect();
        summaries.sort_by_key(|s| (s.pollutant, s.metric));
        summaries
    }

    // ───────────────────── Time series ─────────────────────

    fn city_year_points(&self, city: &str, pollutant: Pollutant, metric: Metric) -> Vec<DataPoint> {
        let inner = self.inner.borrow();
        match inner.detailed.get(&(pollutant, metric)) {
            Some(ds) => city_year_series(ds, city, inner.year),
            None => Vec::new(),
        }
    }

    /// Readings of `city` during the store's year, from the `metric` table.
    pub fn query_city_year_series(&self, city: &str, pollutant: Pollutant, metric: Metric) -> Vec<DateValue> {
        let rows = date_values(&self.city_year_points(city, pollutant, metric));
        log::info!(
            "[AQV] query: query_city_year_series({}, {}, {}) returned {} records",
            city,
            pollutant,
            metric,
            rows.len()
        );
        rows
    }

    /// National daily mean over the registry cities, cached per pollutant
    /// until the next load.
    fn national_daily_points(&self, pollutant: Pollutant) -> Vec<DataPoint> {
        let cached = self.inner.borrow().national_cache.get(&pollutant).cloned();
        if let Some(points) = cached {
            log::debug!("[AQV] query: national mean cache hit for {}", pollutant);
            return points;
        }
        let points = {
            let inner = self.inner.borrow();
            match inner.primary.get(&pollutant) {
                Some(ds) => national_daily_mean(ds, &inner.registry, inner.year),
                None => Vec::new(),
            }
        };
        self.inner
            .borrow_mut()
            .national_cache
            .insert(pollutant, points.clone());
        points
    }

    pub fn query_national_daily_mean(&self, pollutant: Pollutant) -> Vec<DateValue> {
        let rows = date_values(&self.national_daily_points(pollutant));
        log::info!(
            "[AQV] query: query_national_daily_mean({}) returned {} records",
            pollutant,
            rows.len()
        );
        rows
    }

    /// National daily mean for the days of `month` (1-12).
    pub fn query_national_monthly_mean(&self, pollutant: Pollutant, month: u32) -> Vec<DateValue> {
        let inner = self.inner.borrow();
        let points = match inner.primary.get(&pollutant) {
            Some(ds) => national_monthly_mean(ds, &inner.registry, &inner.date_index, month),
            None => Vec::new(),
        };
        date_values(&points)
    }

    // ───────────────────── Single day ─────────────────────

    /// Date of row `index` in the primary dataset.
    pub fn query_date_string(&self, pollutant: Pollutant, index: usize) -> Option<String> {
        let inner = self.inner.borrow();
        let row = inner.primary.get(&pollutant)?.row(index)?;
        Some(format_date(&row.date))
    }

    /// Map point data: every registry city with a reading on day `index`.
    pub fn query_daily_map_data(&self, pollutant: Pollutant, index: usize) -> Vec<CityMapValue> {
        let inner = self.inner.borrow();
        let Some(ds) = inner.primary.get(&pollutant) else {
            return Vec::new();
        };
        let rows: Vec<CityMapValue> = daily_city_values(ds, &inner.registry, index)
            .into_iter()
            .map(|cv| CityMapValue {
                intensity: heat_intensity(pollutant, cv.value),
                color: color_for(pollutant, cv.value),
                city: cv.city,
                value: cv.value,
            })
            .collect();
        log::info!(
            "[AQV] query: query_daily_map_data({}, {}) returned {} cities",
            pollutant,
            index,
            rows.len()
        );
        rows
    }

    /// Radar spokes of `city` on day `index`, one per listed pollutant
    /// whose dataset has that row and a column for the city.
    pub fn query_city_radar(&self, city: &str, index: usize) -> Vec<RadarAxis> {
        let inner = self.inner.borrow();
        inner
            .pollutants
            .iter()
            .filter_map(|&pollutant| {
                let ds = inner.primary.get(&pollutant)?;
                if ds.row(index).is_none() || !ds.has_city(city) {
                    return None;
                }
                let original_value = ds.value(index, city);
                Some(RadarAxis {
                    axis: pollutant,
                    value: normalize(pollutant, original_value),
                    original_value,
                })
            })
            .collect()
    }

    /// Radar spokes of the national mean on day `index`.
    pub fn query_national_radar(&self, index: usize) -> Vec<RadarAxis> {
        let inner = self.inner.borrow();
        inner
            .pollutants
            .iter()
            .filter_map(|&pollutant| {
                let ds = inner.primary.get(&pollutant)?;
                ds.row(index)?;
                let original_value = national_mean_at(ds, &inner.registry, index);
                Some(RadarAxis {
                    axis: pollutant,
                    value: normalize(pollutant, original_value),
                    original_value,
                })
            })
            .collect()
    }

    pub fn query_info_panel(&self, city: &str, pollutant: Pollutant, index: usize) -> InfoPanel {
        let inner = self.inner.borrow();
        let ds = inner.primary.get(&pollutant);
        InfoPanel {
            city: city.to_string(),
            date: ds
                .and_then(|d| d.row(index))
                .map(|r| format_date(&r.date))
                .unwrap_or_default(),
            value: ds.and_then(|d| d.value(index, city)),
            unit: pollutant.unit(),
        }
    }

    // ───────────────────── Drill-down ─────────────────────

    /// Calendar heatmap of the drill-down city.
    pub fn query_calendar(&self, city: &str, pollutant: Pollutant) -> Vec<CalendarCell> {
        calendar_cells(&self.city_year_points(city, pollutant, DRILLDOWN_METRIC), pollutant)
    }

    /// Per-month density ridges: bandwidth `x_max / 30` over a 40-point grid.
    pub fn query_ridgeline(&self, city: &str, pollutant: Pollutant) -> RidgelineData {
        let points = self.city_year_points(city, pollutant, DRILLDOWN_METRIC);
        let x_max = max_value(&points)
            .filter(|&v| v > 0.0)
            .unwrap_or(RIDGELINE_FALLBACK_MAX);
        let bandwidth = x_max / RIDGELINE_BANDWIDTH_DIVISOR;
        let grid = sample_grid(x_max, RIDGELINE_SAMPLE_POINTS);
        RidgelineData {
            city: city.to_string(),
            pollutant,
            bandwidth,
            x_max,
            months: monthly_densities(&points, bandwidth, &grid),
        }
    }

    /// Per-month raincloud: bandwidth `city_max / 40` over a 100-point grid
    /// spanning both the city and the national series.
    pub fn query_raincloud(&self, city: &str, pollutant: Pollutant) -> RaincloudData {
        let points = self.city_year_points(city, pollutant, DRILLDOWN_METRIC);
        let national = self.national_daily_points(pollutant);

        let values: Vec<f64> = points.iter().map(|p| p.value).collect();
        let bandwidth = heuristic_bandwidth(&values, RAINCLOUD_BANDWIDTH_DIVISOR);
        let city_max = max_value(&points).unwrap_or(0.0);
        let y_max = city_max.max(max_value(&national).unwrap_or(0.0)) * 1.1;
        let grid = sample_grid(y_max, RAINCLOUD_SAMPLE_POINTS);

        let months = group_by_month(&points)
            .into_iter()
            .map(|(month_index, month_points)| {
                let raw: Vec<f64> = month_points.iter().map(|p| p.value).collect();
                RaincloudMonth {
                    month_index,
                    mean: mean(raw.iter().copied()).unwrap_or(0.0),
                    curve: kde(bandwidth, &grid, &raw),
                    points: raw,
                }
            })
            .collect();

        RaincloudData {
            city: city.to_string(),
            pollutant,
            bandwidth,
            y_max,
            months,
            national_means: monthly_means(&national),
        }
    }

    /// Daily city readings against the national mean for `month` (1-12).
    pub fn query_month_detail(&self, city: &str, pollutant: Pollutant, month: u32) -> MonthDetailData {
        let month = month.clamp(1, 12);
        let city_points: Vec<DataPoint> = self
            .city_year_points(city, pollutant, DRILLDOWN_METRIC)
            .into_iter()
            .filter(|p| p.date.month() == month)
            .collect();
        MonthDetailData {
            city: city.to_string(),
            pollutant,
            month,
            city_series: date_values(&city_points),
            national_series: self.query_national_monthly_mean(pollutant, month),
        }
    }

    // ───────────────────── Rankings ─────────────────────

    /// Monthly table of `region` for `pollutant`: the loaded table when one
    /// exists, otherwise derived from the primary daily dataset.
    pub fn query_monthly_table(&self, pollutant: Pollutant, region: Region) -> MonthlyTable {
        let inner = self.inner.borrow();
        if let Some(table) = inner.monthly.get(&(pollutant, region)) {
            return table.clone();
        }
        match inner.primary.get(&pollutant) {
            Some(ds) => {
                let cities = inner.regions.cities_in(region);
                let table = monthly_table_from_daily(ds, &cities);
                log::debug!(
                    "[AQV] query: derived monthly {} {} table with {} months",
                    pollutant,
                    region,
                    table.len()
                );
                table
            }
            None => MonthlyTable::default(),
        }
    }

    pub fn query_rank_snapshots(
        &self,
        pollutant: Pollutant,
        region: Region,
        order: RankOrder,
        top_n: usize,
    ) -> Vec<RankSnapshot> {
        let snapshots = build_snapshots(&self.query_monthly_table(pollutant, region), order, top_n);
        log::info!(
            "[AQV] query: query_rank_snapshots({}, {}, {}) returned {} months",
            pollutant,
            region,
            order,
            snapshots.len()
        );
        snapshots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COORDS_CSV: &str = "\
City,Longtitude,Latitude
北京,116.4,39.9
天津,117.2,39.1
沈阳,123.4,41.8
";

    /// Helper to create a store with AQI and CO data for January and
    /// February 2025 (plus one December 2024 row outside the year).
    fn sample_store() -> DataStore {
        let store = DataStore::new(2025, Pollutant::Aqi);
        store.load_city_coords(COORDS_CSV).unwrap();

        let aqi_mean = "\
date,北京,天津,沈阳
2024-12-31,99,99,99
2025-01-01,50,100,150
2025-01-02,60,NaN,80
2025-02-01,40,20,
2025-02-02,,,
";
        store.load_dataset(Pollutant::Aqi, Metric::Mean, aqi_mean).unwrap();

        let aqi_max = "\
date,北京,天津,沈阳
2024-12-31,120,120,120
2025-01-01,50,110,160
2025-01-02,100,90,90
2025-02-01,150,30,10
";
        store.load_dataset(Pollutant::Aqi, Metric::Max, aqi_max).unwrap();

        let co_mean = "\
date,北京,天津,沈阳
2025-01-01,1.0,6.0,2.0
2025-01-02,0.5,0.5,0.5
";
        store.load_dataset(Pollutant::Co, Metric::Mean, co_mean).unwrap();

        store
    }

    /// Helper to create a store with `days` contiguous AQI rows from
    /// 2025-01-01: 北京 reads `10 + i` and 天津 `30 + i` on row `i`.
    fn contiguous_store(days: u32) -> DataStore {
        let mut csv = String::from("date,北京,天津\n");
        let start = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        for i in 0..days {
            let date = start + chrono::Duration::days(i as i64);
            csv.push_str(&format!("{},{},{}\n", format_date(&date), 10 + i, 30 + i));
        }
        let store = DataStore::new(2025, Pollutant::Aqi);
        store.load_dataset(Pollutant::Aqi, Metric::Mean, &csv).unwrap();
        store.load_dataset(Pollutant::Aqi, Metric::Max, &csv).unwrap();
        store
    }

    // ───────────────────── Time series ─────────────────────

    #[test]
    fn date_index_spans_primary_rows() {
        let store = sample_store();
        let index = store.date_index();
        assert_eq!(index.len(), 4);
        assert_eq!(store.query_date_string(Pollutant::Aqi, index.index_from_date(1, 2)).unwrap(), "2025-01-02");
        // truncated dataset clamps later dates onto the last row
        assert_eq!(index.index_from_date(12, 31), 3);
    }

    #[test]
    fn city_year_series_reads_metric_table() {
        let store = sample_store();
        let series = store.query_city_year_series("北京", Pollutant::Aqi, Metric::Max);
        let values: Vec<f64> = series.iter().map(|d| d.value).collect();
        assert_eq!(values, vec![50.0, 100.0, 150.0]);
        assert_eq!(series[0].date, "2025-01-01");
        assert!(store.query_city_year_series("北京", Pollutant::Aqi, Metric::Min).is_empty());
    }

    #[test]
    fn national_daily_mean_omits_empty_rows() {
        let store = sample_store();
        let national = store.query_national_daily_mean(Pollutant::Aqi);
        assert_eq!(national.len(), 3);
        assert_eq!(national[0], DateValue { date: "2025-01-01".to_string(), value: 100.0 });
        assert_eq!(national[1].value, 70.0);
        assert_eq!(national[2].value, 30.0);
    }

    #[test]
    fn national_daily_mean_is_cached_and_stable() {
        let store = sample_store();
        let first = store.query_national_daily_mean(Pollutant::Aqi);
        let second = store.query_national_daily_mean(Pollutant::Aqi);
        assert_eq!(first, second);
    }

    #[test]
    fn national_monthly_mean_for_february() {
        let store = contiguous_store(40);
        let feb = store.query_national_monthly_mean(Pollutant::Aqi, 2);
        // the dataset stops on Feb 9
        assert_eq!(feb.len(), 9);
        assert_eq!(feb[0], DateValue { date: "2025-02-01".to_string(), value: 51.0 });
        assert_eq!(store.query_national_monthly_mean(Pollutant::Aqi, 1).len(), 31);
        assert!(store.query_national_monthly_mean(Pollutant::Aqi, 3).is_empty());
        assert!(store.query_national_monthly_mean(Pollutant::Pm25, 1).is_empty());
    }

    // ───────────────────── Single day ─────────────────────

    #[test]
    fn daily_map_data_colors_registry_cities() {
        let store = sample_store();
        let map = store.query_daily_map_data(Pollutant::Aqi, 0);
        assert_eq!(map.len(), 3);
        assert_eq!(map[0].city, "北京");
        assert_eq!(map[0].color.to_string(), "#FFFF00");
        assert_eq!(map[0].intensity, 0.25);
        assert_eq!(map[1].color.to_string(), "#FF7E00");
        assert!(store.query_daily_map_data(Pollutant::Aqi, 40).is_empty());
    }

    #[test]
    fn city_radar_normalizes_each_pollutant() {
        let store = sample_store();
        let radar = store.query_city_radar("天津", 0);
        // AQI and CO are loaded; the other pollutants have no dataset
        assert_eq!(radar.len(), 2);
        assert_eq!(radar[0].axis, Pollutant::Aqi);
        assert_eq!(radar[0].original_value, Some(100.0));
        assert_eq!(radar[0].value, 100.0 / 300.0);
        // CO 6.0 is above the radar max of 5
        assert_eq!(radar[1].axis, Pollutant::Co);
        assert_eq!(radar[1].value, 1.0);
    }

    #[test]
    fn city_radar_reports_missing_cell_as_zero() {
        let store = sample_store();
        let radar = store.query_city_radar("天津", 1);
        assert_eq!(radar[0].original_value, None);
        assert_eq!(radar[0].value, 0.0);
        assert!(store.query_city_radar("广州", 0).is_empty());
    }

    #[test]
    fn national_radar_averages_registry() {
        let store = sample_store();
        let radar = store.query_national_radar(0);
        assert_eq!(radar[0].original_value, Some(100.0));
        assert_eq!(radar[1].original_value, Some(3.0));
        assert_eq!(radar[1].value, 0.6);
    }

    #[test]
    fn info_panel_reports_unit_and_value() {
        let store = sample_store();
        let panel = store.query_info_panel("北京", Pollutant::Co, 0);
        assert_eq!(panel.date, "2025-01-01");
        assert_eq!(panel.value, Some(1.0));
        assert_eq!(panel.unit, "mg/m³");
        let missing = store.query_info_panel("北京", Pollutant::Co, 9);
        assert_eq!(missing.date, "");
        assert_eq!(missing.value, None);
    }

    // ───────────────────── Drill-down ─────────────────────

    #[test]
    fn ridgeline_uses_max_series() {
        let store = sample_store();
        let ridge = store.query_ridgeline("北京", Pollutant::Aqi);
        assert_eq!(ridge.x_max, 150.0);
        assert_eq!(ridge.bandwidth, 5.0);
        assert_eq!(ridge.months.len(), 2);
        assert_eq!(ridge.months[0].mean, 75.0);
        assert_eq!(ridge.months[0].curve.len(), RIDGELINE_SAMPLE_POINTS);
    }

    #[test]
    fn ridgeline_of_unknown_city_falls_back() {
        let store = sample_store();
        let ridge = store.query_ridgeline("广州", Pollutant::Aqi);
        assert_eq!(ridge.x_max, 10.0);
        assert!(ridge.months.is_empty());
    }

    #[test]
    fn raincloud_includes_national_means() {
        let store = sample_store();
        let rain = store.query_raincloud("北京", Pollutant::Aqi);
        assert_eq!(rain.bandwidth, 150.0 / 40.0);
        assert_eq!(rain.months.len(), 2);
        assert_eq!(rain.months[1].points, vec![150.0]);
        assert_eq!(rain.months[0].curve.len(), RAINCLOUD_SAMPLE_POINTS);
        assert_eq!(rain.national_means.len(), 2);
        assert_eq!(rain.national_means[0].value, 85.0);
        assert!((rain.y_max - 165.0).abs() < 1e-9);
    }

    #[test]
    fn calendar_cells_for_city() {
        let store = sample_store();
        let cells = store.query_calendar("沈阳", Pollutant::Aqi);
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[2].month_index, 1);
    }

    #[test]
    fn month_detail_pairs_city_and_national() {
        let store = contiguous_store(40);
        let detail = store.query_month_detail("北京", Pollutant::Aqi, 2);
        assert_eq!(detail.month, 2);
        assert_eq!(detail.city_series.len(), 9);
        assert_eq!(detail.city_series[0].value, 41.0);
        assert_eq!(detail.national_series.len(), 9);
        assert_eq!(detail.national_series[0].value, 51.0);
    }

    // ───────────────────── Rankings ─────────────────────

    #[test]
    fn rank_snapshots_from_loaded_table() {
        let store = sample_store();
        store
            .load_monthly_table(
                Pollutant::Aqi,
                Region::Northeast,
                "month,沈阳,大连,长春\n2025-01,10,5,NaN\n2025-02,7,8,9\n",
            )
            .unwrap();
        let snapshots = store.query_rank_snapshots(Pollutant::Aqi, Region::Northeast, RankOrder::Best, 15);
        assert_eq!(snapshots.len(), 2);
        let cities: Vec<&str> = snapshots[0].entries.iter().map(|e| e.city.as_str()).collect();
        assert_eq!(cities, vec!["大连", "沈阳"]);
    }

    #[test]
    fn rank_snapshots_derived_from_daily_data() {
        let store = sample_store();
        let snapshots = store.query_rank_snapshots(Pollutant::Aqi, Region::NorthChina, RankOrder::Worst, 0);
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].label, "2025-01");
        // 天津 Jan mean is 100, 北京 is 55
        assert_eq!(snapshots[0].entries[0].city, "天津");
        assert_eq!(snapshots[0].entries[1].value, 55.0);
    }

    #[test]
    fn dataset_summaries_are_ordered() {
        let store = sample_store();
        let summaries = store.query_dataset_summaries();
        assert_eq!(summaries.len(), 3);
        assert_eq!((summaries[0].pollutant, summaries[0].metric), (Pollutant::Aqi, Metric::Max));
        assert_eq!(summaries[1].first_date.as_deref(), Some("2024-12-31"));
        assert_eq!(summaries[2].pollutant, Pollutant::Co);
    }

    #[test]
    fn valid_city_registry_per_pollutant() {
        let store = sample_store();
        assert_eq!(store.valid_city_registry(Pollutant::Co).len(), 3);
        // no dataset: every coordinate city is a candidate
        assert_eq!(store.valid_city_registry(Pollutant::O3).len(), 3);
    }
}
