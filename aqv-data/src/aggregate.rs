//! Aggregates over daily city tables.
//!
//! Missing or malformed cells never raise errors: they are skipped by the
//! aggregate they would have contributed to. A row with no usable city is
//! omitted rather than reported as zero.

use aqv_core::dataset::{Dataset, MonthlyRow, MonthlyTable};
use aqv_core::date_index::DateIndex;
use aqv_core::observation::DataPoint;
use aqv_utils::dates::month_index;
use chrono::Datelike;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Rows sampled when deciding whether a city reports data at all.
pub const REGISTRY_SAMPLE_ROWS: usize = 50;

/// Cities that actually report data. Any city outside the registry is
/// excluded from national aggregates and map point data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CityRegistry {
    cities: Vec<String>,
    members: HashSet<String>,
}

impl CityRegistry {
    pub fn new(cities: Vec<String>) -> Self {
        let mut members = HashSet::with_capacity(cities.len());
        let cities: Vec<String> = cities
            .into_iter()
            .filter(|c| members.insert(c.clone()))
            .collect();
        Self { cities, members }
    }

    pub fn contains(&self, city: &str) -> bool {
        self.members.contains(city)
    }

    pub fn cities(&self) -> &[String] {
        &self.cities
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }

    /// Dataset columns of the registered cities that the dataset carries.
    pub fn columns_in(&self, dataset: &Dataset) -> Vec<usize> {
        self.cities
            .iter()
            .filter_map(|c| dataset.column(c))
            .collect()
    }
}

/// Infer which of `candidates` report data, looking only at the first
/// [`REGISTRY_SAMPLE_ROWS`] rows of `dataset`.
///
/// A city qualifies when any sampled cell is a non-zero number. When the
/// dataset is empty every candidate is kept.
pub fn valid_city_registry(dataset: &Dataset, candidates: &[String]) -> CityRegistry {
    if dataset.is_empty() {
        return CityRegistry::new(candidates.to_vec());
    }
    let sample = &dataset.rows()[..dataset.len().min(REGISTRY_SAMPLE_ROWS)];
    let valid: Vec<String> = candidates
        .iter()
        .filter(|city| {
            dataset.column(city).is_some_and(|column| {
                sample
                    .iter()
                    .any(|row| row.cell(column).is_some_and(|v| v != 0.0))
            })
        })
        .cloned()
        .collect();
    log::debug!(
        "[AQV] aggregate: {} of {} candidate cities report data",
        valid.len(),
        candidates.len()
    );
    CityRegistry::new(valid)
}

/// Readings of `city` during `year`, in source row order.
pub fn city_year_series(dataset: &Dataset, city: &str, year: i32) -> Vec<DataPoint> {
    let Some(column) = dataset.column(city) else {
        return Vec::new();
    };
    dataset
        .rows()
        .iter()
        .filter(|row| row.date.year() == year)
        .filter_map(|row| row.cell(column).map(|v| DataPoint::new(row.date, v)))
        .collect()
}

/// Mean over `columns` of row `index`, or `None` when no column is numeric.
fn row_mean(dataset: &Dataset, index: usize, columns: &[usize]) -> Option<DataPoint> {
    let row = dataset.row(index)?;
    let (sum, count) = columns
        .iter()
        .filter_map(|&c| row.cell(c))
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| DataPoint::new(row.date, sum / count as f64))
}

/// Mean of the registered cities at row `index`.
pub fn national_mean_at(dataset: &Dataset, registry: &CityRegistry, index: usize) -> Option<f64> {
    row_mean(dataset, index, &registry.columns_in(dataset)).map(|p| p.value)
}

/// National daily mean for every row of `year`.
pub fn national_daily_mean(dataset: &Dataset, registry: &CityRegistry, year: i32) -> Vec<DataPoint> {
    let columns = registry.columns_in(dataset);
    (0..dataset.len())
        .filter(|&i| dataset.rows()[i].date.year() == year)
        .filter_map(|i| row_mean(dataset, i, &columns))
        .collect()
}

/// National daily mean for the rows of `month` (1-12), located through
/// `date_index` and truncated when the dataset is short.
pub fn national_monthly_mean(
    dataset: &Dataset,
    registry: &CityRegistry,
    date_index: &DateIndex,
    month: u32,
) -> Vec<DataPoint> {
    let columns = registry.columns_in(dataset);
    date_index
        .month_range(month)
        .filter(|&i| i < dataset.len())
        .filter_map(|i| row_mean(dataset, i, &columns))
        .collect()
}

/// A city's reading on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityValue {
    pub city: String,
    pub value: f64,
}

/// Readings of every registered city at row `index` (map point data).
pub fn daily_city_values(dataset: &Dataset, registry: &CityRegistry, index: usize) -> Vec<CityValue> {
    let Some(row) = dataset.row(index) else {
        return Vec::new();
    };
    registry
        .cities()
        .iter()
        .filter_map(|city| {
            let column = dataset.column(city)?;
            row.cell(column).map(|value| CityValue {
                city: city.clone(),
                value,
            })
        })
        .collect()
}

/// Group a series by zero-based month, keeping row order inside each month.
pub fn group_by_month(points: &[DataPoint]) -> BTreeMap<usize, Vec<DataPoint>> {
    let mut grouped: BTreeMap<usize, Vec<DataPoint>> = BTreeMap::new();
    for p in points {
        grouped.entry(month_index(&p.date)).or_default().push(*p);
    }
    grouped
}

/// Mean of one month of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthMean {
    /// Zero-based month (0 = January).
    pub month_index: usize,
    pub value: f64,
}

/// Per-month means of a series, ordered by month.
pub fn monthly_means(points: &[DataPoint]) -> Vec<MonthMean> {
    group_by_month(points)
        .into_iter()
        .filter_map(|(month_index, values)| {
            mean(values.iter().map(|p| p.value)).map(|value| MonthMean { month_index, value })
        })
        .collect()
}

/// Arithmetic mean, `None` for an empty input.
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Largest value of a series.
pub fn max_value(points: &[DataPoint]) -> Option<f64> {
    points.iter().map(|p| p.value).max_by(|a, b| a.total_cmp(b))
}

/// Derive a monthly-mean table for `cities` from a daily dataset, rounded
/// to one decimal. Months are labelled `YYYY-MM`; a city with no reading in
/// a month gets an empty cell.
pub fn monthly_table_from_daily(dataset: &Dataset, cities: &[&str]) -> MonthlyTable {
    let kept: Vec<(String, usize)> = cities
        .iter()
        .filter_map(|c| dataset.column(c).map(|col| (c.to_string(), col)))
        .collect();

    let mut months: BTreeMap<(i32, u32), Vec<(f64, usize)>> = BTreeMap::new();
    for row in dataset.rows() {
        let sums = months
            .entry((row.date.year(), row.date.month()))
            .or_insert_with(|| vec![(0.0, 0); kept.len()]);
        for (slot, (_, column)) in sums.iter_mut().zip(&kept) {
            if let Some(v) = row.cell(*column) {
                slot.0 += v;
                slot.1 += 1;
            }
        }
    }

    let rows = months
        .into_iter()
        .map(|((year, month), sums)| {
            let cells = sums
                .into_iter()
                .map(|(sum, count)| (count > 0).then(|| (sum / count as f64 * 10.0).round() / 10.0))
                .collect();
            MonthlyRow::new(format!("{year}-{month:02}"), cells)
        })
        .collect();
    MonthlyTable::new(kept.into_iter().map(|(c, _)| c).collect(), rows)
}
